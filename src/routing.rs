//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Json, Router, middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState, Error,
    account::{get_accounts_endpoint, transfer_endpoint},
    auth::{auth_guard, get_log_out, post_log_in, register_user},
    endpoints,
    expense::{
        complete_expense_endpoint, create_expense_endpoint, delete_expense_endpoint,
        list_expenses_endpoint,
    },
    family::{create_family_endpoint, get_my_family_endpoint},
    income::{create_income_endpoint, delete_income_endpoint, list_incomes_endpoint},
    join_request::{
        accept_request_endpoint, create_join_request_endpoint, list_join_requests_endpoint,
        reject_request_endpoint,
    },
    member::{create_member_endpoint, list_members_endpoint},
    notification::{list_notifications_endpoint, mark_notification_read_endpoint},
    report::report_summary_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::FAMILIES, post(create_family_endpoint))
        .route(endpoints::MY_FAMILY, get(get_my_family_endpoint))
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(endpoints::TRANSFER, post(transfer_endpoint))
        .route(
            endpoints::MEMBERS,
            get(list_members_endpoint).post(create_member_endpoint),
        )
        .route(
            endpoints::JOIN_REQUESTS,
            get(list_join_requests_endpoint).post(create_join_request_endpoint),
        )
        .route(endpoints::ACCEPT_JOIN_REQUEST, post(accept_request_endpoint))
        .route(endpoints::REJECT_JOIN_REQUEST, post(reject_request_endpoint))
        .route(
            endpoints::INCOMES,
            get(list_incomes_endpoint).post(create_income_endpoint),
        )
        .route(endpoints::INCOME, delete(delete_income_endpoint))
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE, delete(delete_expense_endpoint))
        .route(endpoints::COMPLETE_EXPENSE, post(complete_expense_endpoint))
        .route(endpoints::REPORT_SUMMARY, get(report_summary_endpoint))
        .route(endpoints::NOTIFICATIONS, get(list_notifications_endpoint))
        .route(
            endpoints::READ_NOTIFICATION,
            post(mark_notification_read_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Liveness probe.
async fn get_health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod router_tests {
    use axum_test::TestServer;
    use axum_extra::extract::cookie::Cookie;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{AppState, auth::COOKIE_TOKEN, endpoints};

    use super::build_router;

    const TEST_PASSWORD: &str = "a fine strong passphrase";

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "a test secret").unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    /// Register a user and return their session cookie.
    async fn register(server: &TestServer, email: &str) -> Cookie<'static> {
        let response = server
            .post(endpoints::USERS)
            .json(&json!({
                "email": email,
                "password": TEST_PASSWORD,
                "confirm_password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn health_endpoint_is_unprotected() {
        let server = get_test_server();

        server.get(endpoints::HEALTH).await.assert_status_ok();
    }

    #[tokio::test]
    async fn protected_routes_require_authentication() {
        let server = get_test_server();

        let response = server.get(endpoints::ACCOUNTS).await;

        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_returns_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/does_not_exist").await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_create_family_and_read_report() {
        let server = get_test_server();
        let session = register(&server, "alex@example.com").await;

        let response = server
            .post(endpoints::FAMILIES)
            .add_cookie(session.clone())
            .json(&json!({
                "name": "Alex",
                "relationship": "self",
                "income_types": ["salary"],
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let members: serde_json::Value = server
            .get(endpoints::MEMBERS)
            .add_cookie(session.clone())
            .await
            .json();
        let member_id = members[0]["id"].as_i64().unwrap();

        let response = server
            .post(endpoints::INCOMES)
            .add_cookie(session.clone())
            .json(&json!({
                "member_id": member_id,
                "amount": 1000.0,
                "income_type": "salary",
                "date": "2025-03-01",
                "account_kind": "main",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let summary: serde_json::Value = server
            .get(endpoints::REPORT_SUMMARY)
            .add_cookie(session)
            .await
            .json();
        assert_eq!(summary["total_income"].as_f64().unwrap(), 1000.0);
        assert_eq!(summary["balance"].as_f64().unwrap(), 1000.0);
    }

    #[tokio::test]
    async fn join_request_accept_flow_binds_requester() {
        let server = get_test_server();

        // The creator registers, creates the family, and adds an open
        // slot.
        let creator_session = register(&server, "creator@example.com").await;
        server
            .post(endpoints::FAMILIES)
            .add_cookie(creator_session.clone())
            .json(&json!({
                "name": "Alex",
                "relationship": "self",
                "income_types": [],
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        let slot: serde_json::Value = server
            .post(endpoints::MEMBERS)
            .add_cookie(creator_session.clone())
            .json(&json!({
                "name": "Jamie",
                "relationship": "child",
                "income_types": [],
            }))
            .await
            .json();
        let slot_id = slot["id"].as_i64().unwrap();

        // The requester registers and asks to join.
        let requester_session = register(&server, "jamie@example.com").await;
        let request: serde_json::Value = server
            .post(endpoints::JOIN_REQUESTS)
            .add_cookie(requester_session.clone())
            .json(&json!({
                "creator_email": "creator@example.com",
                "message": "it's me",
            }))
            .await
            .json();
        let request_id = request["id"].as_i64().unwrap();

        // The creator accepts.
        let response = server
            .post(&crate::endpoints::format_endpoint(
                endpoints::ACCEPT_JOIN_REQUEST,
                request_id,
            ))
            .add_cookie(creator_session)
            .json(&json!({ "member_id": slot_id }))
            .await;
        response.assert_status_ok();

        // The requester can now see the family.
        server
            .get(endpoints::MY_FAMILY)
            .add_cookie(requester_session)
            .await
            .assert_status_ok();
    }
}
