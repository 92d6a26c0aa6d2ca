//! Defines the endpoint for the aggregate ledger report.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    auth::UserID,
    member::get_member_of_user,
    report::{ReportQuery, summarize},
};

/// The state needed to compute a report.
#[derive(Debug, Clone)]
pub struct ReportSummaryState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportSummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler returning the aggregate totals for the caller's
/// family, filtered by the query string.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn report_summary_endpoint(
    State(state): State<ReportSummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    match summarize(member.family_id, &query, &connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        auth::{Email, PasswordHash, UserID, create_user},
        db::initialize,
        family::{CreatorProfile, create_family},
        report::ReportQuery,
    };

    use super::{ReportSummaryState, report_summary_endpoint};

    #[tokio::test]
    async fn returns_summary_for_member() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            Email::new_unchecked("foo@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        create_family(
            user.id,
            CreatorProfile {
                name: "Alex".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();
        let state = ReportSummaryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = report_summary_endpoint(
            State(state),
            Extension(user.id),
            Query(ReportQuery::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn fails_for_unaffiliated_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = ReportSummaryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = report_summary_endpoint(
            State(state),
            Extension(UserID::new(1)),
            Query(ReportQuery::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
