//! Defines the endpoint for listing expenses.

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
    expense::{ExpenseQuery, list_expenses},
    member::get_member_of_user,
};

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler listing the caller's family's expenses, filtered by
/// the query string (date range, member, category, planned flag).
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseQuery>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    match list_expenses(member.family_id, &query, &connection) {
        Ok(expenses) => Json(expenses).into_response(),
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
        expense::ExpenseQuery,
        family::{CreatorProfile, create_family},
    };

    use super::{ListExpensesState, list_expenses_endpoint};

    #[tokio::test]
    async fn lists_expenses_for_member() {
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
        let state = ListExpensesState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_expenses_endpoint(
            State(state),
            Extension(user.id),
            Query(ExpenseQuery::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn fails_for_unaffiliated_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = ListExpensesState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_expenses_endpoint(
            State(state),
            Extension(UserID::new(1)),
            Query(ExpenseQuery::default()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
