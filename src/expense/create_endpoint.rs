//! Defines the endpoint for posting a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    expense::{NewExpense, post_expense},
    member::{get_member, get_member_of_user},
};

/// The state needed to post an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for posting an expense against a member of the
/// caller's family.
///
/// An immediate expense runs the main → savings → investment debit
/// cascade in the same database transaction as the row insert; a planned
/// expense is recorded without touching any balance.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<NewExpense>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let acting_member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    let target_member = match get_member(data.member_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    if target_member.family_id != acting_member.family_id {
        return Error::NotFound.into_response();
    }

    match post_expense(data, &connection) {
        Ok(expense) => (StatusCode::CREATED, Json(expense)).into_response(),
        Err(error) => error.into_response(),
    }
}
