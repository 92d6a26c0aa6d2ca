//! Defines the endpoint for completing a planned expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::ExpenseId,
    expense::{complete_expense, get_expense},
    member::{get_member, get_member_of_user},
};

/// The state needed to complete a planned expense.
#[derive(Debug, Clone)]
pub struct CompleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CompleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that turns a planned expense of the caller's family
/// into an actual one, running the debit cascade with the stored amount.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn complete_expense_endpoint(
    State(state): State<CompleteExpenseState>,
    Path(expense_id): Path<ExpenseId>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let acting_member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    let expense = match get_expense(expense_id, &connection) {
        Ok(expense) => expense,
        Err(error) => return error.into_response(),
    };

    let owner = match get_member(expense.member_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    if owner.family_id != acting_member.family_id {
        return Error::NotFound.into_response();
    }

    match complete_expense(expense_id, &connection) {
        Ok(expense) => Json(expense).into_response(),
        Err(error) => error.into_response(),
    }
}
