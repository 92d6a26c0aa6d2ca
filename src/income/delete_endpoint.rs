//! Defines the endpoint for deleting an income.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::IncomeId,
    income::{delete_income, get_income},
    member::{get_member, get_member_of_user},
};

/// The state needed to delete an income.
#[derive(Debug, Clone)]
pub struct DeleteIncomeState {
    /// The database connection for managing incomes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteIncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an income of the caller's family.
///
/// The account credit the income applied is left in place; balances are
/// not recomputed retroactively.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_income_endpoint(
    State(state): State<DeleteIncomeState>,
    Path(income_id): Path<IncomeId>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let acting_member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    let income = match get_income(income_id, &connection) {
        Ok(income) => income,
        Err(error) => return error.into_response(),
    };

    let owner = match get_member(income.member_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    if owner.family_id != acting_member.family_id {
        return Error::NotFound.into_response();
    }

    match delete_income(income_id, &connection) {
        Ok(()) => Json(json!({ "message": "income deleted" })).into_response(),
        Err(error) => error.into_response(),
    }
}
