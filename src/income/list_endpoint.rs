//! Defines the endpoint for listing incomes.

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
    income::{IncomeQuery, list_incomes},
    member::get_member_of_user,
};

/// The state needed to list incomes.
#[derive(Debug, Clone)]
pub struct ListIncomesState {
    /// The database connection for reading incomes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListIncomesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler listing the caller's family's incomes, filtered by the
/// query string (date range, member, income type).
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_incomes_endpoint(
    State(state): State<ListIncomesState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<IncomeQuery>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    match list_incomes(member.family_id, &query, &connection) {
        Ok(incomes) => Json(incomes).into_response(),
        Err(error) => error.into_response(),
    }
}
