//! Defines the endpoint for posting a new income.

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
    income::{NewIncome, post_income},
    member::{get_member, get_member_of_user},
};

/// The state needed to post an income.
#[derive(Debug, Clone)]
pub struct CreateIncomeState {
    /// The database connection for managing incomes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateIncomeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for posting an income against a member of the caller's
/// family.
///
/// The named account is credited in the same database transaction as the
/// row insert. Posting against a member of another family is reported as
/// not-found so nothing leaks about other families.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_income_endpoint(
    State(state): State<CreateIncomeState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<NewIncome>,
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

    match post_income(data, &connection) {
        Ok(income) => (StatusCode::CREATED, Json(income)).into_response(),
        Err(error) => error.into_response(),
    }
}
