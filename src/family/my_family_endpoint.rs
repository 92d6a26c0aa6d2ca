//! Defines the endpoint for fetching the logged-in user's family.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, auth::UserID, family::get_family_overview, member::get_member_of_user,
};

/// The state needed to look up the logged-in user's family.
#[derive(Debug, Clone)]
pub struct MyFamilyState {
    /// The database connection for reading families.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MyFamilyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler returning the caller's family, its accounts and its
/// members.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_my_family_endpoint(
    State(state): State<MyFamilyState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    match get_family_overview(member.family_id, &connection) {
        Ok(overview) => Json(overview).into_response(),
        Err(error) => error.into_response(),
    }
}
