//! Defines the endpoint for listing join requests.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    join_request::{list_requests_for_family, list_requests_of_user},
    member::{MemberRole, get_member_of_user},
};

/// The state needed to list join requests.
#[derive(Debug, Clone)]
pub struct ListJoinRequestsState {
    /// The database connection for reading join requests.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListJoinRequestsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler listing join requests.
///
/// A family admin sees the requests aimed at their family; everyone else
/// sees the requests they created themselves.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_join_requests_endpoint(
    State(state): State<ListJoinRequestsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let requests = match get_member_of_user(user_id, &connection) {
        Ok(member) if member.role == MemberRole::Admin => {
            list_requests_for_family(member.family_id, &connection)
        }
        Ok(_) | Err(Error::NotAMember) => list_requests_of_user(user_id, &connection),
        Err(error) => return error.into_response(),
    };

    match requests {
        Ok(requests) => Json(requests).into_response(),
        Err(error) => error.into_response(),
    }
}
