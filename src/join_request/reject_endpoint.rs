//! Defines the endpoint for rejecting a join request.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, auth::UserID, database_id::RequestId, join_request::reject_request};

/// The state needed to reject a join request.
#[derive(Debug, Clone)]
pub struct RejectRequestState {
    /// The database connection for managing join requests.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RejectRequestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that rejects a pending join request. Terminal, with no
/// other side effect.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn reject_request_endpoint(
    State(state): State<RejectRequestState>,
    Path(request_id): Path<RequestId>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match reject_request(request_id, user_id, &connection) {
        Ok(request) => Json(request).into_response(),
        Err(error) => error.into_response(),
    }
}
