//! Defines the endpoint for accepting a join request.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    auth::UserID,
    database_id::{MemberId, RequestId},
    join_request::accept_request,
};

/// The state needed to accept a join request.
#[derive(Debug, Clone)]
pub struct AcceptRequestState {
    /// The database connection for managing join requests.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AcceptRequestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for accepting a join request.
#[derive(Debug, Deserialize)]
pub struct AcceptRequestData {
    /// The open member slot to bind the requester into.
    pub member_id: MemberId,
}

/// A route handler that accepts a pending join request and binds the
/// requester into the chosen member slot.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn accept_request_endpoint(
    State(state): State<AcceptRequestState>,
    Path(request_id): Path<RequestId>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<AcceptRequestData>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match accept_request(request_id, data.member_id, user_id, &connection) {
        Ok(request) => Json(request).into_response(),
        Err(error) => error.into_response(),
    }
}
