//! Defines the endpoint for asking to join a family.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, auth::UserID, join_request::create_join_request};

/// The state needed to create a join request.
#[derive(Debug, Clone)]
pub struct CreateJoinRequestState {
    /// The database connection for managing join requests.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateJoinRequestState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for asking to join a family.
#[derive(Debug, Deserialize)]
pub struct CreateJoinRequestData {
    /// The email of the user who created the family to join.
    pub creator_email: String,
    /// A free-text message for the family admin.
    #[serde(default)]
    pub message: String,
}

/// A route handler that creates a pending join request from the caller to
/// the family of the named creator.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_join_request_endpoint(
    State(state): State<CreateJoinRequestState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CreateJoinRequestData>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match create_join_request(user_id, &data.creator_email, &data.message, &connection) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(error) => error.into_response(),
    }
}
