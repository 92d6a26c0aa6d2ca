//! Defines the endpoint for marking a notification as read.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, auth::UserID, database_id::NotificationId,
    notification::mark_notification_read,
};

/// The state needed to mark a notification as read.
#[derive(Debug, Clone)]
pub struct MarkNotificationReadState {
    /// The database connection for managing notifications.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MarkNotificationReadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that marks one of the caller's notifications as read.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn mark_notification_read_endpoint(
    State(state): State<MarkNotificationReadState>,
    Path(notification_id): Path<NotificationId>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match mark_notification_read(notification_id, user_id, &connection) {
        Ok(()) => Json(json!({ "message": "notification marked as read" })).into_response(),
        Err(error) => error.into_response(),
    }
}
