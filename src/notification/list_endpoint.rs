//! Defines the endpoint for listing the caller's notifications.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, auth::UserID, notification::list_notifications};

/// The state needed to list notifications.
#[derive(Debug, Clone)]
pub struct ListNotificationsState {
    /// The database connection for reading notifications.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListNotificationsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler returning the caller's notifications, newest first.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_notifications_endpoint(
    State(state): State<ListNotificationsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match list_notifications(user_id, &connection) {
        Ok(notifications) => Json(notifications).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        auth::{Email, PasswordHash, create_user},
        db::initialize,
    };

    use super::{ListNotificationsState, list_notifications_endpoint};

    #[tokio::test]
    async fn lists_notifications_for_caller() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            Email::new_unchecked("foo@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let state = ListNotificationsState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_notifications_endpoint(State(state), Extension(user.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
