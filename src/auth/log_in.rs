//! Defines the endpoint for logging in a registered user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_email, set_auth_cookie},
};

/// How long the auth cookie should last if the user selects "remember me"
/// at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// The user's password in plain text.
    pub password: String,
    /// Whether to keep the session alive for a week instead of the default
    /// duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// The response body describing the logged-in user.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    /// The user's ID.
    pub id: UserID,
    /// The user's email address.
    pub email: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the
/// logged-in user is returned as JSON.
///
/// # Errors
/// Returns an [Error::InvalidCredentials] response if the email is
/// unknown or the password does not match. The two cases are
/// indistinguishable on purpose.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(data): Json<LogInData>,
) -> Response {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire lock to database connection");

        match get_user_by_email(&data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Error::InvalidCredentials.into_response(),
            Err(error) => return error.into_response(),
        }
    };

    match user.password_hash.verify(&data.password) {
        Ok(true) => {}
        Ok(false) => return Error::InvalidCredentials.into_response(),
        Err(error) => return error.into_response(),
    }

    let duration = if data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = match set_auth_cookie(jar, user.id, duration) {
        Ok(jar) => jar,
        Err(error) => return error.into_response(),
    };

    tracing::info!("user {} logged in", user.id);

    (
        jar,
        Json(AuthenticatedUser {
            id: user.id,
            email: user.email.to_string(),
        }),
    )
        .into_response()
}
