//! Defines the endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        AuthenticatedUser, Email, PasswordHash, ValidatedPassword, create_user, set_auth_cookie,
    },
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// The email to register with.
    pub email: String,
    /// The password in plain text.
    pub password: String,
    /// The password typed a second time.
    pub confirm_password: String,
}

/// Handler for registering a new user.
///
/// On success the user is created, the auth cookie is set (registering
/// implies logging in) and a 201 response with the new user is returned.
///
/// # Errors
/// Returns an error response if:
/// - the email is malformed ([Error::InvalidEmail]),
/// - the passwords do not match ([Error::PasswordMismatch]),
/// - the password is too weak ([Error::TooWeak]),
/// - a user with the email already exists ([Error::DuplicateEmail]).
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Json(data): Json<RegisterData>,
) -> Response {
    let email = match Email::new(&data.email) {
        Ok(email) => email,
        Err(error) => return error.into_response(),
    };

    if data.password != data.confirm_password {
        return Error::PasswordMismatch.into_response();
    }

    let password = match ValidatedPassword::new(&data.password, &[email.as_ref()]) {
        Ok(password) => password,
        Err(error) => return error.into_response(),
    };

    let password_hash = match PasswordHash::new(password) {
        Ok(password_hash) => password_hash,
        Err(error) => return error.into_response(),
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire lock to database connection");

        match create_user(email, password_hash, &connection) {
            Ok(user) => user,
            Err(error) => return error.into_response(),
        }
    };

    let jar = match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => jar,
        Err(error) => return error.into_response(),
    };

    tracing::info!("registered user {}", user.id);

    (
        StatusCode::CREATED,
        jar,
        Json(AuthenticatedUser {
            id: user.id,
            email: user.email.to_string(),
        }),
    )
        .into_response()
}
