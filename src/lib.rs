//! Foyer is a web app for tracking a household budget that is shared by a
//! family.
//!
//! This library provides a JSON REST API: users register and log in, one
//! user creates the family (which owns a main, a savings and an investment
//! account), other users join the family through a request/accept workflow,
//! and members record incomes and expenses that move the account balances.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod family;
mod income;
mod join_request;
mod logging;
mod member;
mod notification;
mod report;
mod routing;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email/password pair that does not match a
    /// registered user.
    ///
    /// An unknown email and a wrong password produce the same error so the
    /// client cannot probe which emails are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request carried no valid auth token (missing, malformed or
    /// expired).
    #[error("you must be logged in to do that")]
    Unauthenticated,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing or formatting the expiry date in the auth
    /// token.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format token expiry date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The logged-in user is a family member but lacks the admin role
    /// required for the operation.
    #[error("only the family admin can do that")]
    Forbidden,

    /// The logged-in user does not belong to any family yet.
    #[error("you do not belong to a family")]
    NotAMember,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// No registered user has the email given when creating a join request.
    #[error("no user with the given email exists")]
    CreatorNotFound,

    /// The user named in a join request has not created a family.
    #[error("the user with the given email has not created a family")]
    FamilyNotFound,

    /// The email given at registration already belongs to a registered user.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// The string given at registration is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The password and its confirmation did not match at registration.
    #[error("the passwords do not match")]
    PasswordMismatch,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server
    /// error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user tried to create a family but is already the creator of one.
    #[error("you have already created a family")]
    AlreadyHasFamily,

    /// The user tried to create or join a family while already being a
    /// member of one.
    #[error("you already belong to a family")]
    AlreadyInFamily,

    /// The member slot chosen when accepting a join request is already
    /// bound to a user.
    #[error("the chosen family member is already linked to a user")]
    MemberSlotTaken,

    /// Tried to accept or reject a join request that has already been
    /// accepted or rejected.
    #[error("the join request has already been resolved")]
    RequestAlreadyResolved,

    /// Tried to complete an expense that is not marked as planned.
    #[error("the expense is not a planned expense")]
    ExpenseNotPlanned,

    /// A zero or negative amount was used for a ledger entry or transfer.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A transfer asked for more money than the source account holds.
    #[error("insufficient funds: the account holds {available} but {requested} was requested")]
    InsufficientFunds {
        /// The balance of the source account.
        available: f64,
        /// The amount the transfer asked for.
        requested: f64,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("family.creator_user_id") =>
            {
                Error::AlreadyHasFamily
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("family_member") =>
            {
                Error::AlreadyInFamily
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Unauthenticated | Error::CookieMissing => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden | Error::NotAMember => StatusCode::FORBIDDEN,
            Error::NotFound | Error::CreatorNotFound | Error::FamilyNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateEmail
            | Error::AlreadyHasFamily
            | Error::AlreadyInFamily
            | Error::MemberSlotTaken
            | Error::RequestAlreadyResolved
            | Error::ExpenseNotPlanned
            | Error::InsufficientFunds { .. } => StatusCode::CONFLICT,
            Error::InvalidEmail(_)
            | Error::PasswordMismatch
            | Error::TooWeak(_)
            | Error::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidDateFormat(_, _) | Error::HashingError(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors are logged on the server and replaced with a
        // generic message so details never reach the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "an internal error occurred, check the server logs for details".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
