//! Defines the endpoint for logging out the current user.

use axum::{Json, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::auth::invalidate_auth_cookie;

/// Handler for log-out requests.
///
/// Invalidates the auth cookie. Safe to call without a live session; the
/// result is the same either way.
pub async fn get_log_out(jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "logged out" })))
}
