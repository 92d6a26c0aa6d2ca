//! Defines the endpoint for creating a new family.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    auth::UserID,
    family::{CreatorProfile, create_family, get_family_overview},
};

/// The state needed to create a family.
#[derive(Debug, Clone)]
pub struct CreateFamilyState {
    /// The database connection for managing families.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateFamilyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a family.
#[derive(Debug, Deserialize)]
pub struct CreateFamilyData {
    /// The display name the creator wants for their own member slot.
    pub name: String,
    /// The creator's relationship label, e.g. "self".
    pub relationship: String,
    /// The kinds of income the creator brings in.
    #[serde(default)]
    pub income_types: Vec<String>,
}

/// A route handler for creating a new family.
///
/// The logged-in user becomes the creator and admin. On success the new
/// family is returned with its three zero-balance accounts and the
/// creator's member slot.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_family_endpoint(
    State(state): State<CreateFamilyState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CreateFamilyData>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let family = match create_family(
        user_id,
        CreatorProfile {
            name: data.name,
            relationship: data.relationship,
            income_types: data.income_types,
        },
        &connection,
    ) {
        Ok(family) => family,
        Err(error) => return error.into_response(),
    };

    match get_family_overview(family.id, &connection) {
        Ok(overview) => (StatusCode::CREATED, Json(overview)).into_response(),
        Err(error) => error.into_response(),
    }
}
