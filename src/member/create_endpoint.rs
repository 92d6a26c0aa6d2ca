//! Defines the endpoint for creating a new (unbound) member slot.

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
    AppState, Error,
    auth::UserID,
    member::{MemberRole, NewMember, get_member_of_user, insert_member},
};

/// The state needed to create a member slot.
#[derive(Debug, Clone)]
pub struct CreateMemberState {
    /// The database connection for managing members.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateMemberState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a member slot.
#[derive(Debug, Deserialize)]
pub struct CreateMemberData {
    /// The member's display name.
    pub name: String,
    /// How the member is related to the family creator.
    pub relationship: String,
    /// The kinds of income this member brings in.
    #[serde(default)]
    pub income_types: Vec<String>,
}

/// A route handler for creating an unbound member slot in the caller's
/// family.
///
/// Only the family admin can add slots. The slot has no bound user until
/// a join request fills it.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_member_endpoint(
    State(state): State<CreateMemberState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CreateMemberData>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let acting_member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    if acting_member.role != MemberRole::Admin {
        return Error::Forbidden.into_response();
    }

    match insert_member(
        NewMember {
            family_id: acting_member.family_id,
            user_id: None,
            name: data.name,
            relationship: data.relationship,
            role: MemberRole::Member,
            income_types: data.income_types,
        },
        &connection,
    ) {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(error) => error.into_response(),
    }
}
