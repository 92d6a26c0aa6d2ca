//! Defines the endpoint for listing the members of the caller's family.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, auth::UserID, member::{get_member_of_user, list_members}};

/// The state needed to list family members.
#[derive(Debug, Clone)]
pub struct ListMembersState {
    /// The database connection for reading members.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListMembersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler returning every member slot of the caller's family.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_members_endpoint(
    State(state): State<ListMembersState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    match list_members(member.family_id, &connection) {
        Ok(members) => Json(members).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        auth::{Email, PasswordHash, UserID, create_user},
        db::initialize,
        family::{CreatorProfile, create_family},
    };

    use super::{ListMembersState, list_members_endpoint};

    #[tokio::test]
    async fn lists_members_for_caller() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            Email::new_unchecked("foo@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        create_family(
            user.id,
            CreatorProfile {
                name: "Alex".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();
        let state = ListMembersState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_members_endpoint(State(state), Extension(user.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn fails_for_unaffiliated_user() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let state = ListMembersState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = list_members_endpoint(State(state), Extension(UserID::new(1)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
