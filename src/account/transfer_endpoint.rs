//! Defines the endpoint for transferring money between two of the
//! family's accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    account::{AccountKind, get_accounts, transfer},
    auth::UserID,
    member::get_member_of_user,
};

/// The state needed to perform a transfer.
#[derive(Debug, Clone)]
pub struct TransferState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferData {
    /// The account to take the money from.
    pub from_kind: AccountKind,
    /// The account to put the money into.
    pub to_kind: AccountKind,
    /// The amount to move.
    pub amount: f64,
}

/// A route handler that moves money between two accounts of the caller's
/// family and returns the updated balances.
///
/// # Panics
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<TransferData>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    let member = match get_member_of_user(user_id, &connection) {
        Ok(member) => member,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = transfer(
        member.family_id,
        data.from_kind,
        data.to_kind,
        data.amount,
        &connection,
    ) {
        return error.into_response();
    }

    match get_accounts(member.family_id, &connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        account::{AccountKind, credit_account, get_account},
        auth::{Email, PasswordHash, UserID, create_user},
        db::initialize,
        family::{CreatorProfile, create_family},
    };

    use super::{TransferData, TransferState, transfer_endpoint};

    fn get_test_state() -> (TransferState, UserID, i64) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user(
            Email::new_unchecked("foo@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let family = create_family(
            user.id,
            CreatorProfile {
                name: "Alex".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();
        credit_account(family.id, AccountKind::Main, 100.0, &conn).unwrap();

        (
            TransferState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
            family.id,
        )
    }

    #[tokio::test]
    async fn transfer_moves_money() {
        let (state, user_id, family_id) = get_test_state();

        let response = transfer_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(TransferData {
                from_kind: AccountKind::Main,
                to_kind: AccountKind::Savings,
                amount: 40.0,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        let main = get_account(family_id, AccountKind::Main, &connection).unwrap();
        let savings = get_account(family_id, AccountKind::Savings, &connection).unwrap();
        assert_eq!(main.balance, 60.0);
        assert_eq!(savings.balance, 40.0);
    }

    #[tokio::test]
    async fn transfer_with_insufficient_funds_returns_conflict() {
        let (state, user_id, _) = get_test_state();

        let response = transfer_endpoint(
            State(state),
            Extension(user_id),
            Json(TransferData {
                from_kind: AccountKind::Savings,
                to_kind: AccountKind::Main,
                amount: 40.0,
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
