//! Defines join requests and their pending → accepted/rejected lifecycle.
//!
//! A join request is how an unaffiliated user becomes a family member:
//! they name the family creator by email, the creator's admin picks one of
//! the family's open member slots, and accepting the request binds the
//! requester into that slot.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{UserID, get_user_by_email, get_user_by_id},
    database_id::{FamilyId, MemberId, RequestId},
    family::get_family_by_creator,
    member::{MemberRole, bind_member_user, get_member, get_member_of_user},
    notification::create_notification,
};

/// The lifecycle state of a join request.
///
/// `Accepted` and `Rejected` are terminal; a resolved request never
/// changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for the family admin to accept or reject.
    Pending,
    /// The requester was bound into a member slot.
    Accepted,
    /// The admin turned the request down.
    Rejected,
}

impl RequestStatus {
    /// The status as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown request status \"{other}\"")),
        }
    }
}

impl ToSql for RequestStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RequestStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A request by a user to join the family of the creator with a given
/// email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinFamilyRequest {
    /// The ID of the request.
    pub id: RequestId,
    /// The user asking to join.
    pub user_id: UserID,
    /// The email the requester used to name the family creator. Kept as
    /// written, even if the creator later changes their address.
    pub creator_email: String,
    /// The family the request targets.
    pub family_id: FamilyId,
    /// A free-text message from the requester to the admin.
    pub message: String,
    /// Where the request is in its lifecycle.
    pub status: RequestStatus,
    /// When the request was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the request last changed state.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Create the join request table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_join_request_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS join_request (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                creator_email TEXT NOT NULL,
                family_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(family_id) REFERENCES family(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_join_request_row(row: &Row) -> Result<JoinFamilyRequest, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let creator_email = row.get(2)?;
    let family_id = row.get(3)?;
    let message = row.get(4)?;
    let status = row.get(5)?;
    let created_at = row.get(6)?;
    let updated_at = row.get(7)?;

    Ok(JoinFamilyRequest {
        id,
        user_id: UserID::new(raw_user_id),
        creator_email,
        family_id,
        message,
        status,
        created_at,
        updated_at,
    })
}

const SELECT_JOIN_REQUEST: &str = "SELECT id, user_id, creator_email, family_id, message, \
     status, created_at, updated_at FROM join_request";

/// Create a pending join request from `requester` to the family whose
/// creator registered with `creator_email`.
///
/// A notification is emitted to the creator on success, fire-and-forget:
/// if writing the notification fails the request still stands and the
/// failure is only logged.
///
/// # Errors
/// This function will return an:
/// - [Error::AlreadyInFamily] if `requester` already occupies a member
///   slot somewhere,
/// - [Error::CreatorNotFound] if no user registered with `creator_email`,
/// - [Error::FamilyNotFound] if that user has not created a family,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_join_request(
    requester: UserID,
    creator_email: &str,
    message: &str,
    connection: &Connection,
) -> Result<JoinFamilyRequest, Error> {
    match get_member_of_user(requester, connection) {
        Ok(_) => return Err(Error::AlreadyInFamily),
        Err(Error::NotAMember) => {}
        Err(error) => return Err(error),
    }

    let creator = match get_user_by_email(creator_email, connection) {
        Ok(creator) => creator,
        Err(Error::NotFound) => return Err(Error::CreatorNotFound),
        Err(error) => return Err(error),
    };

    let family = get_family_by_creator(creator.id, connection)?;

    let now = OffsetDateTime::now_utc();
    let request = connection
        .prepare(
            "INSERT INTO join_request
                 (user_id, creator_email, family_id, message, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, creator_email, family_id, message, status, created_at, updated_at",
        )?
        .query_row(
            (
                requester.as_i64(),
                creator_email,
                family.id,
                message,
                RequestStatus::Pending,
                now,
                now,
            ),
            map_join_request_row,
        )?;

    // Best effort only. A request that exists without its notification
    // beats a notification with no request behind it.
    let requester_email = get_user_by_id(requester, connection)
        .map(|user| user.email.to_string())
        .unwrap_or_else(|_| "someone".to_owned());
    if let Err(error) = create_notification(
        creator.id,
        &format!("{requester_email} wants to join your family"),
        connection,
    ) {
        tracing::warn!(
            "could not notify user {} about join request {}: {}",
            creator.id,
            request.id,
            error
        );
    }

    Ok(request)
}

/// Retrieve a join request from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a join request,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_join_request(
    request_id: RequestId,
    connection: &Connection,
) -> Result<JoinFamilyRequest, Error> {
    connection
        .prepare(&format!("{SELECT_JOIN_REQUEST} WHERE id = :id"))?
        .query_row(&[(":id", &request_id)], map_join_request_row)
        .map_err(|error| error.into())
}

/// The guards shared by accept and reject: the request must exist, the
/// acting user must be the admin of the targeted family, and the request
/// must still be pending.
fn load_pending_request_as_admin(
    request_id: RequestId,
    acting_user: UserID,
    connection: &Connection,
) -> Result<JoinFamilyRequest, Error> {
    let request = get_join_request(request_id, connection)?;

    // A user resolving their own request makes no sense; report the same
    // error as a missing request so nothing is leaked.
    if request.user_id == acting_user {
        return Err(Error::NotFound);
    }

    let acting_member = get_member_of_user(acting_user, connection)?;

    if acting_member.family_id != request.family_id {
        return Err(Error::NotFound);
    }

    if acting_member.role != MemberRole::Admin {
        return Err(Error::Forbidden);
    }

    if request.status != RequestStatus::Pending {
        return Err(Error::RequestAlreadyResolved);
    }

    Ok(request)
}

/// Accept the join request `request_id`, binding the requester into the
/// member slot `target_member_id`.
///
/// The status change and the slot binding run in one transaction; either
/// both land or neither does.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if the request does not exist, the acting user is
///   the requester, the acting user is not in the targeted family, or the
///   chosen slot is not an existing slot of that family,
/// - [Error::Forbidden] if the acting user is not the family admin,
/// - [Error::RequestAlreadyResolved] if the request is not pending,
/// - [Error::MemberSlotTaken] if the chosen slot already has a bound
///   user,
/// - [Error::AlreadyInFamily] if the requester joined a family since the
///   request was made,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn accept_request(
    request_id: RequestId,
    target_member_id: MemberId,
    acting_user: UserID,
    connection: &Connection,
) -> Result<JoinFamilyRequest, Error> {
    let request = load_pending_request_as_admin(request_id, acting_user, connection)?;

    let target = get_member(target_member_id, connection)?;

    if target.family_id != request.family_id {
        return Err(Error::NotFound);
    }

    if target.user_id.is_some() {
        return Err(Error::MemberSlotTaken);
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    set_request_status(request.id, RequestStatus::Accepted, &transaction)?;
    bind_member_user(target.id, request.user_id, &transaction)?;

    transaction.commit()?;

    tracing::info!(
        "join request {} accepted, user {} bound to member {}",
        request.id,
        request.user_id,
        target.id
    );

    get_join_request(request.id, connection)
}

/// Reject the join request `request_id`. Terminal, with no other side
/// effect.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if the request does not exist, the acting user is
///   the requester, or the acting user is not in the targeted family,
/// - [Error::Forbidden] if the acting user is not the family admin,
/// - [Error::RequestAlreadyResolved] if the request is not pending,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn reject_request(
    request_id: RequestId,
    acting_user: UserID,
    connection: &Connection,
) -> Result<JoinFamilyRequest, Error> {
    let request = load_pending_request_as_admin(request_id, acting_user, connection)?;

    set_request_status(request.id, RequestStatus::Rejected, connection)?;

    get_join_request(request.id, connection)
}

fn set_request_status(
    request_id: RequestId,
    status: RequestStatus,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE join_request SET status = :status, updated_at = :updated_at WHERE id = :id",
        &[
            (":status", &status as &dyn ToSql),
            (":updated_at", &OffsetDateTime::now_utc() as &dyn ToSql),
            (":id", &request_id as &dyn ToSql),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve the join requests targeting `family_id`, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_requests_for_family(
    family_id: FamilyId,
    connection: &Connection,
) -> Result<Vec<JoinFamilyRequest>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_JOIN_REQUEST} WHERE family_id = :family_id ORDER BY id DESC"
        ))?
        .query_map(&[(":family_id", &family_id)], map_join_request_row)?
        .map(|maybe_request| maybe_request.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the join requests created by `user_id`, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_requests_of_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<JoinFamilyRequest>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_JOIN_REQUEST} WHERE user_id = :user_id ORDER BY id DESC"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_join_request_row)?
        .map(|maybe_request| maybe_request.map_err(|error| error.into()))
        .collect()
}

#[cfg(test)]
mod join_request_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{Email, PasswordHash, UserID, create_user},
        db::initialize,
        family::{CreatorProfile, create_family},
        member::{MemberRole, NewMember, get_member, insert_member},
        notification::list_notifications,
    };

    use super::{
        RequestStatus, accept_request, create_join_request, get_join_request,
        list_requests_for_family, list_requests_of_user, reject_request,
    };

    const CREATOR_EMAIL: &str = "creator@bar.baz";

    struct Fixture {
        conn: Connection,
        creator_id: UserID,
        requester_id: UserID,
        family_id: i64,
        slot_id: i64,
    }

    fn get_fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let creator = create_user(
            Email::new_unchecked(CREATOR_EMAIL),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let family = create_family(
            creator.id,
            CreatorProfile {
                name: "Alex".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();
        let slot = insert_member(
            NewMember {
                family_id: family.id,
                user_id: None,
                name: "Jamie".to_owned(),
                relationship: "child".to_owned(),
                role: MemberRole::Member,
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();
        let requester = create_user(
            Email::new_unchecked("jamie@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();

        Fixture {
            conn,
            creator_id: creator.id,
            requester_id: requester.id,
            family_id: family.id,
            slot_id: slot.id,
        }
    }

    #[test]
    fn create_join_request_starts_pending() {
        let f = get_fixture();

        let request =
            create_join_request(f.requester_id, CREATOR_EMAIL, "let me in", &f.conn).unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.user_id, f.requester_id);
        assert_eq!(request.family_id, f.family_id);
        assert_eq!(request.creator_email, CREATOR_EMAIL);
        assert_eq!(request.message, "let me in");
    }

    #[test]
    fn create_join_request_notifies_the_creator() {
        let f = get_fixture();

        create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let notifications = list_notifications(f.creator_id, &f.conn).unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("jamie@bar.baz"));
    }

    #[test]
    fn create_join_request_fails_for_unknown_creator_email() {
        let f = get_fixture();

        let result = create_join_request(f.requester_id, "nobody@bar.baz", "", &f.conn);

        assert_eq!(result, Err(Error::CreatorNotFound));
    }

    #[test]
    fn create_join_request_fails_when_creator_has_no_family() {
        let f = get_fixture();
        create_user(
            Email::new_unchecked("nofamily@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &f.conn,
        )
        .unwrap();

        let result = create_join_request(f.requester_id, "nofamily@bar.baz", "", &f.conn);

        assert_eq!(result, Err(Error::FamilyNotFound));
    }

    #[test]
    fn create_join_request_fails_for_user_already_in_a_family() {
        let f = get_fixture();

        let result = create_join_request(f.creator_id, CREATOR_EMAIL, "", &f.conn);

        assert_eq!(result, Err(Error::AlreadyInFamily));
    }

    #[test]
    fn accept_binds_requester_into_slot() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let accepted = accept_request(request.id, f.slot_id, f.creator_id, &f.conn).unwrap();

        assert_eq!(accepted.status, RequestStatus::Accepted);
        let slot = get_member(f.slot_id, &f.conn).unwrap();
        assert_eq!(slot.user_id, Some(f.requester_id));
    }

    #[test]
    fn reject_leaves_no_binding() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let rejected = reject_request(request.id, f.creator_id, &f.conn).unwrap();

        assert_eq!(rejected.status, RequestStatus::Rejected);
        let slot = get_member(f.slot_id, &f.conn).unwrap();
        assert_eq!(slot.user_id, None);
    }

    #[test]
    fn accept_own_request_fails_with_not_found_and_changes_nothing() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let result = accept_request(request.id, f.slot_id, f.requester_id, &f.conn);

        assert_eq!(result, Err(Error::NotFound));
        let unchanged = get_join_request(request.id, &f.conn).unwrap();
        assert_eq!(unchanged.status, RequestStatus::Pending);
        assert_eq!(get_member(f.slot_id, &f.conn).unwrap().user_id, None);
    }

    #[test]
    fn accept_fails_on_resolved_request() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();
        reject_request(request.id, f.creator_id, &f.conn).unwrap();

        let result = accept_request(request.id, f.slot_id, f.creator_id, &f.conn);

        assert_eq!(result, Err(Error::RequestAlreadyResolved));
    }

    #[test]
    fn reject_fails_on_resolved_request() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();
        reject_request(request.id, f.creator_id, &f.conn).unwrap();

        let result = reject_request(request.id, f.creator_id, &f.conn);

        assert_eq!(result, Err(Error::RequestAlreadyResolved));
    }

    #[test]
    fn accept_fails_when_slot_is_taken() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();
        accept_request(request.id, f.slot_id, f.creator_id, &f.conn).unwrap();

        let second_requester = create_user(
            Email::new_unchecked("sam@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &f.conn,
        )
        .unwrap();
        let second_request =
            create_join_request(second_requester.id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let result = accept_request(second_request.id, f.slot_id, f.creator_id, &f.conn);

        assert_eq!(result, Err(Error::MemberSlotTaken));
    }

    #[test]
    fn accept_fails_for_slot_in_another_family() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        // A second family with its own open slot.
        let other_creator = create_user(
            Email::new_unchecked("other@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &f.conn,
        )
        .unwrap();
        let other_family = create_family(
            other_creator.id,
            CreatorProfile {
                name: "Robin".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &f.conn,
        )
        .unwrap();
        let other_slot = insert_member(
            NewMember {
                family_id: other_family.id,
                user_id: None,
                name: "Sam".to_owned(),
                relationship: "child".to_owned(),
                role: MemberRole::Member,
                income_types: vec![],
            },
            &f.conn,
        )
        .unwrap();

        let result = accept_request(request.id, other_slot.id, f.creator_id, &f.conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn accept_by_non_member_fails() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();
        let outsider = create_user(
            Email::new_unchecked("outsider@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &f.conn,
        )
        .unwrap();

        let result = accept_request(request.id, f.slot_id, outsider.id, &f.conn);

        assert_eq!(result, Err(Error::NotAMember));
    }

    #[test]
    fn listing_by_family_and_by_user_agree() {
        let f = get_fixture();
        let request = create_join_request(f.requester_id, CREATOR_EMAIL, "", &f.conn).unwrap();

        let for_family = list_requests_for_family(f.family_id, &f.conn).unwrap();
        let of_user = list_requests_of_user(f.requester_id, &f.conn).unwrap();

        assert_eq!(for_family, vec![request.clone()]);
        assert_eq!(of_user, vec![request]);
    }
}
