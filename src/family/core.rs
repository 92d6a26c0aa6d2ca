//! Defines the family aggregate and the transactional creation of a
//! family with its three accounts and the creator's admin membership.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::Serialize;

use crate::{
    Error,
    account::{Account, AccountKind, get_accounts, insert_account},
    auth::UserID,
    database_id::FamilyId,
    member::{FamilyMember, MemberRole, NewMember, insert_member, list_members},
};

/// The shared budgeting unit owned by one creator user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Family {
    /// The ID of the family.
    pub id: FamilyId,
    /// The user who created the family. Immutable after creation.
    pub creator_user_id: UserID,
}

/// How the creator wants to appear as the first member of their family.
#[derive(Debug, Clone)]
pub struct CreatorProfile {
    /// The creator's display name.
    pub name: String,
    /// The creator's relationship label, e.g. "self" or "mother".
    pub relationship: String,
    /// The kinds of income the creator brings in.
    pub income_types: Vec<String>,
}

/// A family together with its accounts and members, as returned by the
/// family endpoints.
#[derive(Debug, Serialize)]
pub struct FamilyOverview {
    /// The family itself.
    pub family: Family,
    /// The family's three accounts.
    pub accounts: Vec<Account>,
    /// Every member slot, bound or not.
    pub members: Vec<FamilyMember>,
}

/// Create the family table.
///
/// The UNIQUE constraint on the creator column is what enforces "at most
/// one family per creator"; the application never checks first.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_family_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS family (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                creator_user_id INTEGER NOT NULL UNIQUE,
                FOREIGN KEY(creator_user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Family].
pub fn map_family_row(row: &Row) -> Result<Family, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_creator_user_id = row.get(1)?;

    Ok(Family {
        id,
        creator_user_id: UserID::new(raw_creator_user_id),
    })
}

/// Create a family for `creator`, its three accounts with zero balances,
/// and the creator's admin member slot, as one all-or-nothing unit.
///
/// If any step fails the database transaction rolls back and no partial
/// family is visible.
///
/// # Errors
/// This function will return an:
/// - [Error::AlreadyHasFamily] if `creator` has already created a family,
/// - [Error::AlreadyInFamily] if `creator` occupies a member slot in some
///   family,
/// - [Error::NotFound] if `creator` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_family(
    creator: UserID,
    profile: CreatorProfile,
    connection: &Connection,
) -> Result<Family, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let family = insert_family(creator, &transaction)?;

    for kind in AccountKind::ALL {
        insert_account(family.id, kind, &transaction)?;
    }

    insert_member(
        NewMember {
            family_id: family.id,
            user_id: Some(creator),
            name: profile.name,
            relationship: profile.relationship,
            role: MemberRole::Admin,
            income_types: profile.income_types,
        },
        &transaction,
    )?;

    transaction.commit()?;

    tracing::info!("user {} created family {}", creator, family.id);

    Ok(family)
}

fn insert_family(creator: UserID, connection: &Connection) -> Result<Family, Error> {
    connection
        .prepare(
            "INSERT INTO family (creator_user_id) VALUES (?1)
             RETURNING id, creator_user_id",
        )?
        .query_row((creator.as_i64(),), map_family_row)
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve a family from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a family,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_family(family_id: FamilyId, connection: &Connection) -> Result<Family, Error> {
    connection
        .prepare("SELECT id, creator_user_id FROM family WHERE id = :id")?
        .query_row(&[(":id", &family_id)], map_family_row)
        .map_err(|error| error.into())
}

/// Retrieve the family created by `creator`.
///
/// # Errors
/// This function will return a:
/// - [Error::FamilyNotFound] if `creator` has not created a family,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_family_by_creator(
    creator: UserID,
    connection: &Connection,
) -> Result<Family, Error> {
    connection
        .prepare("SELECT id, creator_user_id FROM family WHERE creator_user_id = :creator")?
        .query_row(&[(":creator", &creator.as_i64())], map_family_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::FamilyNotFound,
            error => error.into(),
        })
}

/// Assemble a family with its accounts and members for the API.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `family_id` does not refer to a family,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_family_overview(
    family_id: FamilyId,
    connection: &Connection,
) -> Result<FamilyOverview, Error> {
    let family = get_family(family_id, connection)?;
    let accounts = get_accounts(family_id, connection)?;
    let members = list_members(family_id, connection)?;

    Ok(FamilyOverview {
        family,
        accounts,
        members,
    })
}
