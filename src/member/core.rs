//! Defines family members: named slots within a family that may be bound
//! to a login identity.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    database_id::{FamilyId, MemberId},
};

/// The role of a member within their family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// The member can manage the family: add member slots and resolve
    /// join requests.
    Admin,
    /// A regular member.
    Member,
}

impl MemberRole {
    /// The role as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            other => Err(format!("unknown member role \"{other}\"")),
        }
    }
}

impl ToSql for MemberRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MemberRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A named slot within a family.
///
/// A slot can exist before anyone logs into it: `user_id` stays empty
/// until a join request binds a registered user to the slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyMember {
    /// The ID of the member.
    pub id: MemberId,
    /// The ID of the family the member belongs to.
    pub family_id: FamilyId,
    /// The registered user bound to this slot, if any.
    pub user_id: Option<UserID>,
    /// The member's display name.
    pub name: String,
    /// How the member is related to the family creator, e.g. "spouse".
    pub relationship: String,
    /// The member's role within the family.
    pub role: MemberRole,
    /// The kinds of income this member brings in, e.g. "salary".
    pub income_types: Vec<String>,
}

/// The data needed to insert a member slot.
#[derive(Debug, Clone)]
pub struct NewMember {
    /// The family the slot belongs to.
    pub family_id: FamilyId,
    /// The user to bind immediately, or `None` for an open slot.
    pub user_id: Option<UserID>,
    /// The member's display name.
    pub name: String,
    /// How the member is related to the family creator.
    pub relationship: String,
    /// The member's role within the family.
    pub role: MemberRole,
    /// The kinds of income this member brings in.
    pub income_types: Vec<String>,
}

/// Create the family member table, its income type child table, and the
/// index that keeps a user in at most one family.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_member_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS family_member (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                family_id INTEGER NOT NULL,
                user_id INTEGER,
                name TEXT NOT NULL,
                relationship TEXT NOT NULL,
                role TEXT NOT NULL,
                FOREIGN KEY(family_id) REFERENCES family(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // One income type per row instead of a serialized list in a column.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS member_income_type (
                member_id INTEGER NOT NULL,
                income_type TEXT NOT NULL,
                UNIQUE(member_id, income_type),
                FOREIGN KEY(member_id) REFERENCES family_member(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // A user can belong to at most one family at a time.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_family_member_user
         ON family_member(user_id) WHERE user_id IS NOT NULL",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [FamilyMember] with no income types loaded.
fn map_member_row(row: &Row) -> Result<FamilyMember, rusqlite::Error> {
    let id = row.get(0)?;
    let family_id = row.get(1)?;
    let raw_user_id: Option<i64> = row.get(2)?;
    let name = row.get(3)?;
    let relationship = row.get(4)?;
    let role = row.get(5)?;

    Ok(FamilyMember {
        id,
        family_id,
        user_id: raw_user_id.map(UserID::new),
        name,
        relationship,
        role,
        income_types: Vec::new(),
    })
}

/// Insert a member slot and its income types.
///
/// # Errors
/// This function will return an:
/// - [Error::AlreadyInFamily] if `user_id` is set and that user already
///   occupies a slot in some family,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn insert_member(
    new_member: NewMember,
    connection: &Connection,
) -> Result<FamilyMember, Error> {
    connection.execute(
        "INSERT INTO family_member (family_id, user_id, name, relationship, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_member.family_id,
            new_member.user_id.map(|id| id.as_i64()),
            &new_member.name,
            &new_member.relationship,
            new_member.role,
        ),
    )?;

    let member_id = connection.last_insert_rowid();

    for income_type in &new_member.income_types {
        connection.execute(
            "INSERT OR IGNORE INTO member_income_type (member_id, income_type) VALUES (?1, ?2)",
            (member_id, income_type),
        )?;
    }

    Ok(FamilyMember {
        id: member_id,
        family_id: new_member.family_id,
        user_id: new_member.user_id,
        name: new_member.name,
        relationship: new_member.relationship,
        role: new_member.role,
        income_types: new_member.income_types,
    })
}

fn get_income_types(member_id: MemberId, connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare(
            "SELECT income_type FROM member_income_type
             WHERE member_id = :member_id ORDER BY income_type",
        )?
        .query_map(&[(":member_id", &member_id)], |row| row.get(0))?
        .map(|maybe_income_type| maybe_income_type.map_err(|error| error.into()))
        .collect()
}

const SELECT_MEMBER: &str =
    "SELECT id, family_id, user_id, name, relationship, role FROM family_member";

/// Retrieve a member from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_member(member_id: MemberId, connection: &Connection) -> Result<FamilyMember, Error> {
    let mut member = connection
        .prepare(&format!("{SELECT_MEMBER} WHERE id = :id"))?
        .query_row(&[(":id", &member_id)], map_member_row)
        .map_err(Error::from)?;

    member.income_types = get_income_types(member.id, connection)?;

    Ok(member)
}

/// Retrieve the member slot occupied by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotAMember] if the user does not occupy a slot in any family,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_member_of_user(user_id: UserID, connection: &Connection) -> Result<FamilyMember, Error> {
    let mut member = connection
        .prepare(&format!("{SELECT_MEMBER} WHERE user_id = :user_id"))?
        .query_row(&[(":user_id", &user_id.as_i64())], map_member_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotAMember,
            error => error.into(),
        })?;

    member.income_types = get_income_types(member.id, connection)?;

    Ok(member)
}

/// Retrieve all members of `family_id`, admins first, then by insertion
/// order.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_members(
    family_id: FamilyId,
    connection: &Connection,
) -> Result<Vec<FamilyMember>, Error> {
    let members: Vec<FamilyMember> = connection
        .prepare(&format!(
            "{SELECT_MEMBER} WHERE family_id = :family_id ORDER BY role, id"
        ))?
        .query_map(&[(":family_id", &family_id)], map_member_row)?
        .map(|maybe_member| maybe_member.map_err(Error::from))
        .collect::<Result<_, _>>()?;

    members
        .into_iter()
        .map(|mut member| {
            member.income_types = get_income_types(member.id, connection)?;
            Ok(member)
        })
        .collect()
}

/// Bind the user `user_id` into the member slot `member_id`.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if `member_id` does not refer to a member,
/// - [Error::AlreadyInFamily] if the user already occupies a slot in some
///   family,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn bind_member_user(
    member_id: MemberId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE family_member SET user_id = :user_id WHERE id = :id",
        &[
            (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
            (":id", &member_id as &dyn rusqlite::ToSql),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
