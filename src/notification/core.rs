//! Defines the notification feed shown to users, e.g. "someone wants to
//! join your family".

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, auth::UserID, database_id::NotificationId};

/// A message for a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// The ID of the notification.
    pub id: NotificationId,
    /// The user the notification is addressed to.
    pub user_id: UserID,
    /// The message text.
    pub message: String,
    /// When the notification was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Whether the user has marked the notification as read.
    pub is_read: bool,
}

/// Create the notification table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_notification_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notification (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_notification_row(row: &Row) -> Result<Notification, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let message = row.get(2)?;
    let created_at = row.get(3)?;
    let is_read = row.get(4)?;

    Ok(Notification {
        id,
        user_id: UserID::new(raw_user_id),
        message,
        created_at,
        is_read,
    })
}

/// Create a notification for `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub(crate) fn create_notification(
    user_id: UserID,
    message: &str,
    connection: &Connection,
) -> Result<Notification, Error> {
    connection
        .prepare(
            "INSERT INTO notification (user_id, message, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING id, user_id, message, created_at, is_read",
        )?
        .query_row(
            (user_id.as_i64(), message, OffsetDateTime::now_utc()),
            map_notification_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the notifications addressed to `user_id`, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_notifications(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Notification>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, message, created_at, is_read FROM notification
             WHERE user_id = :user_id ORDER BY id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_notification_row)?
        .map(|maybe_notification| maybe_notification.map_err(|error| error.into()))
        .collect()
}

/// Mark the notification `notification_id` as read.
///
/// The update is scoped to `user_id` so users cannot touch each other's
/// notifications.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the notification does not exist or belongs to a
///   different user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn mark_notification_read(
    notification_id: NotificationId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE notification SET is_read = 1 WHERE id = :id AND user_id = :user_id",
        &[
            (":id", &notification_id as &dyn rusqlite::ToSql),
            (":user_id", &user_id.as_i64() as &dyn rusqlite::ToSql),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
