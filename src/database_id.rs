//! Type aliases for the integer row IDs used across the database schema.
//!
//! The aliases document which table an ID belongs to at function
//! boundaries. [crate::auth::UserID] is the one ID with a newtype because
//! it crosses the trust boundary inside auth cookies.

/// A generic integer ID from the SQLite database.
pub type DatabaseId = i64;

/// The ID of a row in the family table.
pub type FamilyId = DatabaseId;

/// The ID of a row in the account table.
pub type AccountId = DatabaseId;

/// The ID of a row in the family_member table.
pub type MemberId = DatabaseId;

/// The ID of a row in the join_request table.
pub type RequestId = DatabaseId;

/// The ID of a row in the income table.
pub type IncomeId = DatabaseId;

/// The ID of a row in the expense table.
pub type ExpenseId = DatabaseId;

/// The ID of a row in the notification table.
pub type NotificationId = DatabaseId;
