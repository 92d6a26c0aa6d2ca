//! Defines the three fixed per-family accounts and the operations that
//! move money between them.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, FamilyId},
};

/// The kind of an account within a family.
///
/// Every family owns exactly one account of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// The account day-to-day income and spending goes through.
    Main,
    /// Money put aside.
    Savings,
    /// Money locked up in investments.
    Investment,
}

impl AccountKind {
    /// All account kinds, in the order the debit cascade visits them.
    pub const ALL: [AccountKind; 3] = [
        AccountKind::Main,
        AccountKind::Savings,
        AccountKind::Investment,
    ];

    /// The kind as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Main => "main",
            AccountKind::Savings => "savings",
            AccountKind::Investment => "investment",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(AccountKind::Main),
            "savings" => Ok(AccountKind::Savings),
            "investment" => Ok(AccountKind::Investment),
            other => Err(format!("unknown account kind \"{other}\"")),
        }
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// One of the three money pools owned by a family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The ID of the family that owns the account.
    pub family_id: FamilyId,
    /// Which of the three fixed pools this account is.
    pub kind: AccountKind,
    /// The amount of money in the account.
    pub balance: f64,
}

/// Create the account table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                family_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                balance REAL NOT NULL,
                UNIQUE(family_id, kind),
                FOREIGN KEY(family_id) REFERENCES family(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let family_id = row.get(1)?;
    let kind = row.get(2)?;
    let balance = row.get(3)?;

    Ok(Account {
        id,
        family_id,
        kind,
        balance,
    })
}

/// Insert an account of `kind` for `family_id` with a zero balance.
///
/// Only family creation calls this; the UNIQUE(family_id, kind) constraint
/// backs up the one-account-per-kind invariant.
///
/// # Errors
/// This function will return an [Error::SqlError] if the family already
/// has an account of `kind` or if there is some other SQL error.
pub(crate) fn insert_account(
    family_id: FamilyId,
    kind: AccountKind,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "INSERT INTO account (family_id, kind, balance) VALUES (?1, ?2, 0)
             RETURNING id, family_id, kind, balance",
        )?
        .query_row((family_id, kind), map_account_row)
        .map_err(|error| error.into())
}

/// Get all accounts belonging to `family_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn get_accounts(family_id: FamilyId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, family_id, kind, balance FROM account
             WHERE family_id = :family_id ORDER BY id",
        )?
        .query_map(&[(":family_id", &family_id)], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Get the account of `kind` belonging to `family_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the family has no account of `kind`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    family_id: FamilyId,
    kind: AccountKind,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, family_id, kind, balance FROM account
             WHERE family_id = :family_id AND kind = :kind",
        )?
        .query_row(
            &[
                (":family_id", &family_id as &dyn ToSql),
                (":kind", &kind as &dyn ToSql),
            ],
            map_account_row,
        )
        .map_err(|error| error.into())
}

/// Add `amount` to the balance of the account of `kind` for `family_id`.
///
/// The credit is a single atomic UPDATE so concurrent postings cannot lose
/// each other's writes.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the family has no account of `kind`,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn credit_account(
    family_id: FamilyId,
    kind: AccountKind,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = balance + :amount
         WHERE family_id = :family_id AND kind = :kind",
        &[
            (":amount", &amount as &dyn ToSql),
            (":family_id", &family_id as &dyn ToSql),
            (":kind", &kind as &dyn ToSql),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Subtract `amount` from the family's accounts in the fixed order main,
/// savings, investment.
///
/// Main and savings are floored at zero; whatever they cannot cover
/// carries to the next account. The investment account absorbs the rest
/// and is the only account allowed to end up negative.
///
/// **Note:** The cascade is a read-modify-write across up to three rows,
/// so callers must run it inside a database transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the family is missing one of its accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn apply_debit_cascade(
    family_id: FamilyId,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let mut remaining = amount;

    for kind in [AccountKind::Main, AccountKind::Savings] {
        if remaining <= 0.0 {
            return Ok(());
        }

        let account = get_account(family_id, kind, connection)?;
        let debit = remaining.min(account.balance.max(0.0));

        if debit > 0.0 {
            credit_account(family_id, kind, -debit, connection)?;
            remaining -= debit;
        }
    }

    if remaining > 0.0 {
        credit_account(family_id, AccountKind::Investment, -remaining, connection)?;
    }

    Ok(())
}

/// Move `amount` from the account of `from` to the account of `to`.
///
/// The debit and the credit run in one transaction; either both land or
/// neither does.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `amount` is zero or negative,
/// - [Error::InsufficientFunds] if the source account holds less than
///   `amount`,
/// - [Error::NotFound] if the family is missing one of the accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn transfer(
    family_id: FamilyId,
    from: AccountKind,
    to: AccountKind,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let source = get_account(family_id, from, &transaction)?;

    if source.balance < amount {
        return Err(Error::InsufficientFunds {
            available: source.balance,
            requested: amount,
        });
    }

    credit_account(family_id, from, -amount, &transaction)?;
    credit_account(family_id, to, amount, &transaction)?;

    transaction.commit()?;

    Ok(())
}
