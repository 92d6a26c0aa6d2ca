//! Defines expense ledger entries, the debit cascade they trigger, and
//! planned expenses that only hit the accounts once completed.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior, types::ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountKind, apply_debit_cascade},
    database_id::{ExpenseId, FamilyId, MemberId},
    member::get_member,
};

/// A recorded expense: money a family member spent (or plans to spend).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The member who spent the money.
    pub member_id: MemberId,
    /// The amount of money, always positive.
    pub amount: f64,
    /// A free-form category tag, e.g. "groceries".
    pub category: String,
    /// When the money was (or will be) spent.
    pub date: Date,
    /// A text description of what the expense was for.
    pub description: String,
    /// Whether this is a planned expense that has not hit the accounts
    /// yet.
    pub is_planned: bool,
    /// Which account the spender expects the money to come from. A hint
    /// only; the debit cascade always starts at the main account.
    pub account_kind: AccountKind,
}

/// The data needed to post an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    /// The member who spent the money.
    pub member_id: MemberId,
    /// The amount of money, must be positive.
    pub amount: f64,
    /// A free-form category tag.
    pub category: String,
    /// When the money was (or will be) spent.
    pub date: Date,
    /// A text description of what the expense was for.
    #[serde(default)]
    pub description: String,
    /// Record without touching any balance; complete the expense later to
    /// run the debit.
    #[serde(default)]
    pub is_planned: bool,
    /// Which account the spender expects the money to come from.
    #[serde(default = "default_account_kind")]
    pub account_kind: AccountKind,
}

fn default_account_kind() -> AccountKind {
    AccountKind::Main
}

/// Optional filters for listing expenses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseQuery {
    /// Only expenses on or after this date.
    pub start_date: Option<Date>,
    /// Only expenses on or before this date.
    pub end_date: Option<Date>,
    /// Only expenses spent by this member.
    pub member_id: Option<MemberId>,
    /// Only expenses with this category tag.
    pub category: Option<String>,
    /// Only planned (true) or only actual (false) expenses.
    pub is_planned: Option<bool>,
}

/// Create the expense table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                is_planned INTEGER NOT NULL,
                account_kind TEXT NOT NULL,
                FOREIGN KEY(member_id) REFERENCES family_member(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let member_id = row.get(1)?;
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let is_planned = row.get(6)?;
    let account_kind = row.get(7)?;

    Ok(Expense {
        id,
        member_id,
        amount,
        category,
        date,
        description,
        is_planned,
        account_kind,
    })
}

const SELECT_EXPENSE: &str = "SELECT id, member_id, amount, category, date, description, \
     is_planned, account_kind FROM expense";

/// Record an expense. An immediate expense runs the debit cascade in the
/// same transaction as the insert; a planned expense touches no balance.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - [Error::NotFound] if `member_id` does not refer to a member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn post_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    if new_expense.amount <= 0.0 {
        return Err(Error::InvalidAmount(new_expense.amount));
    }

    let member = get_member(new_expense.member_id, connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let expense = transaction
        .prepare(
            "INSERT INTO expense
                 (member_id, amount, category, date, description, is_planned, account_kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, member_id, amount, category, date, description, is_planned, account_kind",
        )?
        .query_row(
            (
                new_expense.member_id,
                new_expense.amount,
                &new_expense.category,
                new_expense.date,
                &new_expense.description,
                new_expense.is_planned,
                new_expense.account_kind,
            ),
            map_expense_row,
        )?;

    if !expense.is_planned {
        apply_debit_cascade(member.family_id, expense.amount, &transaction)?;
    }

    transaction.commit()?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!("{SELECT_EXPENSE} WHERE id = :id"))?
        .query_row(&[(":id", &expense_id)], map_expense_row)
        .map_err(|error| error.into())
}

/// Turn the planned expense `expense_id` into an actual one and run the
/// debit cascade with its stored amount.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if `expense_id` does not refer to an expense,
/// - [Error::ExpenseNotPlanned] if the expense already hit the accounts,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn complete_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = get_expense(expense_id, connection)?;

    if !expense.is_planned {
        return Err(Error::ExpenseNotPlanned);
    }

    let member = get_member(expense.member_id, connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "UPDATE expense SET is_planned = 0 WHERE id = :id",
        &[(":id", &expense_id)],
    )?;
    apply_debit_cascade(member.family_id, expense.amount, &transaction)?;

    transaction.commit()?;

    get_expense(expense_id, connection)
}

/// Retrieve the expenses of `family_id` matching `query`, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_expenses(
    family_id: FamilyId,
    query: &ExpenseQuery,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.member_id, e.amount, e.category, e.date, e.description,
                    e.is_planned, e.account_kind
             FROM expense e
             JOIN family_member m ON e.member_id = m.id
             WHERE m.family_id = :family_id
               AND (:start_date IS NULL OR e.date >= :start_date)
               AND (:end_date IS NULL OR e.date <= :end_date)
               AND (:member_id IS NULL OR e.member_id = :member_id)
               AND (:category IS NULL OR e.category = :category)
               AND (:is_planned IS NULL OR e.is_planned = :is_planned)
             ORDER BY e.date DESC, e.id DESC",
        )?
        .query_map(
            &[
                (":family_id", &family_id as &dyn ToSql),
                (":start_date", &query.start_date as &dyn ToSql),
                (":end_date", &query.end_date as &dyn ToSql),
                (":member_id", &query.member_id as &dyn ToSql),
                (":category", &query.category as &dyn ToSql),
                (":is_planned", &query.is_planned as &dyn ToSql),
            ],
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Delete the expense `expense_id`.
///
/// Deliberately does **not** refund any debit the expense applied;
/// balances reflect what actually happened to the money.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `expense_id` does not refer to an expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(expense_id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM expense WHERE id = :id", &[(":id", &expense_id)])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
