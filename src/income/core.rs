//! Defines income ledger entries and the posting operation that credits
//! an account.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior, types::ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountKind, credit_account},
    database_id::{FamilyId, IncomeId, MemberId},
    member::get_member,
};

/// A recorded income: money a family member brought in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Income {
    /// The ID of the income.
    pub id: IncomeId,
    /// The member who brought the income in.
    pub member_id: MemberId,
    /// The amount of money, always positive.
    pub amount: f64,
    /// A free-form tag for the kind of income, e.g. "salary".
    pub income_type: String,
    /// When the income arrived.
    pub date: Date,
    /// The account the income was credited to.
    pub account_kind: AccountKind,
}

/// The data needed to post an income.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    /// The member who brought the income in.
    pub member_id: MemberId,
    /// The amount of money, must be positive.
    pub amount: f64,
    /// A free-form tag for the kind of income.
    pub income_type: String,
    /// When the income arrived.
    pub date: Date,
    /// The account to credit. The declared kind is honored; incomes are
    /// not funneled into the main account.
    pub account_kind: AccountKind,
}

/// Optional filters for listing incomes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeQuery {
    /// Only incomes on or after this date.
    pub start_date: Option<Date>,
    /// Only incomes on or before this date.
    pub end_date: Option<Date>,
    /// Only incomes brought in by this member.
    pub member_id: Option<MemberId>,
    /// Only incomes with this type tag.
    pub income_type: Option<String>,
}

/// Create the income table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_income_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS income (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                income_type TEXT NOT NULL,
                date TEXT NOT NULL,
                account_kind TEXT NOT NULL,
                FOREIGN KEY(member_id) REFERENCES family_member(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_income_date ON income(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Income].
pub fn map_income_row(row: &Row) -> Result<Income, rusqlite::Error> {
    let id = row.get(0)?;
    let member_id = row.get(1)?;
    let amount = row.get(2)?;
    let income_type = row.get(3)?;
    let date = row.get(4)?;
    let account_kind = row.get(5)?;

    Ok(Income {
        id,
        member_id,
        amount,
        income_type,
        date,
        account_kind,
    })
}

/// Record an income and credit the named account, as one transaction.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - [Error::NotFound] if `member_id` does not refer to a member,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn post_income(new_income: NewIncome, connection: &Connection) -> Result<Income, Error> {
    if new_income.amount <= 0.0 {
        return Err(Error::InvalidAmount(new_income.amount));
    }

    let member = get_member(new_income.member_id, connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let income = transaction
        .prepare(
            "INSERT INTO income (member_id, amount, income_type, date, account_kind)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, member_id, amount, income_type, date, account_kind",
        )?
        .query_row(
            (
                new_income.member_id,
                new_income.amount,
                &new_income.income_type,
                new_income.date,
                new_income.account_kind,
            ),
            map_income_row,
        )?;

    credit_account(
        member.family_id,
        new_income.account_kind,
        new_income.amount,
        &transaction,
    )?;

    transaction.commit()?;

    Ok(income)
}

/// Retrieve an income from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an income,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_income(income_id: IncomeId, connection: &Connection) -> Result<Income, Error> {
    connection
        .prepare(
            "SELECT id, member_id, amount, income_type, date, account_kind
             FROM income WHERE id = :id",
        )?
        .query_row(&[(":id", &income_id)], map_income_row)
        .map_err(|error| error.into())
}

/// Retrieve the incomes of `family_id` matching `query`, newest first.
///
/// Absent filters do not constrain the result; an unbounded query returns
/// the family's entire income history.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn list_incomes(
    family_id: FamilyId,
    query: &IncomeQuery,
    connection: &Connection,
) -> Result<Vec<Income>, Error> {
    connection
        .prepare(
            "SELECT i.id, i.member_id, i.amount, i.income_type, i.date, i.account_kind
             FROM income i
             JOIN family_member m ON i.member_id = m.id
             WHERE m.family_id = :family_id
               AND (:start_date IS NULL OR i.date >= :start_date)
               AND (:end_date IS NULL OR i.date <= :end_date)
               AND (:member_id IS NULL OR i.member_id = :member_id)
               AND (:income_type IS NULL OR i.income_type = :income_type)
             ORDER BY i.date DESC, i.id DESC",
        )?
        .query_map(
            &[
                (":family_id", &family_id as &dyn ToSql),
                (":start_date", &query.start_date as &dyn ToSql),
                (":end_date", &query.end_date as &dyn ToSql),
                (":member_id", &query.member_id as &dyn ToSql),
                (":income_type", &query.income_type as &dyn ToSql),
            ],
            map_income_row,
        )?
        .map(|maybe_income| maybe_income.map_err(|error| error.into()))
        .collect()
}

/// Delete the income `income_id`.
///
/// Deliberately does **not** reverse the account credit the posting
/// applied; balances reflect what actually happened to the money.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `income_id` does not refer to an income,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_income(income_id: IncomeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM income WHERE id = :id", &[(":id", &income_id)])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
