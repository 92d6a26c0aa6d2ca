//! Read-only aggregation over the income and expense ledgers.

use rusqlite::{Connection, types::ToSql};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{FamilyId, MemberId},
};

/// Optional filters for the aggregate report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Only ledger entries on or after this date.
    pub start_date: Option<Date>,
    /// Only ledger entries on or before this date.
    pub end_date: Option<Date>,
    /// Only ledger entries belonging to this member.
    pub member_id: Option<MemberId>,
    /// Only expenses with this category and incomes with this type tag.
    pub category: Option<String>,
}

/// The aggregate totals over the filtered ledger.
///
/// Nothing here is persisted; the totals are recomputed from the ledger
/// tables on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// The sum of all matching incomes.
    pub total_income: f64,
    /// The sum of all matching actual expenses. Planned expenses are not
    /// counted here.
    pub total_expenses: f64,
    /// The sum of all matching planned expenses.
    pub total_planned_expenses: f64,
    /// `total_income - total_expenses`.
    pub balance: f64,
}

/// Sum the incomes and expenses of `family_id` that match `query`.
///
/// An unbounded query (no filters) aggregates the family's entire ledger
/// history; an empty result set produces all-zero totals.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL
/// error.
pub fn summarize(
    family_id: FamilyId,
    query: &ReportQuery,
    connection: &Connection,
) -> Result<ReportSummary, Error> {
    let total_income: f64 = connection
        .prepare(
            "SELECT COALESCE(SUM(i.amount), 0) FROM income i
             JOIN family_member m ON i.member_id = m.id
             WHERE m.family_id = :family_id
               AND (:start_date IS NULL OR i.date >= :start_date)
               AND (:end_date IS NULL OR i.date <= :end_date)
               AND (:member_id IS NULL OR i.member_id = :member_id)
               AND (:category IS NULL OR i.income_type = :category)",
        )?
        .query_row(
            &[
                (":family_id", &family_id as &dyn ToSql),
                (":start_date", &query.start_date as &dyn ToSql),
                (":end_date", &query.end_date as &dyn ToSql),
                (":member_id", &query.member_id as &dyn ToSql),
                (":category", &query.category as &dyn ToSql),
            ],
            |row| row.get(0),
        )?;

    let sum_expenses = |planned: bool| -> Result<f64, Error> {
        connection
            .prepare(
                "SELECT COALESCE(SUM(e.amount), 0) FROM expense e
                 JOIN family_member m ON e.member_id = m.id
                 WHERE m.family_id = :family_id
                   AND e.is_planned = :is_planned
                   AND (:start_date IS NULL OR e.date >= :start_date)
                   AND (:end_date IS NULL OR e.date <= :end_date)
                   AND (:member_id IS NULL OR e.member_id = :member_id)
                   AND (:category IS NULL OR e.category = :category)",
            )?
            .query_row(
                &[
                    (":family_id", &family_id as &dyn ToSql),
                    (":is_planned", &planned as &dyn ToSql),
                    (":start_date", &query.start_date as &dyn ToSql),
                    (":end_date", &query.end_date as &dyn ToSql),
                    (":member_id", &query.member_id as &dyn ToSql),
                    (":category", &query.category as &dyn ToSql),
                ],
                |row| row.get(0),
            )
            .map_err(|error| error.into())
    };

    let total_expenses = sum_expenses(false)?;
    let total_planned_expenses = sum_expenses(true)?;

    Ok(ReportSummary {
        total_income,
        total_expenses,
        total_planned_expenses,
        balance: total_income - total_expenses,
    })
}

#[cfg(test)]
mod report_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::AccountKind,
        auth::{Email, PasswordHash, create_user},
        db::initialize,
        expense::{NewExpense, post_expense},
        family::{CreatorProfile, create_family},
        income::{NewIncome, post_income},
        member::get_member_of_user,
    };

    use super::{ReportQuery, ReportSummary, summarize};

    fn get_test_family() -> (Connection, i64, i64) {
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
        let member = get_member_of_user(user.id, &conn).unwrap();

        (conn, family.id, member.id)
    }

    fn post_test_ledger(conn: &Connection, member_id: i64) {
        post_income(
            NewIncome {
                member_id,
                amount: 1000.0,
                income_type: "salary".to_owned(),
                date: date!(2025 - 03 - 01),
                account_kind: AccountKind::Main,
            },
            conn,
        )
        .unwrap();
        post_expense(
            NewExpense {
                member_id,
                amount: 300.0,
                category: "rent".to_owned(),
                date: date!(2025 - 03 - 02),
                description: String::new(),
                is_planned: false,
                account_kind: AccountKind::Main,
            },
            conn,
        )
        .unwrap();
        post_expense(
            NewExpense {
                member_id,
                amount: 150.0,
                category: "holiday".to_owned(),
                date: date!(2025 - 03 - 20),
                description: String::new(),
                is_planned: true,
                account_kind: AccountKind::Main,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn empty_ledger_sums_to_zero() {
        let (conn, family_id, _) = get_test_family();

        let summary = summarize(family_id, &ReportQuery::default(), &conn).unwrap();

        assert_eq!(
            summary,
            ReportSummary {
                total_income: 0.0,
                total_expenses: 0.0,
                total_planned_expenses: 0.0,
                balance: 0.0,
            }
        );
    }

    #[test]
    fn sums_income_and_expenses_excluding_planned() {
        let (conn, family_id, member_id) = get_test_family();
        post_test_ledger(&conn, member_id);

        let summary = summarize(family_id, &ReportQuery::default(), &conn).unwrap();

        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expenses, 300.0);
        assert_eq!(summary.total_planned_expenses, 150.0);
        assert_eq!(summary.balance, 700.0);
    }

    #[test]
    fn date_range_limits_the_totals() {
        let (conn, family_id, member_id) = get_test_family();
        post_test_ledger(&conn, member_id);

        let summary = summarize(
            family_id,
            &ReportQuery {
                start_date: Some(date!(2025 - 03 - 02)),
                end_date: Some(date!(2025 - 03 - 10)),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_expenses, 300.0);
        assert_eq!(summary.total_planned_expenses, 0.0);
        assert_eq!(summary.balance, -300.0);
    }

    #[test]
    fn category_filter_limits_the_totals() {
        let (conn, family_id, member_id) = get_test_family();
        post_test_ledger(&conn, member_id);

        let summary = summarize(
            family_id,
            &ReportQuery {
                category: Some("rent".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_expenses, 300.0);
    }

    #[test]
    fn repeated_aggregation_is_idempotent() {
        let (conn, family_id, member_id) = get_test_family();
        post_test_ledger(&conn, member_id);
        let query = ReportQuery::default();

        let first = summarize(family_id, &query, &conn).unwrap();
        let second = summarize(family_id, &query, &conn).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn other_families_do_not_leak_into_the_report() {
        let (conn, family_id, member_id) = get_test_family();
        post_test_ledger(&conn, member_id);

        let other_creator = create_user(
            Email::new_unchecked("other@bar.baz"),
            PasswordHash::new_unchecked("hunter2"),
            &conn,
        )
        .unwrap();
        let other_family = create_family(
            other_creator.id,
            CreatorProfile {
                name: "Robin".to_owned(),
                relationship: "self".to_owned(),
                income_types: vec![],
            },
            &conn,
        )
        .unwrap();

        let summary = summarize(other_family.id, &ReportQuery::default(), &conn).unwrap();

        assert_eq!(summary.total_income, 0.0);
        assert_ne!(family_id, other_family.id);
    }
}
