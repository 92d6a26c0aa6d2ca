//! Income ledger entries and their account credits.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    Income, IncomeQuery, NewIncome, create_income_table, delete_income, get_income, list_incomes,
    map_income_row, post_income,
};
pub use create_endpoint::create_income_endpoint;
pub use delete_endpoint::delete_income_endpoint;
pub use list_endpoint::list_incomes_endpoint;
