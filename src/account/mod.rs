//! The three fixed per-family accounts and the operations that move money
//! between them.

mod core;
mod list_endpoint;
mod transfer_endpoint;

pub use core::{
    Account, AccountKind, create_account_table, get_account, get_accounts, map_account_row,
    transfer,
};
pub(crate) use core::{apply_debit_cascade, credit_account, insert_account};
pub use list_endpoint::get_accounts_endpoint;
pub use transfer_endpoint::transfer_endpoint;
