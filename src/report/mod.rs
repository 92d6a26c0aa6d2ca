//! Read-only reporting over the ledger.

mod core;
mod summary_endpoint;

pub use core::{ReportQuery, ReportSummary, summarize};
pub use summary_endpoint::report_summary_endpoint;
