//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/incomes/{income_id}',
//! use [format_endpoint].

/// The liveness probe route.
pub const HEALTH: &str = "/api/health";
/// The route for registering a user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for creating a family.
pub const FAMILIES: &str = "/api/families";
/// The route for fetching the logged-in user's family.
pub const MY_FAMILY: &str = "/api/families/mine";
/// The route for listing the family's accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route for transferring money between two accounts.
pub const TRANSFER: &str = "/api/accounts/transfer";
/// The route for creating and listing family members.
pub const MEMBERS: &str = "/api/members";
/// The route for creating and listing join requests.
pub const JOIN_REQUESTS: &str = "/api/join_requests";
/// The route for accepting a join request.
pub const ACCEPT_JOIN_REQUEST: &str = "/api/join_requests/{request_id}/accept";
/// The route for rejecting a join request.
pub const REJECT_JOIN_REQUEST: &str = "/api/join_requests/{request_id}/reject";
/// The route for posting and listing incomes.
pub const INCOMES: &str = "/api/incomes";
/// The route for deleting a single income.
pub const INCOME: &str = "/api/incomes/{income_id}";
/// The route for posting and listing expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route for deleting a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route for completing a planned expense.
pub const COMPLETE_EXPENSE: &str = "/api/expenses/{expense_id}/complete";
/// The route for the aggregate ledger report.
pub const REPORT_SUMMARY: &str = "/api/reports/summary";
/// The route for listing the logged-in user's notifications.
pub const NOTIFICATIONS: &str = "/api/notifications";
/// The route for marking a notification as read.
pub const READ_NOTIFICATION: &str = "/api/notifications/{notification_id}/read";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/incomes/{income_id}',
/// '{income_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII
/// characters and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
