//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page summarizing balances and recent activity.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying, filtering and sorting transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The fragment route that serves additional transaction list rows.
pub const TRANSACTION_ROWS: &str = "/transactions/rows";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for period analytics (stats and charts).
pub const ANALYTICS_VIEW: &str = "/analytics";

/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/transactions/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = endpoint_path.find('{');
    let param_end = endpoint_path.find('}');

    match (param_start, param_end) {
        (Some(start), Some(end)) if start < end => {
            format!(
                "{}{}{}",
                &endpoint_path[..start],
                id,
                &endpoint_path[end + 1..]
            )
        }
        _ => endpoint_path.to_owned(),
    }
}
