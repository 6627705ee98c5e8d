//! The dynamically composed filter/sort query behind the transactions page.

use rusqlite::{Connection, ToSql, params_from_iter};
use serde::Deserialize;

use crate::{
    Error,
    database_id::CategoryId,
    pagination::PageQuery,
    period::TimeWindow,
    tag::TagId,
};

use super::core::{PaymentMethod, Transaction, TransactionType, map_transaction_row};

/// The selected filters for the transaction list.
///
/// Each dimension is skipped entirely when its selection is empty: an empty
/// set means "no filter", never "match nothing".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Substring to match against transaction titles.
    pub search: Option<String>,
    /// Inclusive epoch millisecond bounds on the transaction date.
    pub window: Option<TimeWindow>,
    /// Restrict to these categories.
    pub category_ids: Vec<CategoryId>,
    /// Restrict to these transaction types.
    pub transaction_types: Vec<TransactionType>,
    /// Restrict to these payment methods.
    pub payment_methods: Vec<PaymentMethod>,
    /// Restrict to transactions carrying any of these tags.
    pub tag_ids: Vec<TagId>,
}

/// The field to sort transactions by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    /// Sort by transaction date.
    #[default]
    Date,
    /// Sort by signed amount.
    Amount,
}

impl SortField {
    /// The value used for this field in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
        }
    }

    /// The label shown in the sort controls.
    pub fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Amount => "Amount",
        }
    }
}

/// The direction to sort transactions in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    #[default]
    Descending,
}

impl SortDirection {
    /// The value used for this direction in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    /// The label shown in the sort controls.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }
}

/// Get one page of transactions matching `filter`, sorted by `sort_field` in
/// `sort_direction`.
///
/// The result includes one look-ahead row past the page size (see
/// [PageQuery::limit_with_lookahead]) so the caller can tell whether another
/// page follows.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_filtered_transactions(
    filter: &TransactionFilter,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: PageQuery,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_sql, mut params) = build_filter_sql(filter);

    // The secondary sort on ID keeps the order stable between page loads.
    let order_clause = match (sort_field, sort_direction) {
        (SortField::Date, SortDirection::Ascending) => "ORDER BY t.date ASC, t.id ASC",
        (SortField::Date, SortDirection::Descending) => "ORDER BY t.date DESC, t.id DESC",
        (SortField::Amount, SortDirection::Ascending) => "ORDER BY t.amount ASC, t.id ASC",
        (SortField::Amount, SortDirection::Descending) => "ORDER BY t.amount DESC, t.id DESC",
    };

    params.push(Box::new(page.limit_with_lookahead() as i64));
    let limit_index = params.len();
    params.push(Box::new(page.offset() as i64));
    let offset_index = params.len();

    let query = format!(
        "SELECT DISTINCT t.id, t.title, t.category_id, t.account_id, t.date, t.transaction_type, t.payment_method, t.amount \
         FROM \"transaction\" t \
         {}{}{} LIMIT ?{limit_index} OFFSET ?{offset_index}",
        tag_join_sql(filter),
        where_sql,
        order_clause,
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions matching `filter`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_filtered_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_sql, params) = build_filter_sql(filter);

    let query = format!(
        "SELECT COUNT(DISTINCT t.id) FROM \"transaction\" t {}{}",
        tag_join_sql(filter),
        where_sql,
    );

    let count: i64 = connection
        .prepare(&query)?
        .query_row(params_from_iter(params), |row| row.get(0))?;

    Ok(count as u64)
}

/// The tag junction join, included only when the tag filter is active.
fn tag_join_sql(filter: &TransactionFilter) -> &'static str {
    if filter.tag_ids.is_empty() {
        ""
    } else {
        "LEFT JOIN transaction_tag tt ON tt.transaction_id = t.id "
    }
}

fn build_filter_sql(filter: &TransactionFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(search) = &filter.search {
        params.push(Box::new(format!("%{search}%")));
        clauses.push(format!("t.title LIKE ?{}", params.len()));
    }

    if let Some(window) = filter.window {
        params.push(Box::new(window.start));
        let start_index = params.len();
        params.push(Box::new(window.end));
        clauses.push(format!(
            "t.date BETWEEN ?{start_index} AND ?{}",
            params.len()
        ));
    }

    push_in_clause(&mut clauses, &mut params, "t.category_id", &filter.category_ids);
    push_in_clause(
        &mut clauses,
        &mut params,
        "t.transaction_type",
        &filter.transaction_types,
    );
    push_in_clause(
        &mut clauses,
        &mut params,
        "t.payment_method",
        &filter.payment_methods,
    );
    push_in_clause(&mut clauses, &mut params, "tt.tag_id", &filter.tag_ids);

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!("WHERE {} ", clauses.join(" AND ")), params)
    }
}

/// Append an `IN` clause restricting `column` to `values`.
///
/// An empty selection applies no filter on the dimension, so nothing is
/// appended.
fn push_in_clause<T>(
    clauses: &mut Vec<String>,
    params: &mut Vec<Box<dyn ToSql>>,
    column: &str,
    values: &[T],
) where
    T: ToSql + Clone + 'static,
{
    if values.is_empty() {
        return;
    }

    let placeholders: Vec<String> = values
        .iter()
        .map(|value| {
            params.push(Box::new(value.clone()));
            format!("?{}", params.len())
        })
        .collect();

    clauses.push(format!("{column} IN ({})", placeholders.join(", ")));
}
