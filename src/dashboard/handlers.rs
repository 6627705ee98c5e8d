//! The dashboard route handler and its views.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    account::get_total_balance,
    category::get_all_categories,
    endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TAG_BADGE_STYLE, base, format_currency},
    navigation::NavBar,
    period::{self, TimeWindow},
    transaction::{
        TransactionType, get_recent_transactions,
        models::TransactionRow,
    },
    transaction_tag::get_tags_for_transactions,
};

use super::cards::{SummaryCard, summary_cards};

/// How many of the newest transactions to show on the dashboard.
const RECENT_TRANSACTION_LIMIT: u32 = 5;

/// How many days back the income and expense cards look.
const TRAILING_DAYS: i64 = 30;

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading summaries.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the landing page: the total balance across accounts, income and
/// expense totals over the trailing 30 days, and the newest transactions.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let today = period::current_local_date(&state.local_timezone)?;
    let local_offset = period::local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let window = TimeWindow {
        start: period::start_of_day_millis(today - Duration::days(TRAILING_DAYS), local_offset),
        end: period::end_of_day_millis(today, local_offset),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let total_balance = get_total_balance(&connection)
        .inspect_err(|error| tracing::error!("could not get total balance: {error}"))?;
    let total_income = total_for_window(TransactionType::Income, window, &connection)
        .inspect_err(|error| tracing::error!("could not get income total: {error}"))?;
    let total_expense = total_for_window(TransactionType::Expense, window, &connection)
        .inspect_err(|error| tracing::error!("could not get expense total: {error}"))?;

    let transactions = get_recent_transactions(RECENT_TRANSACTION_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;
    let transaction_ids: Vec<_> = transactions.iter().map(|transaction| transaction.id).collect();
    let tags_by_transaction = get_tags_for_transactions(&transaction_ids, &connection)
        .inspect_err(|error| tracing::error!("could not get transaction tags: {error}"))?;
    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    let recent_rows =
        TransactionRow::build(transactions, &categories, tags_by_transaction, local_offset)?;

    let cards = [
        SummaryCard {
            label: "Total Balance",
            value: format_currency(total_balance),
            value_class: "text-gray-900 dark:text-white",
        },
        SummaryCard {
            label: "Income (30 days)",
            value: format_currency(total_income),
            value_class: "text-green-700 dark:text-green-300",
        },
        SummaryCard {
            label: "Expense (30 days)",
            value: format_currency(total_expense),
            value_class: "text-red-700 dark:text-red-300",
        },
    ];

    Ok(dashboard_view(&cards, &recent_rows).into_response())
}

/// The unsigned total recorded for `transaction_type` within `window`.
///
/// Returns zero when no transactions match.
fn total_for_window(
    transaction_type: TransactionType,
    window: TimeWindow,
    connection: &Connection,
) -> Result<f64, Error> {
    let total: Option<f64> = connection
        .prepare(
            "SELECT ABS(SUM(amount)) FROM \"transaction\"
             WHERE transaction_type = ?1 AND date BETWEEN ?2 AND ?3;",
        )?
        .query_row((transaction_type, window.start, window.end), |row| {
            row.get(0)
        })?;

    Ok(total.unwrap_or_default())
}

fn dashboard_view(cards: &[SummaryCard], recent_rows: &[TransactionRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-6"
            {
                (summary_cards(cards))

                section class="space-y-2"
                {
                    header class="flex justify-between items-end"
                    {
                        h2 class="text-lg font-bold" { "Recent Transactions" }

                        a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
                    }

                    @if recent_rows.is_empty() {
                        div class=(CARD_STYLE)
                        {
                            p class="text-sm text-gray-500 dark:text-gray-400"
                            {
                                "Nothing here yet. Transactions will show up here once you record some."
                            }

                            a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                            {
                                "Record your first transaction"
                            }
                        }
                    } @else {
                        ul class="rounded bg-gray-50 dark:bg-gray-800 divide-y divide-gray-200 dark:divide-gray-700"
                        {
                            @for row in recent_rows {
                                (recent_transaction_item(row))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Dashboard", &[], &content)
}

fn recent_transaction_item(row: &TransactionRow) -> Markup {
    let amount_class = match row.transaction_type {
        TransactionType::Expense => "text-red-700 dark:text-red-300",
        TransactionType::Income => "text-green-700 dark:text-green-300",
        TransactionType::Neutral => "text-gray-700 dark:text-gray-300",
    };

    html! {
        li class="flex items-center justify-between gap-4 px-4 py-3" data-recent-transaction="true"
        {
            div class="min-w-0"
            {
                p class="font-medium text-gray-900 dark:text-white truncate" { (row.title) }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (period::format_date_label(row.date)) " · " (row.payment_method.label())
                }

                div class="flex flex-wrap gap-1 mt-1"
                {
                    span
                        class="inline-flex items-center px-2.5 py-0.5 text-xs font-semibold rounded-full text-white"
                        style=(format!("background-color: {}", row.category_color))
                    {
                        (row.category_name)
                    }

                    @for tag in &row.tags {
                        span class=(TAG_BADGE_STYLE) { (tag.name) }
                    }
                }
            }

            p class=(format!("font-semibold whitespace-nowrap {amount_class}"))
            {
                (format_currency(row.amount))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, response::Response};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::OffsetDateTime;

    use crate::{
        db::initialize,
        period::TimeWindow,
        transaction::{TransactionType, create_transaction, test_utils::sample_transaction},
    };

    use super::{DashboardState, get_dashboard_page, total_for_window};

    fn get_test_state() -> DashboardState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn now_millis() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp() * 1_000
    }

    async fn parse_html(response: Response) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_card_value(html: &Html, label: &str, want_value: &str) {
        let selector = Selector::parse(&format!("[data-summary-card='{label}'] p + p")).unwrap();
        let value = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No summary card labelled {label}"))
            .text()
            .collect::<String>();
        assert_eq!(value.trim(), want_value, "card {label}");
    }

    #[tokio::test]
    async fn dashboard_shows_balance_and_trailing_totals() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            let now = now_millis();

            create_transaction(sample_transaction(-30.0, now), &conn).unwrap();
            create_transaction(sample_transaction(100.0, now - 1_000), &conn).unwrap();
            // Far outside the trailing window.
            create_transaction(sample_transaction(-500.0, 1_000), &conn).unwrap();
        }

        let response = get_dashboard_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        // The seeded account starts at zero.
        assert_card_value(&html, "Total Balance", "$0.00");
        assert_card_value(&html, "Income (30 days)", "$100.00");
        assert_card_value(&html, "Expense (30 days)", "$30.00");
    }

    #[tokio::test]
    async fn dashboard_limits_recent_transactions() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            for i in 1..=7 {
                create_transaction(sample_transaction(-1.0, i * 1_000), &conn).unwrap();
            }
        }

        let response = get_dashboard_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let row_selector = Selector::parse("[data-recent-transaction='true']").unwrap();
        assert_eq!(html.select(&row_selector).count(), 5);
    }

    #[tokio::test]
    async fn dashboard_shows_empty_state_without_transactions() {
        let state = get_test_state();

        let response = get_dashboard_page(State(state)).await.unwrap();

        let html = parse_html(response).await;
        let row_selector = Selector::parse("[data-recent-transaction='true']").unwrap();
        assert_eq!(html.select(&row_selector).count(), 0);

        let link_selector = Selector::parse(&format!(
            "a[href='{}']",
            crate::endpoints::NEW_TRANSACTION_VIEW
        ))
        .unwrap();
        assert!(
            html.select(&link_selector).next().is_some(),
            "the empty state should link to the entry form"
        );
    }

    #[test]
    fn total_for_window_ignores_other_types_and_dates() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        create_transaction(sample_transaction(-30.0, 1_000), &conn).unwrap();
        create_transaction(sample_transaction(-20.0, 2_000), &conn).unwrap();
        create_transaction(sample_transaction(100.0, 3_000), &conn).unwrap();
        create_transaction(sample_transaction(-40.0, 50_000), &conn).unwrap();

        let window = TimeWindow {
            start: 0,
            end: 10_000,
        };

        let expense = total_for_window(TransactionType::Expense, window, &conn).unwrap();
        let income = total_for_window(TransactionType::Income, window, &conn).unwrap();

        assert_eq!(expense, 50.0);
        assert_eq!(income, 100.0);
    }

    #[test]
    fn total_for_window_is_zero_without_matches() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let window = TimeWindow {
            start: 0,
            end: 10_000,
        };

        let got = total_for_window(TransactionType::Expense, window, &conn).unwrap();

        assert_eq!(got, 0.0);
    }
}
