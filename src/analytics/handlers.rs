//! The analytics page: period navigation, the statistics grid and the charts.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    category::category_summary,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, CHIP_SELECTED_STYLE, CHIP_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, format_currency,
    },
    navigation::NavBar,
    period::{self, DateRange, Period},
    transaction::TransactionType,
};

use super::{
    charts::{
        AnalyticsChart, category_pie, charts_script, charts_view, daily_bar_chart,
        payment_method_pie,
    },
    stats::{TransactionStats, daily_summary, get_transaction_stats, payment_method_summary},
};

/// The ECharts build loaded into the analytics page head.
const ECHARTS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The query parameters for the analytics page.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// The selected period preset. Defaults to the current week.
    pub period: Option<Period>,
    /// The date anchoring a preset period. Defaults to today.
    pub anchor: Option<Date>,
    /// The first day of a custom period.
    pub start: Option<Date>,
    /// The last day of a custom period.
    pub end: Option<Date>,
}

/// The resolved period selection.
struct AnalyticsOptions {
    period: Period,
    range: DateRange,
}

/// Apply defaults and resolve the selected period against `today`.
fn normalize_query(query: AnalyticsQuery, today: Date) -> AnalyticsOptions {
    let period = query.period.unwrap_or(Period::Week);

    let range = if period == Period::Custom {
        let start = query.start.unwrap_or(today);
        let end = query.end.unwrap_or(today);

        if start <= end {
            DateRange { start, end }
        } else {
            DateRange {
                start: end,
                end: start,
            }
        }
    } else {
        let anchor = query.anchor.unwrap_or(today);

        // Only custom periods resolve to `None`, and those are handled above.
        period::preset_range(period, anchor).unwrap_or(DateRange {
            start: anchor,
            end: anchor,
        })
    };

    AnalyticsOptions { period, range }
}

/// The URL selecting `period` with `range` on the analytics page.
fn analytics_url(period: Period, range: DateRange) -> String {
    match period {
        Period::Custom => format!(
            "{}?period=custom&start={}&end={}",
            endpoints::ANALYTICS_VIEW,
            range.start,
            range.end
        ),
        preset => format!(
            "{}?period={}&anchor={}",
            endpoints::ANALYTICS_VIEW,
            preset.as_query_value(),
            range.start
        ),
    }
}

/// The state needed for the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for running the aggregate queries.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display aggregate statistics and charts for the selected period.
pub async fn get_analytics_page(
    State(state): State<AnalyticsState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Response, Error> {
    let today = period::current_local_date(&state.local_timezone)?;
    let local_offset = period::local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;

    let options = normalize_query(query, today);
    let window = period::window(options.range, local_offset);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stats = get_transaction_stats(window, &connection)
        .inspect_err(|error| tracing::error!("could not get transaction stats: {error}"))?;
    let expense_by_category = category_summary(TransactionType::Expense, window, &connection)
        .inspect_err(|error| tracing::error!("could not get expense categories: {error}"))?;
    let income_by_category = category_summary(TransactionType::Income, window, &connection)
        .inspect_err(|error| tracing::error!("could not get income categories: {error}"))?;
    let expense_by_payment = payment_method_summary(TransactionType::Expense, window, &connection)
        .inspect_err(|error| tracing::error!("could not get expense payment methods: {error}"))?;
    let income_by_payment = payment_method_summary(TransactionType::Income, window, &connection)
        .inspect_err(|error| tracing::error!("could not get income payment methods: {error}"))?;
    let days = daily_summary(window, local_offset, &connection)
        .inspect_err(|error| tracing::error!("could not get daily summary: {error}"))?;

    let charts = [
        AnalyticsChart {
            id: "expense-category-chart",
            options: category_pie("Expenses by category", &expense_by_category).to_string(),
        },
        AnalyticsChart {
            id: "income-category-chart",
            options: category_pie("Income by category", &income_by_category).to_string(),
        },
        AnalyticsChart {
            id: "expense-payment-chart",
            options: payment_method_pie("Expenses by payment method", &expense_by_payment)
                .to_string(),
        },
        AnalyticsChart {
            id: "income-payment-chart",
            options: payment_method_pie("Income by payment method", &income_by_payment)
                .to_string(),
        },
        AnalyticsChart {
            id: "daily-chart",
            options: daily_bar_chart(&days).to_string(),
        },
    ];

    Ok(analytics_view(&options, &stats, &charts, today).into_response())
}

// ============================================================================
// VIEWS
// ============================================================================

fn analytics_view(
    options: &AnalyticsOptions,
    stats: &TransactionStats,
    charts: &[AnalyticsChart],
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW).into_html();

    let previous = period::previous_range(options.period, options.range);
    let previous_url = (previous != options.range).then(|| analytics_url(options.period, previous));
    let next_url = period::is_next_enabled(options.period, options.range, today).then(|| {
        analytics_url(
            options.period,
            period::next_range(options.period, options.range),
        )
    });

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-4"
            {
                h1 class="text-xl font-bold" { "Analytics" }

                div class="flex flex-wrap gap-2"
                {
                    @for preset in Period::ALL {
                        a
                            href=(analytics_url(preset, options.range))
                            class=(if options.period == preset { CHIP_SELECTED_STYLE } else { CHIP_STYLE })
                        {
                            (preset.label())
                        }
                    }
                }

                @if options.period == Period::Custom {
                    (custom_range_form(options.range, today))
                }

                (range_navigation(options, previous_url.as_deref(), next_url.as_deref()))

                (stats_grid(stats))

                (charts_view(charts))
            }
        }
    };

    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()),
        charts_script(charts),
    ];

    base("Analytics", &head_elements, &content)
}

fn custom_range_form(range: DateRange, today: Date) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::ANALYTICS_VIEW)
            class="flex flex-wrap items-end gap-4 rounded bg-gray-50 dark:bg-gray-800 p-4"
        {
            input type="hidden" name="period" value="custom";

            div
            {
                label for="start" class=(FORM_LABEL_STYLE) { "From" }

                input
                    name="start"
                    id="start"
                    type="date"
                    max=(today)
                    value=(range.start)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end" class=(FORM_LABEL_STYLE) { "To" }

                input
                    name="end"
                    id="end"
                    type="date"
                    max=(today)
                    value=(range.end)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
        }
    }
}

/// The range label with previous/next navigation.
///
/// A link is rendered as a disabled button when stepping in that direction is
/// not allowed, so forward navigation stops at the current period.
fn range_navigation(
    options: &AnalyticsOptions,
    previous_url: Option<&str>,
    next_url: Option<&str>,
) -> Markup {
    let disabled_style = "px-3 py-1.5 text-gray-400 dark:text-gray-600 cursor-not-allowed";
    let enabled_style = "px-3 py-1.5 text-blue-600 hover:text-blue-500 \
        dark:text-blue-500 dark:hover:text-blue-400";

    html! {
        nav class="flex items-center justify-between rounded bg-gray-50 dark:bg-gray-800 px-4 py-2"
        {
            @if let Some(url) = previous_url {
                a href=(url) data-nav="previous" class=(enabled_style) { "← Previous" }
            } @else {
                span data-nav="previous" aria-disabled="true" class=(disabled_style) { "← Previous" }
            }

            h2 class="text-sm font-semibold" data-range-label="true"
            {
                (period::range_label(options.period, options.range))
            }

            @if let Some(url) = next_url {
                a href=(url) data-nav="next" class=(enabled_style) { "Next →" }
            } @else {
                span data-nav="next" aria-disabled="true" class=(disabled_style) { "Next →" }
            }
        }
    }
}

fn stats_grid(stats: &TransactionStats) -> Markup {
    let entries = [
        ("Transactions", stats.total_transactions.to_string()),
        ("Total Income", format_currency(stats.total_income)),
        ("Total Expense", format_currency(stats.total_expense)),
        ("Avg Income / Day", format_currency(stats.avg_income_per_day)),
        (
            "Avg Expense / Day",
            format_currency(stats.avg_expense_per_day),
        ),
        (
            "Avg Income / Transaction",
            format_currency(stats.avg_income_per_transaction),
        ),
        (
            "Avg Expense / Transaction",
            format_currency(stats.avg_expense_per_transaction),
        ),
        ("Largest Income", format_currency(stats.max_income)),
        ("Largest Expense", format_currency(stats.max_expense)),
    ];

    html! {
        div class="grid grid-cols-2 sm:grid-cols-3 gap-4 w-full"
        {
            @for (label, value) in entries {
                div class=(CARD_STYLE) data-stat=(label)
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { (label) }

                    p class="text-xl font-bold" { (value) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, response::Response};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::{UtcOffset, macros::date};

    use crate::{
        db::initialize,
        period::{self, Period},
        transaction::{create_transaction, test_utils::sample_transaction},
    };

    use super::{AnalyticsQuery, AnalyticsState, get_analytics_page, normalize_query};

    fn get_test_state() -> AnalyticsState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        AnalyticsState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
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
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }

    #[track_caller]
    fn stat_value(html: &Html, label: &str) -> String {
        let selector = Selector::parse(&format!("[data-stat='{label}'] p + p")).unwrap();
        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No stat card labelled {label}"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    #[tokio::test]
    async fn analytics_page_shows_stats_for_anchored_week() {
        let state = get_test_state();
        let anchor = date!(2026 - 08 - 05);
        {
            let conn = state.db_connection.lock().unwrap();
            let range = period::preset_range(Period::Week, anchor).unwrap();
            let window = period::window(range, UtcOffset::UTC);

            create_transaction(sample_transaction(-30.0, window.start + 1_000), &conn).unwrap();
            create_transaction(sample_transaction(100.0, window.start + 2_000), &conn).unwrap();
            // One millisecond past the window.
            create_transaction(sample_transaction(-500.0, window.end + 1), &conn).unwrap();
        }

        let query = AnalyticsQuery {
            period: Some(Period::Week),
            anchor: Some(anchor),
            ..Default::default()
        };

        let response = get_analytics_page(State(state), Query(query)).await.unwrap();

        let html = parse_html(response).await;
        assert_valid_html(&html);
        assert_eq!(stat_value(&html, "Transactions"), "2");
        assert_eq!(stat_value(&html, "Total Income"), "$100.00");
        assert_eq!(stat_value(&html, "Total Expense"), "$30.00");

        let label_selector = Selector::parse("[data-range-label='true']").unwrap();
        let label = html
            .select(&label_selector)
            .next()
            .expect("No range label found")
            .text()
            .collect::<String>();
        assert_eq!(label.trim(), "3 Aug - 9 Aug");
    }

    #[tokio::test]
    async fn analytics_page_disables_next_on_current_period() {
        let state = get_test_state();

        let response = get_analytics_page(State(state), Query(AnalyticsQuery::default()))
            .await
            .unwrap();

        let html = parse_html(response).await;
        let disabled_next = Selector::parse("span[data-nav='next']").unwrap();
        assert!(
            html.select(&disabled_next).next().is_some(),
            "next navigation should be disabled on the current week"
        );

        let previous_link = Selector::parse("a[data-nav='previous']").unwrap();
        assert!(
            html.select(&previous_link).next().is_some(),
            "previous navigation should stay enabled"
        );
    }

    #[tokio::test]
    async fn analytics_page_links_adjacent_periods_in_the_past() {
        let state = get_test_state();
        let query = AnalyticsQuery {
            period: Some(Period::Month),
            anchor: Some(date!(2020 - 06 - 15)),
            ..Default::default()
        };

        let response = get_analytics_page(State(state), Query(query)).await.unwrap();

        let html = parse_html(response).await;

        let next_link = Selector::parse("a[data-nav='next']").unwrap();
        let next_href = html
            .select(&next_link)
            .next()
            .expect("want an enabled next link for a past month")
            .value()
            .attr("href")
            .unwrap();
        assert_eq!(next_href, "/analytics?period=month&anchor=2020-07-01");

        let previous_link = Selector::parse("a[data-nav='previous']").unwrap();
        let previous_href = html
            .select(&previous_link)
            .next()
            .expect("want an enabled previous link")
            .value()
            .attr("href")
            .unwrap();
        assert_eq!(previous_href, "/analytics?period=month&anchor=2020-05-01");
    }

    #[tokio::test]
    async fn analytics_page_shows_custom_range_form() {
        let state = get_test_state();
        let query = AnalyticsQuery {
            period: Some(Period::Custom),
            start: Some(date!(2026 - 01 - 01)),
            end: Some(date!(2026 - 08 - 05)),
            ..Default::default()
        };

        let response = get_analytics_page(State(state), Query(query)).await.unwrap();

        let html = parse_html(response).await;

        let start_selector = Selector::parse("input[name='start']").unwrap();
        let start_input = html
            .select(&start_selector)
            .next()
            .expect("No custom start input found");
        assert_eq!(start_input.value().attr("value"), Some("2026-01-01"));

        let disabled_next = Selector::parse("span[data-nav='next']").unwrap();
        assert!(
            html.select(&disabled_next).next().is_some(),
            "custom ranges never navigate forwards"
        );
    }

    #[tokio::test]
    async fn analytics_page_renders_chart_containers_and_script() {
        let state = get_test_state();

        let response = get_analytics_page(State(state), Query(AnalyticsQuery::default()))
            .await
            .unwrap();

        let html = parse_html(response).await;

        for chart_id in [
            "expense-category-chart",
            "income-category-chart",
            "expense-payment-chart",
            "income-payment-chart",
            "daily-chart",
        ] {
            let selector = Selector::parse(&format!("#{chart_id}")).unwrap();
            assert!(
                html.select(&selector).next().is_some(),
                "Chart container '{chart_id}' not found"
            );
        }

        let script_selector = Selector::parse("script").unwrap();
        let has_init_script = html
            .select(&script_selector)
            .any(|script| script.text().collect::<String>().contains("echarts.init"));
        assert!(has_init_script, "No chart initialization script found");
    }

    #[test]
    fn normalize_query_defaults_to_current_week() {
        let today = date!(2026 - 08 - 05);

        let options = normalize_query(AnalyticsQuery::default(), today);

        assert_eq!(options.period, Period::Week);
        assert_eq!(options.range.start, date!(2026 - 08 - 03));
        assert_eq!(options.range.end, date!(2026 - 08 - 09));
    }

    #[test]
    fn normalize_query_swaps_reversed_custom_range() {
        let today = date!(2026 - 08 - 05);
        let query = AnalyticsQuery {
            period: Some(Period::Custom),
            start: Some(date!(2026 - 08 - 04)),
            end: Some(date!(2026 - 08 - 01)),
            ..Default::default()
        };

        let options = normalize_query(query, today);

        assert_eq!(options.range.start, date!(2026 - 08 - 01));
        assert_eq!(options.range.end, date!(2026 - 08 - 04));
    }
}
