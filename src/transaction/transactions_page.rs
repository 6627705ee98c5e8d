//! Defines the route handlers for the transactions page: the filter and sort
//! panel, the results list and the incrementally loaded row fragments.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use axum_htmx::HxRequest;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, UtcOffset};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    database_id::CategoryId,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CHIP_SELECTED_STYLE, CHIP_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TAG_BADGE_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    pagination::{Page, PageQuery, PaginationConfig},
    period::{self, DateRange, Period},
    tag::{Tag, TagId, get_all_tags},
    transaction_tag::get_tags_for_transactions,
};

use super::{
    core::{PaymentMethod, TransactionType},
    models::TransactionRow,
    query::{
        SortDirection, SortField, TransactionFilter, count_filtered_transactions,
        get_filtered_transactions,
    },
};

/// The max number of graphemes to display for a transaction title before
/// truncating and displaying an ellipsis.
const MAX_TITLE_GRAPHEMES: usize = 32;

/// The raw query parameters for the transactions page.
///
/// Checkbox groups arrive as repeated parameters, e.g.
/// `?category_id=1&category_id=3`, and deselecting every checkbox simply
/// omits the parameter.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    /// Substring to match against transaction titles.
    pub search: Option<String>,
    /// The selected period preset, or `None` for all time.
    pub period: Option<Period>,
    /// The first day of a custom period.
    pub start: Option<Date>,
    /// The last day of a custom period.
    pub end: Option<Date>,
    /// The selected category IDs.
    #[serde(default)]
    pub category_id: Vec<CategoryId>,
    /// The selected transaction types.
    #[serde(default)]
    pub type_: Vec<TransactionType>,
    /// The selected payment methods.
    #[serde(default)]
    pub payment_method: Vec<PaymentMethod>,
    /// The selected tag IDs.
    #[serde(default)]
    pub tag_id: Vec<TagId>,
    /// The field to sort by.
    pub sort: Option<SortField>,
    /// The direction to sort in.
    pub direction: Option<SortDirection>,
    /// The 1-indexed page to fetch.
    pub page: Option<u64>,
}

/// Validated filter, sort and paging selections after applying defaults.
struct ListOptions {
    search: Option<String>,
    period: Option<Period>,
    /// The resolved date range for the active period, `None` for all time.
    range: Option<DateRange>,
    category_ids: Vec<CategoryId>,
    transaction_types: Vec<TransactionType>,
    payment_methods: Vec<PaymentMethod>,
    tag_ids: Vec<TagId>,
    sort: SortField,
    direction: SortDirection,
    page: PageQuery,
}

impl ListOptions {
    /// The query pairs encoding these selections, with the page number
    /// replaced by `page`.
    fn query_pairs(&self, page: u64) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }

        if let Some(selected_period) = self.period {
            pairs.push(("period", selected_period.as_query_value().to_owned()));

            if selected_period == Period::Custom {
                if let Some(range) = self.range {
                    pairs.push(("start", range.start.to_string()));
                    pairs.push(("end", range.end.to_string()));
                }
            }
        }

        for category_id in &self.category_ids {
            pairs.push(("category_id", category_id.to_string()));
        }

        for transaction_type in &self.transaction_types {
            pairs.push(("type_", transaction_type.as_query_value().to_owned()));
        }

        for payment_method in &self.payment_methods {
            pairs.push(("payment_method", payment_method.as_query_value().to_owned()));
        }

        for tag_id in &self.tag_ids {
            pairs.push(("tag_id", tag_id.to_string()));
        }

        pairs.push(("sort", self.sort.as_query_value().to_owned()));
        pairs.push(("direction", self.direction.as_query_value().to_owned()));
        pairs.push(("page", page.to_string()));

        pairs
    }

    /// The URL that fetches row fragments for `page`.
    fn rows_url(&self, page: u64) -> String {
        match serde_urlencoded::to_string(self.query_pairs(page)) {
            Ok(query) => format!("{}?{query}", endpoints::TRANSACTION_ROWS),
            Err(error) => {
                tracing::error!("Could not encode transaction rows URL: {error}");
                endpoints::TRANSACTION_ROWS.to_owned()
            }
        }
    }

    /// Build the store filter for these selections.
    fn to_filter(&self, local_offset: UtcOffset) -> TransactionFilter {
        TransactionFilter {
            search: self.search.clone(),
            window: self.range.map(|range| period::window(range, local_offset)),
            category_ids: self.category_ids.clone(),
            transaction_types: self.transaction_types.clone(),
            payment_methods: self.payment_methods.clone(),
            tag_ids: self.tag_ids.clone(),
        }
    }
}

/// Apply defaults and resolve the selected period against `today`.
fn normalize_query(
    query: TransactionListQuery,
    today: Date,
    pagination_config: &PaginationConfig,
) -> ListOptions {
    let search = query
        .search
        .map(|search| search.trim().to_owned())
        .filter(|search| !search.is_empty());

    let range = match query.period {
        None => None,
        Some(Period::Custom) => {
            let start = query.start.unwrap_or(today);
            let end = query.end.unwrap_or(today);

            // A reversed custom range is treated as its mirror image rather
            // than matching nothing.
            Some(if start <= end {
                DateRange { start, end }
            } else {
                DateRange {
                    start: end,
                    end: start,
                }
            })
        }
        Some(preset) => period::preset_range(preset, today),
    };

    ListOptions {
        search,
        period: query.period,
        range,
        category_ids: query.category_id,
        transaction_types: query.type_,
        payment_methods: query.payment_method,
        tag_ids: query.tag_id,
        sort: query.sort.unwrap_or_default(),
        direction: query.direction.unwrap_or_default(),
        page: PageQuery::new(query.page, None, pagination_config),
    }
}

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    /// The database connection for querying transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The config that controls how many rows to load per page.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// One page of display rows plus the matching row count.
struct ListResults {
    total_count: u64,
    page: Page<TransactionRow>,
}

/// Render the filterable, sortable transaction list.
///
/// Requests made by the filter panel via htmx receive only the results
/// fragment; everything else receives the whole page.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<TransactionListQuery>,
) -> Result<Response, Error> {
    let today = period::current_local_date(&state.local_timezone)?;
    let local_offset = period::local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let options = normalize_query(query, today, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let available_tags = get_all_tags(&connection)
        .inspect_err(|error| tracing::error!("could not get tags: {error}"))?;
    let results = fetch_results(&options, local_offset, &categories, &connection)?;

    if is_htmx {
        return Ok(results_fragment(&results, &options).into_response());
    }

    Ok(
        transactions_page_view(&options, &results, &categories, &available_tags, today)
            .into_response(),
    )
}

/// Serve additional transaction list rows for the "load more" control.
pub async fn get_transaction_rows(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Response, Error> {
    let today = period::current_local_date(&state.local_timezone)?;
    let local_offset = period::local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let options = normalize_query(query, today, &state.pagination_config);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let results = fetch_results(&options, local_offset, &categories, &connection)?;

    Ok(rows_markup(&results.page, &options).into_response())
}

fn fetch_results(
    options: &ListOptions,
    local_offset: UtcOffset,
    categories: &[Category],
    connection: &Connection,
) -> Result<ListResults, Error> {
    let filter = options.to_filter(local_offset);

    let total_count = count_filtered_transactions(&filter, connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let transactions = get_filtered_transactions(
        &filter,
        options.sort,
        options.direction,
        options.page,
        connection,
    )
    .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let transaction_ids: Vec<_> = transactions.iter().map(|transaction| transaction.id).collect();
    let tags_by_transaction = get_tags_for_transactions(&transaction_ids, connection)
        .inspect_err(|error| tracing::error!("could not get transaction tags: {error}"))?;

    let rows = TransactionRow::build(
        transactions,
        categories,
        tags_by_transaction,
        local_offset,
    )?;

    Ok(ListResults {
        total_count,
        page: Page::from_rows(rows, options.page),
    })
}

// ============================================================================
// VIEWS
// ============================================================================

fn transactions_page_view(
    options: &ListOptions,
    results: &ListResults,
    categories: &[Category],
    available_tags: &[Tag],
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "New Transaction"
                    }
                }

                (filter_panel(options, categories, available_tags, today))

                section id="transaction-results" class="rounded bg-gray-50 dark:bg-gray-800 overflow-hidden"
                {
                    (results_fragment(results, options))
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

/// The filter and sort form.
///
/// Changing any control swaps the results fragment in place via htmx; the
/// updated query string is pushed so the filtered view can be reloaded or
/// shared.
fn filter_panel(
    options: &ListOptions,
    categories: &[Category],
    available_tags: &[Tag],
    today: Date,
) -> Markup {
    let custom_range = match (options.period, options.range) {
        (Some(Period::Custom), Some(range)) => range,
        _ => DateRange {
            start: today,
            end: today,
        },
    };

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            hx-get=(endpoints::TRANSACTIONS_VIEW)
            hx-target="#transaction-results"
            hx-swap="innerHTML"
            hx-trigger="change, submit"
            hx-push-url="true"
            class="rounded bg-gray-50 dark:bg-gray-800 p-4 space-y-4"
        {
            div
            {
                label for="search" class=(FORM_LABEL_STYLE) { "Search" }

                input
                    name="search"
                    id="search"
                    type="text"
                    placeholder="Search titles"
                    value=[options.search.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Period" }

                div class="flex flex-wrap gap-2"
                {
                    (period_chip("All time", "", options.period.is_none()))

                    @for preset in Period::ALL {
                        (period_chip(
                            preset.label(),
                            preset.as_query_value(),
                            options.period == Some(preset),
                        ))
                    }
                }

                div class="flex flex-wrap gap-4 mt-3"
                {
                    div
                    {
                        label for="start" class=(FORM_LABEL_STYLE) { "From" }

                        input
                            name="start"
                            id="start"
                            type="date"
                            max=(today)
                            value=(custom_range.start)
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
                            value=(custom_range.end)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Categories" }

                div class="flex flex-wrap gap-2"
                {
                    @for category in categories {
                        (checkbox_chip(
                            "category_id",
                            &category.id.to_string(),
                            &category.name,
                            options.category_ids.contains(&category.id),
                        ))
                    }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction types" }

                div class="flex flex-wrap gap-2"
                {
                    @for transaction_type in TransactionType::ALL {
                        (checkbox_chip(
                            "type_",
                            transaction_type.as_query_value(),
                            transaction_type.label(),
                            options.transaction_types.contains(&transaction_type),
                        ))
                    }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Payment methods" }

                div class="flex flex-wrap gap-2"
                {
                    @for payment_method in PaymentMethod::ALL {
                        (checkbox_chip(
                            "payment_method",
                            payment_method.as_query_value(),
                            payment_method.label(),
                            options.payment_methods.contains(&payment_method),
                        ))
                    }
                }
            }

            @if !available_tags.is_empty() {
                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Tags" }

                    div class="flex flex-wrap gap-2"
                    {
                        @for tag in available_tags {
                            (checkbox_chip(
                                "tag_id",
                                &tag.id.to_string(),
                                tag.name.as_ref(),
                                options.tag_ids.contains(&tag.id),
                            ))
                        }
                    }
                }
            }

            div class="flex flex-wrap items-end gap-4"
            {
                div
                {
                    label for="sort" class=(FORM_LABEL_STYLE) { "Sort by" }

                    select name="sort" id="sort" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for sort_field in [SortField::Date, SortField::Amount] {
                            option
                                value=(sort_field.as_query_value())
                                selected[options.sort == sort_field]
                            {
                                (sort_field.label())
                            }
                        }
                    }
                }

                div
                {
                    label for="direction" class=(FORM_LABEL_STYLE) { "Direction" }

                    select name="direction" id="direction" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for sort_direction in [SortDirection::Descending, SortDirection::Ascending] {
                            option
                                value=(sort_direction.as_query_value())
                                selected[options.direction == sort_direction]
                            {
                                (sort_direction.label())
                            }
                        }
                    }
                }

                div class="ml-auto w-full sm:w-auto"
                {
                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
                }
            }
        }
    }
}

fn period_chip(label: &str, value: &str, is_selected: bool) -> Markup {
    let chip_style = if is_selected {
        CHIP_SELECTED_STYLE
    } else {
        CHIP_STYLE
    };

    html! {
        label class=(chip_style)
        {
            input
                type="radio"
                name="period"
                value=(value)
                checked[is_selected]
                class="sr-only";

            (label)
        }
    }
}

fn checkbox_chip(name: &str, value: &str, label: &str, is_selected: bool) -> Markup {
    let chip_style = if is_selected {
        CHIP_SELECTED_STYLE
    } else {
        CHIP_STYLE
    };

    html! {
        label class=(chip_style)
        {
            input
                type="checkbox"
                name=(name)
                value=(value)
                checked[is_selected]
                class="sr-only";

            (label)
        }
    }
}

/// The results count and list, swapped as one fragment on filter changes.
fn results_fragment(results: &ListResults, options: &ListOptions) -> Markup {
    let count_label = match results.total_count {
        1 => "1 transaction".to_owned(),
        count => format!("{count} transactions"),
    };

    html! {
        header class="flex justify-between items-center px-6 py-3"
        {
            h2 class="text-sm font-semibold" data-results-count="true" { (count_label) }
        }

        @if results.page.items.is_empty() {
            p class="px-6 pb-6 text-sm text-gray-500 dark:text-gray-400" data-empty-state="true"
            {
                "No transactions match the current filters."
            }
        } @else {
            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Tags" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }

                    tbody
                    {
                        (rows_markup(&results.page, options))
                    }
                }
            }
        }
    }
}

/// The row fragments for one page, ending in a "load more" row while further
/// pages exist.
fn rows_markup(page: &Page<TransactionRow>, options: &ListOptions) -> Markup {
    html! {
        @for row in &page.items {
            (transaction_row_view(row))
        }

        @if page.has_more {
            (load_more_row(&options.rows_url(page.number + 1)))
        }
    }
}

fn transaction_row_view(row: &TransactionRow) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { (period::format_date_label(row.date)) }

            td class=(TABLE_CELL_STYLE) { (truncate_title(&row.title)) }

            td class=(TABLE_CELL_STYLE)
            {
                span
                    class="inline-flex items-center px-2.5 py-0.5 text-xs font-semibold rounded-full text-white"
                    style=(format!("background-color: {}", row.category_color))
                {
                    (row.category_name)
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if row.tags.is_empty() {
                    span class="text-gray-400" { "-" }
                } @else {
                    div class="flex flex-wrap gap-1"
                    {
                        @for tag in &row.tags {
                            span class=(TAG_BADGE_STYLE) { (tag.name) }
                        }
                    }
                }
            }

            td class=(TABLE_CELL_STYLE) { (row.payment_method.label()) }

            td class=(format!("{TABLE_CELL_STYLE} text-right font-medium {}", amount_class(row)))
            {
                (format_currency(row.amount))
            }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    type="button"
                    hx-delete=(row.delete_url)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-confirm=(format!("Delete \"{}\"?", row.title))
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn load_more_row(rows_url: &str) -> Markup {
    html! {
        tr
        {
            td colspan="7" class="px-6 py-3 text-center"
            {
                button
                    type="button"
                    data-load-more="true"
                    hx-get=(rows_url)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    class=(LINK_STYLE)
                {
                    "Load more"
                }
            }
        }
    }
}

fn amount_class(row: &TransactionRow) -> &'static str {
    match row.transaction_type {
        TransactionType::Expense => "text-red-700 dark:text-red-300",
        TransactionType::Income => "text-green-700 dark:text-green-300",
        TransactionType::Neutral => "text-gray-700 dark:text-gray-300",
    }
}

fn truncate_title(title: &str) -> String {
    let graphemes: Vec<&str> = title.graphemes(true).collect();

    if graphemes.len() <= MAX_TITLE_GRAPHEMES {
        title.to_owned()
    } else {
        format!("{}…", graphemes[..MAX_TITLE_GRAPHEMES].concat())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, response::Response};
    use axum_extra::extract::Query;
    use axum_htmx::HxRequest;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        db::initialize,
        pagination::PaginationConfig,
        period::Period,
        transaction::{create_transaction, test_utils::sample_transaction},
    };

    use super::{
        TransactionListQuery, TransactionsViewState, get_transaction_rows, get_transactions_page,
        normalize_query, truncate_title,
    };

    fn get_test_state() -> TransactionsViewState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionsViewState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            pagination_config: PaginationConfig::default(),
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

    /// Row fragments are bare `tr` elements, which an HTML parser discards
    /// outside a table, so wrap them before parsing.
    async fn parse_rows_fragment(response: Response) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&format!("<table><tbody>{text}</tbody></table>"))
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
    fn count_transaction_rows(html: &Html) -> usize {
        let row_selector = Selector::parse("tr[data-transaction-row='true']").unwrap();
        html.select(&row_selector).count()
    }

    #[tokio::test]
    async fn transactions_page_lists_transactions_with_filter_panel() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            for i in 1..=3 {
                create_transaction(sample_transaction(-(i as f64), i * 1_000), &conn).unwrap();
            }
        }

        let response = get_transactions_page(
            State(state),
            HxRequest(false),
            Query(TransactionListQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html(response).await;
        assert_valid_html(&html);
        assert_eq!(count_transaction_rows(&html), 3);

        let count_selector = Selector::parse("[data-results-count='true']").unwrap();
        let count_text = html
            .select(&count_selector)
            .next()
            .expect("No results count found")
            .text()
            .collect::<String>();
        assert_eq!(count_text.trim(), "3 transactions");

        let form_selector = Selector::parse("form[hx-get='/transactions']").unwrap();
        let form = html
            .select(&form_selector)
            .next()
            .expect("No filter form found");

        let checkbox_selector = Selector::parse("input[type='checkbox'][name='type_']").unwrap();
        assert_eq!(
            form.select(&checkbox_selector).count(),
            3,
            "want one checkbox per transaction type"
        );
    }

    #[tokio::test]
    async fn transactions_page_returns_fragment_for_htmx_requests() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            create_transaction(sample_transaction(-1.0, 1_000), &conn).unwrap();
        }

        let response = get_transactions_page(
            State(state),
            HxRequest(true),
            Query(TransactionListQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html(response).await;
        let nav_selector = Selector::parse("nav").unwrap();
        assert!(
            html.select(&nav_selector).next().is_none(),
            "fragment responses should not include the navigation bar"
        );
        assert_eq!(count_transaction_rows(&html), 1);
    }

    #[tokio::test]
    async fn transactions_page_shows_empty_state() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(state),
            HxRequest(false),
            Query(TransactionListQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html(response).await;
        let empty_selector = Selector::parse("[data-empty-state='true']").unwrap();
        assert!(
            html.select(&empty_selector).next().is_some(),
            "want an empty state message without transactions"
        );
    }

    #[tokio::test]
    async fn transactions_page_applies_type_filter() {
        let state = get_test_state();
        {
            let conn = state.db_connection.lock().unwrap();
            create_transaction(sample_transaction(-10.0, 1_000), &conn).unwrap();
            create_transaction(sample_transaction(100.0, 2_000), &conn).unwrap();
        }

        let query = TransactionListQuery {
            type_: vec![crate::transaction::TransactionType::Income],
            ..Default::default()
        };

        let response = get_transactions_page(State(state), HxRequest(false), Query(query))
            .await
            .unwrap();

        let html = parse_html(response).await;
        assert_eq!(count_transaction_rows(&html), 1);
    }

    #[tokio::test]
    async fn transactions_page_offers_load_more_when_pages_remain() {
        let state = TransactionsViewState {
            pagination_config: PaginationConfig {
                default_page_size: 2,
                max_page_size: 10,
            },
            ..get_test_state()
        };
        {
            let conn = state.db_connection.lock().unwrap();
            for i in 1..=5 {
                create_transaction(sample_transaction(-1.0, i * 1_000), &conn).unwrap();
            }
        }

        let response = get_transactions_page(
            State(state),
            HxRequest(false),
            Query(TransactionListQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html(response).await;
        assert_eq!(count_transaction_rows(&html), 2);

        let load_more_selector = Selector::parse("button[data-load-more='true']").unwrap();
        let load_more = html
            .select(&load_more_selector)
            .next()
            .expect("No load more button found");
        let rows_url = load_more
            .value()
            .attr("hx-get")
            .expect("Load more button missing hx-get");
        assert!(
            rows_url.starts_with("/transactions/rows?"),
            "want rows URL, got {rows_url}"
        );
        assert!(
            rows_url.contains("page=2"),
            "want rows URL for page 2, got {rows_url}"
        );
    }

    #[tokio::test]
    async fn transaction_rows_returns_final_page_without_load_more() {
        let state = TransactionsViewState {
            pagination_config: PaginationConfig {
                default_page_size: 2,
                max_page_size: 10,
            },
            ..get_test_state()
        };
        {
            let conn = state.db_connection.lock().unwrap();
            for i in 1..=5 {
                create_transaction(sample_transaction(-1.0, i * 1_000), &conn).unwrap();
            }
        }

        let query = TransactionListQuery {
            page: Some(3),
            ..Default::default()
        };

        let response = get_transaction_rows(State(state), Query(query))
            .await
            .unwrap();

        let html = parse_rows_fragment(response).await;
        assert_eq!(count_transaction_rows(&html), 1);

        let load_more_selector = Selector::parse("button[data-load-more='true']").unwrap();
        assert!(
            html.select(&load_more_selector).next().is_none(),
            "the final page should not offer to load more"
        );
    }

    #[test]
    fn normalize_query_applies_defaults() {
        let today = date!(2026 - 08 - 05);

        let options = normalize_query(
            TransactionListQuery::default(),
            today,
            &PaginationConfig::default(),
        );

        assert_eq!(options.search, None);
        assert_eq!(options.range, None);
        assert_eq!(options.sort, super::SortField::Date);
        assert_eq!(options.direction, super::SortDirection::Descending);
        assert_eq!(options.page.page, 1);
    }

    #[test]
    fn normalize_query_resolves_week_preset() {
        let today = date!(2026 - 08 - 05);
        let query = TransactionListQuery {
            period: Some(Period::Week),
            ..Default::default()
        };

        let options = normalize_query(query, today, &PaginationConfig::default());

        let range = options.range.expect("week preset should resolve a range");
        assert_eq!(range.start, date!(2026 - 08 - 03));
        assert_eq!(range.end, date!(2026 - 08 - 09));
    }

    #[test]
    fn normalize_query_swaps_reversed_custom_range() {
        let today = date!(2026 - 08 - 05);
        let query = TransactionListQuery {
            period: Some(Period::Custom),
            start: Some(date!(2026 - 08 - 04)),
            end: Some(date!(2026 - 08 - 01)),
            ..Default::default()
        };

        let options = normalize_query(query, today, &PaginationConfig::default());

        let range = options.range.unwrap();
        assert_eq!(range.start, date!(2026 - 08 - 01));
        assert_eq!(range.end, date!(2026 - 08 - 04));
    }

    #[test]
    fn normalize_query_drops_blank_search() {
        let today = date!(2026 - 08 - 05);
        let query = TransactionListQuery {
            search: Some("   ".to_owned()),
            ..Default::default()
        };

        let options = normalize_query(query, today, &PaginationConfig::default());

        assert_eq!(options.search, None);
    }

    #[test]
    fn rows_url_round_trips_selections() {
        let today = date!(2026 - 08 - 05);
        let query = TransactionListQuery {
            search: Some("coffee".to_owned()),
            period: Some(Period::Month),
            category_id: vec![1, 3],
            ..Default::default()
        };

        let options = normalize_query(query, today, &PaginationConfig::default());
        let url = options.rows_url(2);

        assert!(url.contains("search=coffee"), "got {url}");
        assert!(url.contains("period=month"), "got {url}");
        assert!(url.contains("category_id=1"), "got {url}");
        assert!(url.contains("category_id=3"), "got {url}");
        assert!(url.contains("page=2"), "got {url}");
    }

    #[test]
    fn list_query_parses_repeated_checkbox_params() {
        let query: TransactionListQuery =
            serde_html_form::from_str("category_id=1&category_id=3&type_=income&period=week&page=2")
                .unwrap();

        assert_eq!(query.category_id, vec![1, 3]);
        assert_eq!(
            query.type_,
            vec![crate::transaction::TransactionType::Income]
        );
        assert_eq!(query.period, Some(Period::Week));
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn list_query_parses_empty_params_as_no_filter() {
        let query: TransactionListQuery = serde_html_form::from_str("search=&period=").unwrap();

        assert_eq!(query.search, None);
        assert_eq!(query.period, None);
        assert!(query.category_id.is_empty());
    }

    #[test]
    fn truncate_title_preserves_short_titles() {
        assert_eq!(truncate_title("Coffee"), "Coffee");
    }

    #[test]
    fn truncate_title_shortens_long_titles() {
        let long_title = "a".repeat(50);

        let got = truncate_title(&long_title);

        assert_eq!(got, format!("{}…", "a".repeat(32)));
    }
}
