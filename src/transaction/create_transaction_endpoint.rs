//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::get_all_accounts,
    category::get_all_categories,
    database_id::{AccountId, CategoryId},
    endpoints, period,
    tag::{TagId, TagName, get_or_create_tag},
};

use super::{
    core::{NewTransaction, PaymentMethod, TransactionType, create_transaction_with_tags},
    new_transaction_page::{FormErrors, TransactionFormValues, transaction_form},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for creating a transaction.
///
/// Every field is optional at the wire level so missing selections surface as
/// validation messages instead of deserialization failures. The amount stays
/// a string so non-numeric input can be reported and echoed back.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    /// A short description of what the transaction was for.
    pub title: Option<String>,
    /// The amount as typed into the form.
    pub amount: Option<String>,
    /// The income/expense classification.
    pub type_: Option<TransactionType>,
    /// The ID of the selected category.
    pub category_id: Option<CategoryId>,
    /// The ID of the selected account.
    pub account_id: Option<AccountId>,
    /// How the transaction was settled.
    pub payment_method: Option<PaymentMethod>,
    /// The local calendar day the transaction happened on.
    pub date: Option<Date>,
    /// Comma separated tag names.
    pub tags: Option<String>,
}

/// The outcome of validating a [TransactionForm].
struct ValidatedForm {
    title: String,
    /// The amount as typed, always strictly positive.
    amount: f64,
    transaction_type: TransactionType,
    category_id: CategoryId,
    account_id: AccountId,
    payment_method: PaymentMethod,
    date: Option<Date>,
    tag_names: Vec<TagName>,
}

/// A route handler for creating a new transaction.
///
/// On success the client is redirected to the transactions view. A form that
/// fails validation is re-rendered with the entered values and field level
/// messages, and never reaches storage.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match period::current_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };
    let Some(local_offset) = period::local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone.clone()).into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let validated = match validate_form(&form) {
        Ok(validated) => validated,
        Err(errors) => {
            return match render_form_with_errors(&form, &errors, today, &connection) {
                Ok(markup) => {
                    // The status code has to be 200 OK or HTMX will not swap
                    // the re-rendered form into place.
                    (StatusCode::OK, markup).into_response()
                }
                Err(error) => error.into_alert_response(),
            };
        }
    };

    let mut tag_ids: Vec<TagId> = Vec::new();
    for tag_name in validated.tag_names {
        let tag = match get_or_create_tag(tag_name, &connection) {
            Ok(tag) => tag,
            Err(error) => {
                tracing::error!("could not get or create tag: {error}");
                return error.into_alert_response();
            }
        };

        // "Food, food" resolves to the same tag twice; a duplicate junction
        // row would violate its unique constraint.
        if !tag_ids.contains(&tag.id) {
            tag_ids.push(tag.id);
        }
    }

    let new_transaction = NewTransaction {
        title: validated.title,
        category_id: validated.category_id,
        account_id: validated.account_id,
        date: period::start_of_day_millis(validated.date.unwrap_or(today), local_offset),
        transaction_type: validated.transaction_type,
        payment_method: validated.payment_method,
        amount: signed_amount(validated.amount, validated.transaction_type),
    };

    if let Err(error) = create_transaction_with_tags(new_transaction, &tag_ids, &connection) {
        tracing::error!("could not create transaction: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Apply the entry form's validation rules.
fn validate_form(form: &TransactionForm) -> Result<ValidatedForm, FormErrors> {
    let mut errors = FormErrors::default();

    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty());
    if title.is_none() {
        errors.title = Some("Please enter a title");
    }

    let amount = match form.amount.as_deref().map(str::trim) {
        None | Some("") => {
            errors.amount = Some("Please enter a valid amount");
            None
        }
        Some(raw_amount) => match raw_amount.parse::<f64>() {
            Ok(amount) if amount > 0.0 => Some(amount),
            Ok(_) => {
                errors.amount = Some("Amount must be greater than 0");
                None
            }
            Err(_) => {
                errors.amount = Some("Please enter a valid amount");
                None
            }
        },
    };

    if form.category_id.is_none() {
        errors.category = Some("Please select a category");
    }

    if form.account_id.is_none() {
        errors.account = Some("Please select an account");
    }

    if form.payment_method.is_none() {
        errors.payment_method = Some("Please select a payment method");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let tag_names = form
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|name| TagName::new(name).ok())
        .collect();

    Ok(ValidatedForm {
        title: title.expect("validated above").to_owned(),
        amount: amount.expect("validated above"),
        transaction_type: form.type_.unwrap_or(TransactionType::Expense),
        category_id: form.category_id.expect("validated above"),
        account_id: form.account_id.expect("validated above"),
        payment_method: form.payment_method.expect("validated above"),
        date: form.date,
        tag_names,
    })
}

/// Sign the validated, positive amount by transaction type: expenses are
/// stored negative, everything else as entered.
fn signed_amount(amount: f64, transaction_type: TransactionType) -> f64 {
    match transaction_type {
        TransactionType::Expense => -amount,
        TransactionType::Income | TransactionType::Neutral => amount,
    }
}

fn render_form_with_errors(
    form: &TransactionForm,
    errors: &FormErrors,
    today: Date,
    connection: &Connection,
) -> Result<maud::Markup, Error> {
    let categories = get_all_categories(connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let accounts = get_all_accounts(connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let values = TransactionFormValues {
        title: form.title.as_deref(),
        amount: form.amount.as_deref(),
        transaction_type: form.type_.unwrap_or(TransactionType::Expense),
        category_id: form.category_id,
        account_id: form.account_id,
        payment_method: form.payment_method,
        date: form.date.unwrap_or(today),
        tags: form.tags.as_deref(),
        max_date: today,
    };

    Ok(transaction_form(&values, errors, &categories, &accounts))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Body, extract::State, http::Response, response::IntoResponse};
    use axum_extra::extract::Form;
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        db::initialize,
        transaction::{PaymentMethod, TransactionType, count_transactions, get_transaction},
        transaction_tag::get_transaction_tags,
    };

    use super::{CreateTransactionState, TransactionForm, create_transaction_endpoint};

    fn get_test_state() -> CreateTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn valid_form() -> TransactionForm {
        TransactionForm {
            title: Some("Weekly groceries".to_owned()),
            amount: Some("42.50".to_owned()),
            type_: Some(TransactionType::Expense),
            category_id: Some(1),
            account_id: Some(1),
            payment_method: Some(PaymentMethod::DebitCard),
            date: Some(date!(2026 - 08 - 01)),
            tags: None,
        }
    }

    #[track_caller]
    fn assert_redirects_to_transactions_view(response: &Response<Body>) {
        let location = response
            .headers()
            .get(HX_REDIRECT)
            .expect("expected response to have the header hx-redirect");
        assert_eq!(
            location, "/transactions",
            "got redirect to {location:?}, want redirect to /transactions"
        );
    }

    async fn parse_html(response: Response<Body>) -> Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Could not get response body");
        let text = String::from_utf8_lossy(&body).to_string();

        Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_field_error(html: &Html, field: &str, want_message: &str) {
        let selector = Selector::parse(&format!("[data-error-for='{field}']")).unwrap();
        let message = html
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No error message for field {field}"))
            .text()
            .collect::<String>();
        assert_eq!(message.trim(), want_message);
    }

    #[tokio::test]
    async fn create_stores_expense_with_negative_amount() {
        let state = get_test_state();

        let response = create_transaction_endpoint(State(state.clone()), Form(valid_form()))
            .await
            .into_response();

        assert_redirects_to_transactions_view(&response);

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.title, "Weekly groceries");
        assert_eq!(transaction.amount, -42.5);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
    }

    #[tokio::test]
    async fn create_stores_income_with_positive_amount() {
        let state = get_test_state();
        let form = TransactionForm {
            type_: Some(TransactionType::Income),
            category_id: Some(9),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_redirects_to_transactions_view(&response);

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, &connection).unwrap();
        assert_eq!(transaction.amount, 42.5);
    }

    #[tokio::test]
    async fn create_resolves_tags_case_insensitively() {
        let state = get_test_state();
        let form = TransactionForm {
            tags: Some("Travel, travel, Work Trip".to_owned()),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_redirects_to_transactions_view(&response);

        let connection = state.db_connection.lock().unwrap();
        let tags = get_transaction_tags(1, &connection).unwrap();
        let names: Vec<String> = tags.iter().map(|tag| tag.name.to_string()).collect();
        assert_eq!(names, vec!["Travel".to_owned(), "Work Trip".to_owned()]);
    }

    #[tokio::test]
    async fn create_rejects_non_numeric_amount() {
        let state = get_test_state();
        let form = TransactionForm {
            amount: Some("twelve".to_owned()),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        let html = parse_html(response).await;
        assert_field_error(&html, "amount", "Please enter a valid amount");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_non_positive_amount() {
        let state = get_test_state();

        for amount in ["0", "-5"] {
            let form = TransactionForm {
                amount: Some(amount.to_owned()),
                ..valid_form()
            };

            let response = create_transaction_endpoint(State(state.clone()), Form(form))
                .await
                .into_response();

            let html = parse_html(response).await;
            assert_field_error(&html, "amount", "Amount must be greater than 0");
        }

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let state = get_test_state();
        let form = TransactionForm {
            title: Some("   ".to_owned()),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        let html = parse_html(response).await;
        assert_field_error(&html, "title", "Please enter a title");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_missing_selections() {
        let state = get_test_state();
        let form = TransactionForm {
            category_id: None,
            account_id: None,
            payment_method: None,
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        let html = parse_html(response).await;
        assert_field_error(&html, "category_id", "Please select a category");
        assert_field_error(&html, "account_id", "Please select an account");
        assert_field_error(&html, "payment_method", "Please select a payment method");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_validation_echoes_entered_values() {
        let state = get_test_state();
        let form = TransactionForm {
            title: Some("Coffee".to_owned()),
            amount: Some("abc".to_owned()),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state), Form(form))
            .await
            .into_response();

        let html = parse_html(response).await;

        let title_selector = Selector::parse("input[name='title']").unwrap();
        let title_input = html.select(&title_selector).next().unwrap();
        assert_eq!(title_input.value().attr("value"), Some("Coffee"));

        let amount_selector = Selector::parse("input[name='amount']").unwrap();
        let amount_input = html.select(&amount_selector).next().unwrap();
        assert_eq!(amount_input.value().attr("value"), Some("abc"));
    }

    #[tokio::test]
    async fn create_with_invalid_category_returns_alert() {
        let state = get_test_state();
        let form = TransactionForm {
            category_id: Some(999_999),
            ..valid_form()
        };

        let response = create_transaction_endpoint(State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }
}
