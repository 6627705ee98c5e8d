//! Defines the page with the form for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    database_id::{AccountId, CategoryId},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
    period,
    transaction::core::{PaymentMethod, TransactionType},
};

/// The values to pre-fill the transaction form with.
///
/// The amount is kept as the raw submitted text so a rejected value can be
/// shown back to the user unchanged.
pub(crate) struct TransactionFormValues<'a> {
    pub(crate) title: Option<&'a str>,
    pub(crate) amount: Option<&'a str>,
    pub(crate) transaction_type: TransactionType,
    pub(crate) category_id: Option<CategoryId>,
    pub(crate) account_id: Option<AccountId>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) date: Date,
    pub(crate) tags: Option<&'a str>,
    pub(crate) max_date: Date,
}

impl<'a> TransactionFormValues<'a> {
    /// An empty expense form dated `today`.
    pub(crate) fn empty(today: Date) -> Self {
        Self {
            title: None,
            amount: None,
            transaction_type: TransactionType::Expense,
            category_id: None,
            account_id: None,
            payment_method: None,
            date: today,
            tags: None,
            max_date: today,
        }
    }
}

/// Field level validation messages for the transaction form.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct FormErrors {
    pub(crate) title: Option<&'static str>,
    pub(crate) amount: Option<&'static str>,
    pub(crate) category: Option<&'static str>,
    pub(crate) account: Option<&'static str>,
    pub(crate) payment_method: Option<&'static str>,
}

impl FormErrors {
    pub(crate) fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The database connection for listing categories and accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Render the page for recording a new transaction.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
) -> Result<Response, Error> {
    let today = period::current_local_date(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;
    let accounts = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let content = html! {
        (NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-lg space-y-4"
            {
                h1 class="text-xl font-bold" { "New Transaction" }

                div id="alert-container" {}

                (transaction_form(
                    &TransactionFormValues::empty(today),
                    &FormErrors::default(),
                    &categories,
                    &accounts,
                ))
            }
        }
    };

    Ok(base("New Transaction", &[], &content).into_response())
}

/// Render the transaction entry form with the given values and validation
/// messages.
///
/// The form posts via htmx and swaps itself, so a failed submission
/// re-renders here with the entered values and the relevant field errors.
pub(crate) fn transaction_form(
    values: &TransactionFormValues<'_>,
    errors: &FormErrors,
    categories: &[Category],
    accounts: &[Account],
) -> Markup {
    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    name="title"
                    id="title"
                    type="text"
                    placeholder="What was this for?"
                    value=[values.title]
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(message) = errors.title {
                    p class=(FORM_ERROR_STYLE) data-error-for="title" { (message) }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.01"
                    value=[values.amount]
                    class=(FORM_TEXT_INPUT_STYLE);

                @if let Some(message) = errors.amount {
                    p class=(FORM_ERROR_STYLE) data-error-for="amount" { (message) }
                }
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class="flex gap-6"
                {
                    @for transaction_type in TransactionType::ALL {
                        div class="flex items-center gap-2"
                        {
                            input
                                name="type_"
                                id=(format!("transaction-type-{}", transaction_type.as_query_value()))
                                type="radio"
                                value=(transaction_type.as_query_value())
                                checked[values.transaction_type == transaction_type]
                                required
                                class="w-4 h-4";

                            label
                                for=(format!("transaction-type-{}", transaction_type.as_query_value()))
                                class="text-sm text-gray-900 dark:text-white"
                            {
                                (transaction_type.label())
                            }
                        }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for transaction_type in [TransactionType::Expense, TransactionType::Income] {
                        optgroup label=(transaction_type.label())
                        {
                            @for category in categories {
                                @if category.transaction_type == transaction_type {
                                    option
                                        value=(category.id)
                                        selected[values.category_id == Some(category.id)]
                                    {
                                        (category.name)
                                    }
                                }
                            }
                        }
                    }
                }

                @if let Some(message) = errors.category {
                    p class=(FORM_ERROR_STYLE) data-error-for="category_id" { (message) }
                }
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select name="account_id" id="account_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select an account" }

                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[values.account_id == Some(account.id)]
                        {
                            (account.bank_name) " - " (account.holder_name)
                        }
                    }
                }

                @if let Some(message) = errors.account {
                    p class=(FORM_ERROR_STYLE) data-error-for="account_id" { (message) }
                }
            }

            div
            {
                label for="payment_method" class=(FORM_LABEL_STYLE) { "Payment method" }

                select name="payment_method" id="payment_method" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a payment method" }

                    @for payment_method in PaymentMethod::ALL {
                        option
                            value=(payment_method.as_query_value())
                            selected[values.payment_method == Some(payment_method)]
                        {
                            (payment_method.label())
                        }
                    }
                }

                @if let Some(message) = errors.payment_method {
                    p class=(FORM_ERROR_STYLE) data-error-for="payment_method" { (message) }
                }
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    max=(values.max_date)
                    value=(values.date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="tags" class=(FORM_LABEL_STYLE) { "Tags" }

                input
                    name="tags"
                    id="tags"
                    type="text"
                    placeholder="Comma separated, e.g. groceries, weekly"
                    value=[values.tags]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save transaction" }
        }
    }
}
