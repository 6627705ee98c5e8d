//! Transaction recording and browsing.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the enums for classifying transactions
//! - Database functions for storing, querying and deleting transactions
//! - The dynamically composed filter/sort query behind the transactions page
//! - View handlers for the transaction list and entry form

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
pub(crate) mod models;
mod new_transaction_page;
pub(crate) mod query;
mod transactions_page;

#[cfg(test)]
pub(crate) mod test_utils;

pub use core::{
    NewTransaction, PaymentMethod, Transaction, TransactionType, count_transactions,
    create_transaction, create_transaction_table, create_transaction_with_tags,
    get_recent_transactions, get_transaction,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use new_transaction_page::get_new_transaction_page;
pub use transactions_page::{get_transaction_rows, get_transactions_page};

pub(crate) use core::delete_transaction;
