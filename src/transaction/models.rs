//! Shared view-model structs for the transactions page.

use std::collections::HashMap;

use time::UtcOffset;

use crate::{
    Error,
    category::Category,
    database_id::{CategoryId, TransactionId},
    endpoints,
    period::date_from_millis,
    tag::Tag,
};

use super::core::{PaymentMethod, Transaction, TransactionType};

/// Fallback badge color for transactions whose category row is missing.
const UNKNOWN_CATEGORY_COLOR: &str = "#9E9E9E";

/// Renders a transaction with its category and tags as a table row.
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct TransactionRow {
    /// The ID of the transaction.
    pub(crate) id: TransactionId,
    /// A short description of what the transaction was for.
    pub(crate) title: String,
    /// The local calendar date of the transaction.
    pub(crate) date: time::Date,
    /// The display name of the transaction's category.
    pub(crate) category_name: String,
    /// The hex color of the transaction's category.
    pub(crate) category_color: String,
    /// The tags attached to the transaction, ordered by name.
    pub(crate) tags: Vec<Tag>,
    /// The income/expense classification.
    pub(crate) transaction_type: TransactionType,
    /// How the transaction was settled.
    pub(crate) payment_method: PaymentMethod,
    /// The signed amount.
    pub(crate) amount: f64,
    /// The API path to delete this transaction.
    pub(crate) delete_url: String,
}

impl TransactionRow {
    /// Join transactions with their categories and tags into display rows.
    pub(crate) fn build(
        transactions: Vec<Transaction>,
        categories: &[Category],
        mut tags_by_transaction: HashMap<TransactionId, Vec<Tag>>,
        offset: UtcOffset,
    ) -> Result<Vec<Self>, Error> {
        let categories_by_id: HashMap<CategoryId, &Category> = categories
            .iter()
            .map(|category| (category.id, category))
            .collect();

        transactions
            .into_iter()
            .map(|transaction| {
                let (category_name, category_color) =
                    match categories_by_id.get(&transaction.category_id) {
                        Some(category) => (category.name.clone(), category.color.clone()),
                        None => ("Unknown".to_owned(), UNKNOWN_CATEGORY_COLOR.to_owned()),
                    };

                Ok(Self {
                    id: transaction.id,
                    title: transaction.title,
                    date: date_from_millis(transaction.date, offset)?,
                    category_name,
                    category_color,
                    tags: tags_by_transaction
                        .remove(&transaction.id)
                        .unwrap_or_default(),
                    transaction_type: transaction.transaction_type,
                    payment_method: transaction.payment_method,
                    amount: transaction.amount,
                    delete_url: endpoints::format_endpoint(
                        endpoints::DELETE_TRANSACTION,
                        transaction.id,
                    ),
                })
            })
            .collect()
    }
}
