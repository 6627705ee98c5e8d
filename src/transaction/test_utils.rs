//! Helpers for building transactions in tests.

use crate::{
    period::TimestampMillis,
    transaction::{NewTransaction, PaymentMethod, TransactionType},
};

/// Build a [NewTransaction] against the seeded category and account.
///
/// Negative amounts become expenses, everything else income.
pub(crate) fn sample_transaction(amount: f64, date: TimestampMillis) -> NewTransaction {
    let transaction_type = if amount < 0.0 {
        TransactionType::Expense
    } else {
        TransactionType::Income
    };

    NewTransaction {
        title: "Sample transaction".to_owned(),
        category_id: 1,
        account_id: 1,
        date,
        transaction_type,
        payment_method: PaymentMethod::Cash,
        amount,
    }
}
