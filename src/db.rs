//! Database initialization: table creation and reference-data seeding.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::{NewAccount, count_accounts, create_account, create_account_table},
    category::{count_categories, create_category, create_category_table},
    tag::create_tag_table,
    transaction::{TransactionType, create_transaction_table},
    transaction_tag::create_transaction_tag_table,
};

/// The categories available on a fresh database.
///
/// Stands in for the database asset the mobile builds shipped: categories are
/// not user creatable, so a usable set must exist before the first launch.
const SEED_CATEGORIES: [(&str, TransactionType, &str, &str); 12] = [
    ("Food", TransactionType::Expense, "#FF9800", "ic_food"),
    (
        "Transport",
        TransactionType::Expense,
        "#03A9F4",
        "ic_transport",
    ),
    (
        "Shopping",
        TransactionType::Expense,
        "#9C27B0",
        "ic_shopping",
    ),
    (
        "Entertainment",
        TransactionType::Expense,
        "#E91E63",
        "ic_entertainment",
    ),
    ("Health", TransactionType::Expense, "#F44336", "ic_health"),
    ("Bills", TransactionType::Expense, "#607D8B", "ic_bills"),
    (
        "Education",
        TransactionType::Expense,
        "#3F51B5",
        "ic_education",
    ),
    ("Travel", TransactionType::Expense, "#009688", "ic_travel"),
    ("Salary", TransactionType::Income, "#4CAF50", "ic_salary"),
    (
        "Freelance",
        TransactionType::Income,
        "#8BC34A",
        "ic_freelance",
    ),
    (
        "Interest",
        TransactionType::Income,
        "#CDDC39",
        "ic_interest",
    ),
    ("Gifts", TransactionType::Income, "#FFC107", "ic_gift"),
];

/// Create the application tables and seed the reference data.
///
/// Table creation and seeding run inside a single exclusive transaction, and
/// foreign key enforcement is switched on for the connection. Calling this
/// function on an already initialized database is a no-op.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created or the seed data
/// cannot be inserted.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_tag_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transaction_tag_table(&transaction)?;

    seed_categories(&transaction)?;
    seed_default_account(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn seed_categories(connection: &Connection) -> Result<(), Error> {
    if count_categories(connection)? > 0 {
        return Ok(());
    }

    for (name, transaction_type, color, icon) in SEED_CATEGORIES {
        create_category(name, transaction_type, color, icon, connection)?;
    }

    Ok(())
}

fn seed_default_account(connection: &Connection) -> Result<(), Error> {
    if count_accounts(connection)? > 0 {
        return Ok(());
    }

    create_account(
        NewAccount {
            holder_name: "Personal".to_owned(),
            bank_name: "Cash".to_owned(),
            account_number: "0000".to_owned(),
            balance: 0.0,
        },
        connection,
    )?;

    Ok(())
}
