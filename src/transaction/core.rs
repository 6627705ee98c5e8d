//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, CategoryId, TransactionId},
    period::TimestampMillis,
    tag::TagId,
    transaction_tag::add_tag_to_transaction,
};

// ============================================================================
// MODELS
// ============================================================================

/// The income/expense classification of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    /// Money earned, stored with a positive amount.
    Income,
    /// Money spent, stored with a negative amount.
    Expense,
    /// Movements that are neither, e.g. transfers between own accounts.
    Neutral,
}

impl TransactionType {
    /// Every transaction type, in the order the UI displays them.
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Income,
        TransactionType::Expense,
        TransactionType::Neutral,
    ];

    /// The value used for this type in the database and in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Neutral => "neutral",
        }
    }

    /// The label shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Neutral => "Neutral",
        }
    }

    fn from_query_value(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|value| value.as_query_value() == text)
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_query_value()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Self::from_query_value(text).ok_or(FromSqlError::InvalidType)
    }
}

/// How a transaction was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Paid with cash on hand.
    Cash,
    /// Cash withdrawn from an account.
    CashWithdrawal,
    /// Paid by debit card.
    DebitCard,
    /// Paid by credit card.
    CreditCard,
    /// Paid through UPI.
    Upi,
    /// Paid by bank transfer.
    BankTransfer,
}

impl PaymentMethod {
    /// Every payment method, in the order the UI displays them.
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::CashWithdrawal,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
        PaymentMethod::Upi,
        PaymentMethod::BankTransfer,
    ];

    /// The value used for this payment method in the database and in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CashWithdrawal => "cash-withdrawal",
            Self::DebitCard => "debit-card",
            Self::CreditCard => "credit-card",
            Self::Upi => "upi",
            Self::BankTransfer => "bank-transfer",
        }
    }

    /// The label shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::CashWithdrawal => "Cash Withdrawal",
            Self::DebitCard => "Debit Card",
            Self::CreditCard => "Credit Card",
            Self::Upi => "UPI",
            Self::BankTransfer => "Bank Transfer",
        }
    }

    fn from_query_value(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|value| value.as_query_value() == text)
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_query_value()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Self::from_query_value(text).ok_or(FromSqlError::InvalidType)
    }
}

/// An event where money was spent, earned or moved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description of what the transaction was for.
    pub title: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The ID of the account the transaction was settled against.
    pub account_id: AccountId,
    /// When the transaction happened, in epoch milliseconds.
    pub date: TimestampMillis,
    /// The income/expense classification.
    pub transaction_type: TransactionType,
    /// How the transaction was settled.
    pub payment_method: PaymentMethod,
    /// The signed amount: negative for expenses, positive for income.
    pub amount: f64,
}

/// The data needed to record a new transaction.
///
/// Transactions are only ever inserted and deleted, so there is no
/// corresponding update type.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// A short description of what the transaction was for.
    pub title: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The ID of the account the transaction was settled against.
    pub account_id: AccountId,
    /// When the transaction happened, in epoch milliseconds.
    pub date: TimestampMillis,
    /// The income/expense classification.
    pub transaction_type: TransactionType,
    /// How the transaction was settled.
    pub payment_method: PaymentMethod,
    /// The signed amount: negative for expenses, positive for income.
    pub amount: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidReference] if the category or account ID does not refer
///   to an existing row,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (title, category_id, account_id, date, transaction_type, payment_method, amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, title, category_id, account_id, date, transaction_type, payment_method, amount",
        )?
        .query_row(
            (
                &new_transaction.title,
                new_transaction.category_id,
                new_transaction.account_id,
                new_transaction.date,
                new_transaction.transaction_type,
                new_transaction.payment_method,
                new_transaction.amount,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference,
            error => error.into(),
        })
}

/// Create a new transaction along with its tag associations in a single SQL
/// transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidReference] if the category or account ID does not refer
///   to an existing row,
/// - [Error::InvalidTag] if a tag ID does not refer to an existing tag,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction_with_tags(
    new_transaction: NewTransaction,
    tag_ids: &[TagId],
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = create_transaction(new_transaction, &sql_transaction)?;

    for &tag_id in tag_ids {
        add_tag_to_transaction(transaction.id, tag_id, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, title, category_id, account_id, date, transaction_type, payment_method, amount
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Delete a transaction by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get the most recently dated transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_recent_transactions(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, title, category_id, account_id, date, transaction_type, payment_method, amount
             FROM \"transaction\"
             ORDER BY date DESC, id DESC
             LIMIT :limit",
        )?
        .query_map(&[(":limit", &limit)], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                date INTEGER NOT NULL,
                transaction_type TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                amount REAL NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by the range filters and aggregations.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_type ON \"transaction\"(date, transaction_type);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category_account ON \"transaction\"(category_id, account_id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        category_id: row.get(2)?,
        account_id: row.get(3)?,
        date: row.get(4)?,
        transaction_type: row.get(5)?,
        payment_method: row.get(6)?,
        amount: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        tag::{TagName, get_or_create_tag},
        transaction::test_utils::sample_transaction,
        transaction_tag::get_transaction_tags,
    };

    use super::{
        count_transactions, create_transaction, create_transaction_with_tags, delete_transaction,
        get_recent_transactions, get_transaction,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let new_transaction = sample_transaction(-12.3, 1_000);

        let result = create_transaction(new_transaction.clone(), &conn);

        match result {
            Ok(transaction) => {
                assert!(transaction.id > 0);
                assert_eq!(transaction.amount, new_transaction.amount);
                assert_eq!(transaction.title, new_transaction.title);
            }
            Err(error) => panic!("Unexpected error: {error}"),
        }
    }

    #[test]
    fn create_fails_on_invalid_category() {
        let conn = get_test_connection();
        let mut new_transaction = sample_transaction(-12.3, 1_000);
        new_transaction.category_id = 999_999;

        let result = create_transaction(new_transaction, &conn);

        assert_eq!(result, Err(Error::InvalidReference));
    }

    #[test]
    fn create_fails_on_invalid_account() {
        let conn = get_test_connection();
        let mut new_transaction = sample_transaction(-12.3, 1_000);
        new_transaction.account_id = 999_999;

        let result = create_transaction(new_transaction, &conn);

        assert_eq!(result, Err(Error::InvalidReference));
    }

    #[test]
    fn create_with_tags_links_all_tags() {
        let conn = get_test_connection();
        let groceries = get_or_create_tag(TagName::new_unchecked("Groceries"), &conn).unwrap();
        let weekly = get_or_create_tag(TagName::new_unchecked("Weekly"), &conn).unwrap();

        let transaction = create_transaction_with_tags(
            sample_transaction(-50.0, 1_000),
            &[groceries.id, weekly.id],
            &conn,
        )
        .expect("Could not create transaction with tags");

        let tags = get_transaction_tags(transaction.id, &conn).unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn create_with_invalid_tag_rolls_back_transaction() {
        let conn = get_test_connection();
        let invalid_tag_id = 999_999;

        let result =
            create_transaction_with_tags(sample_transaction(-50.0, 1_000), &[invalid_tag_id], &conn);

        assert_eq!(result, Err(Error::InvalidTag(Some(invalid_tag_id))));
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let transaction = create_transaction(sample_transaction(-12.3, 1_000), &conn).unwrap();

        delete_transaction(transaction.id, &conn).expect("Could not delete transaction");

        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = delete_transaction(999_999, &conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn recent_transactions_returns_newest_first() {
        let conn = get_test_connection();
        for i in 1..=5 {
            create_transaction(sample_transaction(-1.0, i * 1_000), &conn).unwrap();
        }

        let got = get_recent_transactions(3, &conn).unwrap();

        let dates: Vec<i64> = got.iter().map(|transaction| transaction.date).collect();
        assert_eq!(dates, vec![5_000, 4_000, 3_000]);
    }

    #[test]
    fn deleting_category_cascades_to_transactions() {
        let conn = get_test_connection();
        let transaction = create_transaction(sample_transaction(-12.3, 1_000), &conn).unwrap();

        conn.execute("DELETE FROM category WHERE id = ?1", [transaction.category_id])
            .expect("Could not delete category");

        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }
}
