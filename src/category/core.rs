//! Defines the core data model and database queries for categories.
//!
//! Categories are reference data: they are seeded when the database is first
//! initialized and the current flows never create or edit them.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{
    Error, database_id::CategoryId, period::TimeWindow, transaction::TransactionType,
};

/// A category that transactions are recorded against, e.g. "Food" or "Salary".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The category's display name.
    pub name: String,
    /// The transaction type this category applies to.
    pub transaction_type: TransactionType,
    /// The hex color code used for badges and charts, e.g. "#FF9800".
    pub color: String,
    /// The name of the icon asset for this category.
    pub icon: String,
}

/// The total amount recorded against one category within a date window.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category's display name.
    pub name: String,
    /// The category's hex color code.
    pub color: String,
    /// The unsigned total recorded against the category.
    pub total: f64,
}

/// Create a new category in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_category(
    name: &str,
    transaction_type: TransactionType,
    color: &str,
    icon: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = connection
        .prepare(
            "INSERT INTO category (name, transaction_type, color, icon)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, transaction_type, color, icon",
        )?
        .query_row((name, transaction_type, color, icon), map_category_row)?;

    Ok(category)
}

/// Retrieve all categories ordered alphabetically by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, transaction_type, color, icon FROM category ORDER BY name ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Retrieve the categories applicable to `transaction_type`, ordered by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_categories_by_type(
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, transaction_type, color, icon FROM category
             WHERE transaction_type = ?1
             ORDER BY name ASC;",
        )?
        .query_map((transaction_type,), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of categories in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_categories(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Sum the amounts recorded against each category for transactions of
/// `transaction_type` within `window`, largest total first.
///
/// Categories with no matching transactions are omitted. Totals are unsigned
/// so expense and income summaries read the same way.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn category_summary(
    transaction_type: TransactionType,
    window: TimeWindow,
    connection: &Connection,
) -> Result<Vec<CategorySummary>, Error> {
    connection
        .prepare(
            "SELECT c.name, c.color, ABS(SUM(t.amount)) AS total
             FROM \"transaction\" t
             INNER JOIN category c ON t.category_id = c.id
             WHERE t.date BETWEEN ?1 AND ?2 AND t.transaction_type = ?3
             GROUP BY c.id
             HAVING total > 0
             ORDER BY total DESC;",
        )?
        .query_map((window.start, window.end, transaction_type), |row| {
            Ok(CategorySummary {
                name: row.get(0)?,
                color: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(Error::SqlError))
        .collect()
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                transaction_type TEXT NOT NULL,
                color TEXT NOT NULL,
                icon TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('category', 0)",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        transaction_type: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
    })
}
