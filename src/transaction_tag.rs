//! Junction table operations for the many-to-many relationship between
//! transactions and tags.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::{
    Error,
    database_id::TransactionId,
    tag::{Tag, TagId, TagName},
};

/// Create the transaction_tag junction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_tag_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_tag (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(tag_id) REFERENCES tag(id) ON UPDATE CASCADE ON DELETE CASCADE,
            UNIQUE(transaction_id, tag_id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_tag_transaction_id ON transaction_tag(transaction_id)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_tag_tag_id ON transaction_tag(tag_id)",
        (),
    )?;

    Ok(())
}

/// Associate a tag with a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTag] if `tag_id` does not refer to a valid tag,
/// - [Error::SqlError] if there is some other SQL error.
pub fn add_tag_to_transaction(
    transaction_id: TransactionId,
    tag_id: TagId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .execute(
            "INSERT INTO transaction_tag (transaction_id, tag_id) VALUES (?1, ?2)",
            (transaction_id, tag_id),
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                Error::InvalidTag(Some(tag_id))
            }
            error => error.into(),
        })?;

    Ok(())
}

/// Get all tags for a transaction, ordered by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_transaction_tags(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.name
             FROM tag t
             INNER JOIN transaction_tag tt ON t.id = tt.tag_id
             WHERE tt.transaction_id = ?1
             ORDER BY t.name",
        )?
        .query_map([transaction_id], |row| {
            let id = row.get(0)?;
            let raw_name: String = row.get(1)?;
            Ok(Tag {
                id,
                name: TagName::new_unchecked(&raw_name),
            })
        })?
        .map(|maybe_tag| maybe_tag.map_err(Error::SqlError))
        .collect()
}

/// Get the tags for a batch of transactions, keyed by transaction ID.
///
/// Transactions without tags are absent from the returned map. This avoids a
/// per-row query when rendering the transaction list.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_tags_for_transactions(
    transaction_ids: &[TransactionId],
    connection: &Connection,
) -> Result<HashMap<TransactionId, Vec<Tag>>, Error> {
    if transaction_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; transaction_ids.len()].join(", ");
    let query = format!(
        "SELECT tt.transaction_id, t.id, t.name
         FROM tag t
         INNER JOIN transaction_tag tt ON t.id = tt.tag_id
         WHERE tt.transaction_id IN ({placeholders})
         ORDER BY t.name"
    );

    let mut tags_by_transaction: HashMap<TransactionId, Vec<Tag>> = HashMap::new();
    let rows = connection
        .prepare(&query)?
        .query_map(rusqlite::params_from_iter(transaction_ids), |row| {
            let transaction_id: TransactionId = row.get(0)?;
            let id = row.get(1)?;
            let raw_name: String = row.get(2)?;

            Ok((
                transaction_id,
                Tag {
                    id,
                    name: TagName::new_unchecked(&raw_name),
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (transaction_id, tag) in rows {
        tags_by_transaction.entry(transaction_id).or_default().push(tag);
    }

    Ok(tags_by_transaction)
}
