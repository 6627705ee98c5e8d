//! Database operations for tags.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    tag::{Tag, TagId, TagName},
};

/// Get the tag with `name`, creating it first if it does not exist.
///
/// The lookup is case-insensitive, so asking for "travel" returns an existing
/// "Travel" tag rather than creating a duplicate. A newly created tag keeps
/// the casing it was first created with.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_or_create_tag(name: TagName, connection: &Connection) -> Result<Tag, Error> {
    let existing_tag = connection
        .prepare("SELECT id, name FROM tag WHERE name = ?1 COLLATE NOCASE;")?
        .query_row((name.as_ref(),), map_row);

    match existing_tag {
        Ok(tag) => Ok(tag),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            connection.execute("INSERT INTO tag (name) VALUES (?1);", (name.as_ref(),))?;

            Ok(Tag {
                id: connection.last_insert_rowid(),
                name,
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve a single tag by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `tag_id` does not refer to a valid tag,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_tag(tag_id: TagId, connection: &Connection) -> Result<Tag, Error> {
    connection
        .prepare("SELECT id, name FROM tag WHERE id = :id;")?
        .query_row(&[(":id", &tag_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all tags ordered alphabetically by name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_all_tags(connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare("SELECT id, name FROM tag ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Initialize the tag table and indexes.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_tag_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tag (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        );

        CREATE INDEX IF NOT EXISTS idx_tag_name ON tag(name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;

    Ok(Tag {
        id,
        name: TagName::new_unchecked(&raw_name),
    })
}
