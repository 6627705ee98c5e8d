//! Defines the core data model and database queries for accounts.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, database_id::AccountId};

/// An account money can be spent from or received into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The name of the account holder.
    pub holder_name: String,
    /// The name of the bank the account is held with.
    pub bank_name: String,
    /// The account number as displayed by the bank.
    pub account_number: String,
    /// The stored account balance. This is recorded, not derived from
    /// transactions.
    pub balance: f64,
}

/// The data needed to create a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The name of the account holder.
    pub holder_name: String,
    /// The name of the bank the account is held with.
    pub bank_name: String,
    /// The account number as displayed by the bank.
    pub account_number: String,
    /// The starting balance.
    pub balance: f64,
}

/// Create a new account in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_account(
    new_account: NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = connection
        .prepare(
            "INSERT INTO account (holder_name, bank_name, account_number, balance)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, holder_name, bank_name, account_number, balance",
        )?
        .query_row(
            (
                &new_account.holder_name,
                &new_account.bank_name,
                &new_account.account_number,
                new_account.balance,
            ),
            map_account_row,
        )?;

    Ok(account)
}

/// Retrieve all accounts ordered by bank name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, holder_name, bank_name, account_number, balance FROM account
             ORDER BY bank_name ASC;",
        )?
        .query_map([], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of accounts in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_accounts(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM account;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Sum the stored balances across all accounts.
///
/// Returns zero when there are no accounts.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_total_balance(connection: &Connection) -> Result<f64, Error> {
    let total: Option<f64> =
        connection.query_row("SELECT SUM(balance) FROM account;", [], |row| row.get(0))?;

    Ok(total.unwrap_or_default())
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                holder_name TEXT NOT NULL,
                bank_name TEXT NOT NULL,
                account_number TEXT NOT NULL,
                balance REAL NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('account', 0)",
        (),
    )?;

    Ok(())
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        holder_name: row.get(1)?,
        bank_name: row.get(2)?,
        account_number: row.get(3)?,
        balance: row.get(4)?,
    })
}
