//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{Html, IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, database_id::TransactionId};

use super::core::delete_transaction;

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction by its ID.
///
/// The row is removed by htmx swapping in the empty response, so the status
/// code has to be 200 OK or the table row would survive the delete.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        Ok(()) => Html("").into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        transaction::{create_transaction, get_transaction, test_utils::sample_transaction},
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    fn get_test_state() -> DeleteTransactionState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn delete_removes_transaction_and_returns_empty_fragment() {
        let state = get_test_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(sample_transaction(-12.3, 1_000), &connection)
                .unwrap()
                .id
        };

        let response =
            delete_transaction_endpoint(State(state.clone()), Path(transaction_id)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(transaction_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_missing_transaction_returns_not_found_alert() {
        let state = get_test_state();

        let response = delete_transaction_endpoint(State(state), Path(999_999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
