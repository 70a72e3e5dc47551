//! Defines the endpoint for updating an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState,
    auth::UserID,
    database_id::TransactionId,
    endpoints,
    transaction::{TransactionUpdate, create_endpoint::TransactionForm, update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the transactions
/// view on success.
///
/// The reconciler reverses the old delta (on the old account) and applies the
/// new one (on the possibly different new account) atomically, so a failure
/// partway leaves every balance as it was.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let update = TransactionUpdate {
        account_id: form.account_id,
        kind: form.kind,
        amount: form.amount,
        category: form.category,
        description: form.description,
        date: form.date,
    };

    let connection = state.db_connection.lock().unwrap();

    match update_transaction(transaction_id, user_id, update, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{AccountForm, AccountKind, create_account, get_account},
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, insert_test_user},
        transaction::{
            NewTransaction, TransactionKind, create_endpoint::TransactionForm, create_transaction,
            get_transaction,
        },
    };

    use super::{EditTransactionState, edit_transaction_endpoint};

    #[tokio::test]
    async fn can_update_transaction() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let transaction = create_transaction(
            NewTransaction {
                user_id,
                account_id: account.id,
                kind: TransactionKind::Expense,
                amount: 100.0,
                category: "food".to_owned(),
                description: "Lunch".to_owned(),
                date: date!(2025 - 06 - 15),
            },
            &conn,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = TransactionForm {
            account_id: account.id,
            kind: TransactionKind::Income,
            amount: 150.0,
            category: "salary".to_owned(),
            description: "Corrected".to_owned(),
            date: date!(2025 - 06 - 16),
        };

        let response = edit_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
            Form(form),
        )
        .await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let got_transaction = get_transaction(transaction.id, user_id, &connection).unwrap();
        assert_eq!(got_transaction.kind, TransactionKind::Income);
        assert_eq!(got_transaction.amount, 150.0);
        assert_eq!(got_transaction.description, "Corrected");

        // -100 expense reversed and +150 income applied nets +250.
        let account = get_account(account.id, user_id, &connection).unwrap();
        assert_eq!(account.balance, 150.0);
    }

    #[tokio::test]
    async fn updating_missing_transaction_returns_not_found_alert() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = TransactionForm {
            account_id: account.id,
            kind: TransactionKind::Expense,
            amount: 5.0,
            category: "food".to_owned(),
            description: String::new(),
            date: date!(2025 - 06 - 15),
        };

        let response = edit_transaction_endpoint(
            State(state),
            Extension(user_id),
            Path(42),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
