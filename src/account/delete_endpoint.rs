//! Defines the endpoint for deleting an account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::{core::count_account_references, get_account},
    alert::AlertTemplate,
    auth::UserID,
    database_id::AccountId,
    shared_templates::render,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account, responds with an alert.
///
/// Deletion is restricted: an account that still has transactions or salary
/// records referencing it cannot be deleted, so the ledger never contains
/// entries that point at a missing account.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, user_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => render(
            StatusCode::OK,
            AlertTemplate::success("Account deleted successfully", "").into_markup(),
        ),
        Err(Error::NotFound) => Error::DeleteMissingAccount.into_alert_response(),
        Err(error @ Error::AccountInUse(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn delete_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let account = get_account(account_id, user_id, connection)?;

    if count_account_references(account_id, connection)? > 0 {
        return Err(Error::AccountInUse(account.name));
    }

    connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![account_id, user_id.as_i64()],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountKind, create_account, get_account},
        db::initialize,
        test_utils::insert_test_user,
        transaction::{NewTransaction, TransactionKind, create_transaction},
    };

    use super::delete_account;

    fn must_create_test_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("could not create in-memory SQLite database");
        initialize(&connection).expect("could not initialize test DB");

        connection
    }

    #[test]
    fn deletes_account_without_references() {
        let connection = must_create_test_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 420.69,
            },
            user_id,
            &connection,
        )
        .unwrap();

        let result = delete_account(account.id, user_id, &connection);

        assert_eq!(Ok(()), result);
        assert_eq!(
            get_account(account.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn refuses_to_delete_account_with_transactions() {
        let connection = must_create_test_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction {
                user_id,
                account_id: account.id,
                kind: TransactionKind::Income,
                amount: 100.0,
                category: "salary".to_owned(),
                description: "Pay day".to_owned(),
                date: date!(2025 - 06 - 15),
            },
            &connection,
        )
        .expect("could not create test transaction");

        let result = delete_account(account.id, user_id, &connection);

        assert_eq!(
            Err(Error::AccountInUse("Checking".to_owned())),
            result
        );
        assert!(get_account(account.id, user_id, &connection).is_ok());
    }

    #[test]
    fn cannot_delete_another_users_account() {
        let connection = must_create_test_connection();
        let user_id = insert_test_user(&connection, "foo@bar.baz");
        let other_user_id = insert_test_user(&connection, "someone@else.com");
        let account = create_account(
            &AccountForm {
                name: "Hidden".to_owned(),
                kind: AccountKind::Cash,
                balance: 0.0,
            },
            other_user_id,
            &connection,
        )
        .unwrap();

        let result = delete_account(account.id, user_id, &connection);

        assert_eq!(Err(Error::NotFound), result);
        assert!(get_account(account.id, other_user_id, &connection).is_ok());
    }
}
