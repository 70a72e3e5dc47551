//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::{Account, AccountKind},
    alert::AlertTemplate,
    auth::UserID,
    endpoints,
    shared_templates::render,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name.
    pub name: String,
    /// The kind of account.
    pub kind: AccountKind,
    /// The opening balance in dollars.
    pub balance: f64,
}

/// A route handler for creating a new account, redirects to the accounts view on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AccountForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(&form, user_id, &connection) {
        Ok(_) => {}
        Err(Error::DuplicateAccountName(name)) => {
            return Error::DuplicateAccountName(name).into_alert_response();
        }
        Err(error) => {
            tracing::error!(
                "Could not create account with {form:?}, got an unexpected error: {error}"
            );
            return render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Something went wrong",
                    "Try again later or check the server logs",
                )
                .into_markup(),
            );
        }
    }

    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

pub fn create_account(
    form: &AccountForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO account (user_id, name, kind, balance, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id.as_i64(), form.name, form.kind, form.balance, created_at],
        )
        .map_err(|error| match error {
            // Handle the unique (user_id, name) constraint violation
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(form.name.clone())
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: form.name.clone(),
        kind: form.kind,
        balance: form.balance,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, response::IntoResponse};
    use rusqlite::{Connection, params};

    use crate::{
        Error,
        account::{
            Account, AccountKind,
            create_endpoint::{AccountForm, CreateAccountState, create_account},
            map_row_to_account,
        },
        database_id::AccountId,
        db::initialize,
        endpoints,
        test_utils::{assert_hx_redirect, insert_test_user},
    };

    use super::create_account_endpoint;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[tokio::test]
    async fn can_create_account() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let state = CreateAccountState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = AccountForm {
            name: "test account".to_owned(),
            kind: AccountKind::Bank,
            balance: 123.45,
        };

        let response = create_account_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);

        // The first account will have ID 1
        let connection = state.db_connection.lock().unwrap();
        let got_account = must_get_account(1, &connection);
        assert_eq!(got_account.name, "test account");
        assert_eq!(got_account.kind, AccountKind::Bank);
        assert_eq!(got_account.balance, 123.45);
    }

    #[test]
    fn create_account_rejects_duplicate_name_for_same_user() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let form = AccountForm {
            name: "Checking".to_owned(),
            kind: AccountKind::Bank,
            balance: 0.0,
        };
        create_account(&form, user_id, &conn).expect("could not create first account");

        let result = create_account(&form, user_id, &conn);

        assert_eq!(
            Err(Error::DuplicateAccountName("Checking".to_owned())),
            result
        );
    }

    #[test]
    fn create_account_allows_same_name_for_different_users() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        let form = AccountForm {
            name: "Checking".to_owned(),
            kind: AccountKind::Bank,
            balance: 0.0,
        };
        create_account(&form, user_id, &conn).expect("could not create first account");

        let result = create_account(&form, other_user_id, &conn);

        assert!(result.is_ok());
    }

    #[track_caller]
    fn must_get_account(id: AccountId, connection: &Connection) -> Account {
        connection
            .query_one(
                "SELECT id, name, kind, balance, created_at FROM account WHERE id = ?1",
                params![id],
                map_row_to_account,
            )
            .expect("could not get account from database")
    }
}
