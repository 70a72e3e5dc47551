//! Defines the route handler for the page for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::get_accounts,
    auth::UserID,
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    transaction::{create_page::transaction_form_fields, get_transaction},
};

/// The state needed to render the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;
    let accounts = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::TRANSACTION, transaction_id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Transaction" }

            form
                hx-put=(edit_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (transaction_form_fields(
                    &accounts,
                    Some(&transaction),
                    transaction.date,
                    "Save Changes",
                ))
            }
        }
    );

    Ok(base("Edit Transaction", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, insert_test_user,
            must_get_form, parse_html_document,
        },
        transaction::{NewTransaction, TransactionKind, create_transaction},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    #[tokio::test]
    async fn edit_page_pre_fills_form() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
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
        let transaction = create_transaction(
            NewTransaction {
                user_id,
                account_id: account.id,
                kind: TransactionKind::Expense,
                amount: 12.5,
                category: "food".to_owned(),
                description: "Lunch".to_owned(),
                date: date!(2025 - 06 - 15),
            },
            &connection,
        )
        .unwrap();
        let state = EditTransactionPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_edit_transaction_page(State(state), Extension(user_id), Path(transaction.id))
                .await
                .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "amount", "number", "12.5");
        assert_form_input_with_value(&form, "date", "date", "2025-06-15");

        let selected_category_selector =
            scraper::Selector::parse("select[name=category] option[selected]").unwrap();
        let selected = form
            .select(&selected_category_selector)
            .next()
            .expect("want a selected category option");
        assert_eq!(selected.value().attr("value"), Some("food"));
    }

    #[tokio::test]
    async fn edit_page_rejects_foreign_transaction() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
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
        let transaction = create_transaction(
            NewTransaction {
                user_id: other_user_id,
                account_id: account.id,
                kind: TransactionKind::Expense,
                amount: 5.0,
                category: "food".to_owned(),
                description: String::new(),
                date: date!(2025 - 06 - 15),
            },
            &connection,
        )
        .unwrap();
        let state = EditTransactionPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result =
            get_edit_transaction_page(State(state), Extension(user_id), Path(transaction.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
