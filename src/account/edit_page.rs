//! Defines the route handler for the page for editing an account.

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
    account::{create_page::account_form_fields, get_account},
    auth::UserID,
    database_id::AccountId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
};

/// The state needed to render the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an account.
///
/// Edits to the balance here are manual adjustments: they update the stored
/// balance directly and are not recorded in the transaction ledger.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection)?;

    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::ACCOUNT, account_id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Account" }

            form
                hx-put=(edit_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (account_form_fields(Some(&account), "Save Changes"))
            }
        }
    );

    Ok(base("Edit Account", &[dollar_input_styles()], &content).into_response())
}
