//! Displays the user's accounts and their balances.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{get_accounts, get_total_account_balance},
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the [get_accounts_page](crate::account::get_accounts_page) route handler.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The account data to display in the view
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    name: String,
    kind_label: &'static str,
    balance: f64,
    created_on: Date,
    edit_url: String,
    delete_url: String,
}

fn accounts_view(accounts: &[AccountTableRow], total_balance: f64) -> Markup {
    let create_account_page_url = endpoints::NEW_ACCOUNT_VIEW;
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &AccountTableRow| {
        let balance_str = format_currency(account.balance);
        let action_links = edit_delete_action_links(
            &account.edit_url,
            &account.delete_url,
            &format!(
                "Are you sure you want to delete the account '{}'? This cannot be undone.",
                account.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (account.kind_label)
                }

                td class="px-6 py-4 text-right"
                {
                    (balance_str)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(account.created_on) { (account.created_on) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "Add Account"
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Type"
                                }
                                th scope="col" class="px-6 py-3 text-right"
                                {
                                    "Balance"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Created"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(create_account_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }

                        @if !accounts.is_empty() {
                            tfoot
                            {
                                tr class="font-semibold text-gray-900 dark:text-white"
                                {
                                    th scope="row" class=(TABLE_CELL_STYLE) { "Total" }
                                    td class=(TABLE_CELL_STYLE) {}
                                    td class="px-6 py-3 text-right" { (format_currency(total_balance)) }
                                    td class=(TABLE_CELL_STYLE) {}
                                    td class=(TABLE_CELL_STYLE) {}
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

/// Renders the accounts page showing all of the user's accounts.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts: Vec<AccountTableRow> = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?
        .into_iter()
        .map(|account| AccountTableRow {
            name: account.name,
            kind_label: account.kind.label(),
            balance: account.balance,
            created_on: account.created_at.date(),
            edit_url: format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id),
            delete_url: format_endpoint(endpoints::ACCOUNT, account.id),
        })
        .collect();

    let total_balance = get_total_account_balance(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get total balance: {error}"))?;

    Ok(accounts_view(&accounts, total_balance).into_response())
}
