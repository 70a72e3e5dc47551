//! Displays the user's transactions.

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
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::{
        TransactionKind, category_label, core::get_transactions_with_account,
    },
};

/// The state needed for the [get_transactions_page](crate::transaction::get_transactions_page) route handler.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The transaction data to display in the view
#[derive(Debug, PartialEq)]
struct TransactionTableRow {
    date: Date,
    account_name: String,
    description: String,
    category_label: String,
    kind: TransactionKind,
    amount: f64,
    edit_url: String,
    delete_url: String,
}

fn transactions_view(transactions: &[TransactionTableRow]) -> Markup {
    let create_transaction_page_url = endpoints::NEW_TRANSACTION_VIEW;
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let amount_cell = |row: &TransactionTableRow| {
        let (sign, style) = match row.kind {
            TransactionKind::Income => ("+", "text-green-600 dark:text-green-400 font-medium"),
            TransactionKind::Expense => ("-", "text-red-600 dark:text-red-400 font-medium"),
        };

        html!(
            span class=(style)
            {
                (sign) (format_currency(row.amount))
            }
        )
    };

    let table_row = |row: &TransactionTableRow| {
        let action_links = edit_delete_action_links(
            &row.edit_url,
            &row.delete_url,
            "Are you sure you want to delete this transaction? \
            Its effect on the account balance will be reversed.",
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(row.date) { (row.date) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.account_name)
                }

                td class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (row.description)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.category_label)
                }

                td class="px-6 py-4 text-right"
                {
                    (amount_cell(row))
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
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(create_transaction_page_url) class=(LINK_STYLE)
                    {
                        "Add Transaction"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in transactions {
                                (table_row(row))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions recorded yet. Record one "
                                        a href=(create_transaction_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

/// Renders the transactions page listing all of the user's transactions.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions: Vec<TransactionTableRow> = get_transactions_with_account(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
        .into_iter()
        .map(|row| TransactionTableRow {
            date: row.transaction.date,
            account_name: row.account_name,
            description: row.transaction.description.clone(),
            category_label: category_label(&row.transaction.category).to_owned(),
            kind: row.transaction.kind,
            amount: row.transaction.amount,
            edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.transaction.id),
            delete_url: format_endpoint(endpoints::TRANSACTION, row.transaction.id),
        })
        .collect();

    Ok(transactions_view(&transactions).into_response())
}
