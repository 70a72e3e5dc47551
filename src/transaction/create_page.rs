//! Defines the route handler for the page for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    account::{Account, get_accounts},
    auth::UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, dollar_input_styles,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{CATEGORIES, Transaction, TransactionKind},
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for listing the user's accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The shared form body for creating and editing a transaction.
///
/// `transaction` pre-fills the fields when editing. `default_date` is used
/// for new transactions. The caller wraps this in a form element with the
/// appropriate htmx attributes.
pub(super) fn transaction_form_fields(
    accounts: &[Account],
    transaction: Option<&Transaction>,
    default_date: Date,
    submit_label: &str,
) -> Markup {
    let selected_account = transaction.map(|transaction| transaction.account_id);
    let selected_kind = transaction
        .map(|transaction| transaction.kind)
        .unwrap_or(TransactionKind::Expense);
    let selected_category = transaction.map(|transaction| transaction.category.as_str());
    let amount = transaction.map(|transaction| transaction.amount);
    let description = transaction
        .map(|transaction| transaction.description.as_str())
        .unwrap_or("");
    let date = transaction
        .map(|transaction| transaction.date)
        .unwrap_or(default_date);

    html!(
        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select name="account_id" id="account_id" class=(FORM_SELECT_STYLE) required
            {
                @for account in accounts {
                    option
                        value=(account.id)
                        selected[selected_account == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }

        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for kind in TransactionKind::ALL {
                    div class="flex items-center"
                    {
                        input
                            type="radio"
                            name="kind"
                            id=(kind.as_str())
                            value=(kind.as_str())
                            class=(FORM_RADIO_INPUT_STYLE)
                            checked[kind == selected_kind];

                        label for=(kind.as_str()) class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (kind.label())
                        }
                    }
                }
            }
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name="amount"
                    id="amount"
                    min="0.01"
                    step="0.01"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=[amount];
            }
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            select name="category" id="category" class=(FORM_SELECT_STYLE) required
            {
                @for kind in TransactionKind::ALL {
                    optgroup label=(kind.label())
                    {
                        @for category in CATEGORIES.iter().filter(|category| category.kind == kind) {
                            option
                                value=(category.id)
                                selected[selected_category == Some(category.id)]
                            {
                                (category.label)
                            }
                        }
                    }
                }
            }
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                type="text"
                name="description"
                id="description"
                placeholder="e.g. Groceries at the corner store"
                class=(FORM_TEXT_INPUT_STYLE)
                value=(description);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                type="date"
                name="date"
                id="date"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(date);
        }

        button type="submit" class=(BUTTON_PRIMARY_STYLE)
        {
            (submit_label)
        }
    )
}

/// Renders the page for recording a transaction.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Transaction" }

            @if accounts.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "You need an account before you can record a transaction. Create one "
                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "here" }
                    "."
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSACTIONS_API)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4"
                {
                    (transaction_form_fields(&accounts, None, today, "Record Transaction"))
                }
            }
        }
    );

    Ok(base("New Transaction", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;

    use crate::{
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            insert_test_user, must_get_form, parse_html_document,
        },
    };

    use super::{CreateTransactionPageState, get_create_transaction_page};

    fn get_test_state() -> (CreateTransactionPageState, crate::auth::UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");

        (
            CreateTransactionPageState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn new_transaction_page_returns_form() {
        let (state, user_id) = get_test_state();
        create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_create_transaction_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");
        assert_form_submit_button(&form);

        let account_option_selector =
            scraper::Selector::parse("select[name=account_id] option").unwrap();
        let options = form.select(&account_option_selector).collect::<Vec<_>>();
        assert_eq!(options.len(), 1, "want 1 account option, got {}", options.len());

        let category_select_selector = scraper::Selector::parse("select[name=category]").unwrap();
        assert!(
            form.select(&category_select_selector).next().is_some(),
            "want a category select"
        );
    }

    #[tokio::test]
    async fn new_transaction_page_without_accounts_prompts_for_account() {
        let (state, user_id) = get_test_state();

        let response = get_create_transaction_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        assert!(
            document.select(&form_selector).next().is_none(),
            "want no form without accounts"
        );

        let link_selector = scraper::Selector::parse("main a[href]").unwrap();
        let link = document
            .select(&link_selector)
            .next()
            .expect("want a link to the new account page");
        assert_eq!(link.value().attr("href"), Some(endpoints::NEW_ACCOUNT_VIEW));
    }
}
