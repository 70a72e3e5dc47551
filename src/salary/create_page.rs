//! Defines the route handler for the page for creating a salary record.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_accounts},
    auth::UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, dollar_input_styles,
    },
    navigation::NavBar,
    salary::Salary,
};

/// The state needed for the new salary page.
#[derive(Debug, Clone)]
pub struct CreateSalaryPageState {
    /// The database connection for listing the user's accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSalaryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The shared form body for creating and editing a salary record.
///
/// `salary` pre-fills the fields when editing. The caller wraps this in a
/// form element with the appropriate htmx attributes.
pub(super) fn salary_form_fields(
    accounts: &[Account],
    salary: Option<&Salary>,
    submit_label: &str,
) -> Markup {
    let selected_account = salary.map(|salary| salary.account_id);
    let amount = salary.map(|salary| salary.amount);
    let payment_day = salary.map(|salary| salary.payment_day).unwrap_or(1);

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
            label for="payment_day" class=(FORM_LABEL_STYLE) { "Payment Day" }

            input
                type="number"
                name="payment_day"
                id="payment_day"
                min="1"
                max="31"
                step="1"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(payment_day);

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "In months shorter than this day the deposit falls on the last day of the month."
            }
        }

        button type="submit" class=(BUTTON_PRIMARY_STYLE)
        {
            (submit_label)
        }
    )
}

/// Renders the page for creating a salary record.
pub async fn get_create_salary_page(
    State(state): State<CreateSalaryPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::NEW_SALARY_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "New Salary" }

            @if accounts.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "You need an account before you can set up a salary. Create one "
                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "here" }
                    "."
                }
            } @else {
                form
                    hx-post=(endpoints::SALARIES_API)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4"
                {
                    (salary_form_fields(&accounts, None, "Create Salary"))
                }
            }
        }
    );

    Ok(base("New Salary", &[dollar_input_styles()], &content).into_response())
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

    use super::{CreateSalaryPageState, get_create_salary_page};

    #[tokio::test]
    async fn new_salary_page_returns_form() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let state = CreateSalaryPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_create_salary_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::SALARIES_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "payment_day", "number");
        assert_form_submit_button(&form);
    }
}
