//! Displays the user's recurring salary deposits.

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
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    salary::{core::get_salaries_with_account, next_payment_date},
    timezone::get_local_offset,
};

/// The state needed for the [get_salaries_page](crate::salary::get_salaries_page) route handler.
#[derive(Debug, Clone)]
pub struct SalariesPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SalariesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The salary data to display in the view
#[derive(Debug, PartialEq)]
struct SalaryTableRow {
    account_name: String,
    payment_day: u8,
    next_payment: Date,
    amount: f64,
    edit_url: String,
    delete_url: String,
}

fn salaries_view(salaries: &[SalaryTableRow]) -> Markup {
    let create_salary_page_url = endpoints::NEW_SALARY_VIEW;
    let nav_bar = NavBar::new(endpoints::SALARIES_VIEW).into_html();

    let table_row = |salary: &SalaryTableRow| {
        let action_links = edit_delete_action_links(
            &salary.edit_url,
            &salary.delete_url,
            "Are you sure you want to delete this salary? This cannot be undone.",
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
                    (salary.account_name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    "Day " (salary.payment_day) " of each month"
                }

                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(salary.next_payment) { (salary.next_payment) }
                }

                td class="px-6 py-4 text-right"
                {
                    (format_currency(salary.amount))
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
                    h1 class="text-xl font-bold" { "Salary" }

                    a href=(create_salary_page_url) class=(LINK_STYLE)
                    {
                        "Add Salary"
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payment Day" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Next Payment" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for salary in salaries {
                                (table_row(salary))
                            }

                            @if salaries.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No salary records yet. Add one "
                                        a href=(create_salary_page_url) class=(LINK_STYLE)
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

                section class="text-sm text-gray-500 dark:text-gray-400 space-y-2 lg:max-w-5xl"
                {
                    h2 class="text-base font-semibold text-gray-900 dark:text-white"
                    {
                        "How salary payments work"
                    }

                    p
                    {
                        "Each salary record describes a recurring deposit: the amount lands in the \
                        selected account on the payment day of every month. If a month is shorter \
                        than the payment day, the deposit falls on the last day of that month."
                    }
                }
            }
        }
    );

    base("Salary", &[], &content)
}

/// Renders the salary page listing all of the user's salary records.
pub async fn get_salaries_page(
    State(state): State<SalariesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let salaries: Vec<SalaryTableRow> = get_salaries_with_account(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get salaries: {error}"))?
        .into_iter()
        .map(|row| SalaryTableRow {
            account_name: row.account_name,
            payment_day: row.salary.payment_day,
            next_payment: next_payment_date(row.salary.payment_day, today),
            amount: row.salary.amount,
            edit_url: format_endpoint(endpoints::EDIT_SALARY_VIEW, row.salary.id),
            delete_url: format_endpoint(endpoints::SALARY, row.salary.id),
        })
        .collect();

    Ok(salaries_view(&salaries).into_response())
}

#[cfg(test)]
mod get_salaries_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        html::format_currency,
        salary::{SalaryForm, create_salary},
        test_utils::{assert_valid_html, insert_test_user, parse_html_document},
    };

    use super::{SalariesPageState, get_salaries_page};

    #[tokio::test]
    async fn lists_the_users_salaries() {
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
        create_salary(
            &SalaryForm {
                account_id: account.id,
                amount: 5250.0,
                payment_day: 15,
            },
            user_id,
            &connection,
        )
        .unwrap();
        let state = SalariesPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_salaries_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let table_selector = scraper::Selector::parse("table").unwrap();
        let table = html
            .select(&table_selector)
            .next()
            .expect("Could not find table in HTML");
        let text = table.text().collect::<String>();
        assert!(text.contains("Checking"));
        assert!(text.contains("Day 15 of each month"));
        assert!(text.contains(&format_currency(5250.0)));
    }

    #[tokio::test]
    async fn shows_empty_state_without_salaries() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = insert_test_user(&connection, "foo@bar.baz");
        let state = SalariesPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_salaries_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let body_text = html.root_element().text().collect::<String>();
        assert!(
            body_text.contains("No salary records yet"),
            "page should show the empty state message"
        );
    }
}
