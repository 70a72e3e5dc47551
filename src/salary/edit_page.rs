//! Defines the route handler for the page for editing a salary record.

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
    database_id::SalaryId,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    salary::{create_page::salary_form_fields, get_salary},
};

/// The state needed to render the edit salary page.
#[derive(Debug, Clone)]
pub struct EditSalaryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditSalaryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a salary record.
pub async fn get_edit_salary_page(
    State(state): State<EditSalaryPageState>,
    Extension(user_id): Extension<UserID>,
    Path(salary_id): Path<SalaryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let salary = get_salary(salary_id, user_id, &connection)?;
    let accounts = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;

    let nav_bar = NavBar::new(endpoints::SALARIES_VIEW).into_html();
    let edit_url = format_endpoint(endpoints::SALARY, salary_id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold py-4" { "Edit Salary" }

            form
                hx-put=(edit_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (salary_form_fields(&accounts, Some(&salary), "Save Changes"))
            }
        }
    );

    Ok(base("Edit Salary", &[dollar_input_styles()], &content).into_response())
}
