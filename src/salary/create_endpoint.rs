//! Defines the endpoint for creating a new salary record.
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
    account::assert_account_owned,
    auth::UserID,
    database_id::AccountId,
    endpoints,
    salary::{Salary, validate_payment_day},
};

/// The state needed to create a salary record.
#[derive(Debug, Clone)]
pub struct CreateSalaryState {
    /// The database connection for managing salary records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSalaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or editing a salary record.
#[derive(Debug, Deserialize)]
pub struct SalaryForm {
    /// The account the salary is paid into.
    pub account_id: AccountId,
    /// The amount deposited each month, in dollars.
    pub amount: f64,
    /// The day of the month the deposit lands on.
    pub payment_day: u8,
}

/// A route handler for creating a new salary record, redirects to the salary
/// view on success.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn create_salary_endpoint(
    State(state): State<CreateSalaryState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SalaryForm>,
) -> impl IntoResponse {
    let connection = state.db_connection.lock().unwrap();

    if let Err(error) = create_salary(&form, user_id, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::SALARIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

pub fn create_salary(
    form: &SalaryForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Salary, Error> {
    if !(form.amount > 0.0 && form.amount.is_finite()) {
        return Err(Error::NonPositiveAmount(form.amount));
    }
    validate_payment_day(form.payment_day)?;
    assert_account_owned(form.account_id, user_id, connection)?;

    let created_at = OffsetDateTime::now_utc();
    connection.execute(
        "INSERT INTO salary (user_id, account_id, amount, payment_day, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id.as_i64(),
            form.account_id,
            form.amount,
            form.payment_day,
            created_at,
        ],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Salary {
        id,
        account_id: form.account_id,
        amount: form.amount,
        payment_day: form.payment_day,
        created_at,
    })
}
