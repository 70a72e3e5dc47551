//! Defines the endpoint for updating a salary record.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::assert_account_owned,
    auth::UserID,
    database_id::SalaryId,
    endpoints,
    salary::{create_endpoint::SalaryForm, validate_payment_day},
};

/// The state needed to edit a salary record.
#[derive(Debug, Clone)]
pub struct EditSalaryState {
    /// The database connection for managing salary records.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditSalaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a salary record, redirects to the salary
/// view on success.
pub async fn edit_salary_endpoint(
    State(state): State<EditSalaryState>,
    Extension(user_id): Extension<UserID>,
    Path(salary_id): Path<SalaryId>,
    Form(form): Form<SalaryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_salary(salary_id, user_id, &form, &connection) {
        Ok(rows_affected) if rows_affected != 0 => (
            HxRedirect(endpoints::SALARIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Ok(_) => Error::UpdateMissingSalary.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not update salary {salary_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn update_salary(
    id: SalaryId,
    user_id: UserID,
    salary: &SalaryForm,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    if !(salary.amount > 0.0 && salary.amount.is_finite()) {
        return Err(Error::NonPositiveAmount(salary.amount));
    }
    validate_payment_day(salary.payment_day)?;
    assert_account_owned(salary.account_id, user_id, connection)?;

    connection
        .execute(
            "UPDATE salary
        SET \
            account_id = ?1, \
            amount = ?2, \
            payment_day = ?3 \
        WHERE id = ?4 AND user_id = ?5;",
            params![
                salary.account_id,
                salary.amount,
                salary.payment_day,
                id,
                user_id.as_i64(),
            ],
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        endpoints,
        salary::{SalaryForm, create_salary, get_salary},
        test_utils::{assert_hx_redirect, insert_test_user},
    };

    use super::{EditSalaryState, edit_salary_endpoint};

    #[tokio::test]
    async fn can_update_salary() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let salary = create_salary(
            &SalaryForm {
                account_id: account.id,
                amount: 5000.0,
                payment_day: 15,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let state = EditSalaryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = SalaryForm {
            account_id: account.id,
            amount: 5500.0,
            payment_day: 28,
        };

        let response = edit_salary_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(salary.id),
            Form(form),
        )
        .await;

        assert_hx_redirect(&response, endpoints::SALARIES_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let got_salary = get_salary(salary.id, user_id, &connection).unwrap();
        assert_eq!(got_salary.amount, 5500.0);
        assert_eq!(got_salary.payment_day, 28);
    }

    #[tokio::test]
    async fn cannot_update_another_users_salary() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        let their_account = create_account(
            &AccountForm {
                name: "Theirs".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            other_user_id,
            &conn,
        )
        .unwrap();
        let my_account = create_account(
            &AccountForm {
                name: "Mine".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let salary = create_salary(
            &SalaryForm {
                account_id: their_account.id,
                amount: 5000.0,
                payment_day: 15,
            },
            other_user_id,
            &conn,
        )
        .unwrap();
        let state = EditSalaryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = SalaryForm {
            account_id: my_account.id,
            amount: 1.0,
            payment_day: 1,
        };

        let response = edit_salary_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(salary.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        let got_salary = get_salary(salary.id, other_user_id, &connection).unwrap();
        assert_eq!(got_salary.amount, 5000.0);
    }
}
