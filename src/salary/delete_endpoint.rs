//! Defines the endpoint for deleting a salary record.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error, alert::AlertTemplate, auth::UserID, database_id::SalaryId,
    shared_templates::render,
};

/// The state needed to delete a salary record.
#[derive(Debug, Clone)]
pub struct DeleteSalaryState {
    /// The database connection for managing salary records.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteSalaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a salary record, responds with an alert.
pub async fn delete_salary_endpoint(
    State(state): State<DeleteSalaryState>,
    Extension(user_id): Extension<UserID>,
    Path(salary_id): Path<SalaryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_salary(salary_id, user_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(rows_affected) if rows_affected != 0 => render(
            StatusCode::OK,
            AlertTemplate::success("Salary deleted successfully", "").into_markup(),
        ),
        Ok(_) => Error::DeleteMissingSalary.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete salary {salary_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

fn delete_salary(
    id: SalaryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM salary WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
        )
        .map_err(Error::from)
}
