//! FinTrack is a web app for tracking your personal finances: bank and cash
//! accounts, income and expense transactions, and recurring salary deposits.
//!
//! This library provides a REST API that directly serves HTML pages.
//! Account balances are kept consistent with the transaction ledger by the
//! reconciler in [crate::transaction], which applies and reverses signed
//! balance deltas inside a single database transaction.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod profile;
mod routing;
mod salary;
mod shared_templates;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;

use crate::{
    alert::AlertTemplate,
    database_id::AccountId,
    internal_server_error::render_internal_server_error,
    not_found::get_404_not_found_response,
    shared_templates::render,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The session token cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar :(")]
    CookieMissing,

    /// The session token could not be parsed or its expiry could not be
    /// extended.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not read or update the session token: {0}")]
    InvalidToken(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A string that is not a valid email address was used to register or log
    /// in.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The email used to register already belongs to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The account ID on a transaction or salary record did not match an
    /// account owned by the user.
    #[error("the account ID {0} does not refer to one of your accounts")]
    InvalidAccount(AccountId),

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// Tried to delete an account that transactions or salaries still
    /// reference.
    #[error("the account \"{0}\" still has transactions or salaries attached to it")]
    AccountInUse(String),

    /// A zero or negative amount was used for a transaction or salary.
    ///
    /// Amounts are always positive; whether they are added to or subtracted
    /// from an account balance is determined by the income/expense kind.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(f64),

    /// A salary payment day outside the range 1-31 was provided.
    #[error("{0} is not a valid payment day, it must be between 1 and 31")]
    InvalidPaymentDay(u8),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows. Rows
    /// owned by another user are reported as not found so that handlers do
    /// not leak which IDs exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete a salary record that does not exist
    #[error("tried to delete a salary that is not in the database")]
    DeleteMissingSalary,

    /// Tried to update a salary record that does not exist
    #[error("tried to update a salary that is not in the database")]
    UpdateMissingSalary,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => render_internal_server_error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                ),
            ),
            Error::DatabaseLockError => render_internal_server_error(
                "Sorry, something went wrong.",
                "Try again later or check the server logs",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                )
                .into_markup(),
            ),
            Error::InvalidAccount(account_id) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid account",
                    &format!("Could not find one of your accounts with the ID {account_id}"),
                )
                .into_markup(),
            ),
            Error::NonPositiveAmount(amount) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid amount",
                    &format!("{amount} is not a positive amount. Enter an amount greater than zero."),
                )
                .into_markup(),
            ),
            Error::InvalidPaymentDay(day) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid payment day",
                    &format!("{day} is not a valid payment day. Choose a day between 1 and 31."),
                )
                .into_markup(),
            ),
            Error::UpdateMissingTransaction => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not update transaction",
                    "The transaction could not be found.",
                )
                .into_markup(),
            ),
            Error::DeleteMissingTransaction => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete transaction",
                    "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted.",
                )
                .into_markup(),
            ),
            Error::UpdateMissingAccount => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not update account",
                    "The account could not be found.",
                )
                .into_markup(),
            ),
            Error::DeleteMissingAccount => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete account",
                    "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted.",
                )
                .into_markup(),
            ),
            Error::UpdateMissingSalary => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not update salary",
                    "The salary record could not be found.",
                )
                .into_markup(),
            ),
            Error::DeleteMissingSalary => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Could not delete salary",
                    "The salary record could not be found. \
                    Try refreshing the page to see if it has already been deleted.",
                )
                .into_markup(),
            ),
            Error::DuplicateAccountName(name) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Duplicate Account Name",
                    &format!(
                        "The account {name} already exists. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                )
                .into_markup(),
            ),
            Error::AccountInUse(name) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Account still in use",
                    &format!(
                        "The account {name} still has transactions or salary records attached to it. \
                        Delete or reassign them before deleting the account.",
                    ),
                )
                .into_markup(),
            ),
            _ => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_markup(),
            ),
        }
    }
}
