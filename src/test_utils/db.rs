use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::auth::{PasswordHash, UserID, create_user};

/// Insert a user with `email` and return their ID.
///
/// The database schema must already be initialized.
#[track_caller]
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    let user = create_user(
        EmailAddress::from_str(email).expect("invalid test email"),
        "Test User",
        PasswordHash::new_unchecked("hunter2"),
        connection,
    )
    .expect("could not insert test user");

    user.id
}
