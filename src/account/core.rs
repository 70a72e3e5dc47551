//! Defines the core data model and database queries for accounts.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserID, database_id::AccountId};

/// What kind of money container an account is.
///
/// The kind is purely informational: it does not change how balances are
/// reconciled, only how the account is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Cash,
    Bank,
    Credit,
    Investment,
}

impl AccountKind {
    /// All account kinds, in the order they appear in forms.
    pub const ALL: [AccountKind; 4] = [
        AccountKind::Cash,
        AccountKind::Bank,
        AccountKind::Credit,
        AccountKind::Investment,
    ];

    /// The identifier stored in the database and used in form values.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Cash => "cash",
            AccountKind::Bank => "bank",
            AccountKind::Credit => "credit",
            AccountKind::Investment => "investment",
        }
    }

    /// The human readable label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Cash => "Cash",
            AccountKind::Bank => "Bank",
            AccountKind::Credit => "Credit Card",
            AccountKind::Investment => "Investment",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "cash" => Ok(AccountKind::Cash),
            "bank" => Ok(AccountKind::Bank),
            "credit" => Ok(AccountKind::Credit),
            "investment" => Ok(AccountKind::Investment),
            other => Err(FromSqlError::Other(
                format!("unknown account kind {other}").into(),
            )),
        }
    }
}

/// A named container of money owned by one user, e.g. a bank account or a
/// wallet of cash.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The name of the account.
    pub name: String,
    /// The kind of account.
    pub kind: AccountKind,
    /// The current balance.
    ///
    /// Outside of manual edits on the account page, the balance is only
    /// changed through the reconciler in [crate::transaction], which keeps it
    /// equal to the opening balance plus the net effect of the account's
    /// transactions.
    pub balance: f64,
    /// When the account was created.
    pub created_at: OffsetDateTime,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance REAL NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        balance: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Get the account `account_id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user, or [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_one(
            "SELECT id, name, kind, balance, created_at FROM account
             WHERE id = ?1 AND user_id = ?2",
            params![account_id, user_id.as_i64()],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get all accounts belonging to `user_id`, ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, balance, created_at FROM account
             WHERE user_id = :user_id ORDER BY name ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// Get the total balance across all of a user's accounts.
///
/// # Errors
/// Returns [Error::SqlError] if the SQL query preparation or execution fails.
pub fn get_total_account_balance(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let total = connection
        .prepare("SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = :user_id")?
        .query_one(&[(":user_id", &user_id.as_i64())], |row| row.get(0))?;

    Ok(total)
}

/// Check that the account `account_id` exists and belongs to `user_id`.
///
/// # Errors
/// Returns [Error::InvalidAccount] if it does not. Accounts belonging to
/// other users are reported the same way as missing accounts.
pub fn assert_account_owned(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let account_exists = connection
        .prepare("SELECT EXISTS (SELECT 1 FROM account WHERE id = ?1 AND user_id = ?2)")?
        .query_one(params![account_id, user_id.as_i64()], |row| {
            row.get::<_, bool>(0)
        })?;

    if account_exists {
        Ok(())
    } else {
        Err(Error::InvalidAccount(account_id))
    }
}

/// Count the transactions and salary records that reference the account
/// `account_id`.
///
/// Used to enforce the restrict policy on account deletion.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub(crate) fn count_account_references(
    account_id: AccountId,
    connection: &Connection,
) -> Result<i64, Error> {
    let count = connection
        .prepare(
            "SELECT (SELECT COUNT(id) FROM \"transaction\" WHERE account_id = ?1)
                  + (SELECT COUNT(id) FROM salary WHERE account_id = ?1)",
        )?
        .query_one(params![account_id], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use crate::auth::create_user_table;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}

#[cfg(test)]
mod account_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{AccountForm, AccountKind, create_account},
        auth::UserID,
        db::initialize,
        test_utils::insert_test_user,
    };

    use super::{
        assert_account_owned, count_account_references, get_account, get_accounts,
        get_total_account_balance,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn must_create_account(name: &str, balance: f64, user_id: UserID, conn: &Connection) {
        create_account(
            &AccountForm {
                name: name.to_owned(),
                kind: AccountKind::Bank,
                balance,
            },
            user_id,
            conn,
        )
        .expect("could not create test account");
    }

    #[test]
    fn total_balance_sums_only_the_users_accounts() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        must_create_account("Checking", 100.50, user_id, &conn);
        must_create_account("Savings", 250.25, user_id, &conn);
        must_create_account("Checking", 999.99, other_user_id, &conn);

        let total = get_total_account_balance(user_id, &conn).unwrap();

        assert_eq!(350.75, total);
    }

    #[test]
    fn total_balance_is_zero_without_accounts() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");

        let total = get_total_account_balance(user_id, &conn).unwrap();

        assert_eq!(0.0, total);
    }

    #[test]
    fn get_accounts_excludes_other_users() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        must_create_account("Checking", 100.0, user_id, &conn);
        must_create_account("Wallet", 999.0, other_user_id, &conn);

        let accounts = get_accounts(user_id, &conn).unwrap();

        assert_eq!(1, accounts.len());
        assert_eq!("Checking", accounts[0].name);
    }

    #[test]
    fn get_account_fails_for_other_users_account() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        must_create_account("Checking", 100.0, other_user_id, &conn);

        let result = get_account(1, user_id, &conn);

        assert_eq!(Err(Error::NotFound), result);
    }

    #[test]
    fn assert_account_owned_rejects_foreign_account() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let other_user_id = insert_test_user(&conn, "someone@else.com");
        must_create_account("Checking", 100.0, other_user_id, &conn);

        assert_eq!(Ok(()), assert_account_owned(1, other_user_id, &conn));
        assert_eq!(
            Err(Error::InvalidAccount(1)),
            assert_account_owned(1, user_id, &conn)
        );
    }

    #[test]
    fn count_references_is_zero_for_fresh_account() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        must_create_account("Checking", 100.0, user_id, &conn);

        assert_eq!(Ok(0), count_account_references(1, &conn));
    }
}
