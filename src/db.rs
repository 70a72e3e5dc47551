//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, auth::create_user_table, salary::create_salary_table,
    transaction::create_transaction_table,
};

/// Create the tables for the application's domain models.
///
/// Table creation runs inside a single exclusive transaction so that a
/// partially created schema is never left behind.
///
/// # Errors
/// Returns an error if the database schema could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are off by default in SQLite and must be enabled per
    // connection, outside of a transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_salary_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
