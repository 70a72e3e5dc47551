//! Keeps account balances consistent with the transaction ledger.
//!
//! Every balance-affecting mutation flows through the three functions in this
//! module. Each one runs inside a single SQLite transaction: the balance
//! delta on the referenced account and the write to the ledger commit or roll
//! back together, so a failure partway through an update can never leave a
//! balance silently wrong.
//!
//! The invariant maintained here is that an account's balance always equals
//! its opening balance plus the sum of signed amounts of the transactions
//! currently referencing it.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior, params};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::assert_account_owned,
    auth::UserID,
    database_id::{AccountId, TransactionId},
    transaction::{Transaction, TransactionKind, get_transaction},
};

/// The data needed to record a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The owner of the transaction.
    pub user_id: UserID,
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money, which must be positive.
    pub amount: f64,
    /// The category the transaction is filed under.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
}

/// The replacement values for an existing transaction.
///
/// The account may differ from the transaction's current account, in which
/// case the old account's balance is restored and the new account's balance
/// adjusted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// The account the money moves in or out of.
    pub account_id: AccountId,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money, which must be positive.
    pub amount: f64,
    /// The category the transaction is filed under.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount > 0.0 && amount.is_finite() {
        Ok(())
    } else {
        Err(Error::NonPositiveAmount(amount))
    }
}

fn apply_balance_delta(
    account_id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
        params![delta, account_id],
    )?;

    Ok(())
}

/// Record a new transaction and apply its delta to the referenced account's
/// balance.
///
/// Both writes happen inside one database transaction: either the ledger row
/// and the balance change both commit, or neither does.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero, negative or not finite,
/// - [Error::InvalidAccount] if the account does not exist or belongs to
///   another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(new.amount)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    assert_account_owned(new.account_id, new.user_id, &sql_transaction)?;
    apply_balance_delta(
        new.account_id,
        new.kind.signed_amount(new.amount),
        &sql_transaction,
    )?;

    let created_at = OffsetDateTime::now_utc();
    sql_transaction.execute(
        "INSERT INTO \"transaction\"
            (user_id, account_id, kind, amount, category, description, date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.user_id.as_i64(),
            new.account_id,
            new.kind,
            new.amount,
            new.category,
            new.description,
            new.date,
            created_at,
        ],
    )?;
    let id = sql_transaction.last_insert_rowid();

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        account_id: new.account_id,
        kind: new.kind,
        amount: new.amount,
        category: new.category,
        description: new.description,
        date: new.date,
        created_at,
    })
}

/// Replace the transaction `id` with `update`, reversing the old delta and
/// applying the new one.
///
/// The old delta is reversed on the transaction's current account and the new
/// delta applied on `update.account_id`, which may be a different account.
/// The two balance changes and the row update are atomic as a unit: a failure
/// at any step (e.g. the new account belongs to another user) rolls the whole
/// operation back.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the new amount is zero, negative or not
///   finite,
/// - [Error::UpdateMissingTransaction] if the transaction does not exist or
///   belongs to another user,
/// - [Error::InvalidAccount] if the new account does not exist or belongs to
///   another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(update.amount)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let old = get_transaction(id, user_id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;

    apply_balance_delta(
        old.account_id,
        -old.kind.signed_amount(old.amount),
        &sql_transaction,
    )?;

    assert_account_owned(update.account_id, user_id, &sql_transaction)?;
    apply_balance_delta(
        update.account_id,
        update.kind.signed_amount(update.amount),
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "UPDATE \"transaction\"
         SET account_id = ?1, kind = ?2, amount = ?3, category = ?4, description = ?5, date = ?6
         WHERE id = ?7 AND user_id = ?8",
        params![
            update.account_id,
            update.kind,
            update.amount,
            update.category,
            update.description,
            update.date,
            id,
            user_id.as_i64(),
        ],
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        account_id: update.account_id,
        kind: update.kind,
        amount: update.amount,
        category: update.category,
        description: update.description,
        date: update.date,
        created_at: old.created_at,
    })
}

/// Delete the transaction `id`, reversing its delta on the referenced
/// account's balance.
///
/// The balance change and the row deletion are atomic as a unit.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the transaction does not exist or
///   belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let old = get_transaction(id, user_id, &sql_transaction).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingTransaction,
        error => error,
    })?;

    apply_balance_delta(
        old.account_id,
        -old.kind.signed_amount(old.amount),
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    sql_transaction.commit()?;

    Ok(())
}
