//! Defines the core data model and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::{AccountId, TransactionId},
};

/// Whether a transaction adds money to an account or takes money out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Both transaction kinds, in the order they appear in forms.
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Income, TransactionKind::Expense];

    /// The identifier stored in the database and used in form values.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The human readable label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// The delta this transaction applies to its account's balance.
    ///
    /// `amount` is always positive; income counts towards the balance and
    /// expense counts against it.
    pub fn signed_amount(&self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind {other}").into(),
            )),
        }
    }
}

/// A fixed category a transaction can be filed under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Category {
    /// The identifier stored on the transaction row.
    pub id: &'static str,
    /// The human readable label shown in the UI.
    pub label: &'static str,
    /// Which transaction kind the category applies to.
    pub kind: TransactionKind,
}

/// The categories a transaction can be filed under, income categories first.
pub const CATEGORIES: [Category; 12] = [
    Category {
        id: "salary",
        label: "Salary",
        kind: TransactionKind::Income,
    },
    Category {
        id: "investment",
        label: "Investment Income",
        kind: TransactionKind::Income,
    },
    Category {
        id: "other_income",
        label: "Other Income",
        kind: TransactionKind::Income,
    },
    Category {
        id: "food",
        label: "Food",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "transportation",
        label: "Transportation",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "rent",
        label: "Rent",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "utilities",
        label: "Utilities",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "entertainment",
        label: "Entertainment",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "shopping",
        label: "Shopping",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "health",
        label: "Health",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "education",
        label: "Education",
        kind: TransactionKind::Expense,
    },
    Category {
        id: "other_expense",
        label: "Other Expenses",
        kind: TransactionKind::Expense,
    },
];

/// The label for a category ID, falling back to the raw ID for values that
/// are no longer in [CATEGORIES].
pub fn category_label(category_id: &str) -> &str {
    CATEGORIES
        .iter()
        .find(|category| category.id == category_id)
        .map(|category| category.label)
        .unwrap_or(category_id)
}

/// An expense or income, i.e. an event where money was either spent or earned
/// on one of the user's accounts.
///
/// Transactions are only created, updated and deleted through the reconciler
/// functions in [crate::transaction], which keep the referenced account's
/// balance in step with the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the account the transaction happened on.
    pub account_id: AccountId,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money, always positive.
    pub amount: f64,
    /// The category the transaction is filed under.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // Composite index used by the transactions page and the dashboard.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, account_id, kind, amount, category, description, date, created_at";

/// Retrieve the transaction `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's
///   transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_one(
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
            ),
            params![id, user_id.as_i64()],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// A transaction joined with the name of the account it happened on, for
/// display in listing views.
#[derive(Debug, PartialEq)]
pub(crate) struct TransactionWithAccount {
    pub(crate) transaction: Transaction,
    pub(crate) account_name: String,
}

/// Retrieve all of a user's transactions with their account names, most
/// recent date first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub(crate) fn get_transactions_with_account(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionWithAccount>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.account_id, t.kind, t.amount, t.category, t.description, t.date,
                    t.created_at, a.name
             FROM \"transaction\" t
             INNER JOIN account a ON a.id = t.account_id
             WHERE t.user_id = :user_id
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(TransactionWithAccount {
                transaction: map_transaction_row(row)?,
                account_name: row.get(8)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}
