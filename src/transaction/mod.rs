//! Transaction management for the finance tracking application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its database queries
//! - The reconciler, which applies and reverses balance deltas on the
//!   referenced accounts inside a single database transaction
//! - View handlers for transaction-related web pages

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod reconciler;
mod transactions_page;

pub use core::{
    CATEGORIES, Category, Transaction, TransactionKind, category_label, create_transaction_table,
    get_transaction, map_transaction_row,
};
pub(crate) use core::{TransactionWithAccount, get_transactions_with_account};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use reconciler::{NewTransaction, TransactionUpdate, create_transaction, delete_transaction, update_transaction};
pub use transactions_page::get_transactions_page;
