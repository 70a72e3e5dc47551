//! Account management: the `Account` model, its database queries, and the
//! pages and endpoints for listing, creating, editing and deleting accounts.

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountKind, assert_account_owned, create_account_table, get_account, get_accounts,
    get_total_account_balance, map_row_to_account,
};
pub use create_endpoint::create_account_endpoint;
pub use create_page::get_create_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use edit_page::get_edit_account_page;

#[cfg(test)]
pub use create_endpoint::{AccountForm, create_account};
