//! Recurring salary deposits: the `Salary` model, the payment-day to
//! concrete-date mapping, and the pages and endpoints for managing salary
//! records.
//!
//! A salary record is declarative: it says that `amount` should land in
//! `account_id` on `payment_day` of each month. The engine that would post
//! the deposits on schedule is out of scope; the date mapping lives here so
//! the UI can show when the next deposit is due.

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod salaries_page;

pub use core::{
    Salary, create_salary_table, get_salary, map_row_to_salary, next_payment_date,
    payment_date_in, validate_payment_day,
};
pub use create_endpoint::create_salary_endpoint;
pub use create_page::get_create_salary_page;
pub use delete_endpoint::delete_salary_endpoint;
pub use edit_endpoint::edit_salary_endpoint;
pub use edit_page::get_edit_salary_page;
pub use salaries_page::get_salaries_page;

#[cfg(test)]
pub use create_endpoint::{SalaryForm, create_salary};
