//! Defines the core data model, date mapping and database queries for salary
//! records.

use rusqlite::{Connection, Row, params};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::{AccountId, SalaryId},
};

/// A recurring salary deposit: `amount` lands in `account_id` on
/// `payment_day` of each month.
#[derive(Debug, Clone, PartialEq)]
pub struct Salary {
    /// The ID of the salary record.
    pub id: SalaryId,
    /// The account the salary is paid into.
    pub account_id: AccountId,
    /// The amount deposited each month, always positive.
    pub amount: f64,
    /// The day of the month the deposit lands on, between 1 and 31.
    ///
    /// Months shorter than the payment day pay out on their last day, see
    /// [payment_date_in].
    pub payment_day: u8,
    /// When the salary record was created.
    pub created_at: OffsetDateTime,
}

/// Check that `payment_day` is a usable day of the month.
///
/// # Errors
/// Returns [Error::InvalidPaymentDay] if `payment_day` is outside 1-31.
pub fn validate_payment_day(payment_day: u8) -> Result<(), Error> {
    if (1..=31).contains(&payment_day) {
        Ok(())
    } else {
        Err(Error::InvalidPaymentDay(payment_day))
    }
}

/// The concrete date a salary with `payment_day` pays out in the given
/// `year` and `month`.
///
/// Months with fewer days than `payment_day` pay out on their last day, so a
/// payment day of 31 falls on February 28 (29 in leap years), April 30, and
/// so on.
pub fn payment_date_in(year: i32, month: Month, payment_day: u8) -> Date {
    let day = payment_day.min(month.length(year));

    Date::from_calendar_date(year, month, day).expect("day is clamped to the month length")
}

/// The next date on or after `today` that a salary with `payment_day` pays
/// out.
pub fn next_payment_date(payment_day: u8, today: Date) -> Date {
    let this_month = payment_date_in(today.year(), today.month(), payment_day);

    if this_month >= today {
        return this_month;
    }

    let (next_year, next_month) = match today.month() {
        Month::December => (today.year() + 1, Month::January),
        month => (today.year(), month.next()),
    };

    payment_date_in(next_year, next_month, payment_day)
}

/// Create the salary table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_salary_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS salary (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                payment_day INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_salary(row: &Row) -> Result<Salary, rusqlite::Error> {
    Ok(Salary {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        payment_day: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Get the salary record `salary_id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the record does not exist or belongs to
/// another user, or [Error::SqlError] if there is some other SQL error.
pub fn get_salary(
    salary_id: SalaryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Salary, Error> {
    connection
        .query_one(
            "SELECT id, account_id, amount, payment_day, created_at FROM salary
             WHERE id = ?1 AND user_id = ?2",
            params![salary_id, user_id.as_i64()],
            map_row_to_salary,
        )
        .map_err(Error::from)
}

/// A salary record joined with the name of its target account, for display
/// in listing views.
#[derive(Debug, PartialEq)]
pub(crate) struct SalaryWithAccount {
    pub(crate) salary: Salary,
    pub(crate) account_name: String,
}

/// Retrieve all of a user's salary records with their account names, most
/// recently created first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub(crate) fn get_salaries_with_account(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SalaryWithAccount>, Error> {
    connection
        .prepare(
            "SELECT s.id, s.account_id, s.amount, s.payment_day, s.created_at, a.name
             FROM salary s
             INNER JOIN account a ON a.id = s.account_id
             WHERE s.user_id = :user_id
             ORDER BY s.created_at DESC, s.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(SalaryWithAccount {
                salary: map_row_to_salary(row)?,
                account_name: row.get(5)?,
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod payment_date_tests {
    use time::{Month, macros::date};

    use super::{next_payment_date, payment_date_in};

    #[test]
    fn day_within_month_is_unchanged() {
        assert_eq!(
            date!(2025 - 01 - 15),
            payment_date_in(2025, Month::January, 15)
        );
    }

    #[test]
    fn day_31_clamps_to_30_day_months() {
        assert_eq!(
            date!(2025 - 04 - 30),
            payment_date_in(2025, Month::April, 31)
        );
    }

    #[test]
    fn day_31_clamps_to_february() {
        assert_eq!(
            date!(2025 - 02 - 28),
            payment_date_in(2025, Month::February, 31)
        );
    }

    #[test]
    fn day_30_clamps_to_leap_february() {
        assert_eq!(
            date!(2024 - 02 - 29),
            payment_date_in(2024, Month::February, 30)
        );
    }

    #[test]
    fn next_payment_is_this_month_when_day_has_not_passed() {
        assert_eq!(
            date!(2025 - 01 - 15),
            next_payment_date(15, date!(2025 - 01 - 10))
        );
    }

    #[test]
    fn next_payment_is_today_on_the_payment_day() {
        assert_eq!(
            date!(2025 - 01 - 15),
            next_payment_date(15, date!(2025 - 01 - 15))
        );
    }

    #[test]
    fn next_payment_rolls_to_next_month_when_day_has_passed() {
        assert_eq!(
            date!(2025 - 02 - 15),
            next_payment_date(15, date!(2025 - 01 - 20))
        );
    }

    #[test]
    fn next_payment_rolls_december_into_january() {
        assert_eq!(
            date!(2026 - 01 - 15),
            next_payment_date(15, date!(2025 - 12 - 20))
        );
    }

    #[test]
    fn next_payment_clamps_in_the_rolled_month() {
        // Payment day 31, late January: February pays out on the 28th.
        assert_eq!(
            date!(2025 - 02 - 28),
            next_payment_date(31, date!(2025 - 02 - 01))
        );
    }
}
