//! The dashboard page: headline figures for the signed-in user and their most
//! recent transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::{Connection, params};
use time::{Date, Month, OffsetDateTime};

use crate::{
    AppState, Error,
    account::get_total_account_balance,
    auth::UserID,
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, STAT_CARD_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    transaction::{
        TransactionKind, TransactionWithAccount, category_label, get_transactions_with_account,
    },
};

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The headline figures shown at the top of the dashboard.
#[derive(Debug, PartialEq)]
struct DashboardStats {
    total_balance: f64,
    active_accounts: i64,
    monthly_income: f64,
    monthly_expense: f64,
    /// Percentage change of this month's income versus last month's, zero
    /// when last month had no income.
    income_change: f64,
    /// Percentage change of this month's expenses versus last month's, zero
    /// when last month had no expenses.
    expense_change: f64,
    /// This month's net cash flow as a percentage of the total balance, zero
    /// when the total balance is zero.
    balance_change: f64,
}

fn month_start(date: Date) -> Date {
    date.replace_day(1).expect("day 1 is valid for every month")
}

fn previous_month_start(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::January => (date.year() - 1, Month::December),
        month => (date.year(), month.previous()),
    };

    Date::from_calendar_date(year, month, 1).expect("day 1 is valid for every month")
}

fn next_month_start(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).expect("day 1 is valid for every month")
}

/// Sum a user's income and expenses over the half-open date range
/// `[from, to)`.
fn sum_transactions_in_range(
    user_id: UserID,
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<(f64, f64), Error> {
    connection
        .query_one(
            "SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
             FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date < ?3",
            params![user_id.as_i64(), from, to],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(Error::from)
}

fn count_accounts(user_id: UserID, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_one(
            "SELECT COUNT(id) FROM account WHERE user_id = ?1",
            params![user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

fn percent_change(current: f64, previous: f64) -> f64 {
    if previous != 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

fn get_dashboard_stats(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<DashboardStats, Error> {
    let this_month = month_start(today);
    let last_month = previous_month_start(today);
    let next_month = next_month_start(today);

    let total_balance = get_total_account_balance(user_id, connection)?;
    let active_accounts = count_accounts(user_id, connection)?;
    let (monthly_income, monthly_expense) =
        sum_transactions_in_range(user_id, this_month, next_month, connection)?;
    let (last_month_income, last_month_expense) =
        sum_transactions_in_range(user_id, last_month, this_month, connection)?;

    let net_this_month = monthly_income - monthly_expense;
    let balance_change = if total_balance != 0.0 {
        net_this_month / total_balance * 100.0
    } else {
        0.0
    };

    Ok(DashboardStats {
        total_balance,
        active_accounts,
        monthly_income,
        monthly_expense,
        income_change: percent_change(monthly_income, last_month_income),
        expense_change: percent_change(monthly_expense, last_month_expense),
        balance_change,
    })
}

fn stat_card(title: &str, value: &str, change: Option<f64>) -> Markup {
    html!(
        div class=(STAT_CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (title) }

            p class="text-2xl font-semibold text-gray-900 dark:text-white" { (value) }

            @if let Some(change) = change {
                @let style = if change < 0.0 {
                    "text-sm text-red-600 dark:text-red-400"
                } else {
                    "text-sm text-green-600 dark:text-green-400"
                };

                p class=(style)
                {
                    (format!("{change:+.1}% from last month"))
                }
            }
        }
    )
}

fn recent_transactions_table(transactions: &[TransactionWithAccount]) -> Markup {
    html!(
        section class="space-y-2 w-full"
        {
            header class="flex justify-between flex-wrap items-end"
            {
                h2 class="text-lg font-bold" { "Recent Transactions" }

                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class="px-6 py-3 text-right" { "Amount" }
                    }
                }

                tbody
                {
                    @for row in transactions {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                time datetime=(row.transaction.date) { (row.transaction.date) }
                            }

                            td class=(TABLE_CELL_STYLE) { (row.account_name) }

                            td class=(TABLE_CELL_STYLE)
                            {
                                (category_label(&row.transaction.category))
                            }

                            td class="px-6 py-4 text-right"
                            {
                                @match row.transaction.kind {
                                    TransactionKind::Income => {
                                        span class="text-green-600 dark:text-green-400 font-medium"
                                        {
                                            "+" (format_currency(row.transaction.amount))
                                        }
                                    }
                                    TransactionKind::Expense => {
                                        span class="text-red-600 dark:text-red-400 font-medium"
                                        {
                                            "-" (format_currency(row.transaction.amount))
                                        }
                                    }
                                }
                            }
                        }
                    }

                    @if transactions.is_empty() {
                        tr
                        {
                            td colspan="4" class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No transactions recorded yet."
                            }
                        }
                    }
                }
            }
        }
    )
}

fn dashboard_view(stats: &DashboardStats, recent: &[TransactionWithAccount]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                div class="grid grid-cols-1 gap-4 sm:grid-cols-2 lg:grid-cols-4"
                {
                    (stat_card(
                        "Total Balance",
                        &format_currency(stats.total_balance),
                        Some(stats.balance_change),
                    ))
                    (stat_card(
                        "Monthly Income",
                        &format_currency(stats.monthly_income),
                        Some(stats.income_change),
                    ))
                    (stat_card(
                        "Monthly Expenses",
                        &format_currency(stats.monthly_expense),
                        Some(stats.expense_change),
                    ))
                    (stat_card("Active Accounts", &stats.active_accounts.to_string(), None))
                }

                (recent_transactions_table(recent))
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// How many transactions to show in the recent transactions table.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// Renders the dashboard page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let local_offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let stats = get_dashboard_stats(user_id, today, &connection)
        .inspect_err(|error| tracing::error!("could not compute dashboard stats: {error}"))?;

    let mut recent = get_transactions_with_account(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;
    recent.truncate(RECENT_TRANSACTION_COUNT);

    Ok(dashboard_view(&stats, &recent).into_response())
}

#[cfg(test)]
mod dashboard_stats_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{AccountForm, AccountKind, create_account},
        auth::UserID,
        db::initialize,
        test_utils::insert_test_user,
        transaction::{NewTransaction, TransactionKind, create_transaction},
    };

    use super::get_dashboard_stats;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn must_create_transaction(
        user_id: UserID,
        account_id: i64,
        kind: TransactionKind,
        amount: f64,
        date: time::Date,
        conn: &Connection,
    ) {
        create_transaction(
            NewTransaction {
                user_id,
                account_id,
                kind,
                amount,
                category: "other_expense".to_owned(),
                description: String::new(),
                date,
            },
            conn,
        )
        .expect("could not create test transaction");
    }

    #[test]
    fn computes_monthly_totals_and_changes() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        let today = date!(2025 - 06 - 20);

        // Last month: 100 income, 50 expense.
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Income,
            100.0,
            date!(2025 - 05 - 10),
            &conn,
        );
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Expense,
            50.0,
            date!(2025 - 05 - 12),
            &conn,
        );
        // This month: 150 income, 100 expense.
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Income,
            150.0,
            date!(2025 - 06 - 10),
            &conn,
        );
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Expense,
            100.0,
            date!(2025 - 06 - 12),
            &conn,
        );

        let stats = get_dashboard_stats(user_id, today, &conn).unwrap();

        assert_eq!(stats.monthly_income, 150.0);
        assert_eq!(stats.monthly_expense, 100.0);
        assert_eq!(stats.active_accounts, 1);
        // The reconciler has been applying deltas along the way.
        assert_eq!(stats.total_balance, 100.0);
        assert!((stats.income_change - 50.0).abs() < 1e-9);
        assert!((stats.expense_change - 100.0).abs() < 1e-9);
        assert!((stats.balance_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn changes_are_zero_without_last_month_data() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Income,
            100.0,
            date!(2025 - 06 - 10),
            &conn,
        );

        let stats = get_dashboard_stats(user_id, date!(2025 - 06 - 20), &conn).unwrap();

        assert_eq!(stats.income_change, 0.0);
        assert_eq!(stats.expense_change, 0.0);
    }

    #[test]
    fn stats_are_zero_for_new_user() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");

        let stats = get_dashboard_stats(user_id, date!(2025 - 06 - 20), &conn).unwrap();

        assert_eq!(stats.total_balance, 0.0);
        assert_eq!(stats.active_accounts, 0);
        assert_eq!(stats.monthly_income, 0.0);
        assert_eq!(stats.monthly_expense, 0.0);
        assert_eq!(stats.balance_change, 0.0);
    }

    #[test]
    fn january_compares_against_december() {
        let conn = get_test_connection();
        let user_id = insert_test_user(&conn, "foo@bar.baz");
        let account = create_account(
            &AccountForm {
                name: "Checking".to_owned(),
                kind: AccountKind::Bank,
                balance: 0.0,
            },
            user_id,
            &conn,
        )
        .unwrap();
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Income,
            100.0,
            date!(2024 - 12 - 15),
            &conn,
        );
        must_create_transaction(
            user_id,
            account.id,
            TransactionKind::Income,
            200.0,
            date!(2025 - 01 - 15),
            &conn,
        );

        let stats = get_dashboard_stats(user_id, date!(2025 - 01 - 20), &conn).unwrap();

        assert_eq!(stats.monthly_income, 200.0);
        assert!((stats.income_change - 100.0).abs() < 1e-9);
    }
}
