//! Aggregate statistics queries for the analytics page.

use rusqlite::{Connection, named_params};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    Error,
    period::TimeWindow,
    transaction::{PaymentMethod, TransactionType},
};

/// Milliseconds per day, used to bucket timestamps into local calendar days.
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1_000;

/// The headline statistics for one date window.
///
/// Totals are unsigned. Per-day averages divide by the inclusive day count of
/// the window; per-transaction averages divide by the matching transaction
/// count and are zero when nothing matches.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct TransactionStats {
    /// How many transactions fall inside the window.
    pub(crate) total_transactions: u32,
    /// The unsigned expense total.
    pub(crate) total_expense: f64,
    /// The income total.
    pub(crate) total_income: f64,
    /// The expense total divided by the window's day count.
    pub(crate) avg_expense_per_day: f64,
    /// The expense total divided by the expense transaction count.
    pub(crate) avg_expense_per_transaction: f64,
    /// The income total divided by the window's day count.
    pub(crate) avg_income_per_day: f64,
    /// The income total divided by the income transaction count.
    pub(crate) avg_income_per_transaction: f64,
    /// The largest single expense, unsigned.
    pub(crate) max_expense: f64,
    /// The largest single income.
    pub(crate) max_income: f64,
}

/// Compute the full statistics grid in a single aggregate query.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub(crate) fn get_transaction_stats(
    window: TimeWindow,
    connection: &Connection,
) -> Result<TransactionStats, Error> {
    let stats = connection
        .prepare(
            "SELECT
                COUNT(*),
                ABS(SUM(CASE WHEN transaction_type = :expense THEN amount ELSE 0 END)),
                SUM(CASE WHEN transaction_type = :income THEN amount ELSE 0 END),

                ABS(SUM(CASE WHEN transaction_type = :expense THEN amount ELSE 0 END)) /
                    CAST(((:end - :start) / 86400000 + 1) AS REAL),

                ABS(SUM(CASE WHEN transaction_type = :expense THEN amount ELSE 0 END)) /
                    NULLIF(COUNT(CASE WHEN transaction_type = :expense THEN 1 END), 0),

                SUM(CASE WHEN transaction_type = :income THEN amount ELSE 0 END) /
                    CAST(((:end - :start) / 86400000 + 1) AS REAL),

                SUM(CASE WHEN transaction_type = :income THEN amount ELSE 0 END) /
                    NULLIF(COUNT(CASE WHEN transaction_type = :income THEN 1 END), 0),

                ABS(MIN(CASE WHEN transaction_type = :expense THEN amount END)),
                MAX(CASE WHEN transaction_type = :income THEN amount END)
             FROM \"transaction\"
             WHERE date BETWEEN :start AND :end;",
        )?
        .query_row(
            named_params! {
                ":expense": TransactionType::Expense,
                ":income": TransactionType::Income,
                ":start": window.start,
                ":end": window.end,
            },
            |row| {
                Ok(TransactionStats {
                    total_transactions: row.get(0)?,
                    total_expense: row.get::<_, Option<f64>>(1)?.unwrap_or_default(),
                    total_income: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
                    avg_expense_per_day: row.get::<_, Option<f64>>(3)?.unwrap_or_default(),
                    avg_expense_per_transaction: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
                    avg_income_per_day: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
                    avg_income_per_transaction: row.get::<_, Option<f64>>(6)?.unwrap_or_default(),
                    max_expense: row.get::<_, Option<f64>>(7)?.unwrap_or_default(),
                    max_income: row.get::<_, Option<f64>>(8)?.unwrap_or_default(),
                })
            },
        )?;

    Ok(stats)
}

/// The total amount settled through one payment method within a date window.
#[derive(Debug, PartialEq)]
pub(crate) struct PaymentMethodSummary {
    /// The payment method.
    pub(crate) payment_method: PaymentMethod,
    /// The unsigned total settled through it.
    pub(crate) total: f64,
}

/// Sum the amounts settled through each payment method for transactions of
/// `transaction_type` within `window`, largest total first.
///
/// Payment methods with no matching transactions are omitted.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub(crate) fn payment_method_summary(
    transaction_type: TransactionType,
    window: TimeWindow,
    connection: &Connection,
) -> Result<Vec<PaymentMethodSummary>, Error> {
    connection
        .prepare(
            "SELECT payment_method, ABS(SUM(amount)) AS total
             FROM \"transaction\"
             WHERE date BETWEEN ?1 AND ?2 AND transaction_type = ?3
             GROUP BY payment_method
             HAVING total > 0
             ORDER BY total DESC;",
        )?
        .query_map((window.start, window.end, transaction_type), |row| {
            Ok(PaymentMethodSummary {
                payment_method: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(Error::SqlError))
        .collect()
}

/// The income and expense totals for one local calendar day.
#[derive(Debug, PartialEq)]
pub(crate) struct DailySummary {
    /// The local calendar day.
    pub(crate) date: Date,
    /// The income total for the day.
    pub(crate) income: f64,
    /// The unsigned expense total for the day.
    pub(crate) expense: f64,
}

/// Group the transactions in `window` into local calendar days with income
/// and expense totals, oldest day first.
///
/// Timestamps are shifted by the local offset before being divided into
/// days, so a late evening transaction lands on the same day the user saw
/// when recording it. Days without transactions are omitted.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTimestamp] if a day bucket cannot be mapped back to a
///   calendar date,
/// - or [Error::SqlError] if there is an SQL error.
pub(crate) fn daily_summary(
    window: TimeWindow,
    local_offset: UtcOffset,
    connection: &Connection,
) -> Result<Vec<DailySummary>, Error> {
    let offset_millis = i64::from(local_offset.whole_seconds()) * 1_000;

    connection
        .prepare(
            "SELECT
                (date + :offset_millis) / 86400000 AS day,
                SUM(CASE WHEN transaction_type = :income THEN amount ELSE 0 END),
                ABS(SUM(CASE WHEN transaction_type = :expense THEN amount ELSE 0 END))
             FROM \"transaction\"
             WHERE date BETWEEN :start AND :end
             GROUP BY day
             ORDER BY day ASC;",
        )?
        .query_map(
            named_params! {
                ":offset_millis": offset_millis,
                ":income": TransactionType::Income,
                ":expense": TransactionType::Expense,
                ":start": window.start,
                ":end": window.end,
            },
            |row| {
                let day: i64 = row.get(0)?;
                let income: Option<f64> = row.get(1)?;
                let expense: Option<f64> = row.get(2)?;

                Ok((day, income.unwrap_or_default(), expense.unwrap_or_default()))
            },
        )?
        .map(|maybe_row| {
            let (day, income, expense) = maybe_row.map_err(Error::SqlError)?;

            Ok(DailySummary {
                date: date_for_epoch_day(day)?,
                income,
                expense,
            })
        })
        .collect()
}

/// The calendar date for a count of days since the Unix epoch.
fn date_for_epoch_day(epoch_day: i64) -> Result<Date, Error> {
    let timestamp_seconds = epoch_day * (DAY_MILLIS / 1_000);

    OffsetDateTime::from_unix_timestamp(timestamp_seconds)
        .map(|date_time| date_time.date())
        .map_err(|_| Error::InvalidTimestamp(epoch_day * DAY_MILLIS))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{UtcOffset, macros::date};

    use crate::{
        db::initialize,
        period::TimeWindow,
        transaction::{PaymentMethod, TransactionType, create_transaction, test_utils::sample_transaction},
    };

    use super::{
        DailySummary, daily_summary, get_transaction_stats, payment_method_summary,
    };

    const DAY: i64 = 86_400_000;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn stats_are_zero_for_empty_window() {
        let conn = get_test_connection();

        let got = get_transaction_stats(
            TimeWindow {
                start: 0,
                end: DAY - 1,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got, Default::default());
    }

    #[test]
    fn stats_aggregate_income_and_expense() {
        let conn = get_test_connection();
        // Two days: two expenses and one income inside the window, one
        // expense outside it.
        create_transaction(sample_transaction(-30.0, 1_000), &conn).unwrap();
        create_transaction(sample_transaction(-20.0, DAY + 1_000), &conn).unwrap();
        create_transaction(sample_transaction(100.0, 2_000), &conn).unwrap();
        create_transaction(sample_transaction(-500.0, 3 * DAY), &conn).unwrap();

        let got = get_transaction_stats(
            TimeWindow {
                start: 0,
                end: 2 * DAY - 1,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.total_transactions, 3);
        assert_eq!(got.total_expense, 50.0);
        assert_eq!(got.total_income, 100.0);
        assert_eq!(got.avg_expense_per_day, 25.0);
        assert_eq!(got.avg_expense_per_transaction, 25.0);
        assert_eq!(got.avg_income_per_day, 50.0);
        assert_eq!(got.avg_income_per_transaction, 100.0);
        assert_eq!(got.max_expense, 30.0);
        assert_eq!(got.max_income, 100.0);
    }

    #[test]
    fn stats_divide_by_inclusive_day_count() {
        let conn = get_test_connection();
        create_transaction(sample_transaction(-70.0, 1_000), &conn).unwrap();

        // A one week window.
        let got = get_transaction_stats(
            TimeWindow {
                start: 0,
                end: 7 * DAY - 1,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.avg_expense_per_day, 10.0);
    }

    #[test]
    fn payment_method_summary_groups_and_sorts() {
        let conn = get_test_connection();
        let mut upi = sample_transaction(-5.0, 1_000);
        upi.payment_method = PaymentMethod::Upi;
        let mut card_small = sample_transaction(-10.0, 2_000);
        card_small.payment_method = PaymentMethod::CreditCard;
        let mut card_large = sample_transaction(-40.0, 3_000);
        card_large.payment_method = PaymentMethod::CreditCard;
        // Income must not appear in the expense summary.
        let income = sample_transaction(100.0, 4_000);

        for new_transaction in [upi, card_small, card_large, income] {
            create_transaction(new_transaction, &conn).unwrap();
        }

        let got = payment_method_summary(
            TransactionType::Expense,
            TimeWindow {
                start: 0,
                end: 10_000,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].payment_method, PaymentMethod::CreditCard);
        assert_eq!(got[0].total, 50.0);
        assert_eq!(got[1].payment_method, PaymentMethod::Upi);
        assert_eq!(got[1].total, 5.0);
    }

    #[test]
    fn daily_summary_groups_by_day() {
        let conn = get_test_connection();
        create_transaction(sample_transaction(-30.0, 1_000), &conn).unwrap();
        create_transaction(sample_transaction(-20.0, 2_000), &conn).unwrap();
        create_transaction(sample_transaction(100.0, DAY + 1_000), &conn).unwrap();

        let got = daily_summary(
            TimeWindow {
                start: 0,
                end: 2 * DAY - 1,
            },
            UtcOffset::UTC,
            &conn,
        )
        .unwrap();

        assert_eq!(
            got,
            vec![
                DailySummary {
                    date: date!(1970 - 01 - 01),
                    income: 0.0,
                    expense: 50.0,
                },
                DailySummary {
                    date: date!(1970 - 01 - 02),
                    income: 100.0,
                    expense: 0.0,
                },
            ]
        );
    }

    #[test]
    fn daily_summary_buckets_days_in_local_time() {
        let conn = get_test_connection();
        // 23:00 UTC on the first day is already the next day at UTC+2.
        create_transaction(sample_transaction(-30.0, 23 * 60 * 60 * 1_000), &conn).unwrap();

        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        let got = daily_summary(
            TimeWindow {
                start: 0,
                end: 2 * DAY - 1,
            },
            offset,
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].date, date!(1970 - 01 - 02));
    }
}
