//! Calendar arithmetic on date-only values
//!
//! All engine dates are `NaiveDate`; time of day never enters a calculation.

use chrono::{Datelike, Duration, Months, NaiveDate};

/// Number of days in the month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Shift a date forward by whole days
pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_signed(Duration::days(days as i64))
        .unwrap_or(NaiveDate::MAX)
}

/// Shift a date forward by whole months, clamping the day to the target month's end
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// The open day as it falls in the month of `date`.
///
/// An open day past the end of a short month (e.g. 31 in April) lands on
/// the month's last day.
pub fn open_date_in_month(date: NaiveDate, open_day: u32) -> NaiveDate {
    let day = open_day.clamp(1, days_in_month(date));
    date.with_day(day).unwrap_or(date)
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(d(2025, 1, 15)), 31);
        assert_eq!(days_in_month(d(2025, 2, 1)), 28);
        assert_eq!(days_in_month(d(2024, 2, 29)), 29);
        assert_eq!(days_in_month(d(2025, 4, 30)), 30);
        assert_eq!(days_in_month(d(2025, 12, 31)), 31);
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(d(2025, 1, 31), 1), d(2025, 2, 28));
        assert_eq!(add_months(d(2025, 1, 31), 3), d(2025, 4, 30));
        assert_eq!(add_months(d(2024, 2, 29), 12), d(2025, 2, 28));
    }

    #[test]
    fn test_open_date_in_short_month() {
        assert_eq!(open_date_in_month(d(2025, 4, 2), 31), d(2025, 4, 30));
        assert_eq!(open_date_in_month(d(2025, 4, 2), 10), d(2025, 4, 10));
    }

    #[test]
    fn test_add_days_crosses_year() {
        assert_eq!(add_days(d(2025, 12, 30), 3), d(2026, 1, 2));
        assert_eq!(days_between(d(2025, 12, 30), d(2026, 1, 2)), 3);
    }
}
