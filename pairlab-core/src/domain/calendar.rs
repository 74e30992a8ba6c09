//! Calendar-month arithmetic shared by metric computation and the monthly report.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};

/// First day of the calendar month containing `t`.
pub fn month_floor(t: NaiveDateTime) -> NaiveDate {
    // day 1 always exists
    t.date().with_day(1).unwrap()
}

/// First day of the month after `month`.
pub fn next_month(month: NaiveDate) -> NaiveDate {
    month.checked_add_months(Months::new(1)).unwrap()
}

/// Every first-of-month date from the month of `start` to the month of `end`,
/// inclusive. Empty when `end` precedes `start`.
pub fn month_span(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDate> {
    let last = month_floor(end);
    let mut months = Vec::new();
    let mut current = month_floor(start);
    while current <= last {
        months.push(current);
        current = next_month(current);
    }
    months
}

/// Whether `t` falls inside the calendar month starting at `month`.
pub fn month_contains(month: NaiveDate, t: NaiveDateTime) -> bool {
    let floor = month_floor(t);
    floor.year() == month.year() && floor.month() == month.month()
}
