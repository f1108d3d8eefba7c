// SPDX-License-Identifier: MIT
//! Calendar period arithmetic.
//!
//! Pure functions mapping a frequency + reference date to period boundaries,
//! "N periods ago" offsets, period counts, and the period tiling used by the
//! history endpoint. The reference date is always injected by the caller.

use chrono::{Datelike, Days, Months, NaiveDate};

use super::model::Frequency;

/// Start and end (inclusive) of the period containing `date`.
///
/// Daily periods are the date itself, weekly periods are Monday-anchored
/// 7-day windows, monthly periods span the calendar month.
pub fn period_bounds(frequency: Frequency, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match frequency {
        Frequency::Daily => (date, date),
        Frequency::Weekly => {
            let start = monday_of(date);
            let end = start
                .checked_add_days(Days::new(6))
                .unwrap_or(NaiveDate::MAX);
            (start, end)
        }
        Frequency::Monthly => {
            let start = first_of_month(date);
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|d| d.checked_sub_days(Days::new(1)))
                .unwrap_or(NaiveDate::MAX);
            (start, end)
        }
    }
}

/// The date `periods` periods before `date`.
///
/// Daily/weekly subtract whole days; monthly clamps to the first of the
/// month `periods` months back (with year rollover).
pub fn periods_ago(frequency: Frequency, date: NaiveDate, periods: u32) -> NaiveDate {
    match frequency {
        Frequency::Daily => date
            .checked_sub_days(Days::new(u64::from(periods)))
            .unwrap_or(NaiveDate::MIN),
        Frequency::Weekly => date
            .checked_sub_days(Days::new(u64::from(periods) * 7))
            .unwrap_or(NaiveDate::MIN),
        Frequency::Monthly => first_of_month(date)
            .checked_sub_months(Months::new(periods))
            .unwrap_or(NaiveDate::MIN),
    }
}

/// Inclusive number of periods spanned by `[start, end]`; 0 when `end < start`.
pub fn count_periods(frequency: Frequency, start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    match frequency {
        Frequency::Daily => (end - start).num_days() as u32 + 1,
        Frequency::Weekly => {
            let weeks = (monday_of(end) - monday_of(start)).num_days() / 7;
            weeks as u32 + 1
        }
        Frequency::Monthly => {
            let months =
                (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
            months as u32 + 1
        }
    }
}

/// Consecutive, non-overlapping periods covering `[start, end]`.
///
/// The final period's end is clamped to `end`; the first period may start
/// before `start` when `start` falls mid-week or mid-month.
pub fn periods_in_range(
    frequency: Frequency,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<(NaiveDate, NaiveDate)> {
    let mut periods = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let (period_start, period_end) = period_bounds(frequency, cursor);
        if period_start > end {
            break;
        }
        periods.push((period_start, period_end.min(end)));
        match period_end.checked_add_days(Days::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    periods
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.day0())))
        .unwrap_or(NaiveDate::MIN)
}
