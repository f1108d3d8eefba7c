// SPDX-License-Identifier: MIT
//! Current and longest streak computation.
//!
//! Both walks operate on two pre-filtered date sets: the period-bucketed
//! dates whose summed value met the target, and the raw set of dates with
//! any log at all. Strict habits break on any unmet period; lenient habits
//! (those with a `default_value` and `streak_strict` off) tolerate periods
//! with no log, as long as the period is not older than the earliest log
//! on record.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};

use super::model::Habit;
use super::period;

/// Hard bounds on the backward walk: malformed data must truncate the
/// streak, not hang the request.
const MAX_WALK: u32 = 1000;
const FLOOR_YEAR: i32 = 2000;

fn any_in(set: &BTreeSet<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    set.range(start..=end).next().is_some()
}

/// Consecutive met periods counting backwards from `today`.
pub fn current_streak(
    habit: &Habit,
    today: NaiveDate,
    dates_met: &BTreeSet<NaiveDate>,
    logged_dates: &BTreeSet<NaiveDate>,
) -> u32 {
    let mut streak = 0u32;
    let mut check_date = today;

    // Lenient habits cannot extend a streak past the first log on record.
    let min_log_date = logged_dates.first().copied().unwrap_or(today);

    loop {
        let (period_start, period_end) = period::period_bounds(habit.frequency, check_date);

        if any_in(dates_met, period_start, period_end) {
            streak += 1;
        } else if !habit.streak_lenient() {
            break;
        } else if any_in(logged_dates, period_start, period_end) {
            // Something was logged but the target was missed.
            break;
        } else if period_end < min_log_date {
            break;
        } else {
            // Nothing logged at all: a lenient habit keeps its streak.
            streak += 1;
        }

        check_date = match period_start.checked_sub_days(Days::new(1)) {
            Some(d) => d,
            None => break,
        };
        if streak > MAX_WALK || check_date.year() < FLOOR_YEAR {
            break;
        }
    }

    streak
}

/// Longest run of met periods anywhere in the habit's history.
///
/// Scans forward period-by-period from the earliest met date to the latest,
/// applying the same strict/lenient rule as [`current_streak`]. Returns 0
/// when no period ever met the target.
pub fn longest_streak(
    habit: &Habit,
    dates_met: &BTreeSet<NaiveDate>,
    logged_dates: &BTreeSet<NaiveDate>,
) -> u32 {
    let (Some(&first), Some(&last)) = (dates_met.first(), dates_met.last()) else {
        return 0;
    };

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut cursor = first;

    while cursor <= last {
        let (period_start, period_end) = period::period_bounds(habit.frequency, cursor);

        if any_in(dates_met, period_start, period_end) {
            run += 1;
            longest = longest.max(run);
        } else if !habit.streak_lenient() || any_in(logged_dates, period_start, period_end) {
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }

        cursor = match period_end.checked_add_days(Days::new(1)) {
            Some(d) => d,
            None => break,
        };
    }

    longest
}
