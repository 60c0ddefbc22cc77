//! Cycle calendar
//!
//! Each cycle has a concrete start date: the first cycle begins on the
//! 1st of the planting month in the current year, and successive cycles
//! start after the previous cycle's length plus a fallow gap. The start
//! date resolves which calendar month each simulated day falls in.

use chrono::{Datelike, Days, Local, NaiveDate};

/// Fallow days between consecutive cycles.
pub const GAP_DAYS: u64 = 30;

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    let month = month.clamp(1, 12);
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of a clamped month is a valid date")
}

/// First day of `month` in the current year.
pub fn planting_start(month: u32) -> NaiveDate {
    first_of_month(Local::now().year(), month)
}

/// Calendar month (1-12) of the `day_index`-th day of a cycle starting at
/// `start`.
pub fn month_for_day(start: NaiveDate, day_index: u32) -> u32 {
    start
        .checked_add_days(Days::new(day_index as u64))
        .unwrap_or(start)
        .month()
}

/// Start date of the cycle after one beginning at `start`.
///
/// Normally `start + prev_cycle_days + GAP_DAYS`. When a planting-month
/// change was committed at the boundary, the next start realigns to the
/// 1st of the new month, rolling into the following year if that date has
/// already passed.
pub fn advance_cycle_start(
    start: NaiveDate,
    prev_cycle_days: u32,
    new_planting_month: Option<u32>,
) -> NaiveDate {
    let next = start
        .checked_add_days(Days::new(prev_cycle_days as u64 + GAP_DAYS))
        .unwrap_or(start);

    match new_planting_month {
        None => next,
        Some(month) => {
            let candidate = first_of_month(next.year(), month);
            if candidate < next {
                first_of_month(next.year() + 1, month)
            } else {
                candidate
            }
        }
    }
}
