//! Sleep duration calculation engine.
//!
//! Pure arithmetic shared by the record and stats services:
//! - Elapsed hours between sleep-start and wake timestamps, with a
//!   single midnight-crossing correction
//! - Recent-window lower-bound dates

use chrono::{Days, NaiveDate, NaiveDateTime};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Calculate elapsed hours between going to sleep and waking up.
///
/// A strictly negative difference means the stored wake timestamp reuses
/// sleep-start's calendar date even though the session crossed midnight,
/// so one day is added back. Sessions longer than 24 hours are not
/// representable. No rounding; display rounding is a presentation
/// concern.
pub fn sleep_duration_hours(sleep_start: NaiveDateTime, wake_time: NaiveDateTime) -> f64 {
    let mut diff_ms = (wake_time - sleep_start).num_milliseconds();
    if diff_ms < 0 {
        diff_ms += MS_PER_DAY;
    }
    diff_ms as f64 / MS_PER_HOUR
}

/// Calculate the inclusive lower bound of a trailing window ending today.
///
/// A record dated exactly `window_days` days before `today` is inside
/// the window; one dated `window_days + 1` days before is outside.
pub fn recent_window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    today - Days::new(u64::from(window_days))
}
