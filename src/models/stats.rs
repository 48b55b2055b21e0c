//! Derived statistics models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point of the recent-window daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    /// Sleep date the duration belongs to
    pub date: NaiveDate,

    /// Duration slept that night, in hours
    pub duration_hours: f64,
}

/// Average sleep duration for one day of the week.
///
/// Weekday indices run 0=Sunday through 6=Saturday. Weekdays with no
/// records are simply absent from the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayAverage {
    /// Day-of-week index (0=Sunday..6=Saturday)
    pub weekday: u32,

    /// Arithmetic mean of duration_hours across that weekday's records
    pub average_hours: f64,
}
