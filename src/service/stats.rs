//! Read-only derived statistics, recomputed fully on every call.

use chrono::{Local, NaiveDate};

use crate::calculate::recent_window_start;
use crate::models::{DailyStat, WeekdayAverage};
use crate::storage::Database;

use super::ServiceError;

/// Default trailing window for the daily series, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Aggregated views over a user's sleep records.
#[derive(Clone)]
pub struct SleepStatsService {
    db: Database,
}

impl SleepStatsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Daily durations for the trailing window ending today, ascending
    /// by date. Users with no records in the window get an empty list.
    pub async fn recent_daily(
        &self,
        user_id: i64,
        window_days: u32,
    ) -> Result<Vec<DailyStat>, ServiceError> {
        self.recent_daily_as_of(user_id, window_days, Local::now().date_naive())
            .await
    }

    /// Same as [`Self::recent_daily`] with an explicit "today", so
    /// callers and tests can pin the clock.
    pub async fn recent_daily_as_of(
        &self,
        user_id: i64,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<Vec<DailyStat>, ServiceError> {
        if window_days == 0 {
            return Err(ServiceError::InvalidInput(
                "window_days must be at least 1".into(),
            ));
        }

        let since = recent_window_start(today, window_days);
        Ok(self.db.recent_daily_stats(user_id, since).await?)
    }

    /// Mean duration per weekday across ALL of the user's records,
    /// ascending by weekday index (0=Sunday..6=Saturday). Weekdays
    /// without records are absent, not zero.
    pub async fn weekday_averages(
        &self,
        user_id: i64,
    ) -> Result<Vec<WeekdayAverage>, ServiceError> {
        Ok(self.db.weekday_average_stats(user_id).await?)
    }
}
