//! Sleep record CRUD with the duration and uniqueness invariants
//! enforced centrally, so no caller can bypass them.

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::calculate::sleep_duration_hours;
use crate::models::{CreateSleepRecord, SleepRecord, SleepRecordDraft, UpdateSleepRecord};
use crate::storage::{Database, StorageError};

use super::{parse_timestamp, ServiceError};

/// CRUD orchestration for sleep records.
#[derive(Clone)]
pub struct SleepRecordService {
    db: Database,
}

impl SleepRecordService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a record for (user, sleep_date), computing its duration.
    ///
    /// The explicit lookup gives a clear `Conflict` in the common case;
    /// the UNIQUE constraint remains the guard against a concurrent
    /// create racing past it.
    pub async fn create(&self, req: CreateSleepRecord) -> Result<SleepRecord, ServiceError> {
        let sleep_start = parse_timestamp(&req.sleep_start, "sleep_start")?;
        let wake_time = parse_timestamp(&req.wake_time, "wake_time")?;

        if self.db.get_user(req.user_id).await?.is_none() {
            return Err(Self::unknown_user(req.user_id));
        }

        if self
            .db
            .get_record_by_user_and_date(req.user_id, req.sleep_date)
            .await?
            .is_some()
        {
            return Err(Self::duplicate(req.user_id, req.sleep_date));
        }

        let now = Utc::now();
        let draft = SleepRecordDraft {
            user_id: req.user_id,
            sleep_date: req.sleep_date,
            sleep_start,
            wake_time,
            duration_hours: sleep_duration_hours(sleep_start, wake_time),
            note: req.note,
            created_at: now,
            updated_at: now,
        };

        let record = match self.db.insert_record(draft).await {
            Ok(record) => record,
            Err(StorageError::UniqueViolation(_)) => {
                return Err(Self::duplicate(req.user_id, req.sleep_date))
            }
            Err(StorageError::ForeignKeyViolation(_)) => {
                return Err(Self::unknown_user(req.user_id))
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            record_id = record.id,
            user_id = record.user_id,
            sleep_date = %record.sleep_date,
            duration_hours = record.duration_hours,
            "created sleep record"
        );
        Ok(record)
    }

    /// Apply a partial update. Duration is recomputed only when the
    /// patch carries BOTH timestamps; a one-sided change keeps the
    /// stored duration untouched. sleep_date is immutable.
    pub async fn update(
        &self,
        id: i64,
        patch: UpdateSleepRecord,
    ) -> Result<SleepRecord, ServiceError> {
        let mut record = self
            .db
            .get_record(id)
            .await?
            .ok_or_else(|| Self::unknown_record(id))?;

        if patch.is_empty() {
            return Ok(record);
        }

        let new_start = patch
            .sleep_start
            .as_deref()
            .map(|value| parse_timestamp(value, "sleep_start"))
            .transpose()?;
        let new_wake = patch
            .wake_time
            .as_deref()
            .map(|value| parse_timestamp(value, "wake_time"))
            .transpose()?;

        if let Some(start) = new_start {
            record.sleep_start = start;
        }
        if let Some(wake) = new_wake {
            record.wake_time = wake;
        }
        if let (Some(start), Some(wake)) = (new_start, new_wake) {
            record.duration_hours = sleep_duration_hours(start, wake);
        }
        if let Some(note) = patch.note {
            record.note = Some(note);
        }
        record.updated_at = Utc::now();

        if !self.db.update_record(&record).await? {
            return Err(Self::unknown_record(id));
        }

        info!(record_id = record.id, "updated sleep record");
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.db.delete_record(id).await? {
            return Err(Self::unknown_record(id));
        }
        info!(record_id = id, "deleted sleep record");
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<SleepRecord>, ServiceError> {
        Ok(self.db.get_record(id).await?)
    }

    pub async fn get_by_user_and_date(
        &self,
        user_id: i64,
        sleep_date: NaiveDate,
    ) -> Result<Option<SleepRecord>, ServiceError> {
        Ok(self.db.get_record_by_user_and_date(user_id, sleep_date).await?)
    }

    /// All of a user's records, newest sleep date first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<SleepRecord>, ServiceError> {
        Ok(self.db.list_records_by_user(user_id).await?)
    }

    fn duplicate(user_id: i64, sleep_date: NaiveDate) -> ServiceError {
        ServiceError::Conflict(format!(
            "a record for user {user_id} on {sleep_date} already exists"
        ))
    }

    fn unknown_user(user_id: i64) -> ServiceError {
        ServiceError::NotFound(format!("user {user_id} does not exist"))
    }

    fn unknown_record(id: i64) -> ServiceError {
        ServiceError::NotFound(format!("record {id} does not exist"))
    }
}
