//! Sleep record model and its wire-input shapes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single night's sleep, attributed to one calendar date per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Store-assigned identifier
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    /// Calendar date the sleep is attributed to (uniqueness key with user_id)
    pub sleep_date: NaiveDate,

    /// When the user went to sleep (naive local time)
    pub sleep_start: NaiveDateTime,

    /// When the user woke up (naive local time; may read "earlier" than
    /// sleep_start when the session crossed midnight)
    pub wake_time: NaiveDateTime,

    /// Derived duration in hours; recomputed from the timestamps, never
    /// editable on its own
    pub duration_hours: f64,

    /// Optional free-text note
    pub note: Option<String>,

    /// When this record was created
    pub created_at: DateTime<Utc>,

    /// When this record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Creation request body. Timestamps arrive as strings and are parsed by
/// the record service so malformed input surfaces as a typed error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSleepRecord {
    pub user_id: i64,
    pub sleep_date: NaiveDate,
    pub sleep_start: String,
    pub wake_time: String,
    pub note: Option<String>,
}

impl CreateSleepRecord {
    pub fn new(
        user_id: i64,
        sleep_date: NaiveDate,
        sleep_start: impl Into<String>,
        wake_time: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            sleep_date,
            sleep_start: sleep_start.into(),
            wake_time: wake_time.into(),
            note: None,
        }
    }

    /// Builder method to attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Partial-update request body. Every field is an explicit `Option` so
/// "field absent" and "field present" are distinct, testable states.
/// Duration is recomputed only when both timestamps are supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSleepRecord {
    pub sleep_start: Option<String>,
    pub wake_time: Option<String>,
    pub note: Option<String>,
}

impl UpdateSleepRecord {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.sleep_start.is_none() && self.wake_time.is_none() && self.note.is_none()
    }
}

/// Fully-computed record fields ready for insertion; the store assigns
/// the id.
#[derive(Debug, Clone)]
pub struct SleepRecordDraft {
    pub user_id: i64,
    pub sleep_date: NaiveDate,
    pub sleep_start: NaiveDateTime,
    pub wake_time: NaiveDateTime,
    pub duration_hours: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SleepRecordDraft {
    /// Finalize the draft with the id the store assigned.
    pub fn into_record(self, id: i64) -> SleepRecord {
        SleepRecord {
            id,
            user_id: self.user_id,
            sleep_date: self.sleep_date,
            sleep_start: self.sleep_start,
            wake_time: self.wake_time,
            duration_hours: self.duration_hours,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SleepRecord {
        SleepRecord {
            id: 1,
            user_id: 42,
            sleep_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            sleep_start: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(23, 30, 0)
                .unwrap(),
            wake_time: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap(),
            duration_hours: 8.0,
            note: Some("restless".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: SleepRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }

    #[test]
    fn test_create_builder_attaches_note() {
        let req = CreateSleepRecord::new(
            42,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            "2025-06-01T23:30",
            "2025-06-01T07:30",
        )
        .with_note("late coffee");

        assert_eq!(req.note.as_deref(), Some("late coffee"));
        assert_eq!(req.user_id, 42);
    }

    #[test]
    fn test_update_patch_presence_is_explicit() {
        let patch: UpdateSleepRecord = serde_json::from_str(r#"{"note":"nap"}"#).unwrap();
        assert!(patch.sleep_start.is_none());
        assert!(patch.wake_time.is_none());
        assert_eq!(patch.note.as_deref(), Some("nap"));
        assert!(!patch.is_empty());

        let empty: UpdateSleepRecord = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_draft_into_record_carries_fields() {
        let record = sample_record();
        let draft = SleepRecordDraft {
            user_id: record.user_id,
            sleep_date: record.sleep_date,
            sleep_start: record.sleep_start,
            wake_time: record.wake_time,
            duration_hours: record.duration_hours,
            note: record.note.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        };

        let built = draft.into_record(record.id);
        assert_eq!(built, record);
    }
}
