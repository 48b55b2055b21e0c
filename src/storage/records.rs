//! Sleep record table queries, including the two aggregation views.

use chrono::NaiveDate;
use rusqlite::{params, Row};

use crate::models::{DailyStat, SleepRecord, SleepRecordDraft, WeekdayAverage};

use super::{classify_constraint, format_naive, parse_date, parse_naive, parse_utc, Database, StorageError};

const RECORD_COLUMNS: &str =
    "id, user_id, sleep_date, sleep_start, wake_time, duration_hours, note, created_at, updated_at";

fn row_to_record(row: &Row<'_>) -> Result<SleepRecord, StorageError> {
    Ok(SleepRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        sleep_date: parse_date(&row.get::<_, String>(2)?)?,
        sleep_start: parse_naive(&row.get::<_, String>(3)?)?,
        wake_time: parse_naive(&row.get::<_, String>(4)?)?,
        duration_hours: row.get(5)?,
        note: row.get(6)?,
        created_at: parse_utc(&row.get::<_, String>(7)?)?,
        updated_at: parse_utc(&row.get::<_, String>(8)?)?,
    })
}

impl Database {
    /// Insert a fully-computed record; the store assigns the id.
    ///
    /// A second record for the same (user_id, sleep_date) surfaces as
    /// [`StorageError::UniqueViolation`]; an unknown user as
    /// [`StorageError::ForeignKeyViolation`].
    pub async fn insert_record(
        &self,
        draft: SleepRecordDraft,
    ) -> Result<SleepRecord, StorageError> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sleep_records
                     (user_id, sleep_date, sleep_start, wake_time, duration_hours, note, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    draft.user_id,
                    draft.sleep_date.to_string(),
                    format_naive(draft.sleep_start),
                    format_naive(draft.wake_time),
                    draft.duration_hours,
                    draft.note,
                    draft.created_at.to_rfc3339(),
                    draft.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|err| classify_constraint(err, "sleep_records"))?;

            let id = conn.last_insert_rowid();
            Ok(draft.into_record(id))
        })
        .await
    }

    pub async fn get_record(&self, id: i64) -> Result<Option<SleepRecord>, StorageError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM sleep_records WHERE id = ?1"
            ))?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_record(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn get_record_by_user_and_date(
        &self,
        user_id: i64,
        sleep_date: NaiveDate,
    ) -> Result<Option<SleepRecord>, StorageError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM sleep_records WHERE user_id = ?1 AND sleep_date = ?2"
            ))?;
            let mut rows = stmt.query(params![user_id, sleep_date.to_string()])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_record(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// All of a user's records, newest sleep date first.
    pub async fn list_records_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<SleepRecord>, StorageError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM sleep_records
                 WHERE user_id = ?1
                 ORDER BY sleep_date DESC"
            ))?;
            let mut rows = stmt.query(params![user_id])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }

    /// Persist the mutable fields of an already-loaded record.
    /// Returns false when the row no longer exists. sleep_date and
    /// user_id are immutable and deliberately absent from the SET list.
    pub async fn update_record(&self, record: &SleepRecord) -> Result<bool, StorageError> {
        let record = record.clone();
        self.execute(move |conn| {
            let affected = conn.execute(
                "UPDATE sleep_records
                 SET sleep_start = ?1,
                     wake_time = ?2,
                     duration_hours = ?3,
                     note = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    format_naive(record.sleep_start),
                    format_naive(record.wake_time),
                    record.duration_hours,
                    record.note,
                    record.updated_at.to_rfc3339(),
                    record.id,
                ],
            )?;
            Ok(affected > 0)
        })
        .await
    }

    pub async fn delete_record(&self, id: i64) -> Result<bool, StorageError> {
        self.execute(move |conn| {
            let affected =
                conn.execute("DELETE FROM sleep_records WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
    }

    /// Daily durations on or after `since`, ascending by sleep date.
    pub async fn recent_daily_stats(
        &self,
        user_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<DailyStat>, StorageError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT sleep_date, duration_hours
                 FROM sleep_records
                 WHERE user_id = ?1 AND sleep_date >= ?2
                 ORDER BY sleep_date ASC",
            )?;
            let mut rows = stmt.query(params![user_id, since.to_string()])?;
            let mut stats = Vec::new();
            while let Some(row) = rows.next()? {
                stats.push(DailyStat {
                    date: parse_date(&row.get::<_, String>(0)?)?,
                    duration_hours: row.get(1)?,
                });
            }
            Ok(stats)
        })
        .await
    }

    /// Mean duration per weekday over all of a user's records,
    /// ascending by weekday index (0=Sunday..6=Saturday). Weekdays
    /// without records produce no row.
    pub async fn weekday_average_stats(
        &self,
        user_id: i64,
    ) -> Result<Vec<WeekdayAverage>, StorageError> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT CAST(strftime('%w', sleep_date) AS INTEGER) AS weekday,
                        AVG(duration_hours) AS average_hours
                 FROM sleep_records
                 WHERE user_id = ?1
                 GROUP BY weekday
                 ORDER BY weekday ASC",
            )?;
            let mut rows = stmt.query(params![user_id])?;
            let mut averages = Vec::new();
            while let Some(row) = rows.next()? {
                averages.push(WeekdayAverage {
                    weekday: row.get::<_, i64>(0)? as u32,
                    average_hours: row.get(1)?,
                });
            }
            Ok(averages)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user("sleeper").await.unwrap();
        (db, user.id)
    }

    fn dt(value: &str) -> NaiveDateTime {
        value.parse().unwrap()
    }

    fn draft(user_id: i64, date: &str, start: &str, wake: &str, hours: f64) -> SleepRecordDraft {
        let now = Utc::now();
        SleepRecordDraft {
            user_id,
            sleep_date: date.parse().unwrap(),
            sleep_start: dt(start),
            wake_time: dt(wake),
            duration_hours: hours,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (db, user_id) = setup().await;

        let inserted = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:30:00",
                "2025-06-01T07:30:00",
                8.0,
            ))
            .await
            .unwrap();
        assert!(inserted.id > 0);

        let fetched = db.get_record(inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched.sleep_date, inserted.sleep_date);
        assert_eq!(fetched.sleep_start, inserted.sleep_start);
        assert_eq!(fetched.wake_time, inserted.wake_time);
        assert_eq!(fetched.duration_hours, 8.0);
    }

    #[tokio::test]
    async fn test_duplicate_date_is_unique_violation() {
        let (db, user_id) = setup().await;
        db.insert_record(draft(
            user_id,
            "2025-06-01",
            "2025-06-01T23:00:00",
            "2025-06-01T07:00:00",
            8.0,
        ))
        .await
        .unwrap();

        let result = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T22:00:00",
                "2025-06-01T06:00:00",
                8.0,
            ))
            .await;

        match result {
            Err(StorageError::UniqueViolation(table)) => assert_eq!(table, "sleep_records"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_foreign_key_violation() {
        let db = Database::open_in_memory().unwrap();

        let result = db
            .insert_record(draft(
                999,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await;

        match result {
            Err(StorageError::ForeignKeyViolation(table)) => assert_eq!(table, "sleep_records"),
            other => panic!("expected ForeignKeyViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_by_user_and_date() {
        let (db, user_id) = setup().await;
        let inserted = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await
            .unwrap();

        let found = db
            .get_record_by_user_and_date(user_id, "2025-06-01".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, inserted.id);

        let absent = db
            .get_record_by_user_and_date(user_id, "2025-06-02".parse().unwrap())
            .await
            .unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn test_update_record_persists_fields() {
        let (db, user_id) = setup().await;
        let mut record = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await
            .unwrap();

        record.wake_time = dt("2025-06-01T06:00:00");
        record.duration_hours = 7.0;
        record.note = Some("short night".to_string());

        assert!(db.update_record(&record).await.unwrap());

        let fetched = db.get_record(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.duration_hours, 7.0);
        assert_eq!(fetched.note.as_deref(), Some("short night"));
        assert_eq!(fetched.wake_time, dt("2025-06-01T06:00:00"));
    }

    #[tokio::test]
    async fn test_update_missing_record_reports_absence() {
        let (db, user_id) = setup().await;
        let mut record = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await
            .unwrap();

        assert!(db.delete_record(record.id).await.unwrap());
        record.note = Some("too late".to_string());
        assert!(!db.update_record(&record).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_absent() {
        let (db, user_id) = setup().await;
        let record = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await
            .unwrap();

        assert!(db.delete_record(record.id).await.unwrap());
        assert!(db.get_record(record.id).await.unwrap().is_none());
        assert!(!db.delete_record(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (db, user_id) = setup().await;
        for (date, start, wake) in [
            ("2025-06-01", "2025-06-01T23:00:00", "2025-06-01T07:00:00"),
            ("2025-06-03", "2025-06-03T23:00:00", "2025-06-03T07:00:00"),
            ("2025-06-02", "2025-06-02T23:00:00", "2025-06-02T07:00:00"),
        ] {
            db.insert_record(draft(user_id, date, start, wake, 8.0))
                .await
                .unwrap();
        }

        let records = db.list_records_by_user(user_id).await.unwrap();
        let dates: Vec<String> = records.iter().map(|r| r.sleep_date.to_string()).collect();
        assert_eq!(dates, vec!["2025-06-03", "2025-06-02", "2025-06-01"]);
    }

    #[tokio::test]
    async fn test_recent_stats_filter_and_order() {
        let (db, user_id) = setup().await;
        for (date, hours) in [("2025-05-20", 6.0), ("2025-06-01", 7.5), ("2025-06-10", 8.0)] {
            db.insert_record(draft(
                user_id,
                date,
                &format!("{date}T23:00:00"),
                &format!("{date}T07:00:00"),
                hours,
            ))
            .await
            .unwrap();
        }

        let stats = db
            .recent_daily_stats(user_id, "2025-06-01".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].date.to_string(), "2025-06-01");
        assert_eq!(stats[0].duration_hours, 7.5);
        assert_eq!(stats[1].date.to_string(), "2025-06-10");
    }

    #[tokio::test]
    async fn test_weekday_averages_group_and_order() {
        let (db, user_id) = setup().await;
        // 2025-06-01 is a Sunday; the 2nd, 9th and 16th are Mondays.
        for (date, hours) in [
            ("2025-06-02", 7.0),
            ("2025-06-09", 8.0),
            ("2025-06-16", 9.0),
            ("2025-06-01", 5.0),
        ] {
            db.insert_record(draft(
                user_id,
                date,
                &format!("{date}T23:00:00"),
                &format!("{date}T07:00:00"),
                hours,
            ))
            .await
            .unwrap();
        }

        let averages = db.weekday_average_stats(user_id).await.unwrap();

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].weekday, 0);
        assert_eq!(averages[0].average_hours, 5.0);
        assert_eq!(averages[1].weekday, 1);
        assert_eq!(averages[1].average_hours, 8.0);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_records() {
        let (db, user_id) = setup().await;
        let record = db
            .insert_record(draft(
                user_id,
                "2025-06-01",
                "2025-06-01T23:00:00",
                "2025-06-01T07:00:00",
                8.0,
            ))
            .await
            .unwrap();

        assert!(db.delete_user(user_id).await.unwrap());
        assert!(db.get_record(record.id).await.unwrap().is_none());
    }
}
