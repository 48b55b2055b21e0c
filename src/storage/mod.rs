//! SQLite-backed storage layer.
//!
//! All access goes through [`Database`], a cloneable handle over a
//! dedicated worker thread that owns the single SQLite connection.
//! Async callers submit closures and await the reply over a oneshot
//! channel, so every statement is serialized without blocking the
//! runtime. Dropping the last handle shuts the worker down.

mod migrations;
mod records;
mod users;

use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{ffi, Connection};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use migrations::run_migrations;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unique constraint violated on {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated on {0}")]
    ForeignKeyViolation(String),

    #[error("stored value could not be decoded: {0}")]
    InvalidRow(String),

    #[error("schema migration failed: {0}")]
    Migration(String),

    #[error("database worker unavailable: {0}")]
    Closed(String),
}

/// Map a failed statement to a typed constraint error where possible.
///
/// The UNIQUE constraint on (user_id, sleep_date) is the real guard
/// against concurrent duplicate inserts, so callers need to tell a
/// constraint trip apart from any other SQLite failure.
fn classify_constraint(err: rusqlite::Error, table: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(cause, _) = &err {
        match cause.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return StorageError::UniqueViolation(table.to_string());
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return StorageError::ForeignKeyViolation(table.to_string());
            }
            _ => {}
        }
    }
    StorageError::Sqlite(err)
}

/// Stored format for naive timestamps (sleep_start, wake_time).
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_naive(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn parse_naive(value: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map_err(|err| StorageError::InvalidRow(format!("timestamp '{value}': {err}")))
}

fn parse_date(value: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| StorageError::InvalidRow(format!("date '{value}': {err}")))
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| StorageError::InvalidRow(format!("datetime '{value}': {err}")))
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

#[derive(Clone, Debug)]
enum Location {
    Disk(PathBuf),
    Memory,
}

impl Location {
    fn connect(&self) -> Result<Connection, StorageError> {
        match self {
            Location::Disk(path) => Ok(Connection::open(path)?),
            Location::Memory => Ok(Connection::open_in_memory()?),
        }
    }

    fn describe(&self) -> String {
        match self {
            Location::Disk(path) => path.display().to_string(),
            Location::Memory => ":memory:".to_string(),
        }
    }
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("failed to send shutdown to database worker: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("failed to join database worker: {join_err:?}");
            }
        }
    }
}

/// Handle to the sleep diary database.
///
/// Cheap to clone; all clones share one worker thread and connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open (creating if necessary) the database at `path` and run any
    /// pending schema migrations.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::spawn(Location::Disk(path))
    }

    /// Open a fresh in-memory database. Used by tests; the schema is
    /// applied the same way as on disk.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::spawn(Location::Memory)
    }

    fn spawn(location: Location) -> Result<Self, StorageError> {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_location = location.clone();

        let worker = thread::Builder::new()
            .name("kip-db".into())
            .spawn(move || {
                let mut conn = match thread_location.connect() {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("failed to enable foreign keys: {err}");
                }

                if ready_tx.send(run_migrations(&mut conn)).is_err() {
                    error!("initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                debug!("database worker shutting down");
            })?;

        ready_rx
            .recv()
            .map_err(|_| StorageError::Closed("worker exited before signaling readiness".into()))??;

        info!(path = %location.describe(), "database ready");

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Run `task` on the worker thread and await its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                debug!("database caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| StorageError::Closed(format!("failed to queue task: {err}")))?;

        reply_rx
            .await
            .map_err(|_| StorageError::Closed("worker terminated before replying".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_runs_schema() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .execute(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let mut rows = stmt.query([])?;
                let mut names = Vec::new();
                while let Some(row) = rows.next()? {
                    names.push(row.get::<_, String>(0)?);
                }
                Ok(names)
            })
            .await
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"sleep_records".to_string()));
    }

    #[tokio::test]
    async fn test_open_on_disk_is_reopenable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kip.db");

        {
            let db = Database::open(&path).unwrap();
            db.execute(|conn| {
                conn.execute(
                    "INSERT INTO users (nickname, created_at) VALUES ('probe', '2025-06-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        }

        // Second open finds the schema current and the row still there.
        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_classify_constraint_passes_through_other_errors() {
        let err = rusqlite::Error::InvalidQuery;
        match classify_constraint(err, "users") {
            StorageError::Sqlite(_) => {}
            other => panic!("expected Sqlite passthrough, got {other:?}"),
        }
    }

    #[test]
    fn test_naive_timestamp_round_trip() {
        let dt: NaiveDateTime = "2025-06-01T23:30:00".parse().unwrap();
        assert_eq!(format_naive(dt), "2025-06-01T23:30:00");
        assert_eq!(parse_naive("2025-06-01T23:30:00").unwrap(), dt);
        assert!(parse_naive("01/06/2025 23:30").is_err());
    }
}
