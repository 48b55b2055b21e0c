//! Domain services.
//!
//! Each service is a thin cloneable struct over the injected
//! [`Database`](crate::storage::Database) handle. Invariants live here:
//! duration is always derived from the timestamps, one record per user
//! per date, typed failures instead of transport codes.

mod records;
mod stats;
mod users;

pub use records::SleepRecordService;
pub use stats::{SleepStatsService, DEFAULT_WINDOW_DAYS};
pub use users::UserService;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::storage::StorageError;

/// Typed outcomes for service operations. The HTTP layer owns the
/// mapping to status codes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage failure: {0}")]
    Upstream(#[from] StorageError),
}

const DATETIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a client-supplied timestamp. Accepts second or minute
/// precision with either a `T` or a space separator, which covers what
/// datetime-local form fields submit.
fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }

    for format in DATETIME_INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    Err(ServiceError::InvalidInput(format!(
        "{field} '{trimmed}' is not a timestamp like 2025-06-01T23:30"
    )))
}
