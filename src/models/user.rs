//! User identity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum nickname length in characters, after trimming.
pub const MAX_NICKNAME_LEN: usize = 32;

/// A registered user, identified by a unique nickname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,

    /// Unique nickname
    pub nickname: String,

    /// When this user was registered
    pub created_at: DateTime<Utc>,
}
