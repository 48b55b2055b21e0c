//! Nickname-based identity.

use tracing::info;

use crate::models::{User, MAX_NICKNAME_LEN};
use crate::storage::{Database, StorageError};

use super::ServiceError;

/// Registration and lookup of users.
#[derive(Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new user. Nicknames are trimmed, bounded in length,
    /// and unique across the store.
    pub async fn register(&self, nickname: &str) -> Result<User, ServiceError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(ServiceError::InvalidInput(
                "nickname must not be empty".into(),
            ));
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "nickname must be at most {MAX_NICKNAME_LEN} characters"
            )));
        }

        if self.db.get_user_by_nickname(nickname).await?.is_some() {
            return Err(Self::taken(nickname));
        }

        let user = match self.db.insert_user(nickname).await {
            Ok(user) => user,
            // A concurrent registration that slipped past the pre-check
            // trips the UNIQUE constraint instead.
            Err(StorageError::UniqueViolation(_)) => return Err(Self::taken(nickname)),
            Err(err) => return Err(err.into()),
        };

        info!(user_id = user.id, nickname = %user.nickname, "registered user");
        Ok(user)
    }

    fn taken(nickname: &str) -> ServiceError {
        ServiceError::Conflict(format!("nickname '{nickname}' is already taken"))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.db.get_user(id).await?)
    }

    pub async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.db.get_user_by_nickname(nickname.trim()).await?)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db.list_users().await?)
    }

    /// Delete a user and, by storage-level cascade, their records.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.db.delete_user(id).await? {
            return Err(ServiceError::NotFound(format!("user {id} does not exist")));
        }
        info!(user_id = id, "deleted user");
        Ok(())
    }
}
