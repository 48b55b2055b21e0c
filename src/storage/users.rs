//! User table queries.

use chrono::Utc;
use rusqlite::{params, Row};

use crate::models::User;

use super::{classify_constraint, parse_utc, Database, StorageError};

fn row_to_user(row: &Row<'_>) -> Result<User, StorageError> {
    Ok(User {
        id: row.get(0)?,
        nickname: row.get(1)?,
        created_at: parse_utc(&row.get::<_, String>(2)?)?,
    })
}

impl Database {
    /// Insert a user; the store assigns the id and creation stamp.
    /// A taken nickname surfaces as [`StorageError::UniqueViolation`].
    pub async fn insert_user(&self, nickname: &str) -> Result<User, StorageError> {
        let nickname = nickname.to_string();
        self.execute(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO users (nickname, created_at) VALUES (?1, ?2)",
                params![nickname, created_at.to_rfc3339()],
            )
            .map_err(|err| classify_constraint(err, "users"))?;

            Ok(User {
                id: conn.last_insert_rowid(),
                nickname,
                created_at,
            })
        })
        .await
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, nickname, created_at FROM users WHERE id = ?1")?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_user(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<User>, StorageError> {
        let nickname = nickname.to_string();
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, nickname, created_at FROM users WHERE nickname = ?1")?;
            let mut rows = stmt.query(params![nickname])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_user(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.execute(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, nickname, created_at FROM users ORDER BY id ASC")?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(row_to_user(row)?);
            }
            Ok(users)
        })
        .await
    }

    /// Delete a user. Returns false when no such user existed. The
    /// user's sleep records go with it (schema-level cascade).
    pub async fn delete_user(&self, id: i64) -> Result<bool, StorageError> {
        self.execute(move |conn| {
            let affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
        .await
    }
}
