//! String-keyed durable store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/set/remove over opaque string values by string key.
//! - Enforce a per-value size quota the way browser local storage does.
//!
//! # Invariants
//! - `set_item` replaces the previous value atomically.
//! - A rejected write leaves the previous value in place.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default per-value quota: 5 MiB.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for key-value persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Blank keys are not addressable.
    InvalidKey,
    /// Value is larger than the configured quota.
    QuotaExceeded { len: usize, quota: usize },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey => write!(f, "storage key must not be blank"),
            Self::QuotaExceeded { len, quota } => {
                write!(f, "value of {len} bytes exceeds storage quota of {quota} bytes")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey | Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Durable string-keyed store used for snapshot persistence.
pub trait KeyValueRepository {
    fn get_item(&self, key: &str) -> RepoResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a value was present.
    fn remove_item(&self, key: &str) -> RepoResult<bool>;
}

impl<R: KeyValueRepository + ?Sized> KeyValueRepository for &R {
    fn get_item(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> RepoResult<bool> {
        (**self).remove_item(key)
    }
}

/// SQLite-backed key-value repository over the `kv_store` table.
pub struct SqliteKeyValueRepository<'conn> {
    conn: &'conn Connection,
    quota_bytes: usize,
}

impl<'conn> SqliteKeyValueRepository<'conn> {
    /// Creates a repository with the default quota.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_quota(conn, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(conn: &'conn Connection, quota_bytes: usize) -> Self {
        Self { conn, quota_bytes }
    }
}

impl KeyValueRepository for SqliteKeyValueRepository<'_> {
    fn get_item(&self, key: &str) -> RepoResult<Option<String>> {
        validate_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> RepoResult<()> {
        validate_key(key)?;
        if value.len() > self.quota_bytes {
            return Err(RepoError::QuotaExceeded {
                len: value.len(),
                quota: self.quota_bytes,
            });
        }

        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> RepoResult<bool> {
        validate_key(key)?;
        let changed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

fn validate_key(key: &str) -> RepoResult<()> {
    if key.trim().is_empty() {
        return Err(RepoError::InvalidKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{KeyValueRepository, RepoError, SqliteKeyValueRepository};
    use crate::db::open_db_in_memory;

    #[test]
    fn set_get_remove_roundtrip() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);

        assert_eq!(repo.get_item("k").unwrap(), None);
        repo.set_item("k", "one").unwrap();
        repo.set_item("k", "two").unwrap();
        assert_eq!(repo.get_item("k").unwrap().as_deref(), Some("two"));
        assert!(repo.remove_item("k").unwrap());
        assert!(!repo.remove_item("k").unwrap());
    }

    #[test]
    fn quota_rejects_large_value_and_keeps_previous() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::with_quota(&conn, 4);

        repo.set_item("k", "abc").unwrap();
        let err = repo.set_item("k", "abcde").unwrap_err();
        assert!(matches!(err, RepoError::QuotaExceeded { len: 5, quota: 4 }));
        assert_eq!(repo.get_item("k").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn blank_key_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteKeyValueRepository::new(&conn);
        assert!(matches!(
            repo.set_item("  ", "v").unwrap_err(),
            RepoError::InvalidKey
        ));
    }
}
