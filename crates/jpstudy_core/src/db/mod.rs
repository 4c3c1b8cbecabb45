//! SQLite storage for the persistent item cache.
//!
//! # Responsibility
//! - Open and configure cache connections.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Cache code must not read/write rows before migrations succeed.
//! - A file that is not an SQLite database is reported as such, never
//!   overwritten.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Cache path points at a file SQLite cannot read as a database.
    NotACacheFile(PathBuf),
    /// Cache written by a newer schema than this build knows.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A stored value is outside what the schema allows.
    InvalidData(String),
}

impl DbError {
    /// Returns whether SQLite rejected the file header.
    pub(crate) fn is_not_a_database(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(inner, _))
                if inner.code == rusqlite::ErrorCode::NotADatabase
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "cache database error: {err}"),
            Self::NotACacheFile(path) => {
                write!(f, "`{}` is not an item cache database", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "cache schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidData(message) => write!(f, "invalid cache data: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NotACacheFile(_) | Self::UnsupportedSchemaVersion { .. } | Self::InvalidData(_) => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Converts a `COUNT(*)` result, rejecting values no table can hold.
pub(crate) fn row_count(table: &str, count: i64) -> DbResult<usize> {
    usize::try_from(count).map_err(|_| DbError::InvalidData(format!("{table} row count {count}")))
}
