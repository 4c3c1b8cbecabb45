//! Persistent, append-only item cache over SQLite.
//!
//! # Responsibility
//! - Serve item records from the `items` table.
//! - Fetch and persist missing records through an [`ItemSource`].
//!
//! # Invariants
//! - Writes use `INSERT OR IGNORE`: the first stored record for an id wins,
//!   and a concurrent writer finding the id present is a no-op.
//! - `get` returns the persisted row, so every caller observes the same
//!   record for an id.
//! - Read paths reject invalid persisted state instead of masking it.

use super::source::{FetchError, ItemSource};
use crate::db::DbError;
use crate::model::item::{ItemRecord, ItemValidationError, SubjectId};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Fetch(FetchError),
    Validation(ItemValidationError),
    Db(DbError),
    InvalidData(String),
}

impl CacheError {
    /// Returns the fetch failure behind this error, if any.
    pub fn as_fetch(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid cached item data: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<FetchError> for CacheError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<ItemValidationError> for CacheError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Item cache borrowing a migrated connection.
pub struct ItemCache<'conn, S: ItemSource> {
    conn: &'conn Connection,
    source: S,
}

impl<'conn, S: ItemSource> ItemCache<'conn, S> {
    pub fn new(conn: &'conn Connection, source: S) -> Self {
        Self { conn, source }
    }

    /// Returns whether `id` is already persisted.
    pub fn exists(&self, id: SubjectId) -> CacheResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Returns the persisted record without touching the source.
    pub fn cached(&self, id: SubjectId) -> CacheResult<Option<ItemRecord>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT record_json FROM items WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|json| parse_record(id, &json)).transpose()
    }

    /// Returns the record for `id`, fetching and persisting it on first access.
    ///
    /// # Errors
    /// - `CacheError::Fetch` when the source fails; nothing is persisted.
    /// - `CacheError::Validation` when the source returns an invalid record.
    pub fn get(&self, id: SubjectId) -> CacheResult<ItemRecord> {
        if let Some(record) = self.cached(id)? {
            return Ok(record);
        }

        let started_at = Instant::now();
        let record = match self.source.fetch(id) {
            Ok(record) => record,
            Err(err) => {
                error!(
                    "event=item_fetch module=cache status=error id={id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };
        let inserted = self.insert(&record)?;
        info!(
            "event=item_fetch module=cache status=ok id={id} inserted={inserted} duration_ms={}",
            started_at.elapsed().as_millis()
        );

        self.cached(id)?.ok_or_else(|| {
            CacheError::InvalidData(format!("item {id} missing after insert"))
        })
    }

    /// Persists `record` unless its id is already stored.
    ///
    /// Returns `true` when this call wrote the row.
    pub fn insert(&self, record: &ItemRecord) -> CacheResult<bool> {
        record.validate()?;
        let json = serde_json::to_string(record)
            .map_err(|err| CacheError::InvalidData(err.to_string()))?;

        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO items (id, object, characters, level, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id,
                record.object.as_str(),
                record.characters.as_deref(),
                record.level,
                json,
            ],
        )?;
        Ok(changed == 1)
    }

    /// Number of persisted records.
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| CacheError::InvalidData(format!("row count {count}")))
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn parse_record(id: SubjectId, json: &str) -> CacheResult<ItemRecord> {
    let record: ItemRecord = serde_json::from_str(json).map_err(|err| {
        CacheError::InvalidData(format!("items.record_json for id {id}: {err}"))
    })?;
    if record.id != id {
        return Err(CacheError::InvalidData(format!(
            "items row {id} holds record for id {}",
            record.id
        )));
    }
    record.validate()?;
    Ok(record)
}
