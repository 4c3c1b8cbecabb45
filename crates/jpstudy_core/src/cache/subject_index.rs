//! Character -> owning item index.
//!
//! The external catalogue maps every tracked character (or word) to the id of
//! the item that teaches it. The resolver only needs exact lookups.

use crate::db::{row_count, DbResult};
use crate::model::item::SubjectId;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

/// Exact-match lookup from characters to the owning item id.
pub trait SubjectIndex {
    fn lookup(&self, characters: &str) -> DbResult<Option<SubjectId>>;
}

impl<I: SubjectIndex + ?Sized> SubjectIndex for &I {
    fn lookup(&self, characters: &str) -> DbResult<Option<SubjectId>> {
        (**self).lookup(characters)
    }
}

impl SubjectIndex for HashMap<String, SubjectId> {
    fn lookup(&self, characters: &str) -> DbResult<Option<SubjectId>> {
        Ok(self.get(characters).copied())
    }
}

/// One catalogue row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIndexEntry {
    pub characters: String,
    pub subject_id: SubjectId,
    pub object: String,
}

impl SubjectIndexEntry {
    pub fn new(
        characters: impl Into<String>,
        subject_id: SubjectId,
        object: impl Into<String>,
    ) -> Self {
        Self {
            characters: characters.into(),
            subject_id,
            object: object.into(),
        }
    }
}

/// SQLite-backed index stored next to the item cache.
pub struct SqliteSubjectIndex<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectIndex<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts or replaces catalogue rows in one transaction.
    ///
    /// Unlike cached items, the catalogue is refreshed wholesale when synced.
    pub fn upsert_entries(&self, entries: &[SubjectIndexEntry]) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO subject_index (characters, subject_id, object)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(characters) DO UPDATE SET
                    subject_id = excluded.subject_id,
                    object = excluded.object;",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.characters.as_str(),
                    entry.subject_id,
                    entry.object.as_str()
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=subject_index_sync module=cache status=ok rows={}",
            entries.len()
        );
        Ok(entries.len())
    }

    pub fn len(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM subject_index;", [], |row| row.get(0))?;
        row_count("subject_index", count)
    }

    pub fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl SubjectIndex for SqliteSubjectIndex<'_> {
    fn lookup(&self, characters: &str) -> DbResult<Option<SubjectId>> {
        let id = self
            .conn
            .query_row(
                "SELECT subject_id FROM subject_index WHERE characters = ?1;",
                [characters],
                |row| row.get::<_, SubjectId>(0),
            )
            .optional()?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteSubjectIndex, SubjectIndex, SubjectIndexEntry};
    use crate::db::open_db_in_memory;

    #[test]
    fn upsert_then_lookup_and_refresh() {
        let conn = open_db_in_memory().unwrap();
        let index = SqliteSubjectIndex::new(&conn);

        index
            .upsert_entries(&[
                SubjectIndexEntry::new("板", 2467, "kanji"),
                SubjectIndexEntry::new("寝", 1100, "kanji"),
            ])
            .unwrap();
        assert_eq!(index.lookup("板").unwrap(), Some(2467));
        assert_eq!(index.lookup("猫").unwrap(), None);

        index
            .upsert_entries(&[SubjectIndexEntry::new("板", 2500, "kanji")])
            .unwrap();
        assert_eq!(index.lookup("板").unwrap(), Some(2500));
        assert_eq!(index.len().unwrap(), 2);
    }
}
