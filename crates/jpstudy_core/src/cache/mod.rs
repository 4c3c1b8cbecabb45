//! Persistent item cache and the external lookups behind it.
//!
//! # Responsibility
//! - Fetch item records from an external source on first access.
//! - Persist fetched records so later runs never refetch them.
//! - Map characters to the id of the item that owns them.
//!
//! # Invariants
//! - The cache is append-only: a stored id is never overwritten.
//! - Fetch failures are surfaced to the caller, never retried here.

pub mod item_cache;
pub mod source;
pub mod subject_index;

pub use item_cache::{CacheError, CacheResult, ItemCache};
pub use source::{decode_item, FetchError, HttpItemSource, ItemSource};
pub use subject_index::{SqliteSubjectIndex, SubjectIndex, SubjectIndexEntry};
