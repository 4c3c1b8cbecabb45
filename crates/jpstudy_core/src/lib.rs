//! Core logic for jpstudy: knowledge-aware Japanese sentence annotation.
//! Owns the annotation rules, the persistent item cache and level resolution.

pub mod annotate;
pub mod cache;
pub mod config;
pub mod db;
pub mod extract;
pub mod knowledge;
pub mod logging;
pub mod markup;
pub mod model;
pub mod resolve;
pub mod service;
pub mod text;

pub use annotate::{annotate, apply_glosses, Annotation, GlossEntry, ReplacementMismatch};
pub use cache::{
    CacheError, CacheResult, FetchError, HttpItemSource, ItemCache, ItemSource,
    SqliteSubjectIndex, SubjectIndex, SubjectIndexEntry,
};
pub use config::{ConfigError, ItemSourceConfig, PipelineConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use extract::{
    attach_levels, extract_unknown_kanji, ExamplePolicy, UnknownItem, UnknownItemExtractor,
    UnknownKanji,
};
pub use knowledge::{KnowledgeState, SnapshotError};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use markup::MarkupError;
pub use model::item::{ItemRecord, SubjectId};
pub use model::sentence::{AnnotatedSentence, SentenceRecord};
pub use resolve::{DependencyResolver, LevelResolution, ResolveError, UNRESOLVED_LEVEL};
pub use service::pipeline::{
    select_known_sentences, LevelResolver, PipelineReport, RejectedSentence, StudyPipeline,
};
pub use text::{ReadingLexicon, Token, Transliterator};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
