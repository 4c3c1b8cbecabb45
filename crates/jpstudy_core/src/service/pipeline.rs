//! Sentence batch -> annotated sentences + leveled unknown items.
//!
//! # Responsibility
//! - Run validate, strip, annotate, gloss and reading steps per sentence.
//! - Collect unknown items and kanji across the batch and resolve levels.
//!
//! # Invariants
//! - A malformed sentence is rejected alone; the rest of the batch runs.
//! - Glosses are computed on markup-free text and applied to the markup text.
//! - Resolution failures stay failures; no level is ever substituted.

use crate::annotate::{annotate, apply_glosses};
use crate::cache::{ItemCache, ItemSource, SubjectIndex};
use crate::extract::{
    attach_levels, extract_unknown_kanji, kanji_to_resolve, UnknownItem, UnknownItemExtractor,
    UnknownKanji,
};
use crate::knowledge::KnowledgeState;
use crate::markup::{self, MarkupError};
use crate::model::sentence::{AnnotatedSentence, SentenceRecord};
use crate::resolve::{DependencyResolver, LevelResolution};
use crate::text::{Lexicon, Transliterator};
use log::{info, warn};
use std::time::Instant;

/// Assigns levels to a set of kanji.
pub trait LevelResolver {
    fn resolve_levels(&self, units: &[char]) -> LevelResolution;
}

impl<'r, 'conn, S: ItemSource, I: SubjectIndex> LevelResolver
    for DependencyResolver<'r, 'conn, S, I>
{
    fn resolve_levels(&self, units: &[char]) -> LevelResolution {
        DependencyResolver::resolve_levels(self, units.iter().copied())
    }
}

impl<R: LevelResolver + ?Sized> LevelResolver for &R {
    fn resolve_levels(&self, units: &[char]) -> LevelResolution {
        (**self).resolve_levels(units)
    }
}

/// Sentence refused by markup validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSentence {
    /// Position in the input batch.
    pub index: usize,
    pub record: SentenceRecord,
    pub error: MarkupError,
}

/// Everything one pipeline run produced.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub sentences: Vec<AnnotatedSentence>,
    pub rejected: Vec<RejectedSentence>,
    pub unknown_items: Vec<UnknownItem>,
    pub unknown_kanji: Vec<UnknownKanji>,
    /// Levels, per-kanji failures and unresolved components.
    pub resolution: LevelResolution,
}

/// Batch pipeline over one knowledge snapshot.
pub struct StudyPipeline<'p, L: Lexicon, R: LevelResolver> {
    knowledge: &'p KnowledgeState,
    transliterator: &'p Transliterator<L>,
    extractor: UnknownItemExtractor,
    resolver: R,
}

impl<'p, L: Lexicon, R: LevelResolver> StudyPipeline<'p, L, R> {
    pub fn new(
        knowledge: &'p KnowledgeState,
        transliterator: &'p Transliterator<L>,
        extractor: UnknownItemExtractor,
        resolver: R,
    ) -> Self {
        Self {
            knowledge,
            transliterator,
            extractor,
            resolver,
        }
    }

    /// Annotates one sentence.
    ///
    /// # Errors
    /// Returns the markup error when `record.japanese` is malformed.
    pub fn annotate_record(&self, record: &SentenceRecord) -> Result<AnnotatedSentence, MarkupError> {
        markup::validate(&record.japanese)?;
        let id = markup::strip(&record.japanese);

        let glosses = annotate(&id, self.knowledge, self.transliterator);
        let glossed = apply_glosses(&record.japanese, &glosses);
        let (hiragana, romaji) = self.transliterator.read_sentence(&id);

        Ok(AnnotatedSentence {
            id,
            japanese: glossed.text,
            english: record.english.clone(),
            tag: record.tag.clone(),
            hiragana,
            romaji,
            glosses,
            mismatches: glossed.mismatches,
        })
    }

    pub fn run(&self, records: &[SentenceRecord]) -> PipelineReport {
        let started_at = Instant::now();
        let mut report = PipelineReport::default();

        for (index, record) in records.iter().enumerate() {
            match self.annotate_record(record) {
                Ok(sentence) => report.sentences.push(sentence),
                Err(error) => {
                    warn!(
                        "event=sentence_rejected module=pipeline status=warn index={index} error={error}"
                    );
                    report.rejected.push(RejectedSentence {
                        index,
                        record: record.clone(),
                        error,
                    });
                }
            }
        }

        report.unknown_items = self
            .extractor
            .extract_unknown(&report.sentences, self.knowledge);
        report.unknown_kanji = extract_unknown_kanji(&report.sentences, self.knowledge);

        let units = kanji_to_resolve(&report.unknown_items, &report.unknown_kanji);
        report.resolution = self.resolver.resolve_levels(&units);
        attach_levels(
            &mut report.unknown_items,
            &mut report.unknown_kanji,
            &report.resolution,
        );

        info!(
            "event=pipeline_run module=pipeline status=ok sentences={} rejected={} unknown_items={} unknown_kanji={} level_failures={} duration_ms={}",
            report.sentences.len(),
            report.rejected.len(),
            report.unknown_items.len(),
            report.unknown_kanji.len(),
            report.resolution.failures.len(),
            started_at.elapsed().as_millis()
        );
        report
    }
}

/// Builds a resolver-backed pipeline over a cache and a subject index.
pub fn cached_pipeline<'p, 'r, 'conn, L, S, I>(
    knowledge: &'p KnowledgeState,
    transliterator: &'p Transliterator<L>,
    extractor: UnknownItemExtractor,
    cache: &'r ItemCache<'conn, S>,
    index: I,
) -> StudyPipeline<'p, L, DependencyResolver<'r, 'conn, S, I>>
where
    L: Lexicon,
    S: ItemSource,
    I: SubjectIndex,
{
    StudyPipeline::new(
        knowledge,
        transliterator,
        extractor,
        DependencyResolver::new(cache, index),
    )
}

/// Records whose every kanji is already known.
///
/// Markup is stripped before checking; malformed records are left out.
pub fn select_known_sentences<'a>(
    records: &'a [SentenceRecord],
    knowledge: &KnowledgeState,
) -> Vec<&'a SentenceRecord> {
    records
        .iter()
        .filter(|record| markup::validate(&record.japanese).is_ok())
        .filter(|record| knowledge.covers_text(&markup::strip(&record.japanese)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{select_known_sentences, LevelResolver, StudyPipeline};
    use crate::extract::{CandidateSource, UnknownItemExtractor};
    use crate::knowledge::KnowledgeState;
    use crate::model::sentence::SentenceRecord;
    use crate::resolve::{LevelResolution, UNRESOLVED_LEVEL};
    use crate::text::{ReadingLexicon, Transliterator};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingResolver {
        requested: RefCell<Vec<char>>,
    }

    impl LevelResolver for RecordingResolver {
        fn resolve_levels(&self, units: &[char]) -> LevelResolution {
            self.requested.borrow_mut().extend_from_slice(units);
            let mut resolution = LevelResolution::default();
            for unit in units {
                resolution.levels.insert(*unit, UNRESOLVED_LEVEL);
            }
            resolution
        }
    }

    fn engine() -> Transliterator<ReadingLexicon> {
        Transliterator::new(ReadingLexicon::from_entries([("食べ", "たべ"), ("板", "いた")]))
    }

    #[test]
    fn tagged_sentence_is_glossed_and_read() {
        let knowledge = KnowledgeState::from_known_units([]);
        let engine = engine();
        let resolver = RecordingResolver::default();
        let pipeline = StudyPipeline::new(
            &knowledge,
            &engine,
            UnknownItemExtractor::default(),
            &resolver,
        );

        let report = pipeline.run(&[SentenceRecord::new(
            "<verb>食べ</><teform>て</>",
            "eat and",
        )]);

        let sentence = &report.sentences[0];
        assert_eq!(sentence.id, "食べて");
        assert_eq!(sentence.japanese, "<verb>食べ[たべ]</><teform>て</>");
        assert_eq!(sentence.hiragana, "たべ て ");
        assert_eq!(sentence.romaji, "tabe te ");
        assert!(sentence.mismatches.is_empty());

        assert_eq!(report.unknown_items.len(), 1);
        let item = &report.unknown_items[0];
        assert_eq!(item.glossed_form, "食べ[たべ]");
        assert_eq!(item.source, CandidateSource::Gloss);
        assert_eq!(item.kanji_levels[0].level, Some(UNRESOLVED_LEVEL));
        assert_eq!(*resolver.requested.borrow(), vec!['食']);
    }

    #[test]
    fn known_sentence_filter_skips_unknown_and_malformed() {
        let knowledge = KnowledgeState::from_known_units(['板']);
        let records = vec![
            SentenceRecord::new("板です", "it is a board"),
            SentenceRecord::new("食べて", "eat and"),
            SentenceRecord::new("<verb>板", "broken"),
            SentenceRecord::new("ありがとう", "thanks"),
        ];

        let selected = select_known_sentences(&records, &knowledge);
        let texts: Vec<&str> = selected.iter().map(|r| r.japanese.as_str()).collect();
        assert_eq!(texts, vec!["板です", "ありがとう"]);
    }
}
