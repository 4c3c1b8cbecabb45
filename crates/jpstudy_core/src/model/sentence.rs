//! Sentence records flowing through the annotation pipeline.

use crate::annotate::{Annotation, ReplacementMismatch};
use serde::{Deserialize, Serialize};

/// Raw sentence supplied by a loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRecord {
    /// Japanese text; curated lesson text may carry tagged-span markup.
    pub japanese: String,
    pub english: String,
    /// Source label (e.g. the deck or lesson it came from).
    #[serde(default)]
    pub tag: Option<String>,
}

impl SentenceRecord {
    pub fn new(japanese: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            japanese: japanese.into(),
            english: english.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Sentence after validation, glossing and reading generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSentence {
    /// Markup-free Japanese text; stable identity of the sentence.
    pub id: String,
    /// Japanese text with markup kept and glosses inserted.
    pub japanese: String,
    pub english: String,
    pub tag: Option<String>,
    /// Whole-sentence hiragana reading.
    pub hiragana: String,
    /// Whole-sentence romaji reading.
    pub romaji: String,
    /// Gloss replacements computed from `id`.
    pub glosses: Annotation,
    /// Glosses that could not be applied onto `japanese`.
    pub mismatches: Vec<ReplacementMismatch>,
}
