//! Furigana annotator.
//!
//! # Responsibility
//! - Decide per token whether a reading gloss is needed.
//! - Produce an ordered `original -> gloss` replacement map.
//! - Apply that map onto the text shown to the learner.
//!
//! # Invariants
//! - Tokens whose kanji are all known are never glossed.
//! - Gloss format is `"{original}[{phonetic}] "`; the trailing space is part
//!   of the stored gloss and stripped when applied.
//! - A repeated key keeps its first position and takes the last value.

use crate::knowledge::KnowledgeState;
use crate::text::script::kanji_in;
use crate::text::{Lexicon, Token, Transliterator};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inflectional kana trimmed from the end of a glossed token.
pub const SUFFIX_ENDINGS: &[char] = &['て', 'で', 'く', 'か'];

/// One replacement produced by [`annotate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossEntry {
    /// Span to replace (after suffix trimming).
    pub original: String,
    /// Hiragana reading of `original`.
    pub phonetic: String,
    /// Canonical gloss, `"{original}[{phonetic}] "`.
    pub gloss: String,
    /// Ending removed by the suffix-trim heuristic, if it fired.
    pub trimmed_suffix: Option<char>,
}

impl GlossEntry {
    fn new(original: String, phonetic: String, trimmed_suffix: Option<char>) -> Self {
        let gloss = format!("{original}[{phonetic}] ");
        Self {
            original,
            phonetic,
            gloss,
            trimmed_suffix,
        }
    }

    /// Gloss without its canonical trailing space, as inserted into text.
    pub fn inline_gloss(&self) -> &str {
        self.gloss.strip_suffix(' ').unwrap_or(&self.gloss)
    }
}

/// Insertion-ordered gloss map keyed by original span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    entries: Vec<GlossEntry>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`; an existing key is overwritten in place.
    pub fn insert(&mut self, entry: GlossEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.original == entry.original)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, original: &str) -> Option<&GlossEntry> {
        self.entries.iter().find(|entry| entry.original == original)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlossEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Annotation {
    type Item = &'a GlossEntry;
    type IntoIter = std::slice::Iter<'a, GlossEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Computes gloss replacements for every token that contains unknown kanji.
///
/// # Side effects
/// - Logs `suffix_trim` when the trimming heuristic fires.
/// - Logs `gloss_skipped` for unknown tokens the lexicon cannot read.
pub fn annotate<L: Lexicon>(
    text: &str,
    knowledge: &KnowledgeState,
    transliterator: &Transliterator<L>,
) -> Annotation {
    let mut annotation = Annotation::new();

    for token in transliterator.tokenize(text) {
        if knowledge.is_known_subset(kanji_in(&token.original)) {
            continue;
        }
        if !token.has_reading() {
            warn!(
                "event=gloss_skipped module=annotate status=warn reason=no_reading span={}",
                token.original
            );
            continue;
        }
        annotation.insert(gloss_for(token));
    }

    annotation
}

fn gloss_for(token: Token) -> GlossEntry {
    let Token {
        mut original,
        mut phonetic,
        ..
    } = token;

    let trimmed = match (original.chars().count() > 1, original.chars().last()) {
        (true, Some(last)) if SUFFIX_ENDINGS.contains(&last) && phonetic.ends_with(last) => {
            debug!(
                "event=suffix_trim module=annotate status=ok suffix={last} original={original} phonetic={phonetic}"
            );
            original.pop();
            phonetic.pop();
            Some(last)
        }
        _ => None,
    };

    GlossEntry::new(original, phonetic, trimmed)
}

/// A gloss key that does not occur in the text it should be applied to.
///
/// Data-quality warning: the replacement is skipped, annotation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMismatch {
    pub key: String,
    pub gloss: String,
    pub target: String,
}

impl Display for ReplacementMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gloss key `{}` ({}) not found in `{}`",
            self.key, self.gloss, self.target
        )
    }
}

impl Error for ReplacementMismatch {}

/// Text with glosses applied plus the replacements that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossedText {
    pub text: String,
    pub mismatches: Vec<ReplacementMismatch>,
}

/// Applies every gloss as a whole-string replacement, in annotation order.
///
/// `target` may differ from the annotated text (for example it may still
/// carry tagged-span markup), so a key can be missing; such entries are
/// reported and skipped.
pub fn apply_glosses(target: &str, annotation: &Annotation) -> GlossedText {
    let mut text = target.to_string();
    let mut mismatches = Vec::new();

    for entry in annotation {
        if entry.original.is_empty() || !text.contains(entry.original.as_str()) {
            warn!(
                "event=replacement_mismatch module=annotate status=warn key={} target={}",
                entry.original, text
            );
            mismatches.push(ReplacementMismatch {
                key: entry.original.clone(),
                gloss: entry.gloss.clone(),
                target: text.clone(),
            });
            continue;
        }
        text = text.replace(entry.original.as_str(), entry.inline_gloss());
    }

    GlossedText { text, mismatches }
}
