//! Reading lexicon used by the tokenizer.
//!
//! # Responsibility
//! - Map surface forms (kanji words, optionally with okurigana) to readings.
//! - Answer longest-prefix queries for segmentation.
//!
//! # Invariants
//! - Stored readings are hiragana.
//! - `longest_match` only returns prefixes ending on a char boundary.

use super::kana::to_hiragana;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reading dictionary queried by [`crate::text::Transliterator`].
pub trait Lexicon {
    /// Returns the longest entry that is a prefix of `text`.
    fn longest_match(&self, text: &str) -> Option<LexiconMatch<'_>>;

    /// Returns the reading of one exact surface form.
    fn reading(&self, surface: &str) -> Option<&str>;
}

impl<L: Lexicon + ?Sized> Lexicon for &L {
    fn longest_match(&self, text: &str) -> Option<LexiconMatch<'_>> {
        (**self).longest_match(text)
    }

    fn reading(&self, surface: &str) -> Option<&str> {
        (**self).reading(surface)
    }
}

/// Prefix match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexiconMatch<'l> {
    /// Matched prefix length in bytes.
    pub len: usize,
    /// Hiragana reading of the matched surface.
    pub reading: &'l str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexiconError {
    /// A TSV line lacked the `surface<TAB>reading` shape.
    MalformedLine { line: usize, content: String },
}

impl Display for LexiconError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine { line, content } => {
                write!(f, "lexicon line {line} is not `surface<TAB>reading`: `{content}`")
            }
        }
    }
}

impl Error for LexiconError {}

/// In-memory surface -> reading dictionary.
#[derive(Debug, Clone, Default)]
pub struct ReadingLexicon {
    entries: HashMap<String, String>,
    max_chars: usize,
}

impl ReadingLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a lexicon from `(surface, reading)` pairs. Later duplicates win.
    pub fn from_entries<I, S, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: Into<String>,
        R: AsRef<str>,
    {
        let mut lexicon = Self::new();
        for (surface, reading) in entries {
            lexicon.insert(surface, reading.as_ref());
        }
        lexicon
    }

    /// Parses `surface<TAB>reading` lines. Blank lines and `#` comments are skipped.
    pub fn from_tsv(source: &str) -> Result<Self, LexiconError> {
        let mut lexicon = Self::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((surface, reading)) = line.split_once('\t') else {
                return Err(LexiconError::MalformedLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            };
            let (surface, reading) = (surface.trim(), reading.trim());
            if surface.is_empty() || reading.is_empty() {
                return Err(LexiconError::MalformedLine {
                    line: index + 1,
                    content: line.to_string(),
                });
            }
            lexicon.insert(surface, reading);
        }
        Ok(lexicon)
    }

    pub fn insert(&mut self, surface: impl Into<String>, reading: &str) {
        let surface = surface.into();
        self.max_chars = self.max_chars.max(surface.chars().count());
        self.entries.insert(surface, to_hiragana(reading));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lexicon for ReadingLexicon {
    fn longest_match(&self, text: &str) -> Option<LexiconMatch<'_>> {
        let ends: Vec<usize> = text
            .char_indices()
            .map(|(offset, ch)| offset + ch.len_utf8())
            .take(self.max_chars)
            .collect();

        ends.into_iter().rev().find_map(|end| {
            self.entries
                .get(&text[..end])
                .map(|reading| LexiconMatch {
                    len: end,
                    reading: reading.as_str(),
                })
        })
    }

    fn reading(&self, surface: &str) -> Option<&str> {
        self.entries.get(surface).map(String::as_str)
    }
}
