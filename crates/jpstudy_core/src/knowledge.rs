//! Learner knowledge state derived from a spaced-repetition snapshot.
//!
//! # Responsibility
//! - Classify kanji and words as known from per-item mastery stages.
//! - Answer membership queries for the annotator and sentence filters.
//!
//! # Invariants
//! - An item is known iff its mastery stage is strictly greater than
//!   `learned_stage`.
//! - The state is immutable after construction.

use crate::text::script::{is_kanji, kanji_in};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default boundary: stages above this value count as learned.
pub const DEFAULT_LEARNED_STAGE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A TSV line lacked the `characters<TAB>stage` shape.
    MalformedLine { line: usize, content: String },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine { line, content } => {
                write!(f, "snapshot line {line} is not `characters<TAB>stage`: `{content}`")
            }
        }
    }
}

impl Error for SnapshotError {}

/// Known kanji and known multi-character words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeState {
    units: HashSet<char>,
    words: HashSet<String>,
}

impl KnowledgeState {
    /// Builds a state from `(characters, mastery_stage)` pairs.
    ///
    /// Single-ideograph entries become known units; any longer entry becomes a
    /// known word. Entries at or below `learned_stage` are ignored.
    pub fn from_assignments<I, S>(assignments: I, learned_stage: i32) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        let mut state = Self::default();
        for (characters, stage) in assignments {
            if stage <= learned_stage {
                continue;
            }
            let characters = characters.as_ref().trim();
            let mut chars = characters.chars();
            match (chars.next(), chars.next()) {
                (Some(unit), None) if is_kanji(unit) => {
                    state.units.insert(unit);
                }
                (Some(_), _) => {
                    state.words.insert(characters.to_string());
                }
                (None, _) => {}
            }
        }
        state
    }

    /// Builds a state using [`DEFAULT_LEARNED_STAGE`].
    pub fn with_default_threshold<I, S>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        Self::from_assignments(assignments, DEFAULT_LEARNED_STAGE)
    }

    /// Parses a `characters<TAB>stage` snapshot export.
    ///
    /// Blank lines and `#` comments are skipped.
    pub fn from_snapshot_tsv(source: &str, learned_stage: i32) -> Result<Self, SnapshotError> {
        let mut assignments = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = line.split_once('\t').and_then(|(characters, stage)| {
                let stage = stage.trim().parse::<i32>().ok()?;
                Some((characters, stage))
            });
            match parsed {
                Some(pair) => assignments.push(pair),
                None => {
                    return Err(SnapshotError::MalformedLine {
                        line: index + 1,
                        content: line.to_string(),
                    })
                }
            }
        }
        Ok(Self::from_assignments(assignments, learned_stage))
    }

    /// Builds a state where every given kanji is known.
    pub fn from_known_units(units: impl IntoIterator<Item = char>) -> Self {
        Self {
            units: units.into_iter().collect(),
            words: HashSet::new(),
        }
    }

    pub fn is_known(&self, unit: char) -> bool {
        self.units.contains(&unit)
    }

    /// Returns true iff every unit is individually known. Empty input is known.
    pub fn is_known_subset<I>(&self, units: I) -> bool
    where
        I: IntoIterator<Item = char>,
    {
        units.into_iter().all(|unit| self.is_known(unit))
    }

    pub fn is_known_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Returns whether every kanji in `text` is known.
    pub fn covers_text(&self, text: &str) -> bool {
        self.is_known_subset(kanji_in(text))
    }

    pub fn known_unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn known_word_count(&self) -> usize {
        self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{KnowledgeState, SnapshotError};

    #[test]
    fn threshold_is_strictly_greater_than_learned_stage() {
        let state =
            KnowledgeState::with_default_threshold([("食", 2), ("寝", 1), ("板", 0)]);
        assert!(state.is_known('食'));
        assert!(!state.is_known('寝'));
        assert!(!state.is_known('板'));
    }

    #[test]
    fn multi_character_entries_become_words() {
        let state = KnowledgeState::from_assignments([("一つ", 5), ("一", 5)], 1);
        assert!(state.is_known_word("一つ"));
        assert!(state.is_known('一'));
        assert_eq!(state.known_word_count(), 1);
        assert_eq!(state.known_unit_count(), 1);
    }

    #[test]
    fn subset_requires_every_unit_and_accepts_empty() {
        let state = KnowledgeState::from_known_units(['食', '板']);
        assert!(state.is_known_subset(['食', '板']));
        assert!(!state.is_known_subset(['食', '寝']));
        assert!(state.is_known_subset(std::iter::empty()));
    }

    #[test]
    fn covers_text_ignores_kana() {
        let state = KnowledgeState::from_known_units(['食']);
        assert!(state.covers_text("食べてください"));
        assert!(!state.covers_text("寝る"));
    }

    #[test]
    fn snapshot_tsv_applies_learned_stage() {
        let snapshot = "# characters\tstage\n食\t3\n寝\t1\nコーヒー\t6\n\n";
        let state = KnowledgeState::from_snapshot_tsv(snapshot, 1).unwrap();
        assert!(state.is_known('食'));
        assert!(!state.is_known('寝'));
        assert!(state.is_known_word("コーヒー"));

        let strict = KnowledgeState::from_snapshot_tsv(snapshot, 3).unwrap();
        assert!(!strict.is_known('食'));
        assert!(strict.is_known_word("コーヒー"));

        assert_eq!(
            KnowledgeState::from_snapshot_tsv("食\t3\n寝\tmany\n", 1).unwrap_err(),
            SnapshotError::MalformedLine {
                line: 2,
                content: "寝\tmany".to_string(),
            }
        );
    }
}
