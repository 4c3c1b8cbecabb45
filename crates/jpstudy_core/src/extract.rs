//! Unknown-item extraction for downstream card generation.
//!
//! # Responsibility
//! - Turn gloss replacements and katakana words into unknown-item candidates.
//! - Collapse candidates to one record per glossed form.
//! - Group unknown kanji with their example sentences.
//! - Merge resolved levels onto extracted items.
//!
//! # Invariants
//! - Output order is the order of first occurrence in the input.
//! - Extraction is deterministic: the same input yields the same output.

use crate::knowledge::KnowledgeState;
use crate::model::sentence::AnnotatedSentence;
use crate::resolve::LevelResolution;
use crate::text::kana::{romanize, to_hiragana};
use crate::text::script::{is_katakana, kanji_in, LONG_VOWEL_MARK};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which example to keep when several sentences yield the same glossed form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamplePolicy {
    /// Keep the first sentence in input order.
    #[default]
    FirstSeen,
    /// Keep the sentence whose tag sorts last; ties keep the earlier one.
    GreatestTag,
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Gloss,
    Katakana,
}

/// Level of one kanji inside an unknown item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanjiLevel {
    pub kanji: char,
    /// `None` when resolution failed; `Some(-1)` when no item owns the kanji.
    pub level: Option<i32>,
}

/// Deduplicated unknown word with one example context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownItem {
    pub word: String,
    /// Hiragana reading.
    pub reading: String,
    pub romaji: String,
    /// `"{word}[{reading}]"`; the deduplication key.
    pub glossed_form: String,
    pub example_sentence: String,
    pub example_translation: String,
    pub source: CandidateSource,
    /// Filled by [`attach_levels`].
    #[serde(default)]
    pub kanji_levels: Vec<KanjiLevel>,
    #[serde(skip)]
    example_tag: Option<String>,
}

impl UnknownItem {
    fn candidate(
        word: &str,
        reading: String,
        source: CandidateSource,
        sentence: &AnnotatedSentence,
    ) -> Self {
        Self {
            romaji: romanize(&reading),
            glossed_form: format!("{word}[{reading}]"),
            word: word.to_string(),
            reading,
            example_sentence: sentence.id.clone(),
            example_translation: sentence.english.clone(),
            source,
            kanji_levels: Vec::new(),
            example_tag: sentence.tag.clone(),
        }
    }
}

/// Unknown kanji with every sentence it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownKanji {
    pub kanji: char,
    /// `"{sentence} -> {translation}"`, one entry per occurrence, input order.
    pub examples: Vec<String>,
    /// Filled by [`attach_levels`].
    pub level: Option<i32>,
}

/// Collects and deduplicates unknown items from annotated sentences.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownItemExtractor {
    policy: ExamplePolicy,
}

impl UnknownItemExtractor {
    pub fn new(policy: ExamplePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ExamplePolicy {
        self.policy
    }

    pub fn extract(&self, sentences: &[AnnotatedSentence]) -> Vec<UnknownItem> {
        self.collect(sentences, |_| true)
    }

    /// Like [`extract`](Self::extract), dropping words `knowledge` already knows.
    pub fn extract_unknown(
        &self,
        sentences: &[AnnotatedSentence],
        knowledge: &KnowledgeState,
    ) -> Vec<UnknownItem> {
        self.collect(sentences, |candidate| !knowledge.is_known_word(&candidate.word))
    }

    fn collect<F>(&self, sentences: &[AnnotatedSentence], keep: F) -> Vec<UnknownItem>
    where
        F: Fn(&UnknownItem) -> bool,
    {
        let mut items: Vec<UnknownItem> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for sentence in sentences {
            for candidate in candidates(sentence).into_iter().filter(|c| keep(c)) {
                match positions.get(&candidate.glossed_form) {
                    Some(&index) => {
                        if self.prefers(&items[index], &candidate) {
                            items[index] = candidate;
                        }
                    }
                    None => {
                        positions.insert(candidate.glossed_form.clone(), items.len());
                        items.push(candidate);
                    }
                }
            }
        }

        items
    }

    fn prefers(&self, current: &UnknownItem, candidate: &UnknownItem) -> bool {
        match self.policy {
            ExamplePolicy::FirstSeen => false,
            ExamplePolicy::GreatestTag => candidate.example_tag > current.example_tag,
        }
    }
}

fn candidates(sentence: &AnnotatedSentence) -> Vec<UnknownItem> {
    let glosses = sentence.glosses.iter().map(|entry| {
        UnknownItem::candidate(
            &entry.original,
            entry.phonetic.clone(),
            CandidateSource::Gloss,
            sentence,
        )
    });
    let katakana = katakana_words(&sentence.id).into_iter().map(|word| {
        UnknownItem::candidate(word, to_hiragana(word), CandidateSource::Katakana, sentence)
    });
    glosses.chain(katakana).collect()
}

/// Returns maximal katakana runs longer than one character.
///
/// Runs made only of `ー`/`・` are not words and are skipped.
pub fn katakana_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (offset, ch) in text.char_indices().chain(std::iter::once((text.len(), '\0'))) {
        match (start, is_katakana(ch)) {
            (None, true) => start = Some(offset),
            (Some(begin), false) => {
                let run = &text[begin..offset];
                if run.chars().count() > 1
                    && run.chars().any(|c| c != LONG_VOWEL_MARK && c != '・')
                {
                    words.push(run);
                }
                start = None;
            }
            _ => {}
        }
    }

    words
}

/// Groups every unknown kanji with the sentences it appears in.
///
/// A kanji occurring twice in one sentence lists that sentence twice.
pub fn extract_unknown_kanji(
    sentences: &[AnnotatedSentence],
    knowledge: &KnowledgeState,
) -> Vec<UnknownKanji> {
    let mut groups: Vec<UnknownKanji> = Vec::new();
    let mut positions: HashMap<char, usize> = HashMap::new();

    for sentence in sentences {
        let example = format!("{} -> {}", sentence.id, sentence.english);
        for kanji in kanji_in(&sentence.id) {
            if knowledge.is_known(kanji) {
                continue;
            }
            let index = *positions.entry(kanji).or_insert_with(|| {
                groups.push(UnknownKanji {
                    kanji,
                    examples: Vec::new(),
                    level: None,
                });
                groups.len() - 1
            });
            groups[index].examples.push(example.clone());
        }
    }

    groups
}

/// Copies resolved levels onto items and kanji groups.
///
/// Kanji that failed to resolve keep `None`; they are never defaulted.
pub fn attach_levels(
    items: &mut [UnknownItem],
    kanji: &mut [UnknownKanji],
    resolution: &LevelResolution,
) {
    for item in items.iter_mut() {
        let mut seen = Vec::new();
        item.kanji_levels = kanji_in(&item.word)
            .into_iter()
            .filter(|unit| {
                let first = !seen.contains(unit);
                seen.push(*unit);
                first
            })
            .map(|unit| KanjiLevel {
                kanji: unit,
                level: resolution.level(unit),
            })
            .collect();
    }
    for group in kanji.iter_mut() {
        group.level = resolution.level(group.kanji);
    }
}

/// Every distinct kanji across items and kanji groups, first-seen order.
pub fn kanji_to_resolve(items: &[UnknownItem], kanji: &[UnknownKanji]) -> Vec<char> {
    let mut units: Vec<char> = Vec::new();
    let all = items
        .iter()
        .flat_map(|item| kanji_in(&item.word))
        .chain(kanji.iter().map(|group| group.kanji));
    for unit in all {
        if !units.contains(&unit) {
            units.push(unit);
        }
    }
    units
}
