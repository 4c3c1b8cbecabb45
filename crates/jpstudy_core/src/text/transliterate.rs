//! Transliteration engine: text -> `(original, phonetic, romanized)` tokens.
//!
//! # Responsibility
//! - Segment text by lexicon longest-match and script runs.
//! - Attach a hiragana reading and a Hepburn romanization to every token.
//!
//! # Invariants
//! - Concatenating `Token::original` over `tokenize(text)` yields `text`.
//! - Tokenization is deterministic and has no failure path; text the lexicon
//!   cannot read is emitted verbatim with an empty reading.

use super::kana::{romanize, to_hiragana};
use super::lexicon::Lexicon;
use super::script::Script;
use serde::{Deserialize, Serialize};

/// One transliterated segment of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Source substring, byte-for-byte.
    pub original: String,
    /// Hiragana reading; empty for punctuation and unreadable ideographs.
    pub phonetic: String,
    /// Modified-Hepburn romanization of `phonetic`.
    pub romanized: String,
}

impl Token {
    fn new(original: &str, phonetic: impl Into<String>) -> Self {
        let phonetic = phonetic.into();
        let romanized = romanize(&phonetic);
        Self {
            original: original.to_string(),
            phonetic,
            romanized,
        }
    }

    fn verbatim(original: &str) -> Self {
        Self {
            original: original.to_string(),
            phonetic: String::new(),
            romanized: String::new(),
        }
    }

    /// Returns whether the tokenizer produced a reading for this token.
    pub fn has_reading(&self) -> bool {
        !self.phonetic.is_empty()
    }
}

/// Lexicon-backed tokenizer.
#[derive(Debug, Clone)]
pub struct Transliterator<L: Lexicon> {
    lexicon: L,
}

impl<L: Lexicon> Transliterator<L> {
    pub fn new(lexicon: L) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &L {
        &self.lexicon
    }

    /// Returns a lazy token iterator over `text`.
    ///
    /// Each call starts a fresh pass, so the sequence is restartable.
    pub fn tokenize<'t>(&'t self, text: &'t str) -> Tokens<'t, L> {
        Tokens {
            lexicon: &self.lexicon,
            text,
            pos: 0,
        }
    }

    /// Returns the whole-sentence `(hiragana, romaji)` reading.
    ///
    /// Token readings are joined by single spaces with a trailing space, the
    /// shape used on reading cards. Tokens without a reading contribute their
    /// original text.
    pub fn read_sentence(&self, text: &str) -> (String, String) {
        let mut hiragana = String::new();
        let mut romaji = String::new();
        for token in self.tokenize(text) {
            if token.has_reading() {
                hiragana.push_str(&token.phonetic);
                romaji.push_str(&token.romanized);
            } else {
                hiragana.push_str(&token.original);
                romaji.push_str(&token.original);
            }
            hiragana.push(' ');
            romaji.push(' ');
        }
        (hiragana, romaji)
    }
}

/// Iterator returned by [`Transliterator::tokenize`].
pub struct Tokens<'t, L: Lexicon> {
    lexicon: &'t L,
    text: &'t str,
    pos: usize,
}

impl<L: Lexicon> Iterator for Tokens<'_, L> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let (text, lexicon) = (self.text, self.lexicon);
        let rest = &text[self.pos..];
        let first = rest.chars().next()?;
        let script = Script::of(first);

        if matches!(script, Script::Kanji | Script::Hiragana | Script::Katakana) {
            if let Some(found) = lexicon.longest_match(rest) {
                let token = Token::new(&rest[..found.len], found.reading);
                self.pos += found.len;
                return Some(token);
            }
        }

        let token = match script {
            Script::Kanji => self.unmatched_kanji_run(rest),
            Script::Hiragana | Script::Katakana => {
                let run = &rest[..run_len(rest, script)];
                Token::new(run, to_hiragana(run))
            }
            Script::Other => {
                let run = &rest[..run_len(rest, script)];
                if run.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                    Token {
                        original: run.to_string(),
                        phonetic: run.to_string(),
                        romanized: run.to_string(),
                    }
                } else {
                    Token::verbatim(run)
                }
            }
        };

        self.pos += token.original.len();
        Some(token)
    }
}

impl<L: Lexicon> Tokens<'_, L> {
    /// Consumes ideographs until one starts a lexicon entry.
    ///
    /// The first character never matches (the caller already tried), so the
    /// run always makes progress.
    fn unmatched_kanji_run(&self, rest: &str) -> Token {
        let mut end = 0;
        for (offset, ch) in rest.char_indices() {
            if Script::of(ch) != Script::Kanji {
                break;
            }
            if offset > 0 && self.lexicon.longest_match(&rest[offset..]).is_some() {
                break;
            }
            end = offset + ch.len_utf8();
        }
        Token::verbatim(&rest[..end])
    }
}

fn run_len(text: &str, script: Script) -> usize {
    text.char_indices()
        .find(|(_, ch)| Script::of(*ch) != script)
        .map_or(text.len(), |(offset, _)| offset)
}
