//! Japanese text handling: script classes, kana conversion and tokenization.
//!
//! # Responsibility
//! - Classify characters by script (ideograph, hiragana, katakana).
//! - Convert kana to hiragana/romaji.
//! - Split arbitrary text into `(original, phonetic, romanized)` tokens.
//!
//! # Invariants
//! - Tokenization never drops or reorders input characters.

pub mod kana;
pub mod lexicon;
pub mod script;
pub mod transliterate;

pub use lexicon::{Lexicon, LexiconError, LexiconMatch, ReadingLexicon};
pub use transliterate::{Token, Tokens, Transliterator};
