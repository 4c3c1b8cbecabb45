//! Tagged-span markup used in curated lesson sentences.
//!
//! Lesson text marks parts of speech as `<verb>食べ</><teform>て</>`: an
//! opening label from a closed vocabulary and a generic `</>` closer.
//!
//! # Invariants
//! - `validate` accepts only known labels with balanced brackets and exactly
//!   one `/` per open/close pair.
//! - `strip` removes markers but keeps enclosed text, and is idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(.*?)>").expect("valid marker regex"));

/// Part-of-speech labels allowed inside `<...>`.
pub const POS_LABELS: &[&str] = &[
    "verb", "noun", "teform", "obj", "adv", "subject", "adbph", "conjunc", "det", "adj", "end",
];

/// Label carried by the generic closer `</>`.
pub const CLOSER_LABEL: &str = "/";

/// Structural markup violation (the `MalformedMarkup` condition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    UnknownLabel { label: String, text: String },
    UnbalancedBrackets { open: usize, close: usize, text: String },
    OddBracketCount { total: usize, text: String },
    UnmatchedCloser { open: usize, closers: usize, text: String },
}

impl MarkupError {
    /// Returns the sentence that failed validation.
    pub fn text(&self) -> &str {
        match self {
            Self::UnknownLabel { text, .. }
            | Self::UnbalancedBrackets { text, .. }
            | Self::OddBracketCount { text, .. }
            | Self::UnmatchedCloser { text, .. } => text,
        }
    }
}

impl Display for MarkupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLabel { label, text } => {
                write!(f, "malformed markup: unknown marker `{label}` in `{text}`")
            }
            Self::UnbalancedBrackets { open, close, text } => write!(
                f,
                "malformed markup: unmatched <> ({open} `<` vs {close} `>`) in `{text}`"
            ),
            Self::OddBracketCount { total, text } => {
                write!(f, "malformed markup: odd bracket count {total} in `{text}`")
            }
            Self::UnmatchedCloser {
                open,
                closers,
                text,
            } => write!(
                f,
                "malformed markup: unmatched </> ({open} `<` needs {} closers, found {closers}) in `{text}`",
                open / 2
            ),
        }
    }
}

impl Error for MarkupError {}

/// Returns every label found inside `<...>`, closers included as `/`.
pub fn extract_tags(text: &str) -> Vec<&str> {
    MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|label| label.as_str()))
        .collect()
}

/// Validates tagged-span structure.
///
/// # Errors
/// Returns the first violated rule, checked in this order: unknown label,
/// `<`/`>` count mismatch, odd total bracket count, closer count mismatch.
pub fn validate(text: &str) -> Result<(), MarkupError> {
    if let Some(label) = extract_tags(text)
        .into_iter()
        .find(|label| *label != CLOSER_LABEL && !POS_LABELS.contains(label))
    {
        return Err(MarkupError::UnknownLabel {
            label: label.to_string(),
            text: text.to_string(),
        });
    }

    let open = text.matches('<').count();
    let close = text.matches('>').count();
    let slashes = text.matches('/').count();

    if open != close {
        return Err(MarkupError::UnbalancedBrackets {
            open,
            close,
            text: text.to_string(),
        });
    }
    if (open + close) % 2 != 0 {
        return Err(MarkupError::OddBracketCount {
            total: open + close,
            text: text.to_string(),
        });
    }
    // `open / 2 == slashes` compared without integer truncation.
    if open != slashes * 2 {
        return Err(MarkupError::UnmatchedCloser {
            open,
            closers: slashes,
            text: text.to_string(),
        });
    }

    Ok(())
}

/// Removes every `<...>` marker, keeping the enclosed text.
pub fn strip(text: &str) -> String {
    let mut stripped = MARKER_RE.replace_all(text, "").into_owned();
    // A removal can splice a new `<...>` together (`<<a>b>`); repeat until stable.
    while MARKER_RE.is_match(&stripped) {
        stripped = MARKER_RE.replace_all(&stripped, "").into_owned();
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::{extract_tags, strip, validate, MarkupError};

    #[test]
    fn extract_tags_includes_closers() {
        assert_eq!(
            extract_tags("<verb>食べ</><teform>て</>"),
            vec!["verb", "/", "teform", "/"]
        );
    }

    #[test]
    fn validate_accepts_well_formed_lesson_text() {
        validate("<verb>食べ</><teform>て</>").unwrap();
        validate("<noun>クッキ</><obj>を</><verb>食べ</><teform>て</>").unwrap();
        validate("ただのテキスト").unwrap();
    }

    #[test]
    fn validate_rejects_missing_closer() {
        let err = validate("<verb>食べ<teform>て</>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnmatchedCloser {
                open: 3,
                closers: 1,
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_unknown_label_first() {
        let err = validate("<color>赤</>").unwrap_err();
        assert!(matches!(err, MarkupError::UnknownLabel { ref label, .. } if label == "color"));
        assert_eq!(err.text(), "<color>赤</>");
    }

    #[test]
    fn validate_rejects_unbalanced_brackets() {
        let err = validate("<verb>食べ</>>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::UnbalancedBrackets {
                open: 2,
                close: 3,
                ..
            }
        ));
    }

    #[test]
    fn strip_is_idempotent() {
        for text in [
            "<verb>食べ</><teform>て</>",
            "<<verb>>食べ",
            "a < b > c",
            "no markup",
            "<unclosed",
        ] {
            let once = strip(text);
            assert!(!super::MARKER_RE.is_match(&once));
            assert_eq!(strip(&once), once);
        }
        assert_eq!(strip("<verb>食べ</><teform>て</>"), "食べて");
    }
}
