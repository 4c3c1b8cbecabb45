//! Unicode script classification for Japanese text.

/// Returns whether `ch` counts as a tracked ideograph (kanji).
///
/// Covers CJK Extension A, the unified block and the compatibility block.
pub fn is_kanji(ch: char) -> bool {
    matches!(
        ch,
        '\u{3400}'..='\u{4DB5}' | '\u{4E00}'..='\u{9FCB}' | '\u{F900}'..='\u{FA6A}'
    )
}

pub fn is_hiragana(ch: char) -> bool {
    matches!(ch, '\u{3041}'..='\u{309F}')
}

/// Returns whether `ch` lies in the katakana block, including `ー` and `・`.
pub fn is_katakana(ch: char) -> bool {
    matches!(ch, '\u{30A0}'..='\u{30FF}')
}

/// Ideograph iteration mark (`々`). Not a tracked unit, but part of kanji words.
pub const ITERATION_MARK: char = '\u{3005}';

/// Long vowel mark used inside katakana words.
pub const LONG_VOWEL_MARK: char = 'ー';

/// Coarse script class used to segment text into runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Other,
}

impl Script {
    pub fn of(ch: char) -> Self {
        if is_kanji(ch) || ch == ITERATION_MARK {
            Self::Kanji
        } else if is_hiragana(ch) {
            Self::Hiragana
        } else if is_katakana(ch) {
            Self::Katakana
        } else {
            Self::Other
        }
    }
}

/// Returns every tracked ideograph in `text`, in order, duplicates kept.
pub fn kanji_in(text: &str) -> Vec<char> {
    text.chars().filter(|ch| is_kanji(*ch)).collect()
}

#[cfg(test)]
mod tests {
    use super::{is_kanji, is_katakana, kanji_in, Script};

    #[test]
    fn kanji_ranges_cover_common_and_exclude_kana() {
        assert!(is_kanji('食'));
        assert!(is_kanji('寝'));
        assert!(!is_kanji('た'));
        assert!(!is_kanji('々'));
        assert!(!is_kanji('A'));
    }

    #[test]
    fn long_vowel_mark_is_katakana() {
        assert!(is_katakana('ー'));
        assert_eq!(Script::of('ー'), Script::Katakana);
        assert_eq!(Script::of('々'), Script::Kanji);
    }

    #[test]
    fn kanji_in_keeps_order_and_duplicates() {
        assert_eq!(kanji_in("寝る前に寝"), vec!['寝', '前', '寝']);
    }
}
