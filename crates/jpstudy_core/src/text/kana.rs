//! Kana folding and modified-Hepburn romanization.
//!
//! # Invariants
//! - `to_hiragana` only rewrites katakana letters that have a hiragana twin;
//!   every other character passes through unchanged.
//! - `romanize` passes non-kana characters through unchanged.

use super::script::LONG_VOWEL_MARK;

const KATAKANA_TO_HIRAGANA_OFFSET: u32 = 0x60;
const SOKUON: char = 'っ';

/// Folds katakana letters to hiragana. `ー` and `・` are kept.
pub fn to_hiragana(text: &str) -> String {
    text.chars().map(fold_katakana).collect()
}

fn fold_katakana(ch: char) -> char {
    if matches!(ch, '\u{30A1}'..='\u{30F6}') {
        char::from_u32(ch as u32 - KATAKANA_TO_HIRAGANA_OFFSET).unwrap_or(ch)
    } else {
        ch
    }
}

/// Romanizes kana text (hiragana or katakana) using modified Hepburn.
///
/// - Small `ゃゅょ` combine with the preceding syllable (`きゃ` -> `kya`).
/// - `っ` doubles the next consonant (`っち` -> `tchi`).
/// - `ー` repeats the previous vowel.
/// - `う` before a small vowel becomes `w` (`ウィ` -> `wi`).
pub fn romanize(text: &str) -> String {
    let chars: Vec<char> = to_hiragana(text).chars().collect();
    let mut out = String::with_capacity(chars.len() * 2);
    let mut geminate = false;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];

        if ch == SOKUON {
            geminate = true;
            idx += 1;
            continue;
        }

        if ch == LONG_VOWEL_MARK {
            if let Some(vowel) = out.chars().last().filter(|c| is_vowel(*c)) {
                out.push(vowel);
            }
            idx += 1;
            continue;
        }

        let Some(base) = syllable(ch) else {
            geminate = false;
            out.push(ch);
            idx += 1;
            continue;
        };

        let mut romaji = base.to_string();
        if let Some(next) = chars.get(idx + 1).copied() {
            if let Some(combined) = combine_small(base, next) {
                romaji = combined;
                idx += 1;
            }
        }

        if geminate {
            if let Some(first) = romaji.chars().next().filter(|c| !is_vowel(*c)) {
                out.push(if romaji.starts_with("ch") { 't' } else { first });
            }
            geminate = false;
        }

        out.push_str(&romaji);
        idx += 1;
    }

    out
}

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'i' | 'u' | 'e' | 'o')
}

fn combine_small(base: &str, next: char) -> Option<String> {
    let yoon = match next {
        'ゃ' => 'a',
        'ゅ' => 'u',
        'ょ' => 'o',
        _ => {
            let vowel = small_vowel(next)?;
            let stem = base.strip_suffix(|c: char| is_vowel(c))?;
            return match stem {
                "" if base == "u" => Some(format!("w{vowel}")),
                "" => None,
                _ => Some(format!("{stem}{vowel}")),
            };
        }
    };

    let stem = base.strip_suffix('i')?;
    if stem.is_empty() {
        return None;
    }
    if matches!(stem, "sh" | "ch" | "j") {
        Some(format!("{stem}{yoon}"))
    } else {
        Some(format!("{stem}y{yoon}"))
    }
}

fn small_vowel(ch: char) -> Option<char> {
    match ch {
        'ぁ' => Some('a'),
        'ぃ' => Some('i'),
        'ぅ' => Some('u'),
        'ぇ' => Some('e'),
        'ぉ' => Some('o'),
        _ => None,
    }
}

fn syllable(ch: char) -> Option<&'static str> {
    let romaji = match ch {
        'あ' => "a",
        'い' => "i",
        'う' => "u",
        'え' => "e",
        'お' => "o",
        'か' => "ka",
        'き' => "ki",
        'く' => "ku",
        'け' => "ke",
        'こ' => "ko",
        'が' => "ga",
        'ぎ' => "gi",
        'ぐ' => "gu",
        'げ' => "ge",
        'ご' => "go",
        'さ' => "sa",
        'し' => "shi",
        'す' => "su",
        'せ' => "se",
        'そ' => "so",
        'ざ' => "za",
        'じ' => "ji",
        'ず' => "zu",
        'ぜ' => "ze",
        'ぞ' => "zo",
        'た' => "ta",
        'ち' => "chi",
        'つ' => "tsu",
        'て' => "te",
        'と' => "to",
        'だ' => "da",
        'ぢ' => "ji",
        'づ' => "zu",
        'で' => "de",
        'ど' => "do",
        'な' => "na",
        'に' => "ni",
        'ぬ' => "nu",
        'ね' => "ne",
        'の' => "no",
        'は' => "ha",
        'ひ' => "hi",
        'ふ' => "fu",
        'へ' => "he",
        'ほ' => "ho",
        'ば' => "ba",
        'び' => "bi",
        'ぶ' => "bu",
        'べ' => "be",
        'ぼ' => "bo",
        'ぱ' => "pa",
        'ぴ' => "pi",
        'ぷ' => "pu",
        'ぺ' => "pe",
        'ぽ' => "po",
        'ま' => "ma",
        'み' => "mi",
        'む' => "mu",
        'め' => "me",
        'も' => "mo",
        'や' => "ya",
        'ゆ' => "yu",
        'よ' => "yo",
        'ら' => "ra",
        'り' => "ri",
        'る' => "ru",
        'れ' => "re",
        'ろ' => "ro",
        'わ' => "wa",
        'ゐ' => "i",
        'ゑ' => "e",
        'を' => "o",
        'ん' => "n",
        'ゔ' => "vu",
        'ぁ' => "a",
        'ぃ' => "i",
        'ぅ' => "u",
        'ぇ' => "e",
        'ぉ' => "o",
        'ゃ' => "ya",
        'ゅ' => "yu",
        'ょ' => "yo",
        'ゎ' => "wa",
        _ => return None,
    };
    Some(romaji)
}

#[cfg(test)]
mod tests {
    use super::{romanize, to_hiragana};

    #[test]
    fn katakana_folds_to_hiragana_and_keeps_long_vowel() {
        assert_eq!(to_hiragana("コーヒー"), "こーひー");
        assert_eq!(to_hiragana("たべ"), "たべ");
    }

    #[test]
    fn romanize_handles_plain_syllables() {
        assert_eq!(romanize("たべ"), "tabe");
        assert_eq!(romanize("ねる"), "neru");
        assert_eq!(romanize("しんぶん"), "shinbun");
    }

    #[test]
    fn romanize_combines_yoon_and_doubles_after_sokuon() {
        assert_eq!(romanize("きょう"), "kyou");
        assert_eq!(romanize("しゃしん"), "shashin");
        assert_eq!(romanize("きって"), "kitte");
        assert_eq!(romanize("まっちゃ"), "matcha");
    }

    #[test]
    fn romanize_extends_vowel_for_long_mark() {
        assert_eq!(romanize("コーヒー"), "koohii");
        assert_eq!(romanize("ファン"), "fan");
    }

    #[test]
    fn romanize_joins_u_with_small_vowel() {
        assert_eq!(romanize("ウィスキー"), "wisukii");
        assert_eq!(romanize("ウェブ"), "webu");
        assert_eq!(romanize("ウォ"), "wo");
        assert_eq!(romanize("うえ"), "ue");
    }

    #[test]
    fn romanize_passes_through_non_kana() {
        assert_eq!(romanize("abc。"), "abc。");
    }
}
