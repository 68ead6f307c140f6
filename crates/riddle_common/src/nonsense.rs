//! Shape heuristics for degenerate input: too short, mashed, symbol soup,
//! stuttered, bare jamo. They look only at the characters, never at the
//! catalog, so they hold for any scenario.

/// At or below this many characters a question says nothing.
pub const MIN_MEANINGFUL_CHARS: usize = 2;
/// Diversity is only judged on strings longer than this.
pub const DIVERSITY_MIN_CHARS: usize = 10;
pub const DIVERSITY_RATIO: f64 = 0.4;
/// Symbol density is only judged on strings longer than this.
pub const SYMBOL_MIN_CHARS: usize = 5;
pub const SYMBOL_RATIO: f64 = 0.5;
pub const REPEAT_MIN_UNIT: usize = 2;
pub const REPEAT_MIN_COUNT: usize = 3;
pub const JAMO_RUN: usize = 3;
pub const MASH_CONSONANT_RUN: usize = 5;

/// True if normalized `text` fails any shape check.
pub fn is_degenerate(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.len() <= MIN_MEANINGFUL_CHARS
        || low_diversity(&chars)
        || symbol_heavy(&chars)
        || has_repeated_unit(&chars)
        || has_jamo_run(&chars)
        || is_keyboard_mash(&chars)
}

pub fn low_diversity(chars: &[char]) -> bool {
    if chars.len() <= DIVERSITY_MIN_CHARS {
        return false;
    }
    let mut distinct: Vec<char> = chars.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    (distinct.len() as f64) < DIVERSITY_RATIO * chars.len() as f64
}

pub fn symbol_heavy(chars: &[char]) -> bool {
    if chars.len() <= SYMBOL_MIN_CHARS {
        return false;
    }
    let symbols = chars
        .iter()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count();
    (symbols as f64) > SYMBOL_RATIO * chars.len() as f64
}

/// A unit of two or more characters appearing three or more times back to back.
pub fn has_repeated_unit(chars: &[char]) -> bool {
    let n = chars.len();
    for unit in REPEAT_MIN_UNIT..=n / REPEAT_MIN_COUNT {
        for start in 0..=n - unit * REPEAT_MIN_COUNT {
            let first = &chars[start..start + unit];
            let repeated = (1..REPEAT_MIN_COUNT).all(|k| {
                let at = start + k * unit;
                &chars[at..at + unit] == first
            });
            if repeated {
                return true;
            }
        }
    }
    false
}

/// Hangul compatibility jamo (ㄱ..ㆎ) typed without forming syllables.
pub fn has_jamo_run(chars: &[char]) -> bool {
    let mut run = 0;
    for c in chars {
        if ('\u{3131}'..='\u{318E}').contains(c) {
            run += 1;
            if run >= JAMO_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Latin letters with a long consonant streak, e.g. "asdkjqwe".
pub fn is_keyboard_mash(chars: &[char]) -> bool {
    let mut run = 0;
    for c in chars {
        if c.is_ascii_alphabetic() && !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u' | 'y') {
            run += 1;
            if run >= MASH_CONSONANT_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_short_input() {
        assert!(is_degenerate(""));
        assert!(is_degenerate("네"));
        assert!(is_degenerate("ab"));
        assert!(!is_degenerate("남자는 죽었나요"));
    }

    #[test]
    fn test_low_diversity() {
        assert!(low_diversity(&chars("아아아아아아아아아아아아")));
        assert!(!low_diversity(&chars("열기구에서 성냥으로 제비뽑기를 했나요")));
        // Too short to judge
        assert!(!low_diversity(&chars("아아아아")));
    }

    #[test]
    fn test_symbol_heavy() {
        assert!(symbol_heavy(&chars("?!?!?!남자")));
        assert!(!symbol_heavy(&chars("남자는 죽었나요?")));
        assert!(!symbol_heavy(&chars("?!?")));
    }

    #[test]
    fn test_repeated_unit() {
        assert!(has_repeated_unit(&chars("하하하하하하")));
        assert!(has_repeated_unit(&chars("남자 abcabcabc")));
        assert!(!has_repeated_unit(&chars("하하하")));
        assert!(!has_repeated_unit(&chars("성냥 성냥")));
    }

    #[test]
    fn test_jamo_run() {
        assert!(has_jamo_run(&chars("ㅋㅋㅋ")));
        assert!(has_jamo_run(&chars("남자 ㅁㄴㅇㄹ")));
        assert!(!has_jamo_run(&chars("ㅋㅋ 남자")));
    }

    #[test]
    fn test_keyboard_mash() {
        assert!(is_keyboard_mash(&chars("asdkjqwe")));
        assert!(!is_keyboard_mash(&chars("balloon match")));
        assert!(!is_keyboard_mash(&chars("성냥")));
    }
}
