//! Negative interrogatives ("…아닌가요?", "…아니었나요?").
//!
//! Only the sentence-final ending is inspected, after stripping trailing
//! punctuation; a negative word in the middle of a question does not count.

use crate::catalog::NegationPair;

/// Rewrite a negative interrogative to its positive form.
///
/// `pairs` must be ordered longest negative ending first. Returns `None` when
/// the question does not end in a negative interrogative.
pub fn positive_form(text: &str, pairs: &[NegationPair]) -> Option<String> {
    let body = text.trim_end_matches(|c: char| matches!(c, '?' | '.' | '!') || c.is_whitespace());
    let tail = &text[body.len()..];
    let pair = pairs.iter().find(|p| body.ends_with(p.negative.as_str()))?;
    let stem = &body[..body.len() - pair.negative.len()];
    Some(format!("{}{}{}", stem, pair.positive, tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<NegationPair> {
        [("아니었나요", "였나요"), ("아닌가요", "인가요"), ("아닌가", "인가")]
            .iter()
            .map(|(n, p)| NegationPair {
                negative: n.to_string(),
                positive: p.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_rewrites_final_ending() {
        assert_eq!(
            positive_form("성냥이 부러진 것 아닌가요?", &pairs()).as_deref(),
            Some("성냥이 부러진 것 인가요?")
        );
        assert_eq!(
            positive_form("남자는 알몸 아니었나요", &pairs()).as_deref(),
            Some("남자는 알몸 였나요")
        );
    }

    #[test]
    fn test_longest_ending_wins() {
        assert_eq!(
            positive_form("사고 아닌가요", &pairs()).as_deref(),
            Some("사고 인가요")
        );
        assert_eq!(positive_form("사고 아닌가", &pairs()).as_deref(), Some("사고 인가"));
    }

    #[test]
    fn test_positive_question_untouched() {
        assert_eq!(positive_form("남자는 죽었나요?", &pairs()), None);
        assert_eq!(positive_form("아닌가요 남자는 죽었나요", &pairs()), None);
        assert_eq!(positive_form("", &pairs()), None);
    }
}
