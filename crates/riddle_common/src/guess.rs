//! Final-solution scoring.
//!
//! A guess is scored against the anchor vocabulary and the curated
//! paraphrase lists. Signals only ever add to the score, so appending
//! text to a guess can raise its score but never lower it, unless the added
//! text names a known-wrong theory.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::PatternCatalog;
use crate::normalize::normalize;

pub const WEIGHT_ALL_ANCHORS: u32 = 40;
pub const WEIGHT_ANY_SECONDARY: u32 = 30;
pub const WEIGHT_CANONICAL: u32 = 50;
pub const WEIGHT_ESSENTIAL: u32 = 60;

/// Terms that fired for each signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessMatches {
    pub anchors: Vec<String>,
    pub secondary: Vec<String>,
    pub canonical: Vec<String>,
    pub essential: Vec<String>,
    pub wrong: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessEvaluation {
    pub is_correct: bool,
    pub score_percent: u32,
    pub all_anchors: bool,
    pub any_secondary: bool,
    pub canonical_combination: bool,
    pub essential_combination: bool,
    pub wrong_pattern: bool,
    /// Every narrative element group is mentioned
    pub narrative_present: bool,
    pub matched: GuessMatches,
}

fn owned(terms: Vec<&str>) -> Vec<String> {
    terms.into_iter().map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub struct GuessScorer {
    catalog: Arc<PatternCatalog>,
}

impl GuessScorer {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    pub fn score(&self, guess: &str) -> GuessEvaluation {
        let text = normalize(guess);
        let vocab = &self.catalog.guess;

        let anchors = vocab.anchors_all.matches_in(&text);
        let all_anchors = anchors.len() == vocab.anchors_all.len();
        let secondary = vocab.anchors_any.matches_in(&text);
        let any_secondary = !secondary.is_empty();
        let canonical = vocab.canonical.matches_in(&text);
        let canonical_combination = !canonical.is_empty();
        let essential = vocab.essential.matches_in(&text);
        let essential_combination = !essential.is_empty();
        let wrong = vocab.wrong.matches_in(&text);
        let wrong_pattern = !wrong.is_empty();
        let narrative_present = !vocab.narrative_groups.is_empty()
            && vocab.narrative_groups.iter().all(|g| g.matches(&text));

        let mut score = 0;
        if all_anchors {
            score += WEIGHT_ALL_ANCHORS;
        }
        if any_secondary {
            score += WEIGHT_ANY_SECONDARY;
        }
        if canonical_combination {
            score += WEIGHT_CANONICAL;
        }
        if essential_combination {
            score += WEIGHT_ESSENTIAL;
        }

        let sufficient = narrative_present
            || (score >= 70 && all_anchors && any_secondary)
            || (canonical_combination && score >= 60)
            || (essential_combination && score >= 50)
            || (score >= 80 && any_secondary);
        let is_correct = !wrong_pattern && sufficient;

        debug!(
            "Guess scored {} (correct={}, wrong={:?})",
            score, is_correct, wrong
        );

        GuessEvaluation {
            is_correct,
            score_percent: score,
            all_anchors,
            any_secondary,
            canonical_combination,
            essential_combination,
            wrong_pattern,
            narrative_present,
            matched: GuessMatches {
                anchors: owned(anchors),
                secondary: owned(secondary),
                canonical: owned(canonical),
                essential: owned(essential),
                wrong: owned(wrong),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> GuessScorer {
        GuessScorer::new(Arc::new(PatternCatalog::builtin().unwrap()))
    }

    #[test]
    fn test_full_solution_accepted() {
        let eval = scorer().score("열기구가 고장나서 성냥으로 제비뽑기를 해 희생자가 뛰어내려 죽었다");
        assert!(eval.all_anchors);
        assert!(eval.any_secondary);
        assert!(eval.essential_combination);
        assert!(!eval.wrong_pattern);
        assert!(eval.narrative_present);
        assert_eq!(eval.score_percent, 130);
        assert!(eval.is_correct);
        assert_eq!(eval.matched.essential, vec!["뛰어내려 죽".to_string()]);
    }

    #[test]
    fn test_wrong_theory_rejected() {
        let eval = scorer().score("낙타를 타다가 더위로 죽었다");
        assert!(eval.wrong_pattern);
        assert!(!eval.is_correct);
        assert_eq!(eval.matched.wrong, vec!["낙타".to_string(), "더위".to_string()]);
    }

    #[test]
    fn test_wrong_pattern_vetoes_high_score() {
        let eval = scorer().score("열기구에서 성냥으로 제비뽑기를 해 희생했지만 사실 낙타 때문");
        assert!(eval.score_percent >= 70);
        assert!(!eval.is_correct);
    }

    #[test]
    fn test_keywords_without_story_not_enough() {
        let eval = scorer().score("성냥");
        assert_eq!(eval.score_percent, 0);
        assert!(!eval.is_correct);

        let eval = scorer().score("사막에서 추락");
        assert_eq!(eval.score_percent, WEIGHT_ANY_SECONDARY);
        assert!(!eval.is_correct);
    }

    #[test]
    fn test_essential_with_secondary() {
        // 60 + 30 with no anchors set
        let eval = scorer().score("열기구에서 내려야 했고 결국 사망");
        assert!(eval.essential_combination);
        assert!(!eval.canonical_combination);
        assert!(!eval.all_anchors);
        assert_eq!(eval.score_percent, 90);
        assert!(eval.is_correct);
    }

    #[test]
    fn test_whitespace_and_case_insensitive() {
        let a = scorer().score("열기구에서   성냥으로 제비뽑기  희생");
        let b = scorer().score("  열기구에서 성냥으로 제비뽑기 희생 ");
        assert_eq!(a, b);
    }
}
