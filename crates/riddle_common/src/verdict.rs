//! Verdict types produced by the question cascade.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RiddleError;

/// Outcome of judging one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Yes,
    No,
    Ambiguous,
    Nonsense,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Ambiguous => "ambiguous",
            Self::Nonsense => "nonsense",
        }
    }

    /// Yes and No swap; Ambiguous and Nonsense have no polarity.
    pub fn inverted(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
            other => other,
        }
    }

    pub fn has_polarity(&self) -> bool {
        matches!(self, Self::Yes | Self::No)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = RiddleError;

    /// Accepts the stored classification words, English or Korean.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "예" | "네" => Ok(Self::Yes),
            "no" | "n" | "아니오" | "아니요" => Ok(Self::No),
            "ambiguous" => Ok(Self::Ambiguous),
            "nonsense" => Ok(Self::Nonsense),
            other => Err(RiddleError::InvalidInput(format!(
                "unknown outcome '{}'",
                other
            ))),
        }
    }
}

/// Which terminal rule produced a verdict.
///
/// Each variant names exactly one rule so a verdict can be traced back to the
/// stage that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Evidence {
    NonsensePattern,
    ScenarioExternal,
    Irrelevant,
    LearnedOverride,
    WrongAnswer,
    MatchDraw,
    MatchOtherUse,
    MatchPossession,
    MatchState,
    MatchUnspecified,
    Posture,
    ClothingReason,
    Transport,
    OffScenario,
    #[serde(rename = "scenario-unrelated")]
    OrganReference,
    PhysicalEvidence,
    /// Body phrasing with neither an injury nor an absence word. Answers
    /// like `OrganReference` (No, scenario-unrelated reply) but keeps its
    /// own `physical-unspecified` tag, so clients reading `evidence` see a
    /// tag distinct from `scenario-unrelated`.
    PhysicalUnspecified,
    OpenEnded,
    ScenarioBased,
    SystemError,
}

impl Evidence {
    pub const ALL: [Evidence; 20] = [
        Self::NonsensePattern,
        Self::ScenarioExternal,
        Self::Irrelevant,
        Self::LearnedOverride,
        Self::WrongAnswer,
        Self::MatchDraw,
        Self::MatchOtherUse,
        Self::MatchPossession,
        Self::MatchState,
        Self::MatchUnspecified,
        Self::Posture,
        Self::ClothingReason,
        Self::Transport,
        Self::OffScenario,
        Self::OrganReference,
        Self::PhysicalEvidence,
        Self::PhysicalUnspecified,
        Self::OpenEnded,
        Self::ScenarioBased,
        Self::SystemError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonsensePattern => "nonsense-pattern",
            Self::ScenarioExternal => "scenario-external",
            Self::Irrelevant => "irrelevant",
            Self::LearnedOverride => "learned-override",
            Self::WrongAnswer => "wrong-answer",
            Self::MatchDraw => "match-draw",
            Self::MatchOtherUse => "match-other-use",
            Self::MatchPossession => "match-possession",
            Self::MatchState => "match-state",
            Self::MatchUnspecified => "match-unspecified",
            Self::Posture => "posture",
            Self::ClothingReason => "clothing-reason",
            Self::Transport => "transport",
            Self::OffScenario => "off-scenario",
            Self::OrganReference => "scenario-unrelated",
            Self::PhysicalEvidence => "physical-evidence",
            Self::PhysicalUnspecified => "physical-unspecified",
            Self::OpenEnded => "open-ended",
            Self::ScenarioBased => "scenario-based",
            Self::SystemError => "system-error",
        }
    }

    /// Parse from tag (for corpus tests)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == tag)
    }

    /// Whether the rule asserts a fact about the narrative.
    ///
    /// Only factual verdicts flip under a negative interrogative. Gate rules
    /// (nonsense, scope, relevance, overrides, open-ended) and the organ
    /// block keep their outcome whatever the phrasing.
    pub fn is_factual(&self) -> bool {
        matches!(
            self,
            Self::WrongAnswer
                | Self::MatchDraw
                | Self::MatchOtherUse
                | Self::MatchPossession
                | Self::MatchState
                | Self::Posture
                | Self::ClothingReason
                | Self::Transport
                | Self::PhysicalEvidence
                | Self::ScenarioBased
        )
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub evidence: Evidence,
    /// User-facing sentence bound to this outcome
    pub answer: String,
    /// True when a negative interrogative flipped the rule's polarity
    #[serde(default)]
    pub negated: bool,
}

impl Verdict {
    pub fn new(outcome: Outcome, evidence: Evidence, answer: impl Into<String>) -> Self {
        Self {
            outcome,
            evidence,
            answer: answer.into(),
            negated: false,
        }
    }

    /// Safe default when a request hits an internal fault.
    pub fn system_error(answer: impl Into<String>) -> Self {
        Self::new(Outcome::No, Evidence::SystemError, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_inversion() {
        assert_eq!(Outcome::Yes.inverted(), Outcome::No);
        assert_eq!(Outcome::No.inverted(), Outcome::Yes);
        assert_eq!(Outcome::Nonsense.inverted(), Outcome::Nonsense);
        assert_eq!(Outcome::Ambiguous.inverted(), Outcome::Ambiguous);
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("YES".parse::<Outcome>().unwrap(), Outcome::Yes);
        assert_eq!(" no ".parse::<Outcome>().unwrap(), Outcome::No);
        assert_eq!("아니오".parse::<Outcome>().unwrap(), Outcome::No);
        assert!("maybe".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_evidence_tags_unique() {
        let mut tags: Vec<&str> = Evidence::ALL.iter().map(|e| e.as_str()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), Evidence::ALL.len());
    }

    #[test]
    fn test_evidence_serde_matches_tag() {
        for evidence in Evidence::ALL {
            let json = serde_json::to_string(&evidence).unwrap();
            assert_eq!(json, format!("\"{}\"", evidence.as_str()));
            assert_eq!(Evidence::from_tag(evidence.as_str()), Some(evidence));
        }
    }

    #[test]
    fn test_organ_block_is_not_factual() {
        assert!(!Evidence::OrganReference.is_factual());
        assert!(!Evidence::LearnedOverride.is_factual());
        assert!(Evidence::ScenarioBased.is_factual());
    }
}
