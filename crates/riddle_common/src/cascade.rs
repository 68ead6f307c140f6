//! Rule cascade: the ordered decision procedure that turns a question into a
//! Verdict.
//!
//! Stages run strictly in `Stage::GUARDS` order and the first guard that
//! fires is terminal. A question nothing fires on is presumed consistent
//! with the narrative (scenario fallback). Negative interrogatives are
//! rewritten to the positive form before the fact stages run, and factual
//! verdicts are inverted afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::PatternCatalog;
use crate::negation::positive_form;
use crate::nonsense;
use crate::normalize::normalize;
use crate::overrides::OverrideTable;
use crate::verdict::{Evidence, Outcome, Verdict};

/// One guard of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Degenerate input and known nonsense phrases
    Nonsense,
    /// Facts the narrative never states
    ScenarioExternal,
    /// Off-topic questions
    Relevance,
    /// Human corrections
    LearnedOverride,
    /// Known-incorrect explanations
    WrongAnswer,
    /// Matches, posture, clothing, transport, off-scenario activities
    DomainRules,
    /// Injury and body phrasing
    PhysicalEvidence,
    /// Questions that cannot be answered yes or no
    OpenEnded,
    /// Nothing fired; presumed consistent
    ScenarioFallback,
}

impl Stage {
    /// Guard order. Changing it changes answers.
    pub const GUARDS: [Stage; 8] = [
        Stage::Nonsense,
        Stage::ScenarioExternal,
        Stage::Relevance,
        Stage::LearnedOverride,
        Stage::WrongAnswer,
        Stage::DomainRules,
        Stage::PhysicalEvidence,
        Stage::OpenEnded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nonsense => "nonsense",
            Self::ScenarioExternal => "scenario_external",
            Self::Relevance => "relevance",
            Self::LearnedOverride => "learned_override",
            Self::WrongAnswer => "wrong_answer",
            Self::DomainRules => "domain_rules",
            Self::PhysicalEvidence => "physical_evidence",
            Self::OpenEnded => "open_ended",
            Self::ScenarioFallback => "scenario_fallback",
        }
    }

    /// Whether the stage reads the positive rewrite of a negative question.
    fn reads_positive_form(&self) -> bool {
        matches!(
            self,
            Self::WrongAnswer
                | Self::DomainRules
                | Self::PhysicalEvidence
                | Self::OpenEnded
                | Self::ScenarioFallback
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub stage: Stage,
}

/// Per-question view shared by the stages.
struct Probe<'a> {
    text: &'a str,
    positive: &'a str,
    negated: bool,
    overrides: &'a OverrideTable,
}

impl<'a> Probe<'a> {
    fn text_for(&self, stage: Stage) -> &'a str {
        if stage.reads_positive_form() {
            self.positive
        } else {
            self.text
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleCascade {
    catalog: Arc<PatternCatalog>,
}

impl RuleCascade {
    pub fn new(catalog: Arc<PatternCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn classify(&self, question: &str, overrides: &OverrideTable) -> Verdict {
        self.decide(question, overrides).verdict
    }

    /// Classify and report which stage decided.
    pub fn decide(&self, question: &str, overrides: &OverrideTable) -> Decision {
        let text = normalize(question);
        let rewritten = positive_form(&text, &self.catalog.negation);
        let probe = Probe {
            text: &text,
            positive: rewritten.as_deref().unwrap_or(&text),
            negated: rewritten.is_some(),
            overrides,
        };

        let (stage, verdict) = Stage::GUARDS
            .iter()
            .find_map(|&stage| self.run(stage, &probe).map(|v| (stage, v)))
            .unwrap_or_else(|| (Stage::ScenarioFallback, self.scenario_fallback()));

        let verdict = self.apply_negation(verdict, probe.negated);
        debug!(
            "Cascade: '{}' -> {} ({}, stage {}{})",
            text,
            verdict.outcome,
            verdict.evidence,
            stage,
            if verdict.negated { ", negated" } else { "" }
        );
        Decision { verdict, stage }
    }

    /// `None` when the guard does not fire. The fallback has no condition of
    /// its own; `decide` applies it once every guard has passed.
    fn run(&self, stage: Stage, probe: &Probe<'_>) -> Option<Verdict> {
        let text = probe.text_for(stage);
        match stage {
            Stage::Nonsense => self.nonsense(text),
            Stage::ScenarioExternal => self.scenario_external(text),
            Stage::Relevance => self.relevance(text),
            Stage::LearnedOverride => self.learned_override(text, probe.overrides),
            Stage::WrongAnswer => self.wrong_answer(text),
            Stage::DomainRules => self.domain_rules(text),
            Stage::PhysicalEvidence => self.physical_evidence(text),
            Stage::OpenEnded => self.open_ended(text),
            Stage::ScenarioFallback => None,
        }
    }

    fn scenario_fallback(&self) -> Verdict {
        self.reply(Outcome::Yes, Evidence::ScenarioBased)
    }

    /// Verdict with the reply text bound to its outcome and rule.
    fn reply(&self, outcome: Outcome, evidence: Evidence) -> Verdict {
        let replies = &self.catalog.replies;
        let answer: &str = match evidence {
            Evidence::NonsensePattern => &replies.nonsense,
            Evidence::ScenarioExternal => &replies.scenario_external,
            Evidence::Irrelevant => &replies.irrelevant,
            Evidence::OrganReference | Evidence::PhysicalUnspecified => {
                &replies.scenario_unrelated
            }
            Evidence::OffScenario => &replies.off_scenario,
            Evidence::OpenEnded => &replies.open_ended,
            Evidence::SystemError => &replies.system_error,
            _ => self.outcome_reply(outcome),
        };
        Verdict::new(outcome, evidence, answer)
    }

    fn outcome_reply(&self, outcome: Outcome) -> &str {
        self.catalog.replies.for_outcome(outcome)
    }

    fn apply_negation(&self, mut verdict: Verdict, negated: bool) -> Verdict {
        if negated && verdict.evidence.is_factual() && verdict.outcome.has_polarity() {
            verdict.outcome = verdict.outcome.inverted();
            verdict.answer = self.outcome_reply(verdict.outcome).to_string();
            verdict.negated = true;
        }
        verdict
    }

    // Stage 1
    fn nonsense(&self, text: &str) -> Option<Verdict> {
        let c = &self.catalog;
        let hit = nonsense::is_degenerate(text)
            || c.nonsense_phrases.matches(text)
            || c.nonsense_regexes.iter().any(|re| re.is_match(text));
        hit.then(|| self.reply(Outcome::Nonsense, Evidence::NonsensePattern))
    }

    // Stage 2
    fn scenario_external(&self, text: &str) -> Option<Verdict> {
        self.catalog
            .external_info
            .matches(text)
            .then(|| self.reply(Outcome::No, Evidence::ScenarioExternal))
    }

    // Stage 3
    fn relevance(&self, text: &str) -> Option<Verdict> {
        (!self.is_relevant(text)).then(|| self.reply(Outcome::No, Evidence::Irrelevant))
    }

    /// Relevance gate. An irrelevant-domain word with no scenario keyword
    /// fails regardless of phrasing.
    pub fn is_relevant(&self, text: &str) -> bool {
        let c = &self.catalog;
        let on_scenario = c.scenario_keywords.matches(text);
        if c.irrelevant_domain.matches(text) && !on_scenario {
            return false;
        }
        if c.interrogatives.iter().any(|re| re.is_match(text)) {
            return true;
        }
        on_scenario
            || c.question_words.matches(text)
            || c.subject_phrases.matches(text)
    }

    // Stage 4
    fn learned_override(&self, text: &str, overrides: &OverrideTable) -> Option<Verdict> {
        let record = overrides.lookup(text)?;
        match record.outcome() {
            Ok(outcome) => {
                let answer = if record.correct_answer.trim().is_empty() {
                    self.outcome_reply(outcome).to_string()
                } else {
                    record.correct_answer.clone()
                };
                Some(Verdict::new(outcome, Evidence::LearnedOverride, answer))
            }
            Err(e) => {
                warn!("Degrading to system-error verdict: {}", e);
                Some(self.reply(Outcome::No, Evidence::SystemError))
            }
        }
    }

    // Stage 5
    fn wrong_answer(&self, text: &str) -> Option<Verdict> {
        self.catalog
            .wrong_answer
            .matches(text)
            .then(|| self.reply(Outcome::No, Evidence::WrongAnswer))
    }

    // Stage 6, sub-rules a through e
    fn domain_rules(&self, text: &str) -> Option<Verdict> {
        let c = &self.catalog;

        if c.match_terms.matches(text) {
            let (outcome, evidence) = if c.match_draw.matches(text) {
                (Outcome::Yes, Evidence::MatchDraw)
            } else if c.match_other_use.matches(text) {
                (Outcome::No, Evidence::MatchOtherUse)
            } else if c.match_possession.matches(text) {
                (Outcome::Yes, Evidence::MatchPossession)
            } else if c.match_state.matches(text) {
                (Outcome::Yes, Evidence::MatchState)
            } else {
                (Outcome::No, Evidence::MatchUnspecified)
            };
            return Some(self.reply(outcome, evidence));
        }

        // The victim is dead: never upright, but lying down.
        if c.posture_upright.matches(text) {
            return Some(self.reply(Outcome::No, Evidence::Posture));
        }
        if c.posture_supine.matches(text) {
            return Some(self.reply(Outcome::Yes, Evidence::Posture));
        }

        if c.clothing_triggers.matches(text) && c.clothing_alternatives.matches(text) {
            return Some(self.reply(Outcome::No, Evidence::ClothingReason));
        }

        if c.transport.matches(text) {
            return Some(self.reply(Outcome::No, Evidence::Transport));
        }

        if c.off_scenario.matches(text) {
            return Some(self.reply(Outcome::Ambiguous, Evidence::OffScenario));
        }

        None
    }

    // Stage 7
    fn physical_evidence(&self, text: &str) -> Option<Verdict> {
        let c = &self.catalog;
        if !c.physical_evidence.matches(text) {
            return None;
        }
        let (outcome, evidence) = if c.organ.matches(text) {
            (Outcome::No, Evidence::OrganReference)
        } else if c.physical_abnormal.matches(text) {
            (Outcome::Yes, Evidence::PhysicalEvidence)
        } else if c.physical_absence.matches(text) {
            (Outcome::No, Evidence::PhysicalEvidence)
        } else if c.physical_presence.matches(text) {
            (Outcome::Yes, Evidence::PhysicalEvidence)
        } else {
            (Outcome::No, Evidence::PhysicalUnspecified)
        };
        Some(self.reply(outcome, evidence))
    }

    // Stage 8
    fn open_ended(&self, text: &str) -> Option<Verdict> {
        self.catalog
            .open_ended
            .matches(text)
            .then(|| self.reply(Outcome::No, Evidence::OpenEnded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Override;

    fn cascade() -> RuleCascade {
        RuleCascade::new(Arc::new(PatternCatalog::builtin().unwrap()))
    }

    fn check(q: &str) -> (Outcome, Evidence) {
        let v = cascade().classify(q, &OverrideTable::default());
        (v.outcome, v.evidence)
    }

    #[test]
    fn test_draw_with_matches() {
        assert_eq!(
            check("열기구에서 성냥으로 제비뽑기를 했나요"),
            (Outcome::Yes, Evidence::MatchDraw)
        );
    }

    #[test]
    fn test_standing_is_no() {
        assert_eq!(check("남자는 서 있었나요"), (Outcome::No, Evidence::Posture));
        assert_eq!(check("남자는 누워 있었나요"), (Outcome::Yes, Evidence::Posture));
    }

    #[test]
    fn test_camel_is_wrong_answer() {
        assert_eq!(check("낙타를 타고 있었나요"), (Outcome::No, Evidence::WrongAnswer));
    }

    #[test]
    fn test_keyboard_mash_is_nonsense() {
        assert_eq!(check("asdkjqwe"), (Outcome::Nonsense, Evidence::NonsensePattern));
        assert_eq!(check("ㅋㅋㅋㅋ"), (Outcome::Nonsense, Evidence::NonsensePattern));
    }

    #[test]
    fn test_nonsense_precedes_scenario_keywords() {
        // Both a nonsense phrase and a scenario keyword
        assert_eq!(
            check("열기구에서 외계인이 나왔나요"),
            (Outcome::Nonsense, Evidence::NonsensePattern)
        );
    }

    #[test]
    fn test_external_info() {
        assert_eq!(
            check("남자의 나이는 몇 살인가요"),
            (Outcome::No, Evidence::ScenarioExternal)
        );
    }

    #[test]
    fn test_irrelevant_domain_without_scenario_keyword() {
        assert_eq!(check("동물이 좋아했나요"), (Outcome::No, Evidence::Irrelevant));
        assert_eq!(check("하늘이 파랗다"), (Outcome::No, Evidence::Irrelevant));
    }

    #[test]
    fn test_match_sub_rules_in_order() {
        assert_eq!(check("성냥으로 불을 피웠나요"), (Outcome::No, Evidence::MatchOtherUse));
        assert_eq!(
            check("남자는 성냥을 들고 있었나요"),
            (Outcome::Yes, Evidence::MatchPossession)
        );
        assert_eq!(check("성냥이 부러진 상태였나요"), (Outcome::Yes, Evidence::MatchState));
        assert_eq!(check("성냥이 중요한가요"), (Outcome::No, Evidence::MatchUnspecified));
        // Draw wins over any other mention
        assert_eq!(check("제비뽑기에 성냥을 사용했나요"), (Outcome::Yes, Evidence::MatchDraw));
    }

    #[test]
    fn test_clothing_reason() {
        assert_eq!(
            check("남자가 옷을 벗은 이유는 그냥 벗고 싶어서인가요"),
            (Outcome::No, Evidence::ClothingReason)
        );
    }

    #[test]
    fn test_transport() {
        assert_eq!(
            check("남자는 자전거를 타고 왔나요"),
            (Outcome::No, Evidence::Transport)
        );
    }

    #[test]
    fn test_off_scenario_is_ambiguous() {
        assert_eq!(
            check("남자는 낙하산을 메고 있었나요"),
            (Outcome::Ambiguous, Evidence::OffScenario)
        );
    }

    #[test]
    fn test_physical_evidence_polarity() {
        assert_eq!(
            check("남자의 다리가 부러졌나요"),
            (Outcome::Yes, Evidence::PhysicalEvidence)
        );
        assert_eq!(
            check("남자의 몸에 상처가 없나요"),
            (Outcome::No, Evidence::PhysicalEvidence)
        );
        // "비정상" contains the absence word "정상"
        assert_eq!(
            check("남자의 몸 상태가 비정상이었나요"),
            (Outcome::Yes, Evidence::PhysicalEvidence)
        );
        assert_eq!(
            check("남자의 몸 상태는 정상이었나요"),
            (Outcome::No, Evidence::PhysicalEvidence)
        );
        assert_eq!(check("남자는 내장이 파열됐나요"), (Outcome::No, Evidence::OrganReference));
        assert_eq!(
            check("남자의 머리가 길었나요"),
            (Outcome::No, Evidence::PhysicalUnspecified)
        );
    }

    #[test]
    fn test_open_ended_veto() {
        assert_eq!(check("남자는 왜 죽었나요"), (Outcome::No, Evidence::OpenEnded));
    }

    #[test]
    fn test_scenario_fallback() {
        let decision = cascade().decide("남자는 열기구에서 뛰어내렸나요", &OverrideTable::default());
        assert_eq!(decision.verdict.outcome, Outcome::Yes);
        assert_eq!(decision.verdict.evidence, Evidence::ScenarioBased);
        assert_eq!(decision.stage, Stage::ScenarioFallback);
    }

    #[test]
    fn test_override_takes_priority_over_domain_rules() {
        let table = OverrideTable::from_records(vec![Override::new(
            "남자는 서 있었나요",
            Outcome::Yes,
            "예, 처음에는요",
        )]);
        let decision = cascade().decide("  남자는 서 있었나요 ", &table);
        assert_eq!(decision.stage, Stage::LearnedOverride);
        assert_eq!(decision.verdict.outcome, Outcome::Yes);
        assert_eq!(decision.verdict.evidence, Evidence::LearnedOverride);
        assert_eq!(decision.verdict.answer, "예, 처음에는요");
    }

    #[test]
    fn test_corrupt_override_degrades() {
        let mut record = Override::new("남자는 서 있었나요", Outcome::Yes, "예");
        record.correct_classification = "??".to_string();
        let table = OverrideTable::from_records(vec![record]);
        let v = cascade().classify("남자는 서 있었나요", &table);
        assert_eq!(v.outcome, Outcome::No);
        assert_eq!(v.evidence, Evidence::SystemError);
    }

    #[test]
    fn test_negative_interrogative_inverts_fact() {
        let c = cascade();
        let v = c.classify("남자는 누워 있던 것 아닌가요?", &OverrideTable::default());
        assert_eq!(v.evidence, Evidence::Posture);
        assert_eq!(v.outcome, Outcome::No);
        assert!(v.negated);
        assert_eq!(v.answer, c.catalog().replies.no);
    }

    #[test]
    fn test_negation_leaves_gates_alone() {
        let v = cascade().classify("남자는 왜 죽은 것 아닌가요", &OverrideTable::default());
        assert_eq!(v.outcome, Outcome::No);
        assert_eq!(v.evidence, Evidence::OpenEnded);
        assert!(!v.negated);
    }

    #[test]
    fn test_stage_order_is_locked() {
        let names: Vec<&str> = Stage::GUARDS.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "nonsense",
                "scenario_external",
                "relevance",
                "learned_override",
                "wrong_answer",
                "domain_rules",
                "physical_evidence",
                "open_ended",
            ]
        );
    }
}
