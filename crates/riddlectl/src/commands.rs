//! Command implementations
//!
//! Each command builds what it needs from the config, runs the judge and
//! hands the result to `output` for display.

use anyhow::{bail, Context as _, Result};
use riddle_common::{
    Decision, GuessEvaluation, Judge, JsonlOverrideStore, MemoryOverrideStore, Outcome,
    Override, OverrideStore, RiddleConfig, Scenario, Verdict,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::output;

/// Settings shared by every command.
pub struct Context {
    pub config: RiddleConfig,
    pub json: bool,
}

impl Context {
    pub fn load(config_path: Option<&Path>, data_dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let mut config = RiddleConfig::load(config_path).context("loading config")?;
        if data_dir.is_some() {
            config.storage.data_dir = data_dir;
        }
        Ok(Self { config, json })
    }

    fn judge(&self) -> Result<Judge> {
        Judge::from_config(&self.config).context("building judge")
    }

    fn scenario(&self) -> Result<Scenario> {
        let scenario = match &self.config.judge.scenario_path {
            Some(path) => Scenario::load(path),
            None => Scenario::builtin(),
        };
        scenario.context("loading scenario")
    }
}

fn join_words(words: &[String]) -> String {
    words.join(" ")
}

pub fn ask(ctx: &Context, words: &[String]) -> Result<()> {
    let question = join_words(words);
    let decision = ctx.judge()?.decide(&question)?;
    debug!("'{}' decided at {}", question, decision.stage);
    if ctx.json {
        output::print_json(&AskOutput {
            question: &question,
            decision: &decision,
        })
    } else {
        output::display_decision(&question, &decision);
        Ok(())
    }
}

#[derive(Serialize)]
struct AskOutput<'a> {
    question: &'a str,
    #[serde(flatten)]
    decision: &'a Decision,
}

pub fn guess(ctx: &Context, words: &[String]) -> Result<()> {
    let text = join_words(words);
    let evaluation: GuessEvaluation = ctx.judge()?.evaluate_guess(&text)?;
    if ctx.json {
        output::print_json(&evaluation)
    } else {
        output::display_guess(&evaluation);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LearnOutcome {
    pub overrides: usize,
    pub verdict: Verdict,
    pub dry_run: bool,
}

/// Record a correction and report the verdict the question now gets.
pub fn learn_with(
    judge: &Judge,
    question: &str,
    outcome: &str,
    answer: Option<&str>,
) -> Result<(usize, Verdict)> {
    let outcome: Outcome = outcome.parse()?;
    let count = judge.learn(Override::new(question, outcome, answer.unwrap_or_default()))?;
    let verdict = judge.classify(question)?;
    Ok((count, verdict))
}

pub fn learn(
    ctx: &Context,
    question: &str,
    outcome: &str,
    answer: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let judge = if dry_run {
        // Start from what is on disk, write nowhere
        let on_disk = JsonlOverrideStore::in_dir(&ctx.config.data_dir()).load_all()?;
        let store = MemoryOverrideStore::with_records(on_disk);
        Judge::with_store(&ctx.config, Arc::new(store))?
    } else {
        ctx.judge()?
    };

    let (overrides, verdict) = learn_with(&judge, question, outcome, answer)?;
    let result = LearnOutcome {
        overrides,
        verdict,
        dry_run,
    };
    if ctx.json {
        output::print_json(&result)
    } else {
        output::display_learn(question, &result);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayRow {
    pub line: usize,
    pub question: String,
    pub verdict: Verdict,
    pub expected: Option<Outcome>,
}

impl ReplayRow {
    pub fn is_mismatch(&self) -> bool {
        self.expected.is_some_and(|e| e != self.verdict.outcome)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    pub rows: Vec<ReplayRow>,
    pub by_outcome: BTreeMap<String, usize>,
    pub by_evidence: BTreeMap<String, usize>,
}

impl ReplayReport {
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn mismatches(&self) -> Vec<&ReplayRow> {
        self.rows.iter().filter(|r| r.is_mismatch()).collect()
    }
}

/// Classify each question line of `content`. A second tab-separated column,
/// when present, is the expected outcome.
pub fn replay_lines(judge: &Judge, content: &str) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();
    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let mut columns = line.split('\t');
        let question = columns.next().unwrap_or_default().trim().to_string();
        let expected = match columns.next().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<Outcome>()
                    .with_context(|| format!("line {}: bad expected outcome", line_num))?,
            ),
            None => None,
        };
        if question.is_empty() {
            continue;
        }

        let verdict = judge
            .classify(&question)
            .with_context(|| format!("line {}", line_num))?;
        *report
            .by_outcome
            .entry(verdict.outcome.as_str().to_string())
            .or_default() += 1;
        *report
            .by_evidence
            .entry(verdict.evidence.as_str().to_string())
            .or_default() += 1;
        report.rows.push(ReplayRow {
            line: line_num,
            question,
            verdict,
            expected,
        });
    }
    Ok(report)
}

pub fn replay(ctx: &Context, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let report = replay_lines(&ctx.judge()?, &content)?;

    if ctx.json {
        output::print_json(&report)?;
    } else {
        output::display_replay(&report);
    }

    let mismatches = report.mismatches().len();
    if mismatches > 0 {
        bail!("{} of {} questions disagree with the expected outcome", mismatches, report.total());
    }
    Ok(())
}

pub fn scenario(ctx: &Context, hints: bool, reveal: bool) -> Result<()> {
    let scenario = ctx.scenario()?;
    if ctx.json {
        let mut value = serde_json::json!({
            "id": scenario.id,
            "title": scenario.title,
            "description": scenario.description,
        });
        if hints {
            value["hints"] = serde_json::json!(scenario.hints);
        }
        if reveal {
            value["reveal"] = serde_json::json!(scenario.reveal);
        }
        output::print_json(&value)
    } else {
        output::display_scenario(&scenario, hints, reveal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riddle_common::Evidence;

    fn judge() -> Judge {
        Judge::builtin(Arc::new(MemoryOverrideStore::new())).unwrap()
    }

    #[test]
    fn test_replay_counts_and_skips_comments() {
        let content = "# warm-up\n남자는 서 있었나요?\n\n열기구에서 성냥으로 제비뽑기를 했나요\n";
        let report = replay_lines(&judge(), content).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.rows[0].line, 2);
        assert_eq!(report.rows[0].verdict.evidence, Evidence::Posture);
        assert_eq!(report.by_outcome.get("no"), Some(&1));
        assert_eq!(report.by_outcome.get("yes"), Some(&1));
        assert!(report.mismatches().is_empty());
    }

    #[test]
    fn test_replay_flags_mismatches() {
        let content = "남자는 서 있었나요?\tno\n남자는 누워 있었나요?\tno\n";
        let report = replay_lines(&judge(), content).unwrap();
        let mismatches = report.mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].line, 2);
    }

    #[test]
    fn test_replay_rejects_bad_expectation() {
        let err = replay_lines(&judge(), "남자는 서 있었나요?\tperhaps\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_learn_with_applies_immediately() {
        let j = judge();
        let (count, verdict) = learn_with(&j, "남자는 서 있었나요", "예", Some("잠깐 서 있었습니다")).unwrap();
        assert_eq!(count, 1);
        assert_eq!(verdict.outcome, Outcome::Yes);
        assert_eq!(verdict.evidence, Evidence::LearnedOverride);
        assert_eq!(verdict.answer, "잠깐 서 있었습니다");
    }

    #[test]
    fn test_learn_with_rejects_unknown_outcome() {
        assert!(learn_with(&judge(), "남자는 죽었나요", "perhaps", None).is_err());
    }

    #[test]
    fn test_context_data_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[judge]\ncache_capacity = 4\n").unwrap();

        let ctx = Context::load(Some(&config_path), Some(dir.path().to_path_buf()), true).unwrap();
        assert_eq!(ctx.config.data_dir(), dir.path());
        assert_eq!(ctx.config.judge.cache_capacity, 4);

        learn(&ctx, "성냥은 길었나요", "no", None, false).unwrap();
        assert!(dir.path().join("overrides.jsonl").exists());

        // Dry runs leave the file alone
        let before = std::fs::read_to_string(dir.path().join("overrides.jsonl")).unwrap();
        learn(&ctx, "성냥은 짧았나요", "yes", None, true).unwrap();
        let after = std::fs::read_to_string(dir.path().join("overrides.jsonl")).unwrap();
        assert_eq!(before, after);
    }
}
