//! Output formatting - plain ASCII markers, color only for emphasis

use anyhow::Result;
use owo_colors::OwoColorize;
use riddle_common::{Decision, GuessEvaluation, Outcome, Scenario};
use serde::Serialize;

use crate::commands::{LearnOutcome, ReplayReport};

const SEPARATOR: &str = "----------------------------------------";

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Bracketed outcome marker, colored by outcome.
fn outcome_marker(outcome: Outcome) -> String {
    let label = format!("[{}]", outcome.as_str().to_uppercase());
    match outcome {
        Outcome::Yes => label.bright_green().to_string(),
        Outcome::No => label.bright_red().to_string(),
        Outcome::Ambiguous => label.yellow().to_string(),
        Outcome::Nonsense => label.magenta().to_string(),
    }
}

fn flag(on: bool) -> String {
    if on {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

pub fn display_decision(question: &str, decision: &Decision) {
    let verdict = &decision.verdict;
    println!();
    println!("{}", question.bold());
    println!("{}  {}", outcome_marker(verdict.outcome), verdict.answer);
    println!(
        "  {} {}  {} {}",
        "evidence:".dimmed(),
        verdict.evidence.as_str().cyan(),
        "stage:".dimmed(),
        decision.stage
    );
    if verdict.negated {
        println!("  {}", "(negative question, outcome inverted)".dimmed());
    }
    println!();
}

pub fn display_guess(eval: &GuessEvaluation) {
    println!();
    if eval.is_correct {
        println!("{}  score {}%", "[CORRECT]".bright_green(), eval.score_percent);
    } else {
        println!("{}  score {}%", "[INCORRECT]".bright_red(), eval.score_percent);
    }
    println!("{}", SEPARATOR.dimmed());
    println!("  all anchors       {}  {}", flag(eval.all_anchors), eval.matched.anchors.join(", "));
    println!("  secondary anchor  {}  {}", flag(eval.any_secondary), eval.matched.secondary.join(", "));
    println!("  canonical phrase  {}  {}", flag(eval.canonical_combination), eval.matched.canonical.join(", "));
    println!("  essential phrase  {}  {}", flag(eval.essential_combination), eval.matched.essential.join(", "));
    println!("  narrative         {}", flag(eval.narrative_present));
    if eval.wrong_pattern {
        println!(
            "  {} {}",
            "[WRONG]".bright_red(),
            eval.matched.wrong.join(", ")
        );
    }
    println!();
}

pub fn display_learn(question: &str, result: &LearnOutcome) {
    println!();
    if result.dry_run {
        println!("{} nothing was written", "[DRY RUN]".yellow());
    } else {
        println!("{} override recorded ({} questions overridden)", "[OK]".bright_green(), result.overrides);
    }
    println!("{}", question.bold());
    println!("{}  {}", outcome_marker(result.verdict.outcome), result.verdict.answer);
    println!();
}

pub fn display_replay(report: &ReplayReport) {
    println!();
    for row in &report.rows {
        let marker = if row.is_mismatch() {
            "!".bright_red().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:>4}  {:<22} {:<20} {}",
            marker,
            row.line,
            outcome_marker(row.verdict.outcome),
            row.verdict.evidence.as_str(),
            row.question
        );
    }

    println!();
    println!("{}", SEPARATOR.dimmed());
    println!("{} questions", report.total());
    for (outcome, count) in &report.by_outcome {
        println!("  {:<12} {:>5}", outcome, count);
    }
    println!("{}", SEPARATOR.dimmed());
    for (evidence, count) in &report.by_evidence {
        println!("  {:<22} {:>5}", evidence, count);
    }

    let mismatches = report.mismatches();
    if !mismatches.is_empty() {
        println!();
        println!("{} {} mismatches", "[WARNING]".bright_red(), mismatches.len());
        for row in mismatches {
            let expected = row.expected.map(|e| e.as_str()).unwrap_or("-");
            println!(
                "  line {}: expected {}, got {}  {}",
                row.line,
                expected,
                row.verdict.outcome,
                row.question
            );
        }
    }
    println!();
}

pub fn display_scenario(scenario: &Scenario, hints: bool, reveal: bool) {
    println!();
    println!("{}", scenario.title.bold());
    println!("{}", scenario.description);

    if hints && !scenario.hints.is_empty() {
        println!();
        println!("[HINTS]");
        for (i, hint) in scenario.hints.iter().enumerate() {
            println!("  {}. {}", i + 1, hint);
        }
    }

    if reveal {
        println!();
        println!("{}", "[SOLUTION]".yellow());
        println!("{}", scenario.reveal.answer);
        println!();
        println!("{}", scenario.reveal.explanation.dimmed());
    }
    println!();
}
