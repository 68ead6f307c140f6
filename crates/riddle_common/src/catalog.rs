//! Pattern catalog: every keyword list and regex the cascade and the guess
//! scorer consult, loaded from TOML.
//!
//! The built-in catalog is compiled into the binary; a deployment can point
//! `judge.catalog_path` at its own copy. Entries are matched as substrings of
//! normalized text, so they are lower-cased at load and otherwise kept
//! verbatim (a leading space in an entry is significant).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, RiddleError};
use crate::verdict::Outcome;

const BUILTIN_CATALOG: &str = include_str!("../data/desert_catalog.toml");

/// Named list of substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    name: String,
    entries: Vec<String>,
}

impl PatternSet {
    pub fn new(name: impl Into<String>, entries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            entries: entries.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry occurs in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.entries.iter().any(|e| text.contains(e.as_str()))
    }

    /// First entry (in catalog order) that occurs in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| text.contains(e.as_str()))
            .map(String::as_str)
    }

    /// All entries that occur in `text`, in catalog order.
    pub fn matches_in(&self, text: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| text.contains(e.as_str()))
            .map(String::as_str)
            .collect()
    }

    fn absorb(&mut self, other: &PatternSet) {
        for entry in &other.entries {
            if !self.entries.contains(entry) {
                self.entries.push(entry.clone());
            }
        }
    }
}

/// User-facing sentences bound to outcomes and gate rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replies {
    pub yes: String,
    pub no: String,
    pub ambiguous: String,
    pub nonsense: String,
    pub scenario_external: String,
    pub irrelevant: String,
    pub scenario_unrelated: String,
    pub open_ended: String,
    pub off_scenario: String,
    pub system_error: String,
}

impl Replies {
    /// Plain reply for an outcome, ignoring which rule produced it.
    pub fn for_outcome(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Yes => &self.yes,
            Outcome::No => &self.no,
            Outcome::Ambiguous => &self.ambiguous,
            Outcome::Nonsense => &self.nonsense,
        }
    }
}

/// A negative sentence ending and the positive form it rewrites to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegationPair {
    pub negative: String,
    pub positive: String,
}

/// Vocabulary for scoring a final solution.
#[derive(Debug, Clone)]
pub struct GuessVocabulary {
    pub anchors_all: PatternSet,
    pub anchors_any: PatternSet,
    pub canonical: PatternSet,
    pub essential: PatternSet,
    pub wrong: PatternSet,
    /// Narrative elements; a guess touching every group is accepted outright.
    pub narrative_groups: Vec<PatternSet>,
}

// On-disk layout

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    scenario: String,
    replies: Replies,
    nonsense: NonsenseSection,
    scope: ScopeSection,
    relevance: RelevanceSection,
    rules: RulesSection,
    physical: PhysicalSection,
    open_ended: OpenEndedSection,
    #[serde(default)]
    negation: Vec<NegationPair>,
    guess: GuessSection,
}

#[derive(Debug, Deserialize)]
struct NonsenseSection {
    phrases: Vec<String>,
    #[serde(default)]
    regexes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScopeSection {
    external_info: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RelevanceSection {
    scenario_keywords: Vec<String>,
    subject_phrases: Vec<String>,
    irrelevant_domain: Vec<String>,
    question_words: Vec<String>,
    #[serde(default)]
    interrogative_regexes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RulesSection {
    wrong_answer: Vec<String>,
    match_terms: Vec<String>,
    match_draw: Vec<String>,
    match_other_use: Vec<String>,
    match_possession: Vec<String>,
    match_state: Vec<String>,
    posture_upright: Vec<String>,
    posture_supine: Vec<String>,
    clothing_reason_triggers: Vec<String>,
    clothing_reason_alternatives: Vec<String>,
    transport: Vec<String>,
    off_scenario: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PhysicalSection {
    evidence: Vec<String>,
    organ: Vec<String>,
    abnormal: Vec<String>,
    absence: Vec<String>,
    presence: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenEndedSection {
    markers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GuessSection {
    anchors_all: Vec<String>,
    anchors_any: Vec<String>,
    canonical_combinations: Vec<String>,
    essential_combinations: Vec<String>,
    wrong_patterns: Vec<String>,
    #[serde(default)]
    narrative_groups: Vec<Vec<String>>,
}

/// Compiled catalog, immutable after load.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    pub version: String,
    pub scenario: String,
    pub replies: Replies,

    pub nonsense_phrases: PatternSet,
    pub nonsense_regexes: Vec<Regex>,

    pub external_info: PatternSet,

    pub scenario_keywords: PatternSet,
    pub subject_phrases: PatternSet,
    pub irrelevant_domain: PatternSet,
    pub question_words: PatternSet,
    pub interrogatives: Vec<Regex>,

    pub wrong_answer: PatternSet,
    pub match_terms: PatternSet,
    pub match_draw: PatternSet,
    pub match_other_use: PatternSet,
    pub match_possession: PatternSet,
    pub match_state: PatternSet,
    pub posture_upright: PatternSet,
    pub posture_supine: PatternSet,
    pub clothing_triggers: PatternSet,
    pub clothing_alternatives: PatternSet,
    pub transport: PatternSet,
    pub off_scenario: PatternSet,

    /// Category gate for stage 7; includes every organ, absence and presence entry.
    pub physical_evidence: PatternSet,
    pub organ: PatternSet,
    pub physical_abnormal: PatternSet,
    pub physical_absence: PatternSet,
    pub physical_presence: PatternSet,

    pub open_ended: PatternSet,

    /// Sorted longest negative ending first.
    pub negation: Vec<NegationPair>,

    pub guess: GuessVocabulary,
}

fn compile_regexes(section: &str, sources: &[String]) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|src| {
            Regex::new(src).map_err(|e| {
                RiddleError::Catalog(format!("{}: invalid regex '{}': {}", section, src, e))
            })
        })
        .collect()
}

impl PatternCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RiddleError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            "Loaded pattern catalog {} v{} from {} ({} entries)",
            catalog.scenario,
            catalog.version,
            path.display(),
            catalog.entry_count()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let catalog = Self::compile(file)?;
        catalog.validate()?;
        debug!(
            "Compiled pattern catalog v{} ({} entries)",
            catalog.version,
            catalog.entry_count()
        );
        Ok(catalog)
    }

    fn compile(file: CatalogFile) -> Result<Self> {
        let set = |name: &str, entries: Vec<String>| PatternSet::new(name, entries);

        let organ = set("organ", file.physical.organ);
        let physical_abnormal = set("physical_abnormal", file.physical.abnormal);
        let physical_absence = set("physical_absence", file.physical.absence);
        let physical_presence = set("physical_presence", file.physical.presence);
        let mut physical_evidence = set("physical_evidence", file.physical.evidence);
        physical_evidence.absorb(&organ);
        physical_evidence.absorb(&physical_abnormal);
        physical_evidence.absorb(&physical_absence);
        physical_evidence.absorb(&physical_presence);

        let mut negation = file.negation;
        // Stable sort keeps catalog order among endings of equal length.
        negation.sort_by(|a, b| b.negative.chars().count().cmp(&a.negative.chars().count()));

        let guess = GuessVocabulary {
            anchors_all: set("anchors_all", file.guess.anchors_all),
            anchors_any: set("anchors_any", file.guess.anchors_any),
            canonical: set("canonical_combinations", file.guess.canonical_combinations),
            essential: set("essential_combinations", file.guess.essential_combinations),
            wrong: set("wrong_patterns", file.guess.wrong_patterns),
            narrative_groups: file
                .guess
                .narrative_groups
                .into_iter()
                .enumerate()
                .map(|(i, group)| set(&format!("narrative_group_{}", i), group))
                .collect(),
        };

        Ok(Self {
            version: file.version,
            scenario: file.scenario,
            replies: file.replies,
            nonsense_phrases: set("nonsense_phrases", file.nonsense.phrases),
            nonsense_regexes: compile_regexes("nonsense", &file.nonsense.regexes)?,
            external_info: set("external_info", file.scope.external_info),
            scenario_keywords: set("scenario_keywords", file.relevance.scenario_keywords),
            subject_phrases: set("subject_phrases", file.relevance.subject_phrases),
            irrelevant_domain: set("irrelevant_domain", file.relevance.irrelevant_domain),
            question_words: set("question_words", file.relevance.question_words),
            interrogatives: compile_regexes("relevance", &file.relevance.interrogative_regexes)?,
            wrong_answer: set("wrong_answer", file.rules.wrong_answer),
            match_terms: set("match_terms", file.rules.match_terms),
            match_draw: set("match_draw", file.rules.match_draw),
            match_other_use: set("match_other_use", file.rules.match_other_use),
            match_possession: set("match_possession", file.rules.match_possession),
            match_state: set("match_state", file.rules.match_state),
            posture_upright: set("posture_upright", file.rules.posture_upright),
            posture_supine: set("posture_supine", file.rules.posture_supine),
            clothing_triggers: set("clothing_triggers", file.rules.clothing_reason_triggers),
            clothing_alternatives: set(
                "clothing_alternatives",
                file.rules.clothing_reason_alternatives,
            ),
            transport: set("transport", file.rules.transport),
            off_scenario: set("off_scenario", file.rules.off_scenario),
            physical_evidence,
            organ,
            physical_abnormal,
            physical_absence,
            physical_presence,
            open_ended: set("open_ended", file.open_ended.markers),
            negation,
            guess,
        })
    }

    fn sets(&self) -> Vec<&PatternSet> {
        let mut sets = vec![
            &self.nonsense_phrases,
            &self.external_info,
            &self.scenario_keywords,
            &self.subject_phrases,
            &self.irrelevant_domain,
            &self.question_words,
            &self.wrong_answer,
            &self.match_terms,
            &self.match_draw,
            &self.match_other_use,
            &self.match_possession,
            &self.match_state,
            &self.posture_upright,
            &self.posture_supine,
            &self.clothing_triggers,
            &self.clothing_alternatives,
            &self.transport,
            &self.off_scenario,
            &self.physical_evidence,
            &self.organ,
            &self.physical_abnormal,
            &self.physical_absence,
            &self.physical_presence,
            &self.open_ended,
            &self.guess.anchors_all,
            &self.guess.anchors_any,
            &self.guess.canonical,
            &self.guess.essential,
            &self.guess.wrong,
        ];
        sets.extend(self.guess.narrative_groups.iter());
        sets
    }

    /// Total entries across all sets and regexes.
    pub fn entry_count(&self) -> usize {
        self.sets().iter().map(|s| s.len()).sum::<usize>()
            + self.nonsense_regexes.len()
            + self.interrogatives.len()
            + self.negation.len()
    }

    /// Reject catalogs the cascade cannot run on.
    ///
    /// Every set must be non-empty and free of blank entries, and no accepted
    /// solution phrase may contain a known-wrong term (a canonical answer that
    /// is also wrong could never score as correct).
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(RiddleError::Catalog("version is empty".to_string()));
        }

        for set in self.sets() {
            if set.is_empty() {
                return Err(RiddleError::Catalog(format!("{} has no entries", set.name())));
            }
            if set.entries().iter().any(|e| e.trim().is_empty()) {
                return Err(RiddleError::Catalog(format!("{} has a blank entry", set.name())));
            }
        }

        for pair in &self.negation {
            if pair.negative.trim().is_empty() {
                return Err(RiddleError::Catalog(
                    "negation ending must not be blank".to_string(),
                ));
            }
        }

        for phrase in self
            .guess
            .canonical
            .entries()
            .iter()
            .chain(self.guess.essential.entries())
        {
            if let Some(wrong) = self.guess.wrong.first_match(phrase) {
                return Err(RiddleError::Catalog(format!(
                    "accepted phrase '{}' contains wrong pattern '{}'",
                    phrase, wrong
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert_eq!(catalog.scenario, "desert_man");
        assert!(!catalog.version.is_empty());
        assert!(catalog.entry_count() > 300);
        assert_eq!(catalog.guess.narrative_groups.len(), 4);
    }

    #[test]
    fn test_pattern_set_matching() {
        let set = PatternSet::new("t", vec!["성냥".into(), "열기구".into(), "KM".into()]);
        assert!(set.matches("열기구에서 성냥으로"));
        assert_eq!(set.first_match("열기구에서 성냥으로"), Some("성냥"));
        assert_eq!(set.matches_in("열기구에서 성냥으로"), vec!["성냥", "열기구"]);
        assert!(set.matches("10km"));
        assert!(!set.matches("사막"));
    }

    #[test]
    fn test_leading_space_entry_is_significant() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert!(catalog.posture_upright.matches("남자는 서 있었나요"));
        assert!(!catalog.posture_upright.matches("서 있었나요"));
    }

    #[test]
    fn test_physical_category_includes_polarity_lists() {
        let catalog = PatternCatalog::builtin().unwrap();
        for entry in catalog.organ.entries() {
            assert!(catalog.physical_evidence.entries().contains(entry));
        }
        for entry in catalog.physical_presence.entries() {
            assert!(catalog.physical_evidence.entries().contains(entry));
        }
    }

    #[test]
    fn test_negation_sorted_longest_first() {
        let catalog = PatternCatalog::builtin().unwrap();
        let lens: Vec<usize> = catalog
            .negation
            .iter()
            .map(|p| p.negative.chars().count())
            .collect();
        let mut sorted = lens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(lens, sorted);
    }

    #[test]
    fn test_rejects_wrong_term_in_canonical() {
        let bad = BUILTIN_CATALOG.replace("\"열기구 무게 제비뽑기\"", "\"낙타 제비뽑기\"");
        let err = PatternCatalog::from_toml_str(&bad).unwrap_err();
        assert!(matches!(err, RiddleError::Catalog(_)));
        assert!(err.to_string().contains("낙타"));
    }

    #[test]
    fn test_rejects_empty_set() {
        let bad = BUILTIN_CATALOG.replace(
            "match_terms = [\"성냥\"]",
            "match_terms = []",
        );
        let err = PatternCatalog::from_toml_str(&bad).unwrap_err();
        assert!(err.to_string().contains("match_terms"));
    }

    #[test]
    fn test_rejects_bad_regex() {
        let bad = BUILTIN_CATALOG.replace("'결국\\s*아무것도\\s*못하'", "'(unclosed'");
        let err = PatternCatalog::from_toml_str(&bad).unwrap_err();
        assert!(matches!(err, RiddleError::Catalog(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = PatternCatalog::from_toml_str("version = ").unwrap_err();
        assert!(matches!(err, RiddleError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, BUILTIN_CATALOG).unwrap();
        let catalog = PatternCatalog::load(&path).unwrap();
        assert_eq!(catalog.scenario, "desert_man");

        let missing = PatternCatalog::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(RiddleError::Catalog(_))));
    }
}
