//! The puzzle narrative shown to players: premise, hints and the solution.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{Result, RiddleError};

const BUILTIN_SCENARIO: &str = include_str!("../data/desert_scenario.toml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    pub reveal: Reveal,
}

impl Scenario {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_SCENARIO)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scenario = Self::from_toml_str(&content)?;
        info!("Loaded scenario '{}' from {}", scenario.id, path.display());
        Ok(scenario)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        if scenario.id.trim().is_empty() {
            return Err(RiddleError::Config("scenario id is empty".to_string()));
        }
        Ok(scenario)
    }

    /// Hint number `index` (zero-based), if there is one.
    pub fn hint(&self, index: usize) -> Option<&str> {
        self.hints.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenario() {
        let s = Scenario::builtin().unwrap();
        assert_eq!(s.id, "desert_man");
        assert_eq!(s.title, "사막의 남자");
        assert_eq!(s.hints.len(), 3);
        assert_eq!(s.facts.len(), 6);
        assert!(s.reveal.answer.starts_with("남자가 한 명의 일행과"));
        assert!(s.hint(0).is_some());
        assert!(s.hint(3).is_none());
    }

    #[test]
    fn test_empty_id_rejected() {
        let bad = BUILTIN_SCENARIO.replace("id = \"desert_man\"", "id = \"\"");
        assert!(matches!(
            Scenario::from_toml_str(&bad),
            Err(RiddleError::Config(_))
        ));
    }
}
