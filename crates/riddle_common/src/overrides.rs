//! Learned overrides: human corrections consulted ahead of the domain rules.
//!
//! Records are append-only. The table keeps the latest record per normalized
//! question, so a newer correction supersedes an older one without rewriting
//! the file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, RiddleError};
use crate::jsonl;
use crate::normalize::normalize;
use crate::verdict::Outcome;

pub const OVERRIDES_FILE: &str = "overrides.jsonl";

/// One persisted correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// Question as the player typed it
    pub question: String,
    /// Outcome word as recorded; parsed at lookup time
    pub correct_classification: String,
    #[serde(default)]
    pub correct_answer: String,
    /// What the cascade answered before the correction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_answer: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Override {
    pub fn new(question: impl Into<String>, outcome: Outcome, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            correct_classification: outcome.as_str().to_string(),
            correct_answer: answer.into(),
            original_answer: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_original_answer(mut self, answer: impl Into<String>) -> Self {
        self.original_answer = Some(answer.into());
        self
    }

    /// Table key: the normalized question.
    pub fn key(&self) -> String {
        normalize(&self.question)
    }

    pub fn outcome(&self) -> Result<Outcome> {
        self.correct_classification
            .parse()
            .map_err(|_| RiddleError::CorruptOverride {
                question: self.question.clone(),
                reason: format!("unknown classification '{}'", self.correct_classification),
            })
    }
}

/// Persistence for overrides. The core only reads through `load_all`; the
/// service calls `append` when a player submits a correction.
pub trait OverrideStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<Override>>;
    fn append(&self, record: &Override) -> Result<()>;
}

/// JSON Lines file, one override per line.
#[derive(Debug, Clone)]
pub struct JsonlOverrideStore {
    path: PathBuf,
}

impl JsonlOverrideStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/overrides.jsonl`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(OVERRIDES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverrideStore for JsonlOverrideStore {
    fn load_all(&self) -> Result<Vec<Override>> {
        jsonl::read_all(&self.path)
    }

    fn append(&self, record: &Override) -> Result<()> {
        jsonl::append(&self.path, record)
    }
}

#[derive(Debug, Default)]
pub struct MemoryOverrideStore {
    records: Mutex<Vec<Override>>,
}

impl MemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Override>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl OverrideStore for MemoryOverrideStore {
    fn load_all(&self) -> Result<Vec<Override>> {
        let records = self
            .records
            .lock()
            .map_err(|_| RiddleError::Store("override store lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    fn append(&self, record: &Override) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| RiddleError::Store("override store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Read-only snapshot of the overrides, keyed by normalized question.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    by_key: HashMap<String, Override>,
}

impl OverrideTable {
    pub fn from_records(records: Vec<Override>) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        for record in records {
            let key = record.key();
            if key.is_empty() {
                continue;
            }
            by_key.insert(key, record);
        }
        Self { by_key }
    }

    pub fn load(store: &dyn OverrideStore) -> Result<Self> {
        Ok(Self::from_records(store.load_all()?))
    }

    /// Look up by an already-normalized question.
    pub fn lookup(&self, normalized: &str) -> Option<&Override> {
        self.by_key.get(normalized)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_record_supersedes() {
        let table = OverrideTable::from_records(vec![
            Override::new("남자는 죽었나요", Outcome::No, "아니오"),
            Override::new("  남자는   죽었나요 ", Outcome::Yes, "예"),
        ]);
        assert_eq!(table.len(), 1);
        let record = table.lookup("남자는 죽었나요").unwrap();
        assert_eq!(record.outcome().unwrap(), Outcome::Yes);
    }

    #[test]
    fn test_corrupt_classification_reported() {
        let mut record = Override::new("성냥은 길었나요", Outcome::No, "아니오");
        record.correct_classification = "perhaps".to_string();
        let err = record.outcome().unwrap_err();
        assert!(matches!(err, RiddleError::CorruptOverride { .. }));
    }

    #[test]
    fn test_blank_question_not_indexed() {
        let table = OverrideTable::from_records(vec![Override::new("   ", Outcome::Yes, "예")]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_jsonl_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlOverrideStore::in_dir(dir.path());
        assert!(store.load_all().unwrap().is_empty());

        let record = Override::new("열기구는 고장났나요", Outcome::Yes, "예")
            .with_original_answer("아니오");
        store.append(&record).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, vec![record]);
        assert!(store.path().ends_with(OVERRIDES_FILE));
    }

    #[test]
    fn test_jsonl_store_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlOverrideStore::in_dir(dir.path());
        store
            .append(&Override::new("성냥은 부러졌나요", Outcome::Yes, "예"))
            .unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .and_then(|mut f| {
                use std::io::Write;
                writeln!(f, "{{\"question\": 42}}")
            })
            .unwrap();

        let table = OverrideTable::load(&store).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryOverrideStore::new();
        store
            .append(&Override::new("남자는 알몸이었나요", Outcome::Yes, "예"))
            .unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
