//! Answer feedback sink. Players rate how their final guess was judged; the
//! records are kept for offline review and never read back by the judge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, RiddleError};
use crate::jsonl;

pub const FEEDBACK_FILE: &str = "answer_feedback.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub guess: String,
    /// Whether the player believes the guess should have been accepted
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AnswerFeedback {
    pub fn new(guess: impl Into<String>, is_correct: bool) -> Self {
        Self {
            guess: guess.into(),
            is_correct,
            comment: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        if !comment.trim().is_empty() {
            self.comment = Some(comment);
        }
        self
    }
}

pub trait FeedbackStore: Send + Sync {
    fn append(&self, record: &AnswerFeedback) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonlFeedbackStore {
    path: PathBuf,
}

impl JsonlFeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(FEEDBACK_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedbackStore for JsonlFeedbackStore {
    fn append(&self, record: &AnswerFeedback) -> Result<()> {
        jsonl::append(&self.path, record)
    }
}

#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    records: Mutex<Vec<AnswerFeedback>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AnswerFeedback> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn append(&self, record: &AnswerFeedback) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| RiddleError::Store("feedback store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_dropped() {
        let fb = AnswerFeedback::new("열기구에서 뛰어내렸다", true).with_comment("  ");
        assert!(fb.comment.is_none());
        let fb = fb.with_comment("정답 같아요");
        assert_eq!(fb.comment.as_deref(), Some("정답 같아요"));
    }

    #[test]
    fn test_jsonl_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlFeedbackStore::in_dir(dir.path());
        store.append(&AnswerFeedback::new("a", true)).unwrap();
        store.append(&AnswerFeedback::new("b", false)).unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        let first: AnswerFeedback = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first.guess, "a");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryFeedbackStore::new();
        store.append(&AnswerFeedback::new("낙타", false)).unwrap();
        assert_eq!(store.records().len(), 1);
    }
}
