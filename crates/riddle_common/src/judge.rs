//! Judge: the two entry points the service calls, `classify` and
//! `evaluate_guess`, plus override maintenance.
//!
//! The override table is a copy-on-write snapshot. Classification holds a
//! read guard for the whole lookup-compute-store sequence and a reload holds
//! the write guard while it swaps the table and clears the cache, so a
//! verdict computed against an old table can never be stored after the
//! clear. Reloads run one at a time from store read to swap, so a slow
//! reload cannot install a snapshot older than one already in place.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::cache::{CacheStats, ResultCache};
use crate::cascade::{Decision, RuleCascade};
use crate::catalog::PatternCatalog;
use crate::config::RiddleConfig;
use crate::error::{Result, RiddleError};
use crate::guess::{GuessEvaluation, GuessScorer};
use crate::normalize::{char_len, normalize};
use crate::overrides::{JsonlOverrideStore, Override, OverrideStore, OverrideTable};
use crate::verdict::{Outcome, Verdict};

/// Longest question or guess accepted, in characters after normalization.
pub const MAX_INPUT_CHARS: usize = 500;

pub struct Judge {
    catalog: Arc<PatternCatalog>,
    cascade: RuleCascade,
    scorer: GuessScorer,
    cache: ResultCache,
    overrides: RwLock<Arc<OverrideTable>>,
    reload_lock: Mutex<()>,
    store: Arc<dyn OverrideStore>,
}

impl Judge {
    pub fn new(
        catalog: PatternCatalog,
        store: Arc<dyn OverrideStore>,
        cache_capacity: usize,
    ) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let table = OverrideTable::load(store.as_ref())?;
        info!(
            "Judge ready: catalog v{} ({} entries), {} learned overrides, cache capacity {}",
            catalog.version,
            catalog.entry_count(),
            table.len(),
            cache_capacity
        );
        Ok(Self {
            cascade: RuleCascade::new(Arc::clone(&catalog)),
            scorer: GuessScorer::new(Arc::clone(&catalog)),
            catalog,
            cache: ResultCache::new(cache_capacity),
            overrides: RwLock::new(Arc::new(table)),
            reload_lock: Mutex::new(()),
            store,
        })
    }

    /// Judge with the built-in catalog and the default cache capacity.
    pub fn builtin(store: Arc<dyn OverrideStore>) -> Result<Self> {
        Self::new(
            PatternCatalog::builtin()?,
            store,
            crate::cache::DEFAULT_CAPACITY,
        )
    }

    /// Catalog from `judge.catalog_path` (or built-in), overrides from the
    /// data directory.
    pub fn from_config(config: &RiddleConfig) -> Result<Self> {
        let store = JsonlOverrideStore::in_dir(&config.data_dir());
        info!("Learned overrides at {}", store.path().display());
        Self::with_store(config, Arc::new(store))
    }

    /// Configured catalog and cache, overrides from `store`.
    pub fn with_store(config: &RiddleConfig, store: Arc<dyn OverrideStore>) -> Result<Self> {
        let catalog = match &config.judge.catalog_path {
            Some(path) => PatternCatalog::load(path)?,
            None => PatternCatalog::builtin()?,
        };
        Self::new(catalog, store, config.judge.cache_capacity)
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    fn read_overrides(&self) -> RwLockReadGuard<'_, Arc<OverrideTable>> {
        self.overrides
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_text(kind: &str, text: &str) -> Result<String> {
        let key = normalize(text);
        if key.is_empty() {
            return Err(RiddleError::InvalidInput(format!("{} is empty", kind)));
        }
        if char_len(&key) > MAX_INPUT_CHARS {
            return Err(RiddleError::InvalidInput(format!(
                "{} is longer than {} characters",
                kind, MAX_INPUT_CHARS
            )));
        }
        Ok(key)
    }

    /// Classify a question. Rejects empty input; everything else yields a
    /// verdict.
    pub fn classify(&self, question: &str) -> Result<Verdict> {
        let key = Self::require_text("question", question)?;
        let table = self.read_overrides();

        if let Some(verdict) = self.cache.get(&key) {
            debug!("Verdict cache hit for '{}'", key);
            return Ok(verdict);
        }

        let verdict = self.cascade.classify(&key, &table);
        self.cache.put(key, verdict.clone());
        Ok(verdict)
    }

    /// Uncached classification that also reports the deciding stage.
    pub fn decide(&self, question: &str) -> Result<Decision> {
        let key = Self::require_text("question", question)?;
        let table = self.read_overrides();
        Ok(self.cascade.decide(&key, &table))
    }

    pub fn evaluate_guess(&self, guess: &str) -> Result<GuessEvaluation> {
        Self::require_text("guess", guess)?;
        Ok(self.scorer.score(guess))
    }

    /// Safe default for a request that hit an internal fault.
    pub fn system_error_verdict(&self) -> Verdict {
        Verdict::system_error(self.catalog.replies.system_error.clone())
    }

    /// Re-read the override store, swap the snapshot and drop cached
    /// verdicts. Returns the number of distinct overridden questions.
    pub fn reload_overrides(&self) -> Result<usize> {
        let _reloading = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let table = OverrideTable::load(self.store.as_ref())?;
        let count = table.len();
        let mut guard = self
            .overrides
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(table);
        self.cache.clear();
        drop(guard);
        info!("Reloaded learned overrides: {} questions", count);
        Ok(count)
    }

    /// Persist a correction and make it effective immediately.
    pub fn learn(&self, record: Override) -> Result<usize> {
        Self::require_text("question", &record.question)?;
        record
            .outcome()
            .map_err(|e| RiddleError::InvalidInput(e.to_string()))?;
        self.store.append(&record)?;
        info!(
            "Learned override for '{}' -> {}",
            record.question, record.correct_classification
        );
        self.reload_overrides()
    }

    /// Record a correction given as an outcome plus optional reply text.
    pub fn learn_outcome(&self, question: &str, outcome: Outcome, answer: &str) -> Result<usize> {
        self.learn(Override::new(question, outcome, answer))
    }

    pub fn override_count(&self) -> usize {
        self.read_overrides().len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
