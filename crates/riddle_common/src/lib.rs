//! Question judge and guess scorer for the desert-man situation puzzle.
//!
//! Players ask yes/no questions about a fixed narrative; the judge answers
//! each through an ordered rule cascade backed by a versioned pattern
//! catalog, a verdict cache and human-learned overrides. Final solutions are
//! scored separately against the catalog's guess vocabulary.

pub mod cache;
pub mod cascade;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feedback;
pub mod guess;
mod jsonl;
pub mod judge;
pub mod negation;
pub mod nonsense;
pub mod normalize;
pub mod overrides;
pub mod scenario;
pub mod verdict;

pub use cache::{CacheStats, ResultCache};
pub use cascade::{Decision, RuleCascade, Stage};
pub use catalog::{PatternCatalog, PatternSet};
pub use config::RiddleConfig;
pub use error::{Result, RiddleError};
pub use feedback::{AnswerFeedback, FeedbackStore, JsonlFeedbackStore, MemoryFeedbackStore};
pub use guess::{GuessEvaluation, GuessScorer};
pub use judge::{Judge, MAX_INPUT_CHARS};
pub use normalize::{char_len, normalize};
pub use overrides::{JsonlOverrideStore, MemoryOverrideStore, Override, OverrideStore, OverrideTable};
pub use scenario::Scenario;
pub use verdict::{Evidence, Outcome, Verdict};

/// Crate version, reported by the daemon and the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
