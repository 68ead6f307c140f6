//! Error types for the riddle core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiddleError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pattern catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Corrupt override for '{question}': {reason}")]
    CorruptOverride { question: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RiddleError {
    pub fn code(&self) -> i32 {
        match self {
            RiddleError::InvalidInput(_) => -32602,
            RiddleError::Catalog(_) => -32010,
            RiddleError::Config(_) => -32011,
            RiddleError::Store(_) => -32012,
            RiddleError::CorruptOverride { .. } => -32013,
            RiddleError::Io(_) => -32006,
            RiddleError::Json(_) => -32700,
            RiddleError::Toml(_) => -32701,
        }
    }

    /// True when the caller can fix the request by resubmitting different text.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RiddleError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, RiddleError>;
