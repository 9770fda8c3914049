use grepandit_core::QuestionId;
use grepandit_vocab::LemmaError;
use thiserror::Error;

/// Failures reported by a [`Storage`](crate::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown vocabulary word: {0}")]
    UnknownWord(String),
    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),
    #[error("state serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Nothing matched; recoverable per arm.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller sent something unusable; nothing was mutated.
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("lemmatizer failure: {0}")]
    Lemmatizer(#[from] LemmaError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
