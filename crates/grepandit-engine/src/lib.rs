//! Adaptive question selection for GRE verbal practice.
//!
//! [`AdaptiveEngine`] ties the pieces together: it reads a user's ability
//! profile, turns it into per-category rewards, lets an ε-greedy policy pick
//! categories and resolves each pick to a question through [`QuestionFetcher`].
//! Answer submission applies the ability update under a per-user lock, and
//! question creation tags vocabulary before one atomic save.
//!
//! Persistence sits behind [`Storage`]; [`MemoryStore`] is the bundled
//! implementation.

#![warn(clippy::unwrap_used, clippy::expect_used)]

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::warn!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        eprintln!($($arg)*);
    }};
}

#[cfg(feature = "telemetry")]
macro_rules! debug_event {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "telemetry"))]
macro_rules! debug_event {
    ($($arg:tt)*) => {{
        if false {
            eprintln!($($arg)*);
        }
    }};
}

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod storage;

pub use engine::{AdaptiveBatch, AdaptiveEngine, AnswerOutcome};
pub use error::{EngineError, Result, StorageError};
pub use fetcher::QuestionFetcher;
pub use storage::{MemoryStore, Storage, StorageResult, StoreSnapshot};

use grepandit_bandits::DEFAULT_EPSILON;
use grepandit_vocab::{LemmaError, LexiconLemmatizer};
use std::path::PathBuf;

/// Largest batch `adaptive_questions` accepts by default.
pub const DEFAULT_MAX_BATCH: usize = 20;

/// Questions returned per vocabulary practice request by default.
pub const DEFAULT_VOCAB_PRACTICE_LIMIT: usize = 5;

/// Where question creation loads its lemmatizer lexicon from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexiconSource {
    /// The lexicon compiled into `grepandit-vocab`.
    #[default]
    English,
    File(PathBuf),
}

impl LexiconSource {
    pub fn load(&self) -> std::result::Result<LexiconLemmatizer, LemmaError> {
        match self {
            LexiconSource::English => LexiconLemmatizer::english(),
            LexiconSource::File(path) => LexiconLemmatizer::from_path(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Exploration rate, in `[0, 1]`.
    pub epsilon: f64,
    pub max_batch: usize,
    pub vocab_practice_limit: usize,
    pub lexicon: LexiconSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_batch: DEFAULT_MAX_BATCH,
            vocab_practice_limit: DEFAULT_VOCAB_PRACTICE_LIMIT,
            lexicon: LexiconSource::English,
        }
    }
}
