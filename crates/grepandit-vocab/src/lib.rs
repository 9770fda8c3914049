//! Vocabulary tagging for questions.
//!
//! [`VocabularyTagger`] finds the vocabulary words whose base form occurs in a
//! question's paragraph or options. Base forms come from a [`Lemmatizer`];
//! [`LexiconLemmatizer`] is the bundled English implementation.

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod lemma;
pub mod tagger;

pub use lemma::{LemmaError, Lemmatizer, LexiconLemmatizer};
pub use tagger::{tokenize, VocabularyTagger, TOKEN_DELIMITERS};
