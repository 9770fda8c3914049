//! Reduction of English surface words to their dictionary base form.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const EN_LEXICON: &str = include_str!("../data/en_lexicon.tsv");

/// Suffixes tried in order; longer endings come before the ones they contain.
const SUFFIXES: [&str; 7] = ["ing", "est", "er", "es", "ed", "ly", "s"];

#[derive(Debug, Error)]
pub enum LemmaError {
    #[error("failed to read lexicon: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed lexicon line {line}: '{content}'")]
    Malformed { line: usize, content: String },
    #[error("lexicon contains no entries")]
    Empty,
}

/// Maps a word to its base form. Language is fixed to English.
pub trait Lemmatizer {
    fn lemma(&self, word: &str) -> String;
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for &L {
    fn lemma(&self, word: &str) -> String {
        (**self).lemma(word)
    }
}

impl<L: Lemmatizer + ?Sized> Lemmatizer for Arc<L> {
    fn lemma(&self, word: &str) -> String {
        (**self).lemma(word)
    }
}

/// Lemmatizer driven by a lexicon of irregular forms and known base forms.
///
/// Lookup lowercases the word and tries, in order: the irregular table, the
/// base forms, then suffix stripping with e-restoration, consonant
/// un-doubling and `i -> y` restoration. A candidate only counts if it is a
/// known base form. Words nothing matches come back lowercased.
#[derive(Debug, Clone, Default)]
pub struct LexiconLemmatizer {
    irregular: HashMap<String, String>,
    bases: HashSet<String>,
}

impl LexiconLemmatizer {
    /// The embedded English lexicon.
    pub fn english() -> Result<Self, LemmaError> {
        Self::parse(EN_LEXICON)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LemmaError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses `form<TAB>lemma` and single `lemma` lines. Blank lines and `#`
    /// comments are skipped.
    pub fn parse(content: &str) -> Result<Self, LemmaError> {
        let mut lexicon = Self::default();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || LemmaError::Malformed {
                line: idx + 1,
                content: raw.to_string(),
            };
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.iter().any(|f| f.is_empty() || f.contains(char::is_whitespace)) {
                return Err(malformed());
            }
            match fields.as_slice() {
                [base] => {
                    lexicon.bases.insert(base.to_lowercase());
                }
                [form, lemma] => {
                    let lemma = lemma.to_lowercase();
                    lexicon.irregular.insert(form.to_lowercase(), lemma.clone());
                    lexicon.bases.insert(lemma);
                }
                _ => return Err(malformed()),
            }
        }
        if lexicon.bases.is_empty() {
            return Err(LemmaError::Empty);
        }
        Ok(lexicon)
    }

    /// Adds known base forms, typically the stored vocabulary.
    #[must_use]
    pub fn with_bases<I, S>(mut self, bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.bases
            .extend(bases.into_iter().map(|b| b.as_ref().trim().to_lowercase()));
        self
    }

    #[must_use]
    pub fn is_base(&self, word: &str) -> bool {
        self.bases.contains(word)
    }

    fn reduce(&self, lower: &str) -> Option<String> {
        for suffix in SUFFIXES {
            let Some(stem) = lower.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            if self.is_base(stem) {
                return Some(stem.to_string());
            }
            let with_e = format!("{stem}e");
            if self.is_base(&with_e) {
                return Some(with_e);
            }
            let mut tail = stem.chars().rev();
            if let (Some(last), Some(prev)) = (tail.next(), tail.next()) {
                if last == prev {
                    let undoubled = &stem[..stem.len() - last.len_utf8()];
                    if self.is_base(undoubled) {
                        return Some(undoubled.to_string());
                    }
                }
            }
            if let Some(head) = stem.strip_suffix('i') {
                let with_y = format!("{head}y");
                if self.is_base(&with_y) {
                    return Some(with_y);
                }
            }
        }
        None
    }
}

impl Lemmatizer for LexiconLemmatizer {
    fn lemma(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if let Some(lemma) = self.irregular.get(&lower) {
            return lemma.clone();
        }
        if self.is_base(&lower) {
            return lower;
        }
        self.reduce(&lower).unwrap_or(lower)
    }
}
