//! Detects which vocabulary words a question exercises.

use crate::lemma::Lemmatizer;
use grepandit_core::{NewQuestion, VocabularyTagSet};
use std::collections::{BTreeMap, BTreeSet};

/// Characters that split tokens besides whitespace.
pub const TOKEN_DELIMITERS: [char; 5] = ['.', ',', '!', '(', ')'];

/// Splits `text` on whitespace and [`TOKEN_DELIMITERS`], keeping the surface
/// form (case included) of every non-empty token.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || TOKEN_DELIMITERS.contains(&c))
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone)]
pub struct VocabularyTagger<L> {
    lemmatizer: L,
}

impl<L: Lemmatizer> VocabularyTagger<L> {
    pub fn new(lemmatizer: L) -> Self {
        Self { lemmatizer }
    }

    pub fn lemmatizer(&self) -> &L {
        &self.lemmatizer
    }

    /// Tags a paragraph and its option texts against candidate vocabulary.
    ///
    /// A candidate is selected when some token shares its lemma; every such
    /// token is recorded in the word map as `surface -> lemma`. Candidates
    /// that reduce to the same lemma are selected together. The result is a
    /// pure function of the inputs.
    pub fn tag<'a, I, S>(&self, paragraph: &'a str, options: I, vocabulary: &[S]) -> VocabularyTagSet
    where
        I: IntoIterator<Item = &'a str>,
        S: AsRef<str>,
    {
        let mut by_base: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
        for word in vocabulary {
            let word = word.as_ref();
            by_base
                .entry(self.lemmatizer.lemma(word))
                .or_default()
                .insert(word);
        }

        let mut selected: BTreeSet<&str> = BTreeSet::new();
        let mut word_map = BTreeMap::new();
        let texts = std::iter::once(paragraph).chain(options);
        for token in texts.flat_map(|text| tokenize(text)) {
            if word_map.contains_key(token) {
                continue;
            }
            let lemma = self.lemmatizer.lemma(token);
            if let Some(originals) = by_base.get(&lemma) {
                selected.extend(originals.iter().copied());
                word_map.insert(token.to_string(), lemma);
            }
        }

        VocabularyTagSet {
            words: selected.into_iter().map(str::to_string).collect(),
            word_map,
        }
    }

    /// Tags a creation request using its paragraph, option values and
    /// candidate vocabulary.
    pub fn tag_question(&self, question: &NewQuestion) -> VocabularyTagSet {
        self.tag(
            &question.paragraph,
            question.options.iter().map(|o| o.value.as_str()),
            question.vocabulary.as_slice(),
        )
    }
}
