use crate::error::{EngineError, Result};
use crate::storage::Storage;
use grepandit_core::{Category, Question, QuestionId};
use std::collections::HashSet;

/// Resolves a category pick to one stored question.
#[derive(Debug)]
pub struct QuestionFetcher<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Storage + ?Sized> QuestionFetcher<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// One question of `category` whose id is not in `exclude`.
    ///
    /// Returns [`EngineError::NotFound`] when nothing matches; storage
    /// failures pass through unchanged.
    pub fn fetch_by_category(
        &self,
        category: Category,
        exclude: &HashSet<QuestionId>,
    ) -> Result<Question> {
        match self.store.load_question_by_category(category, exclude)? {
            // A backend that ignores the exclusion set must not leak repeats.
            Some(question) if exclude.contains(&question.id) => {
                warn_event!(
                    "storage returned excluded question {} for {}",
                    question.id,
                    category
                );
                Err(not_found(category))
            }
            Some(question) => Ok(question),
            None => Err(not_found(category)),
        }
    }
}

fn not_found(category: Category) -> EngineError {
    EngineError::NotFound(format!("no unseen question in category {category}"))
}
