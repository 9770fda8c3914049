//! Core types shared by the grepandit crates.

pub mod ability;
pub mod answer;
pub mod category;
pub mod question;

pub use ability::{AbilityProfile, CategoryAbility, UserProfile, MAX_ABILITY, MIN_ABILITY};
pub use answer::{AnswerRecord, AnswerSubmission};
pub use category::{Category, Difficulty, ParseCategoryError, QuestionType, CATEGORY_COUNT};
pub use question::{
    Competence, FramedAs, Meaning, NewQuestion, Question, QuestionId, QuestionOption,
    VocabularyTagSet, VocabularyWord, WordId,
};

use serde::{Deserialize, Serialize};

/// Rewards for all arms, indexed by [`Category::index`].
pub type Rewards = [f64; CATEGORY_COUNT];

/// One arm pick and why it was made.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Decision {
    pub category: Category,
    pub reward: f64,
    pub why: String,
}
