//! The fixed set of practice categories.
//!
//! A [`Category`] is a `(Difficulty, QuestionType)` pair. There are exactly
//! [`CATEGORY_COUNT`] of them, enumerated difficulty-major and type-minor in
//! [`Category::ALL`]. The position in that array is the bandit arm index, so
//! the order must never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of practice categories (3 difficulties x 3 question types).
pub const CATEGORY_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCategoryError {
    #[error("unknown difficulty: {0}")]
    Difficulty(String),
    #[error("unknown question type: {0}")]
    QuestionType(String),
    #[error("unknown competence: {0}")]
    Competence(String),
    #[error("unknown question framing: {0}")]
    FramedAs(String),
    #[error("malformed category key '{0}', expected '<Difficulty>_<QuestionType>'")]
    MalformedKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy = 0,
    Medium = 1,
    Hard = 2,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Ability points gained on a correct answer and lost on an incorrect one.
    #[must_use]
    pub const fn step(self) -> u32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 150,
            Difficulty::Hard => 200,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseCategoryError::Difficulty(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionType {
    ReadingComprehension = 0,
    TextCompletion = 1,
    SentenceEquivalence = 2,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::ReadingComprehension,
        QuestionType::TextCompletion,
        QuestionType::SentenceEquivalence,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            QuestionType::ReadingComprehension => "ReadingComprehension",
            QuestionType::TextCompletion => "TextCompletion",
            QuestionType::SentenceEquivalence => "SentenceEquivalence",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseCategoryError::QuestionType(s.to_string()))
    }
}

/// One bandit arm: a difficulty combined with a question type.
///
/// Serialized as its key, e.g. `"Medium_TextCompletion"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category {
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
}

impl Category {
    /// All categories in arm order.
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::new(Difficulty::Easy, QuestionType::ReadingComprehension),
        Category::new(Difficulty::Easy, QuestionType::TextCompletion),
        Category::new(Difficulty::Easy, QuestionType::SentenceEquivalence),
        Category::new(Difficulty::Medium, QuestionType::ReadingComprehension),
        Category::new(Difficulty::Medium, QuestionType::TextCompletion),
        Category::new(Difficulty::Medium, QuestionType::SentenceEquivalence),
        Category::new(Difficulty::Hard, QuestionType::ReadingComprehension),
        Category::new(Difficulty::Hard, QuestionType::TextCompletion),
        Category::new(Difficulty::Hard, QuestionType::SentenceEquivalence),
    ];

    #[must_use]
    pub const fn new(difficulty: Difficulty, question_type: QuestionType) -> Self {
        Self {
            difficulty,
            question_type,
        }
    }

    /// Arm index of this category, always below [`CATEGORY_COUNT`].
    #[must_use]
    pub const fn index(self) -> usize {
        self.difficulty as usize * QuestionType::ALL.len() + self.question_type as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Storage key in the `"{Difficulty}_{QuestionType}"` form.
    #[must_use]
    pub fn key(self) -> String {
        format!("{}_{}", self.difficulty, self.question_type)
    }

    #[must_use]
    pub const fn step(self) -> u32 {
        self.difficulty.step()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.difficulty, self.question_type)
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (difficulty, question_type) = s
            .split_once('_')
            .ok_or_else(|| ParseCategoryError::MalformedKey(s.to_string()))?;
        Ok(Self::new(difficulty.parse()?, question_type.parse()?))
    }
}

impl TryFrom<String> for Category {
    type Error = ParseCategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.key()
    }
}
