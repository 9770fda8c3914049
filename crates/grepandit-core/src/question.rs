//! Questions, vocabulary entries and the vocabulary tags that link them.

use crate::category::{Category, Difficulty, ParseCategoryError, QuestionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type QuestionId = u64;
pub type WordId = u64;

/// The reasoning skill a question targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Competence {
    #[serde(rename = "Analyzing and drawing conclusions")]
    AnalyzingAndDrawingConclusions,
    #[serde(rename = "Reasoning from incomplete data")]
    ReasoningFromIncompleteData,
    #[serde(rename = "Identifying authors assumptions/perspective")]
    IdentifyingAuthorsAssumptionsPerspective,
    #[serde(rename = "Understanding multiple levels of meaning")]
    UnderstandingMultipleLevelsOfMeaning,
    #[serde(rename = "Selecting important info")]
    SelectingImportantInfo,
    #[serde(rename = "Distinguish major/minor points")]
    DistinguishMajorMinorPoints,
}

impl Competence {
    pub const ALL: [Competence; 6] = [
        Competence::AnalyzingAndDrawingConclusions,
        Competence::ReasoningFromIncompleteData,
        Competence::IdentifyingAuthorsAssumptionsPerspective,
        Competence::UnderstandingMultipleLevelsOfMeaning,
        Competence::SelectingImportantInfo,
        Competence::DistinguishMajorMinorPoints,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Competence::AnalyzingAndDrawingConclusions => "Analyzing and drawing conclusions",
            Competence::ReasoningFromIncompleteData => "Reasoning from incomplete data",
            Competence::IdentifyingAuthorsAssumptionsPerspective => {
                "Identifying authors assumptions/perspective"
            }
            Competence::UnderstandingMultipleLevelsOfMeaning => {
                "Understanding multiple levels of meaning"
            }
            Competence::SelectingImportantInfo => "Selecting important info",
            Competence::DistinguishMajorMinorPoints => "Distinguish major/minor points",
        }
    }
}

impl fmt::Display for Competence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Competence {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Competence::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError::Competence(s.to_string()))
    }
}

/// How the answer choices are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FramedAs {
    MCQSingleAnswer,
    MCQMultipleChoices,
    SelectSentence,
}

impl FromStr for FramedAs {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MCQSingleAnswer" => Ok(FramedAs::MCQSingleAnswer),
            "MCQMultipleChoices" => Ok(FramedAs::MCQMultipleChoices),
            "SelectSentence" => Ok(FramedAs::SelectSentence),
            other => Err(ParseCategoryError::FramedAs(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meaning {
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default, rename = "type")]
    pub part_of_speech: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// A dictionary entry. `word` is the base form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyWord {
    pub id: WordId,
    pub word: String,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

/// Vocabulary detected in a question's text.
///
/// `words` holds the vocabulary entries (as submitted) whose base form occurs
/// in the paragraph or an option; `word_map` maps every matching surface token
/// to its base form. Both are ordered so equal inputs give equal tag sets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VocabularyTagSet {
    pub words: Vec<String>,
    pub word_map: BTreeMap<String, String>,
}

impl VocabularyTagSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// A question as submitted for creation, before it has an id or tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub competence: Competence,
    pub framed_as: FramedAs,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub paragraph: String,
    pub question: String,
    pub options: Vec<QuestionOption>,
    /// Candidate vocabulary words, by base form.
    pub vocabulary: Vec<String>,
}

impl NewQuestion {
    #[must_use]
    pub fn category(&self) -> Category {
        Category::new(self.difficulty, self.question_type)
    }
}

/// A stored question. `vocabulary` is filled in when the question is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub competence: Competence,
    pub framed_as: FramedAs,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub paragraph: String,
    pub question: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub word_map: BTreeMap<String, String>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyWord>,
}

impl Question {
    /// Builds the stored form of `new`, keeping only the word map of `tags`.
    #[must_use]
    pub fn from_new(id: QuestionId, new: NewQuestion, tags: &VocabularyTagSet) -> Self {
        Self {
            id,
            competence: new.competence,
            framed_as: new.framed_as,
            question_type: new.question_type,
            difficulty: new.difficulty,
            paragraph: new.paragraph,
            question: new.question,
            options: new.options,
            word_map: tags.word_map.clone(),
            vocabulary: Vec::new(),
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        Category::new(self.difficulty, self.question_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_question_from_json_fixture() {
        let request = json!({
            "competence": "Selecting important info",
            "framed_as": "MCQSingleAnswer",
            "type": "TextCompletion",
            "difficulty": "Medium",
            "paragraph": "The abacus was ancient.",
            "question": "Pick the best word.",
            "options": [
                {"value": "archaic", "correct": true, "justification": "old"},
                {"value": "modern"}
            ],
            "vocabulary": ["abacus", "ancient"]
        });

        let new: NewQuestion = serde_json::from_value(request).expect("deserialize");
        assert_eq!(new.competence, Competence::SelectingImportantInfo);
        assert_eq!(
            new.category(),
            Category::new(Difficulty::Medium, QuestionType::TextCompletion)
        );
        assert!(!new.options[1].correct);
        assert_eq!(new.vocabulary.len(), 2);
    }

    #[test]
    fn competence_names_parse() {
        for competence in Competence::ALL {
            assert_eq!(competence.as_str().parse::<Competence>(), Ok(competence));
        }
        assert!("Guessing".parse::<Competence>().is_err());
        assert_eq!("SelectSentence".parse::<FramedAs>(), Ok(FramedAs::SelectSentence));
    }
}
