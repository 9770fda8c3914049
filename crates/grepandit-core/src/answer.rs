use crate::category::Category;
use crate::question::QuestionId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// What a client submits after answering a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub correct: bool,
    #[serde(default)]
    pub answers: Vec<String>,
    /// Seconds spent on the question, if the client measured it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

/// One stored answer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: u64,
    pub user_token: String,
    pub question_id: QuestionId,
    pub category: Category,
    pub correct: bool,
    pub answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub answered_at: OffsetDateTime,
}
