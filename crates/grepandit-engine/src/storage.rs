//! The storage seam and an in-memory reference backend.

use crate::error::StorageError;
use grepandit_core::{
    AnswerRecord, AnswerSubmission, Category, Meaning, NewQuestion, Question, QuestionId,
    UserProfile, VocabularyTagSet, VocabularyWord, WordId,
};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use time::OffsetDateTime;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// What the engine needs from persistence.
///
/// Implementations must make [`Storage::save_question`] atomic: the question,
/// its word map and its vocabulary associations are stored together or not
/// at all.
pub trait Storage: Send + Sync {
    fn load_user(&self, token: &str) -> StorageResult<Option<UserProfile>>;
    fn save_user(&self, user: &UserProfile) -> StorageResult<()>;

    /// One question of `category` whose id is not in `exclude`. Repeated
    /// calls should not always return the same match.
    fn load_question_by_category(
        &self,
        category: Category,
        exclude: &HashSet<QuestionId>,
    ) -> StorageResult<Option<Question>>;
    fn load_question(&self, id: QuestionId) -> StorageResult<Option<Question>>;
    fn load_questions(&self, ids: &[QuestionId]) -> StorageResult<Vec<Question>>;
    fn save_question(&self, question: NewQuestion, tags: &VocabularyTagSet)
        -> StorageResult<QuestionId>;

    fn record_answer(
        &self,
        user_token: &str,
        question: &Question,
        submission: &AnswerSubmission,
    ) -> StorageResult<AnswerRecord>;
    /// Stores a graded answer by `user` together with `user`'s updated
    /// profile. Either both are written or neither is.
    fn record_graded_answer(
        &self,
        user: &UserProfile,
        question: &Question,
        submission: &AnswerSubmission,
    ) -> StorageResult<AnswerRecord>;
    fn answers_for_user(&self, user_token: &str) -> StorageResult<Vec<AnswerRecord>>;

    /// Vocabulary entries by base form; unknown forms are left out.
    fn find_words(&self, words: &[String]) -> StorageResult<Vec<VocabularyWord>>;
    fn vocabulary_for_questions(
        &self,
        ids: &[QuestionId],
    ) -> StorageResult<HashMap<QuestionId, Vec<VocabularyWord>>>;
    fn question_ids_for_words(&self, word_ids: &[WordId]) -> StorageResult<Vec<QuestionId>>;
}

/// Serializable content of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: BTreeMap<String, UserProfile>,
    #[serde(default)]
    pub words: BTreeMap<WordId, VocabularyWord>,
    #[serde(default)]
    pub questions: BTreeMap<QuestionId, Question>,
    #[serde(default)]
    pub question_words: BTreeMap<QuestionId, BTreeSet<WordId>>,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    next_id: u64,
}

impl StoreSnapshot {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn answer_record(
        &mut self,
        user_token: &str,
        question: &Question,
        submission: &AnswerSubmission,
    ) -> AnswerRecord {
        AnswerRecord {
            id: self.allocate_id(),
            user_token: user_token.to_string(),
            question_id: question.id,
            category: question.category(),
            correct: submission.correct,
            answers: submission.answers.clone(),
            duration_secs: submission.duration_secs,
            answered_at: OffsetDateTime::now_utc(),
        }
    }

    fn word_id(&self, base: &str) -> Option<WordId> {
        self.words
            .values()
            .find(|w| w.word == base)
            .map(|w| w.id)
    }
}

/// Thread-safe in-memory store. Question picks within a category are random.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
    rng: Mutex<StdRng>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Makes question picks reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    /// Adds a vocabulary entry, or returns the existing one for `word`.
    pub fn insert_word(&self, word: &str, meanings: Vec<Meaning>) -> VocabularyWord {
        let mut state = self.state.write();
        if let Some(id) = state.word_id(word) {
            if let Some(existing) = state.words.get(&id) {
                return existing.clone();
            }
        }
        let entry = VocabularyWord {
            id: state.allocate_id(),
            word: word.to_string(),
            meanings,
        };
        state.words.insert(entry.id, entry.clone());
        entry
    }

    pub fn words(&self) -> Vec<VocabularyWord> {
        self.state.read().words.values().cloned().collect()
    }
}

impl Storage for MemoryStore {
    fn load_user(&self, token: &str) -> StorageResult<Option<UserProfile>> {
        Ok(self.state.read().users.get(token).cloned())
    }

    fn save_user(&self, user: &UserProfile) -> StorageResult<()> {
        self.state
            .write()
            .users
            .insert(user.token.clone(), user.clone());
        Ok(())
    }

    fn load_question_by_category(
        &self,
        category: Category,
        exclude: &HashSet<QuestionId>,
    ) -> StorageResult<Option<Question>> {
        let state = self.state.read();
        let candidates: Vec<&Question> = state
            .questions
            .values()
            .filter(|q| q.category() == category && !exclude.contains(&q.id))
            .collect();
        let picked = candidates.choose(&mut *self.rng.lock()).copied();
        Ok(picked.cloned())
    }

    fn load_question(&self, id: QuestionId) -> StorageResult<Option<Question>> {
        Ok(self.state.read().questions.get(&id).cloned())
    }

    fn load_questions(&self, ids: &[QuestionId]) -> StorageResult<Vec<Question>> {
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.questions.get(id).cloned())
            .collect())
    }

    fn save_question(
        &self,
        question: NewQuestion,
        tags: &VocabularyTagSet,
    ) -> StorageResult<QuestionId> {
        let mut state = self.state.write();
        // Resolve every association before touching anything.
        let word_ids = tags
            .words
            .iter()
            .map(|w| {
                state
                    .word_id(w)
                    .ok_or_else(|| StorageError::UnknownWord(w.clone()))
            })
            .collect::<StorageResult<BTreeSet<WordId>>>()?;

        let id = state.allocate_id();
        state
            .questions
            .insert(id, Question::from_new(id, question, tags));
        state.question_words.insert(id, word_ids);
        Ok(id)
    }

    fn record_answer(
        &self,
        user_token: &str,
        question: &Question,
        submission: &AnswerSubmission,
    ) -> StorageResult<AnswerRecord> {
        let mut state = self.state.write();
        let record = state.answer_record(user_token, question, submission);
        state.answers.push(record.clone());
        Ok(record)
    }

    fn record_graded_answer(
        &self,
        user: &UserProfile,
        question: &Question,
        submission: &AnswerSubmission,
    ) -> StorageResult<AnswerRecord> {
        let mut state = self.state.write();
        if !state.questions.contains_key(&question.id) {
            return Err(StorageError::UnknownQuestion(question.id));
        }
        let record = state.answer_record(&user.token, question, submission);
        state.answers.push(record.clone());
        state.users.insert(user.token.clone(), user.clone());
        Ok(record)
    }

    fn answers_for_user(&self, user_token: &str) -> StorageResult<Vec<AnswerRecord>> {
        Ok(self
            .state
            .read()
            .answers
            .iter()
            .filter(|a| a.user_token == user_token)
            .cloned()
            .collect())
    }

    fn find_words(&self, words: &[String]) -> StorageResult<Vec<VocabularyWord>> {
        let state = self.state.read();
        Ok(words
            .iter()
            .filter_map(|w| state.word_id(w).and_then(|id| state.words.get(&id)).cloned())
            .collect())
    }

    fn vocabulary_for_questions(
        &self,
        ids: &[QuestionId],
    ) -> StorageResult<HashMap<QuestionId, Vec<VocabularyWord>>> {
        let state = self.state.read();
        let mut vocabulary = HashMap::new();
        for id in ids {
            if let Some(word_ids) = state.question_words.get(id) {
                let words = word_ids
                    .iter()
                    .filter_map(|w| state.words.get(w).cloned())
                    .collect();
                vocabulary.insert(*id, words);
            }
        }
        Ok(vocabulary)
    }

    fn question_ids_for_words(&self, word_ids: &[WordId]) -> StorageResult<Vec<QuestionId>> {
        let state = self.state.read();
        Ok(state
            .question_words
            .iter()
            .filter(|(_, words)| word_ids.iter().any(|w| words.contains(w)))
            .map(|(id, _)| *id)
            .collect())
    }
}
