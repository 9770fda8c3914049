use crate::error::{EngineError, Result};
use crate::fetcher::QuestionFetcher;
use crate::storage::Storage;
use crate::EngineConfig;
use grepandit_bandits::{AbilityRewards, ArmPolicy, EpsilonGreedy};
use grepandit_core::{
    AbilityProfile, AnswerRecord, AnswerSubmission, Category, CategoryAbility, Decision,
    NewQuestion, Question, QuestionId, UserProfile, VocabularyWord, WordId,
};
use grepandit_feedback::PerformanceReport;
use grepandit_vocab::VocabularyTagger;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Result of one adaptive request.
#[derive(Debug, Clone, Serialize)]
pub struct AdaptiveBatch {
    /// Resolved questions, in pick order, with vocabulary attached.
    pub questions: Vec<Question>,
    /// Every category pick, resolved or not.
    pub decisions: Vec<Decision>,
    /// Picks that found no unseen question.
    pub unresolved: Vec<Category>,
}

impl AdaptiveBatch {
    /// No pick resolved. This is an outcome, not a failure.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// What a graded answer produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub record: AnswerRecord,
    pub category: Category,
    pub ability: CategoryAbility,
}

pub struct AdaptiveEngine<S> {
    store: S,
    config: EngineConfig,
    policy: EpsilonGreedy,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Storage> AdaptiveEngine<S> {
    /// Fails with [`EngineError::Validation`] when the configured epsilon is
    /// outside `[0, 1]`.
    pub fn new(store: S, config: EngineConfig) -> Result<Self> {
        let policy = EpsilonGreedy::new(config.epsilon)
            .map_err(|err| EngineError::Validation(err.to_string()))?;
        Ok(Self {
            store,
            config,
            policy,
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &EpsilonGreedy {
        &self.policy
    }

    /// Runs `f` while holding `token`'s lock. The lock entry is dropped again
    /// once no other caller holds or waits for it.
    fn with_user_lock<T>(&self, token: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self
            .user_locks
            .lock()
            .entry(token.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock();
            f()
        };

        let mut locks = self.user_locks.lock();
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(token);
        }
        result
    }

    fn load_or_default(&self, token: &str) -> Result<UserProfile> {
        Ok(self
            .store
            .load_user(token)?
            .unwrap_or_else(|| UserProfile::new(token)))
    }

    /// Registers `token`, or returns the existing profile unchanged.
    pub fn register_user(&self, token: &str, email: Option<String>) -> Result<UserProfile> {
        if token.trim().is_empty() {
            return Err(EngineError::Validation("user token is empty".into()));
        }
        self.with_user_lock(token, || {
            if let Some(existing) = self.store.load_user(token)? {
                return Ok(existing);
            }
            let user = UserProfile {
                email,
                ..UserProfile::new(token)
            };
            self.store.save_user(&user)?;
            Ok(user)
        })
    }

    /// The user's ability profile; empty for unknown users.
    pub fn ability(&self, token: &str) -> Result<AbilityProfile> {
        Ok(self.load_or_default(token)?.ability)
    }

    /// Picks `count` categories for `token` and resolves each to a question
    /// not in `exclude` and not already in the batch.
    ///
    /// Picks without a matching question are skipped, so the batch may be
    /// shorter than `count` or empty.
    pub fn adaptive_questions<R: Rng + ?Sized>(
        &self,
        token: &str,
        count: usize,
        exclude: &[QuestionId],
        rng: &mut R,
    ) -> Result<AdaptiveBatch> {
        if count == 0 || count > self.config.max_batch {
            return Err(EngineError::Validation(format!(
                "batch size {count} outside 1..={}",
                self.config.max_batch
            )));
        }

        let profile = self.ability(token)?;
        let decisions = self
            .policy
            .select_arms(&AbilityRewards::new(&profile), count, rng);

        let fetcher = QuestionFetcher::new(&self.store);
        let mut seen: HashSet<QuestionId> = exclude.iter().copied().collect();
        let mut questions = Vec::with_capacity(count);
        let mut unresolved = Vec::new();
        for decision in &decisions {
            match fetcher.fetch_by_category(decision.category, &seen) {
                Ok(question) => {
                    debug_event!(
                        "user {} got question {} ({}, {})",
                        token,
                        question.id,
                        decision.category,
                        decision.why
                    );
                    seen.insert(question.id);
                    questions.push(question);
                }
                Err(EngineError::NotFound(reason)) => {
                    debug_event!("skipping pick: {}", reason);
                    unresolved.push(decision.category);
                }
                Err(err) => return Err(err),
            }
        }

        self.attach_vocabulary(&mut questions)?;
        Ok(AdaptiveBatch {
            questions,
            decisions,
            unresolved,
        })
    }

    fn attach_vocabulary(&self, questions: &mut [Question]) -> Result<()> {
        let ids: Vec<QuestionId> = questions.iter().map(|q| q.id).collect();
        let mut vocabulary = self.store.vocabulary_for_questions(&ids)?;
        for question in questions {
            question.vocabulary = vocabulary.remove(&question.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Applies one graded answer in `category` to the user's profile and
    /// persists it. Unknown users start from an empty profile.
    pub fn apply_outcome(
        &self,
        token: &str,
        category: Category,
        correct: bool,
    ) -> Result<AbilityProfile> {
        self.with_user_lock(token, || {
            let mut user = self.load_or_default(token)?;
            grepandit_feedback::apply_outcome(&mut user.ability, category, correct);
            self.store.save_user(&user)?;
            Ok(user.ability)
        })
    }

    /// Stores the answer and applies exactly one ability update for the
    /// question's category. Both are persisted in one storage call under the
    /// user's lock, so a failure leaves neither behind.
    pub fn submit_answer(
        &self,
        token: &str,
        submission: &AnswerSubmission,
    ) -> Result<AnswerOutcome> {
        let question = self
            .store
            .load_question(submission.question_id)?
            .ok_or_else(|| {
                EngineError::NotFound(format!("question {}", submission.question_id))
            })?;
        let category = question.category();

        self.with_user_lock(token, || {
            let mut user = self.load_or_default(token)?;
            let ability =
                grepandit_feedback::apply_outcome(&mut user.ability, category, submission.correct);
            let record = self
                .store
                .record_graded_answer(&user, &question, submission)?;
            debug_event!(
                "user {} answered {} in {}: score {} after {} attempts",
                token,
                question.id,
                category,
                ability.score,
                ability.attempts
            );

            Ok(AnswerOutcome {
                record,
                category,
                ability,
            })
        })
    }

    /// Validates, tags and stores a new question in one step.
    ///
    /// Every candidate word must already be stored. Lexicon loading happens
    /// before the save, so a lemmatizer failure leaves the store untouched.
    pub fn create_question(&self, new: NewQuestion) -> Result<Question> {
        if new.question.trim().is_empty() {
            return Err(EngineError::Validation("question text is empty".into()));
        }
        if new.options.is_empty() {
            return Err(EngineError::Validation("question has no options".into()));
        }
        if new.vocabulary.is_empty() {
            return Err(EngineError::Validation("vocabulary list is empty".into()));
        }

        let known = self.store.find_words(&new.vocabulary)?;
        let known_forms: HashSet<&str> = known.iter().map(|w| w.word.as_str()).collect();
        let unknown: Vec<&str> = new
            .vocabulary
            .iter()
            .map(String::as_str)
            .filter(|w| !known_forms.contains(w))
            .collect();
        if !unknown.is_empty() {
            return Err(EngineError::Validation(format!(
                "unknown vocabulary words: {}",
                unknown.join(", ")
            )));
        }

        let lemmatizer = self.config.lexicon.load()?.with_bases(&new.vocabulary);
        let tags = VocabularyTagger::new(lemmatizer).tag_question(&new);
        if tags.is_empty() {
            warn_event!("question '{}' exercises none of its vocabulary", new.question);
        }

        let id = self.store.save_question(new.clone(), &tags)?;
        let mut question = Question::from_new(id, new, &tags);
        question.vocabulary = known
            .into_iter()
            .filter(|w| tags.words.contains(&w.word))
            .collect();
        debug_event!("created question {} tagged {:?}", id, tags.words);
        Ok(question)
    }

    /// Up to `vocab_practice_limit` random questions tagged with any of
    /// `word_ids`, none of them in `exclude`.
    pub fn questions_on_vocabulary<R: Rng + ?Sized>(
        &self,
        word_ids: &[WordId],
        exclude: &[QuestionId],
        rng: &mut R,
    ) -> Result<Vec<Question>> {
        if word_ids.is_empty() {
            return Err(EngineError::Validation("no word ids given".into()));
        }
        let exclude: HashSet<QuestionId> = exclude.iter().copied().collect();
        let candidates: Vec<QuestionId> = self
            .store
            .question_ids_for_words(word_ids)?
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .collect();
        let picked: Vec<QuestionId> = candidates
            .choose_multiple(rng, self.config.vocab_practice_limit)
            .copied()
            .collect();

        let mut questions = self.store.load_questions(&picked)?;
        self.attach_vocabulary(&mut questions)?;
        Ok(questions)
    }

    /// Distinct vocabulary words tagged on questions the user got wrong.
    pub fn problematic_words(&self, token: &str) -> Result<Vec<VocabularyWord>> {
        let answers = self.store.answers_for_user(token)?;
        let missed: Vec<QuestionId> = grepandit_feedback::incorrect_question_ids(&answers)
            .into_iter()
            .collect();
        if missed.is_empty() {
            return Ok(Vec::new());
        }

        let mut words: BTreeMap<WordId, VocabularyWord> = BTreeMap::new();
        for word in self
            .store
            .vocabulary_for_questions(&missed)?
            .into_values()
            .flatten()
        {
            words.entry(word.id).or_insert(word);
        }
        Ok(words.into_values().collect())
    }

    pub fn performance_report(&self, token: &str) -> Result<PerformanceReport> {
        let answers = self.store.answers_for_user(token)?;
        Ok(PerformanceReport::build(token, &answers))
    }

    /// Ids of the questions the user answered incorrectly.
    pub fn missed_questions(&self, token: &str) -> Result<BTreeSet<QuestionId>> {
        let answers = self.store.answers_for_user(token)?;
        Ok(grepandit_feedback::incorrect_question_ids(&answers))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(epsilon: f64) -> AdaptiveEngine<MemoryStore> {
        AdaptiveEngine::new(
            MemoryStore::new().with_seed(5),
            EngineConfig {
                epsilon,
                ..EngineConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_invalid_epsilon() {
        let err = AdaptiveEngine::new(
            MemoryStore::new(),
            EngineConfig {
                epsilon: 1.2,
                ..EngineConfig::default()
            },
        )
        .err()
        .unwrap();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn rejects_batch_size_out_of_range() {
        let engine = engine(0.2);
        let mut rng = StdRng::seed_from_u64(1);
        for count in [0, 21] {
            let err = engine
                .adaptive_questions("u-1", count, &[], &mut rng)
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[test]
    fn empty_store_gives_empty_batch() {
        let engine = engine(0.2);
        let mut rng = StdRng::seed_from_u64(2);
        let batch = engine.adaptive_questions("u-1", 5, &[], &mut rng).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.decisions.len(), 5);
        assert_eq!(batch.unresolved.len(), 5);
    }

    #[test]
    fn register_user_keeps_existing_profile() {
        let engine = engine(0.2);
        engine.register_user("u-1", Some("a@b.c".into())).unwrap();
        engine
            .apply_outcome("u-1", Category::ALL[0], true)
            .unwrap();
        let again = engine.register_user("u-1", None).unwrap();
        assert_eq!(again.email.as_deref(), Some("a@b.c"));
        assert_eq!(again.ability.score(Category::ALL[0]), 100);
        assert!(engine.register_user("  ", None).is_err());
    }

    #[test]
    fn user_locks_are_released_after_use() {
        let engine = engine(0.2);
        for token in ["u-1", "u-2", "u-3"] {
            engine.register_user(token, None).unwrap();
            engine.apply_outcome(token, Category::ALL[2], false).unwrap();
        }
        assert!(engine.user_locks.lock().is_empty());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for i in 0..25 {
                        engine
                            .apply_outcome(&format!("u-{}", i % 5), Category::ALL[0], true)
                            .unwrap();
                    }
                });
            }
        });
        assert!(engine.user_locks.lock().is_empty());
        let ability = engine.ability("u-0").unwrap();
        assert_eq!(ability.get(Category::ALL[0]).unwrap().attempts, 20);
    }

    #[test]
    fn vocabulary_practice_needs_word_ids() {
        let engine = engine(0.2);
        let mut rng = StdRng::seed_from_u64(3);
        let err = engine
            .questions_on_vocabulary(&[], &[], &mut rng)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
