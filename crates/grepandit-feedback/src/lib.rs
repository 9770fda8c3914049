#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Answer feedback: the ability update rule and answer-history statistics.
//!
//! Every graded answer moves the score of exactly one category by the step of
//! its difficulty, up on a correct answer and down on an incorrect one, and
//! saturates at [`MIN_ABILITY`] and [`MAX_ABILITY`]. History statistics are
//! read-only summaries over stored [`AnswerRecord`]s.

use grepandit_core::{
    AbilityProfile, AnswerRecord, Category, CategoryAbility, Difficulty, QuestionId, MAX_ABILITY,
    MIN_ABILITY,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Minimum answers in a category before it can be reported as the weakest.
const WEAKEST_MIN_ANSWERS: usize = 3;

/// Fallback timestamp when formatting fails
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Score after one graded answer at `difficulty`.
#[must_use]
pub fn updated_score(score: u32, difficulty: Difficulty, correct: bool) -> u32 {
    let step = difficulty.step();
    if correct {
        score.saturating_add(step).min(MAX_ABILITY)
    } else {
        score.saturating_sub(step).max(MIN_ABILITY)
    }
}

/// Applies one graded answer to `profile` and returns the category's new
/// ability. Unrecorded categories start from a zero baseline.
pub fn apply_outcome(
    profile: &mut AbilityProfile,
    category: Category,
    correct: bool,
) -> CategoryAbility {
    let current = profile.get(category).unwrap_or_default();
    let updated = CategoryAbility {
        score: updated_score(current.score, category.difficulty, correct),
        attempts: current.attempts.saturating_add(1),
    };
    profile.set(category, updated);
    updated
}

/// Statistics aggregated from answer records.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CategoryStatistics {
    /// Total number of answers (correct + incorrect).
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Sum of reported durations, over `timed` answers.
    pub total_duration_secs: u64,
    pub timed: usize,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_answered_at: Option<OffsetDateTime>,
}

impl CategoryStatistics {
    fn record(&mut self, answer: &AnswerRecord) {
        self.total += 1;
        if answer.correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        if let Some(secs) = answer.duration_secs {
            self.total_duration_secs += u64::from(secs);
            self.timed += 1;
        }
        if self
            .last_answered_at
            .map_or(true, |last| answer.answered_at > last)
        {
            self.last_answered_at = Some(answer.answered_at);
        }
    }

    /// Calculate success rate (0.0 to 1.0).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.correct as f64 / self.total as f64
        }
    }

    /// Calculate failure rate (0.0 to 1.0).
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        debug_assert!(
            self.correct + self.incorrect == self.total,
            "CategoryStatistics totals are inconsistent"
        );
        if self.total == 0 {
            return 0.0;
        }
        1.0 - self.success_rate()
    }

    /// Mean duration of the answers that reported one.
    #[must_use]
    pub fn average_duration_secs(&self) -> Option<f64> {
        if self.timed == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.total_duration_secs as f64 / self.timed as f64)
    }
}

#[must_use]
pub fn summarize(records: &[AnswerRecord]) -> CategoryStatistics {
    let mut stats = CategoryStatistics::default();
    for record in records {
        stats.record(record);
    }
    stats
}

/// Aggregate answers per category. Categories without answers are absent.
#[must_use]
pub fn aggregate_by_category(records: &[AnswerRecord]) -> BTreeMap<Category, CategoryStatistics> {
    let mut stats: BTreeMap<Category, CategoryStatistics> = BTreeMap::new();
    for record in records {
        stats.entry(record.category).or_default().record(record);
    }
    stats
}

/// Ids of the questions answered incorrectly at least once.
#[must_use]
pub fn incorrect_question_ids(records: &[AnswerRecord]) -> BTreeSet<QuestionId> {
    records
        .iter()
        .filter(|r| !r.correct)
        .map(|r| r.question_id)
        .collect()
}

/// Per-user answer summary.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub user_token: String,
    pub generated_at: String,
    pub overall: CategoryStatistics,
    pub by_category: BTreeMap<Category, CategoryStatistics>,
    /// Category with the lowest success rate among those with enough answers.
    pub weakest: Option<Category>,
}

impl PerformanceReport {
    #[must_use]
    pub fn build(user_token: &str, records: &[AnswerRecord]) -> Self {
        let by_category = aggregate_by_category(records);
        let weakest = by_category
            .iter()
            .filter(|(_, stats)| stats.total >= WEAKEST_MIN_ANSWERS)
            .min_by(|(_, a), (_, b)| a.success_rate().total_cmp(&b.success_rate()))
            .map(|(category, _)| *category);

        Self {
            user_token: user_token.to_string(),
            generated_at: iso8601_now(),
            overall: summarize(records),
            by_category,
            weakest,
        }
    }
}

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grepandit_core::QuestionType;
    use time::Duration;

    fn answer(id: u64, category: Category, correct: bool, duration: Option<u32>) -> AnswerRecord {
        AnswerRecord {
            id,
            user_token: "u-1".to_string(),
            question_id: 100 + id,
            category,
            correct,
            answers: vec!["A".to_string()],
            duration_secs: duration,
            answered_at: OffsetDateTime::UNIX_EPOCH + Duration::minutes(i64::try_from(id).unwrap()),
        }
    }

    #[test]
    fn steps_follow_difficulty() {
        assert_eq!(updated_score(1000, Difficulty::Easy, true), 1100);
        assert_eq!(updated_score(1000, Difficulty::Medium, true), 1150);
        assert_eq!(updated_score(1000, Difficulty::Hard, true), 1200);
        assert_eq!(updated_score(1000, Difficulty::Easy, false), 900);
        assert_eq!(updated_score(1000, Difficulty::Medium, false), 850);
        assert_eq!(updated_score(1000, Difficulty::Hard, false), 800);
    }

    #[test]
    fn scores_saturate_at_bounds() {
        assert_eq!(updated_score(4400, Difficulty::Easy, true), MAX_ABILITY);
        assert_eq!(updated_score(4450, Difficulty::Hard, true), MAX_ABILITY);
        assert_eq!(updated_score(50, Difficulty::Medium, false), MIN_ABILITY);
        assert_eq!(updated_score(0, Difficulty::Hard, false), MIN_ABILITY);
    }

    #[test]
    fn apply_outcome_starts_from_zero_baseline() {
        let mut profile = AbilityProfile::new();
        let category = Category::new(Difficulty::Hard, QuestionType::ReadingComprehension);

        let after_miss = apply_outcome(&mut profile, category, false);
        assert_eq!(after_miss, CategoryAbility { score: 0, attempts: 1 });

        let after_hit = apply_outcome(&mut profile, category, true);
        assert_eq!(after_hit, CategoryAbility { score: 200, attempts: 2 });
        assert_eq!(profile.get(category), Some(after_hit));

        // Only the answered category moves.
        assert_eq!(profile.iter().filter(|(_, a)| a.is_some()).count(), 1);
    }

    #[test]
    fn clamps_on_streak_near_maximum() {
        let mut profile = AbilityProfile::new();
        let easy_rc = Category::ALL[0];
        profile.set(easy_rc, CategoryAbility { score: 4400, attempts: 44 });

        let updated = apply_outcome(&mut profile, easy_rc, true);
        assert_eq!(updated.score, 4500);
        assert_eq!(updated.attempts, 45);
    }

    #[test]
    fn statistics_calculate_rates_correctly() {
        let category = Category::ALL[1];
        let records = vec![
            answer(1, category, true, Some(30)),
            answer(2, category, false, None),
            answer(3, category, true, Some(50)),
            answer(4, category, true, None),
        ];
        let stats = summarize(&records);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.correct, 3);
        assert!((stats.success_rate() - 0.75).abs() < 1e-12);
        assert!((stats.failure_rate() - 0.25).abs() < 1e-12);
        assert_eq!(stats.average_duration_secs(), Some(40.0));
        assert_eq!(stats.last_answered_at, Some(records[3].answered_at));
    }

    #[test]
    fn statistics_handle_empty_set() {
        let stats = CategoryStatistics::default();
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.failure_rate(), 0.0);
        assert_eq!(stats.average_duration_secs(), None);
    }

    #[test]
    fn aggregates_by_category_and_finds_weakest() {
        let strong = Category::ALL[0];
        let weak = Category::ALL[7];
        let thin = Category::ALL[8];
        let mut records = Vec::new();
        for i in 0..4 {
            records.push(answer(i, strong, true, None));
            records.push(answer(10 + i, weak, i == 0, None));
        }
        records.push(answer(20, thin, false, None));

        let by_category = aggregate_by_category(&records);
        assert_eq!(by_category.len(), 3);
        assert_eq!(by_category[&weak].incorrect, 3);

        let report = PerformanceReport::build("u-1", &records);
        // `thin` is worse but has too few answers to count.
        assert_eq!(report.weakest, Some(weak));
        assert_eq!(report.overall.total, 9);

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["by_category"]["Hard_TextCompletion"]["total"], 4);
    }

    #[test]
    fn collects_incorrectly_answered_questions() {
        let category = Category::ALL[3];
        let records = vec![
            answer(1, category, false, None),
            answer(2, category, true, None),
            answer(3, category, false, None),
        ];
        let ids: Vec<_> = incorrect_question_ids(&records).into_iter().collect();
        assert_eq!(ids, vec![101, 103]);
    }
}
