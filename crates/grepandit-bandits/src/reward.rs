//! Turns an ability profile into one reward per arm.
//!
//! Rewards are inverted ability: the weaker the user is in a category, the
//! higher its reward, so exploitation steers practice toward weak spots.

use grepandit_core::{AbilityProfile, Category, CategoryAbility, Rewards, CATEGORY_COUNT};
use rand::Rng;

/// Lower bound of the randomized reward for categories without attempts.
pub const UNSEEN_REWARD_MIN: f64 = 0.5;
/// Upper bound of the randomized reward for categories without attempts.
pub const UNSEEN_REWARD_MAX: f64 = 1.0;

/// Anything that can produce a fresh reward vector for the nine arms.
pub trait RewardSource {
    fn rewards<R: Rng + ?Sized>(&self, rng: &mut R) -> Rewards;
}

/// Reward source backed by a user's ability profile.
#[derive(Debug, Clone, Copy)]
pub struct AbilityRewards<'a> {
    profile: &'a AbilityProfile,
}

impl<'a> AbilityRewards<'a> {
    #[must_use]
    pub fn new(profile: &'a AbilityProfile) -> Self {
        Self { profile }
    }
}

impl RewardSource for AbilityRewards<'_> {
    fn rewards<R: Rng + ?Sized>(&self, rng: &mut R) -> Rewards {
        let mut rewards = [0.0; CATEGORY_COUNT];
        for (category, ability) in self.profile.iter() {
            rewards[category.index()] = ability
                .and_then(|a| attempted_reward(category, a))
                .unwrap_or_else(|| rng.gen_range(UNSEEN_REWARD_MIN..UNSEEN_REWARD_MAX));
        }
        rewards
    }
}

/// `1 - s/n`, with the mean gain per attempt measured in units of the
/// category's step so the result stays in `[0, 1]`.
///
/// Returns `None` when there are no attempts; callers treat that category as
/// unseen.
#[must_use]
pub fn attempted_reward(category: Category, ability: CategoryAbility) -> Option<f64> {
    if ability.attempts == 0 {
        return None;
    }
    let mean_gain = f64::from(ability.score) / f64::from(ability.attempts);
    let ratio = (mean_gain / f64::from(category.step())).clamp(0.0, 1.0);
    Some(1.0 - ratio)
}
