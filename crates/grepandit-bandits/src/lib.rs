//! ε-greedy selection over the nine practice categories.
//!
//! [`EpsilonGreedy`] picks a uniformly random category with probability
//! `epsilon` and otherwise the category with the highest reward, lowest arm
//! index first on ties. Rewards come from a [`RewardSource`] and are computed
//! once per [`ArmPolicy::select_arms`] call; the policy itself keeps no
//! running estimates.

#![warn(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod reward;

pub use error::{BanditError, Result};
pub use reward::{AbilityRewards, RewardSource, UNSEEN_REWARD_MAX, UNSEEN_REWARD_MIN};

use grepandit_core::{Category, Decision, Rewards, CATEGORY_COUNT};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

/// Exploration rate used when nothing else is configured.
pub const DEFAULT_EPSILON: f64 = 0.2;

macro_rules! warn_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::warn!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        eprintln!($($arg)*);
    }};
}

/// A policy that maps rewards to category picks.
pub trait ArmPolicy {
    /// Picks one arm for the given rewards.
    fn decide<R: Rng + ?Sized>(&self, rewards: &Rewards, rng: &mut R) -> Decision;

    /// Computes rewards once and draws `count` independent picks from them.
    /// Picks may repeat.
    fn select_arms<S, R>(&self, source: &S, count: usize, rng: &mut R) -> Vec<Decision>
    where
        S: RewardSource + ?Sized,
        R: Rng + ?Sized,
    {
        let rewards = source.rewards(&mut *rng);
        (0..count).map(|_| self.decide(&rewards, &mut *rng)).collect()
    }

    fn snapshot(&self) -> Value;
    fn load(&mut self, snapshot: Value) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl EpsilonGreedy {
    /// Fails unless `epsilon` is a finite value in `[0, 1]`.
    pub fn new(epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || !(0.0..=1.0).contains(&epsilon) {
            return Err(BanditError::InvalidEpsilon(epsilon));
        }
        Ok(Self { epsilon })
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// Highest reward, lowest index on ties.
#[must_use]
pub fn best_arm(rewards: &Rewards) -> usize {
    let mut best = 0;
    for (i, reward) in rewards.iter().enumerate().skip(1) {
        if *reward > rewards[best] {
            best = i;
        }
    }
    best
}

impl ArmPolicy for EpsilonGreedy {
    fn decide<R: Rng + ?Sized>(&self, rewards: &Rewards, rng: &mut R) -> Decision {
        let explore = self.epsilon > 0.0 && rng.gen::<f64>() < self.epsilon;
        let index = if explore {
            rng.gen_range(0..CATEGORY_COUNT)
        } else {
            best_arm(rewards)
        };
        Decision {
            category: Category::ALL[index],
            reward: rewards[index],
            why: if explore { "explore ε" } else { "exploit max reward" }.into(),
        }
    }

    /// Persists `epsilon` as JSON.
    fn snapshot(&self) -> Value {
        json!({ "epsilon": self.epsilon })
    }

    /// Restores `epsilon`, clamped to `[0, 1]`; non-finite values reset it to
    /// the default.
    fn load(&mut self, snapshot: Value) -> Result<()> {
        #[derive(Deserialize)]
        struct Snapshot {
            epsilon: f64,
        }

        let Snapshot { epsilon } = serde_json::from_value(snapshot)?;
        self.epsilon = if epsilon.is_finite() {
            let clamped = epsilon.clamp(0.0, 1.0);
            if (clamped - epsilon).abs() > f64::EPSILON {
                warn_event!("epsilon {} out of range, clamped to {}", epsilon, clamped);
            }
            clamped
        } else {
            warn_event!("non-finite epsilon in snapshot, using {}", DEFAULT_EPSILON);
            DEFAULT_EPSILON
        };
        Ok(())
    }
}
