//! Per-user skill estimates.
//!
//! In memory the profile is a fixed array indexed by [`Category::index`]. On
//! the wire it keeps the historical shape: two objects keyed by category key,
//! `verbal_ability` (score) and `verbal_ability_count` (attempts).

use crate::category::{Category, ParseCategoryError, CATEGORY_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_ABILITY: u32 = 0;
pub const MAX_ABILITY: u32 = 4500;

/// Score and attempt count for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryAbility {
    pub score: u32,
    pub attempts: u32,
}

/// Skill estimate per category; `None` means the category was never recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AbilityRepr", into = "AbilityRepr")]
pub struct AbilityProfile {
    entries: [Option<CategoryAbility>; CATEGORY_COUNT],
}

impl AbilityProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, category: Category) -> Option<CategoryAbility> {
        self.entries[category.index()]
    }

    /// Current score, with a zero baseline for unrecorded categories.
    #[must_use]
    pub fn score(&self, category: Category) -> u32 {
        self.get(category).map_or(MIN_ABILITY, |a| a.score)
    }

    /// Stores `ability`, clamping the score into `[MIN_ABILITY, MAX_ABILITY]`.
    pub fn set(&mut self, category: Category, ability: CategoryAbility) {
        self.entries[category.index()] = Some(CategoryAbility {
            score: ability.score.clamp(MIN_ABILITY, MAX_ABILITY),
            attempts: ability.attempts,
        });
    }

    /// Iterates all categories in arm order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<CategoryAbility>)> + '_ {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.entries[category.index()]))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AbilityRepr {
    #[serde(default)]
    verbal_ability: BTreeMap<String, u32>,
    #[serde(default)]
    verbal_ability_count: BTreeMap<String, u32>,
}

impl TryFrom<AbilityRepr> for AbilityProfile {
    type Error = ParseCategoryError;

    fn try_from(repr: AbilityRepr) -> Result<Self, Self::Error> {
        let mut profile = AbilityProfile::new();
        for (key, score) in &repr.verbal_ability {
            let category: Category = key.parse()?;
            let attempts = repr.verbal_ability_count.get(key).copied().unwrap_or(0);
            profile.set(category, CategoryAbility { score: *score, attempts });
        }
        // Counts without a score carry no information; still reject bad keys.
        for key in repr.verbal_ability_count.keys() {
            key.parse::<Category>()?;
        }
        Ok(profile)
    }
}

impl From<AbilityProfile> for AbilityRepr {
    fn from(profile: AbilityProfile) -> Self {
        let mut repr = AbilityRepr::default();
        for (category, ability) in profile.iter() {
            if let Some(ability) = ability {
                repr.verbal_ability.insert(category.key(), ability.score);
                repr.verbal_ability_count
                    .insert(category.key(), ability.attempts);
            }
        }
        repr
    }
}

/// A user as the engine sees it: identity plus ability profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub ability: AbilityProfile,
}

impl UserProfile {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: None,
            ability: AbilityProfile::new(),
        }
    }
}
