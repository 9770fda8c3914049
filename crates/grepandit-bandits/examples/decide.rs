//! Reads an ability profile (JSON) from stdin and prints five category picks.
//!
//! `echo '{"verbal_ability":{"Easy_TextCompletion":300},"verbal_ability_count":{"Easy_TextCompletion":3}}' \
//!   | cargo run -p grepandit-bandits --example decide`

use std::io::{self, Read};

use grepandit_bandits::{AbilityRewards, ArmPolicy, EpsilonGreedy};
use grepandit_core::AbilityProfile;
use rand::thread_rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let profile = if input.trim().is_empty() {
        AbilityProfile::new()
    } else {
        serde_json::from_str::<AbilityProfile>(&input)?
    };

    let policy = EpsilonGreedy::default();
    let decisions = policy.select_arms(&AbilityRewards::new(&profile), 5, &mut thread_rng());

    serde_json::to_writer_pretty(io::stdout(), &decisions)?;
    println!();

    Ok(())
}
