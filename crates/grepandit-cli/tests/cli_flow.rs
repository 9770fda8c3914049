//! End-to-end runs of the `grepandit` binary against a temporary state file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("grepandit_cli_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("failed to create {dir:?}: {e}"));
    dir
}

fn grepandit(state: &Path) -> Command {
    let mut cmd =
        Command::cargo_bin("grepandit").unwrap_or_else(|e| panic!("binary not built: {e}"));
    cmd.env_remove("GREPANDIT_EPSILON")
        .env_remove("GREPANDIT_MAX_BATCH")
        .env_remove("GREPANDIT_LEXICON")
        .env("GREPANDIT_STATE", state);
    cmd
}

fn json_output(cmd: &mut Command, args: &[&str]) -> Value {
    let output = cmd.args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap_or_else(|e| panic!("stdout is not JSON: {e}"))
}

fn write_question(dir: &Path, difficulty: &str) -> PathBuf {
    let path = dir.join(format!("question_{difficulty}.json"));
    let question = serde_json::json!({
        "competence": "Analyzing and drawing conclusions",
        "framed_as": "MCQSingleAnswer",
        "type": "ReadingComprehension",
        "difficulty": difficulty,
        "paragraph": "The abacus was ancient.",
        "question": "What does the passage say about the abacus?",
        "options": [
            {"value": "It was old.", "correct": true},
            {"value": "It was new.", "correct": false}
        ],
        "vocabulary": ["abacus", "ancient"]
    });
    fs::write(&path, question.to_string()).unwrap_or_else(|e| panic!("write question: {e}"));
    path
}

#[test]
fn full_practice_session() {
    let dir = temp_dir("session");
    let state = dir.join("state.json");

    let word = json_output(&mut grepandit(&state), &["add-word", "--word", "Abacus", "--meaning", "counting frame"]);
    assert_eq!(word["word"], "abacus");
    let abacus_id = word["id"].as_u64().unwrap_or_default();
    json_output(&mut grepandit(&state), &["add-word", "--word", "ancient"]);
    json_output(&mut grepandit(&state), &["add-user", "--token", "u-1"]);

    let file = write_question(&dir, "Easy");
    let file = file.to_str().unwrap_or_default();
    let question = json_output(&mut grepandit(&state), &["create-question", "--file", file]);
    let question_id = question["id"].as_u64().unwrap_or_default().to_string();
    assert_eq!(question["vocabulary"].as_array().map(Vec::len), Some(2));

    let batch = json_output(
        &mut grepandit(&state),
        &["adaptive", "--user", "u-1", "--count", "3", "--epsilon", "1", "--seed", "7"],
    );
    assert_eq!(batch["decisions"].as_array().map(Vec::len), Some(3));
    assert!(batch["questions"].as_array().map_or(0, Vec::len) <= 1);

    let outcome = json_output(
        &mut grepandit(&state),
        &["answer", "--user", "u-1", "--question", &question_id, "--incorrect", "--answer", "It was new."],
    );
    assert_eq!(outcome["ability"]["score"], 0);
    assert_eq!(outcome["ability"]["attempts"], 1);

    json_output(
        &mut grepandit(&state),
        &["answer", "--user", "u-1", "--question", &question_id, "--correct", "--duration", "30"],
    );
    let ability = json_output(&mut grepandit(&state), &["ability", "--user", "u-1"]);
    assert_eq!(ability["verbal_ability"]["Easy_ReadingComprehension"], 100);
    assert_eq!(ability["verbal_ability_count"]["Easy_ReadingComprehension"], 2);

    let stats = json_output(&mut grepandit(&state), &["stats", "--user", "u-1"]);
    assert_eq!(stats["overall"]["total"], 2);
    assert_eq!(stats["by_category"]["Easy_ReadingComprehension"]["correct"], 1);

    let words = json_output(&mut grepandit(&state), &["problematic-words", "--user", "u-1"]);
    assert_eq!(words.as_array().map(Vec::len), Some(2));

    let practice = json_output(
        &mut grepandit(&state),
        &["practice-vocab", "--word-id", &abacus_id.to_string()],
    );
    assert_eq!(practice[0]["id"].as_u64().map(|id| id.to_string()), Some(question_id));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn concurrent_answers_are_all_applied() {
    const RUNS: usize = 12;
    let dir = temp_dir("concurrent");
    let state = dir.join("state.json");
    json_output(&mut grepandit(&state), &["add-word", "--word", "abacus"]);
    json_output(&mut grepandit(&state), &["add-word", "--word", "ancient"]);
    let file = write_question(&dir, "Medium");
    let question = json_output(
        &mut grepandit(&state),
        &["create-question", "--file", file.to_str().unwrap_or_default()],
    );
    let question_id = question["id"].as_u64().unwrap_or_default().to_string();

    std::thread::scope(|scope| {
        for _ in 0..RUNS {
            scope.spawn(|| {
                grepandit(&state)
                    .args(["answer", "--user", "u-7", "--question", &question_id, "--correct"])
                    .assert()
                    .success();
            });
        }
    });

    let ability = json_output(&mut grepandit(&state), &["ability", "--user", "u-7"]);
    assert_eq!(ability["verbal_ability_count"]["Medium_ReadingComprehension"], RUNS);
    assert_eq!(ability["verbal_ability"]["Medium_ReadingComprehension"], RUNS * 150);
    let stats = json_output(&mut grepandit(&state), &["stats", "--user", "u-7"]);
    assert_eq!(stats["overall"]["total"], RUNS);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_vocabulary_is_rejected_and_state_untouched() {
    let dir = temp_dir("unknown_word");
    let state = dir.join("state.json");
    json_output(&mut grepandit(&state), &["add-word", "--word", "abacus"]);
    let before = fs::read_to_string(&state).unwrap_or_default();

    let file = write_question(&dir, "Hard");
    grepandit(&state)
        .args(["create-question", "--file", file.to_str().unwrap_or_default()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown vocabulary words: ancient"));

    assert_eq!(fs::read_to_string(&state).unwrap_or_default(), before);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_batch_and_epsilon_fail() {
    let dir = temp_dir("invalid");
    let state = dir.join("state.json");

    grepandit(&state)
        .args(["adaptive", "--user", "u-1", "--count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch size 0"));

    grepandit(&state)
        .env("GREPANDIT_EPSILON", "1.5")
        .args(["adaptive", "--user", "u-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid engine configuration"));

    // Read-only commands never create the state file.
    assert!(!state.exists());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_store_yields_empty_batch() {
    let dir = temp_dir("empty");
    let state = dir.join("state.json");
    let batch = json_output(&mut grepandit(&state), &["adaptive", "--user", "nobody", "--seed", "1"]);
    assert_eq!(batch["questions"], Value::Array(Vec::new()));
    assert_eq!(batch["unresolved"].as_array().map(Vec::len), Some(5));
    let _ = fs::remove_dir_all(&dir);
}
