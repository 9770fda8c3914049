//! Stored profiles and questions keep their historical JSON shape.

use grepandit_core::{
    AbilityProfile, Category, CategoryAbility, Difficulty, Question, QuestionType, UserProfile,
    CATEGORY_COUNT,
};

#[test]
fn profile_fixture_maps_onto_fixed_arms() {
    let json = r#"{
        "token": "u-42",
        "email": "reader@example.org",
        "ability": {
            "verbal_ability": {
                "Easy_ReadingComprehension": 4400,
                "Hard_SentenceEquivalence": 9000
            },
            "verbal_ability_count": {
                "Easy_ReadingComprehension": 44,
                "Hard_SentenceEquivalence": 3
            }
        }
    }"#;

    let user: UserProfile =
        serde_json::from_str(json).unwrap_or_else(|e| panic!("fixture should parse: {e}"));
    let easy_rc = Category::new(Difficulty::Easy, QuestionType::ReadingComprehension);
    assert_eq!(
        user.ability.get(easy_rc),
        Some(CategoryAbility { score: 4400, attempts: 44 })
    );
    // Out-of-range stored scores are clamped on load.
    assert_eq!(user.ability.score(Category::ALL[CATEGORY_COUNT - 1]), 4500);
    assert_eq!(user.ability.iter().filter(|(_, a)| a.is_none()).count(), 7);
}

#[test]
fn profile_with_unknown_category_key_is_rejected() {
    let json = r#"{"verbal_ability": {"Trivial_ReadingComprehension": 100}}"#;
    let err = serde_json::from_str::<AbilityProfile>(json)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert!(err.contains("unknown difficulty: Trivial"), "got: {err}");

    let json = r#"{"verbal_ability_count": {"EasyReadingComprehension": 1}}"#;
    assert!(serde_json::from_str::<AbilityProfile>(json).is_err());
}

#[test]
fn stored_question_without_tags_parses() {
    let json = r#"{
        "id": 3,
        "competence": "Distinguish major/minor points",
        "framed_as": "MCQMultipleChoices",
        "type": "TextCompletion",
        "difficulty": "Medium",
        "question": "Fill the blank.",
        "options": [{"value": "terse"}, {"value": "garrulous", "correct": true}]
    }"#;

    let question: Question =
        serde_json::from_str(json).unwrap_or_else(|e| panic!("fixture should parse: {e}"));
    assert_eq!(question.category().key(), "Medium_TextCompletion");
    assert_eq!(question.category().index(), 4);
    assert!(question.word_map.is_empty());
    assert!(question.vocabulary.is_empty());
    assert!(!question.options[0].correct);
}
