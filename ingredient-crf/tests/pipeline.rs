//! End-to-end pipeline tests with a small hand-built model.
//!
//! The model keys on a handful of robust features (the numeric sentinel's
//! word shape, the unit and punctuation flags) so sentences flow through
//! normalization, feature extraction, Viterbi decoding and
//! post-processing without trained weights.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use ingredient_crf::crf::CrfModel;
use ingredient_crf::output::Quantity;
use ingredient_crf::unit::Unit;
use ingredient_crf::{ParserOptions, SentenceParser};

fn test_model() -> CrfModel {
    let labels = vec![
        "QTY".to_string(),
        "UNIT".to_string(),
        "PUNC".to_string(),
        "B_NAME_TOK".to_string(),
    ];
    let mut state_weights: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
    // The numeric sentinel "!num" has the deterministic word shape "!xxx".
    state_weights.insert("word_shape=!xxx".to_string(), vec![(0, 6.0)]);
    state_weights.insert("is_unit".to_string(), vec![(1, 6.0)]);
    state_weights.insert("is_punc".to_string(), vec![(2, 6.0)]);
    state_weights.insert("bias".to_string(), vec![(3, 0.5)]);
    let transitions = vec![vec![0.0; 4]; 4];
    CrfModel::new(labels, state_weights, transitions).unwrap()
}

fn parser() -> SentenceParser {
    SentenceParser::new(test_model())
}

#[test]
fn test_simple_sentence() {
    let parsed = parser()
        .parse("2 cups flour", &ParserOptions::default())
        .unwrap();

    assert_eq!(parsed.sentence, "2 cups flour");
    assert_eq!(parsed.names.len(), 1);
    assert_eq!(parsed.names[0].text, "flour");
    assert_eq!(parsed.amounts.len(), 1);
    let amount = parsed.amounts[0].as_single().unwrap();
    assert_eq!(amount.quantity, Quantity::Value(2.0));
    assert_eq!(amount.unit, Unit::Cup);
    assert_eq!(amount.text, "2 cups");
}

#[test]
fn test_bracketed_alternative_amount() {
    let parsed = parser()
        .parse("2 cups (500 ml) milk", &ParserOptions::default())
        .unwrap();

    assert_eq!(parsed.amounts.len(), 2);
    let first = parsed.amounts[0].as_single().unwrap();
    assert_eq!(first.quantity, Quantity::Value(2.0));
    assert_eq!(first.unit, Unit::Cup);
    let second = parsed.amounts[1].as_single().unwrap();
    assert_eq!(second.quantity, Quantity::Value(500.0));
    assert_eq!(second.unit, Unit::Milliliter);

    assert!(parsed.names.iter().any(|n| n.text == "milk"));
}

#[test]
fn test_unicode_fraction_quantity() {
    let parsed = parser()
        .parse("½ cup sugar", &ParserOptions::default())
        .unwrap();
    let amount = parsed.amounts[0].as_single().unwrap();
    assert_eq!(amount.quantity, Quantity::Value(0.5));
    assert_eq!(amount.unit, Unit::Cup);
}

#[test]
fn test_parse_is_deterministic() {
    let parser = parser();
    let options = ParserOptions::default();
    let first = parser.parse("100g green beans, trimmed", &options).unwrap();
    let second = parser.parse("100g green beans, trimmed", &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_inspect_invariants() {
    let parser = parser();
    let info = parser
        .inspect("2 cups (500 ml) milk", &ParserOptions::default())
        .unwrap();

    // Tokens, labels, scores and feature maps all line up.
    assert_eq!(info.tokens.len(), info.labels.len());
    assert_eq!(info.tokens.len(), info.scores.len());
    assert_eq!(info.tokens.len(), info.features.len());
    assert_eq!(info.tokens.len(), info.marginals.len());

    // Marginals are probabilities.
    for (score, row) in info.scores.iter().zip(info.marginals.iter()) {
        assert!((0.0..=1.0).contains(score));
        let total: f64 = row.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    // Normalization leaves an already-normal sentence unchanged; unit
    // singularisation happens on the tokens, not the sentence text.
    assert_eq!(info.normalized, "2 cups (500 ml) milk");
    assert_eq!(info.tokens[1].text, "cup");
}

#[test]
fn test_amount_starting_indices_are_valid() {
    let parser = parser();
    let parsed = parser
        .parse("2 cups (500 ml) milk", &ParserOptions::default())
        .unwrap();
    let info = parser
        .inspect("2 cups (500 ml) milk", &ParserOptions::default())
        .unwrap();

    for amount in &parsed.amounts {
        assert!(amount.starting_index() < info.tokens.len());
    }
}
