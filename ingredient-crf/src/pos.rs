//! Deterministic part-of-speech tagging.
//!
//! Tags are Penn Treebank style. The tagger resolves each token through a
//! fixed lexicon of in-domain words, then falls back to suffix rules. This
//! replaces a statistical tagger: ingredient sentences draw on a narrow
//! vocabulary, and the tag lexicon covers the function words and domain
//! overrides that matter to the downstream chunk recognizers.
//!
//! Numeric tokens are always tagged `CD`, and the single-letter units `c`
//! and `g` are always `NN` so a sentence starting with a unit doesn't get
//! mis-tagged.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::tokenize::is_numeric_token;

/// Fixed token-to-tag lexicon. Tokens are matched lowercased.
static TAGDICT: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        // determiners
        ("a", "DT"),
        ("an", "DT"),
        ("the", "DT"),
        ("this", "DT"),
        ("that", "DT"),
        ("each", "DT"),
        ("any", "DT"),
        ("some", "DT"),
        ("all", "DT"),
        ("both", "DT"),
        ("no", "DT"),
        // conjunctions
        ("and", "CC"),
        ("or", "CC"),
        ("but", "CC"),
        ("nor", "CC"),
        ("plus", "CC"),
        ("minus", "CC"),
        // prepositions and subordinating conjunctions
        ("of", "IN"),
        ("for", "IN"),
        ("with", "IN"),
        ("without", "IN"),
        ("from", "IN"),
        ("at", "IN"),
        ("on", "IN"),
        ("in", "IN"),
        ("into", "IN"),
        ("as", "IN"),
        ("like", "IN"),
        ("about", "IN"),
        ("if", "IN"),
        ("than", "IN"),
        ("per", "IN"),
        ("until", "IN"),
        ("over", "IN"),
        ("under", "IN"),
        ("e.g.", "IN"),
        ("eg", "IN"),
        ("to", "TO"),
        ("so", "RB"),
        ("not", "RB"),
        ("very", "RB"),
        ("well", "RB"),
        ("such", "JJ"),
        ("more", "JJR"),
        ("less", "JJR"),
        ("most", "JJS"),
        ("extra", "JJ"),
        // common ingredient adjectives
        ("fresh", "JJ"),
        ("raw", "JJ"),
        ("ripe", "JJ"),
        ("whole", "JJ"),
        ("small", "JJ"),
        ("medium", "JJ"),
        ("large", "JJ"),
        ("big", "JJ"),
        ("little", "JJ"),
        ("jumbo", "JJ"),
        ("hot", "JJ"),
        ("cold", "JJ"),
        ("cool", "JJ"),
        ("warm", "JJ"),
        ("dry", "JJ"),
        ("sweet", "JJ"),
        ("sour", "JJ"),
        ("bitter", "JJ"),
        ("red", "JJ"),
        ("green", "JJ"),
        ("white", "JJ"),
        ("black", "JJ"),
        ("yellow", "JJ"),
        ("brown", "JJ"),
        ("fine", "JJ"),
        ("coarse", "JJ"),
        ("thick", "JJ"),
        ("thin", "JJ"),
        ("soft", "JJ"),
        ("hard", "JJ"),
        ("firm", "JJ"),
        ("mild", "JJ"),
        ("plain", "JJ"),
        ("light", "JJ"),
        ("dark", "JJ"),
        ("boneless", "JJ"),
        ("skinless", "JJ"),
        ("unsalted", "JJ"),
        ("salted", "JJ"),
        ("new", "JJ"),
        ("good", "JJ"),
        ("free-range", "JJ"),
        // domain nouns that general-purpose taggers mangle
        ("can", "NN"),
        ("cans", "NNS"),
        ("stick", "NN"),
        ("sticks", "NNS"),
        ("slice", "NN"),
        ("slices", "NNS"),
        ("stock", "NN"),
        ("cream", "NN"),
        ("oil", "NN"),
        ("butter", "NN"),
        ("milk", "NN"),
        ("water", "NN"),
        ("flour", "NN"),
        ("sugar", "NN"),
        ("salt", "NN"),
        ("pepper", "NN"),
        ("taste", "NN"),
        ("zest", "NN"),
        ("juice", "NN"),
        ("needed", "VBN"),
        ("chopped", "VBN"),
        ("divided", "VBN"),
        ("optional", "JJ"),
    ];
    entries.iter().copied().collect()
});

/// Tag for a single-character punctuation token, if it is one.
fn punctuation_tag(token: &str) -> Option<&'static str> {
    match token {
        "," => Some(","),
        "." => Some("."),
        "(" | "[" | "{" => Some("("),
        ")" | "]" | "}" => Some(")"),
        ":" | ";" | "-" | "/" | "…" => Some(":"),
        "\"" | "'" => Some("''"),
        "$" => Some("$"),
        "#" => Some("#"),
        _ => None,
    }
}

/// Tag derived from the token's suffix. Applied after the lexicon misses.
fn suffix_tag(token: &str) -> &'static str {
    if token.len() >= 4 {
        if token.ends_with("ly") {
            return "RB";
        }
        if token.ends_with("ing") {
            return "VBG";
        }
        if token.ends_with("ed") {
            return "VBN";
        }
        if token.ends_with("est") {
            return "JJS";
        }
        if ["ous", "ful", "ish", "ive", "less"]
            .iter()
            .any(|suffix| token.ends_with(suffix))
        {
            return "JJ";
        }
    }
    if token.len() >= 3 && token.ends_with('s') && !token.ends_with("ss") {
        return "NNS";
    }
    "NN"
}

/// Tag every token in the sentence.
///
/// Tokens are lowercased before tagging so a sentence-initial unit does
/// not pick up a different tag from its capitalisation.
pub fn tag_part_of_speech(tokens: &[String]) -> Vec<&'static str> {
    tokens
        .iter()
        .map(|token| {
            let lowered = token.to_lowercase();
            if is_numeric_token(&lowered) {
                return "CD";
            }
            if lowered == "c" || lowered == "g" {
                return "NN";
            }
            if let Some(tag) = punctuation_tag(&lowered) {
                return tag;
            }
            if let Some(&tag) = TAGDICT.get(lowered.as_str()) {
                return tag;
            }
            suffix_tag(&lowered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(sentence: &[&str]) -> Vec<&'static str> {
        let tokens: Vec<String> = sentence.iter().map(|s| s.to_string()).collect();
        tag_part_of_speech(&tokens)
    }

    #[test]
    fn test_numeric_tokens_are_cd() {
        assert_eq!(tag(&["2", "#1$2", "1-2", "dozen", "3x"]), vec![
            "CD", "CD", "CD", "CD", "CD"
        ]);
    }

    #[test]
    fn test_single_letter_units_are_nouns() {
        assert_eq!(tag(&["250", "g", "flour"]), vec!["CD", "NN", "NN"]);
        assert_eq!(tag(&["1", "c", "milk"]), vec!["CD", "NN", "NN"]);
    }

    #[test]
    fn test_function_words() {
        assert_eq!(
            tag(&["beef", "or", "chicken", "stock"]),
            vec!["NN", "CC", "NN", "NN"]
        );
        assert_eq!(tag(&["such", "as", "basil"]), vec!["JJ", "IN", "NN"]);
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(tag(&["finely", "chopped"]), vec!["RB", "VBN"]);
        assert_eq!(tag(&["sprinkling"]), vec!["VBG"]);
        assert_eq!(tag(&["tomatoes"]), vec!["NNS"]);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(tag(&[",", "(", ")", "/"]), vec![",", "(", ")", ":"]);
    }
}
