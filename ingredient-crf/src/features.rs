//! Token construction and feature extraction for the sequence labeler.
//!
//! A [`PreprocessedSentence`] owns the normalized sentence, its tokens and
//! everything derived from them. Feature maps are emitted on demand as
//! `(attribute, value)` pairs: string-valued features become
//! `key=value` attributes with weight 1, boolean features become bare
//! attributes present only when true, and embedding components carry their
//! float value as the attribute weight.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::embeddings::EmbeddingTable;
use crate::lexicon::{AMBIGUOUS_UNITS, FLATTENED_UNITS};
use crate::normalize::normalize;
use crate::pos::tag_part_of_speech;
use crate::stem::stem;
use crate::structure::StructureFeatures;
use crate::tokenize::{is_numeric_token, singularize_units, tokenize};

/// Sentinel replacing numeric tokens during feature extraction.
pub const NUMERIC_SENTINEL: &str = "!num";

/// Number of leading embedding dimensions used as labeler features.
const EMBEDDING_FEATURE_DIMS: usize = 10;

/// One weighted attribute for the CRF.
pub type Feature = (String, f64);

/// Feature map for a single token.
pub type FeatureVec = Vec<Feature>;

/// One lexical unit of a preprocessed sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Output spelling, after unit singularisation.
    pub text: String,
    /// Feature-side spelling: numerics collapsed to [`NUMERIC_SENTINEL`].
    pub feat_text: String,
    /// Penn Treebank style POS tag.
    pub pos_tag: &'static str,
}

/// A sentence carried through normalization, tokenization and tagging,
/// ready for feature extraction.
#[derive(Debug, Clone)]
pub struct PreprocessedSentence {
    input: String,
    sentence: String,
    tokens: Vec<Token>,
    singularized_indices: Vec<usize>,
    structure: StructureFeatures,
    in_parens: Vec<bool>,
    follows_comma: Vec<bool>,
    follows_plus: Vec<bool>,
}

impl PreprocessedSentence {
    pub fn new(input: &str) -> Self {
        let sentence = normalize(input);
        let (texts, singularized_indices) = singularize_units(tokenize(&sentence));

        let feat_texts: Vec<String> = texts
            .iter()
            .map(|t| {
                if is_numeric_token(t) {
                    NUMERIC_SENTINEL.to_string()
                } else {
                    t.clone()
                }
            })
            .collect();
        let pos_tags = tag_part_of_speech(&texts);
        let structure = StructureFeatures::analyze(&texts, &feat_texts, &pos_tags);

        let in_parens = inside_parentheses(&texts);
        let follows_comma = follows_token(&texts, ",");
        let follows_plus = follows_token(&texts, "plus");

        let tokens = texts
            .into_iter()
            .zip(feat_texts)
            .zip(pos_tags)
            .map(|((text, feat_text), pos_tag)| Token {
                text,
                feat_text,
                pos_tag,
            })
            .collect();

        PreprocessedSentence {
            input: input.to_string(),
            sentence,
            tokens,
            singularized_indices,
            structure,
            in_parens,
            follows_comma,
            follows_plus,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// The normalized sentence.
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token_texts(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.text.clone()).collect()
    }

    pub fn pos_tags(&self) -> Vec<&'static str> {
        self.tokens.iter().map(|t| t.pos_tag).collect()
    }

    /// Indices of tokens whose plural unit spelling was singularised.
    pub fn singularized_indices(&self) -> &[usize] {
        &self.singularized_indices
    }

    pub fn structure(&self) -> &StructureFeatures {
        &self.structure
    }

    /// Feature maps for every token.
    ///
    /// Embedding components are included when an embedding table is
    /// supplied and the token's stem is in its vocabulary.
    pub fn features(&self, embeddings: Option<&EmbeddingTable>) -> Vec<FeatureVec> {
        (0..self.tokens.len())
            .map(|i| self.token_features(i, embeddings))
            .collect()
    }

    fn token_features(&self, index: usize, embeddings: Option<&EmbeddingTable>) -> FeatureVec {
        let mut features: FeatureVec = Vec::with_capacity(64);
        features.push(("bias".to_string(), 1.0));

        let pos = self.tokens[index].pos_tag;
        features.push((format!("pos={pos}"), 1.0));
        self.slot_features(&mut features, index, "", embeddings);

        if index >= 1 {
            let prev_pos = [self.tokens[index - 1].pos_tag, pos].join("+");
            features.push((format!("prev_pos={prev_pos}"), 1.0));
            self.slot_features(&mut features, index - 1, "prev_", embeddings);
        }
        if index >= 2 {
            let prev2_pos = [
                self.tokens[index - 2].pos_tag,
                self.tokens[index - 1].pos_tag,
                pos,
            ]
            .join("+");
            features.push((format!("prev2_pos={prev2_pos}"), 1.0));
            self.slot_features(&mut features, index - 2, "prev2_", embeddings);
        }
        if index + 1 < self.tokens.len() {
            let next_pos = [pos, self.tokens[index + 1].pos_tag].join("+");
            features.push((format!("next_pos={next_pos}"), 1.0));
            self.slot_features(&mut features, index + 1, "next_", embeddings);
        }
        if index + 2 < self.tokens.len() {
            let next2_pos = [
                self.tokens[index + 2].pos_tag,
                self.tokens[index + 1].pos_tag,
                pos,
            ]
            .join("+");
            features.push((format!("next2_pos={next2_pos}"), 1.0));
            self.slot_features(&mut features, index + 2, "next2_", embeddings);
        }

        features
    }

    /// Features shared by the current token and its context slots.
    fn slot_features(
        &self,
        features: &mut FeatureVec,
        index: usize,
        prefix: &str,
        embeddings: Option<&EmbeddingTable>,
    ) {
        let token = &self.tokens[index].feat_text;

        let stemmed = stem(token);
        features.push((format!("{prefix}stem={stemmed}"), 1.0));
        if *token != stemmed {
            features.push((format!("{prefix}token={token}"), 1.0));
        }

        if is_capitalized(token) {
            features.push((format!("{prefix}is_capitalised"), 1.0));
        }
        if FLATTENED_UNITS.contains(token.to_lowercase().as_str()) {
            features.push((format!("{prefix}is_unit"), 1.0));
        }
        if is_punctuation(token) {
            features.push((format!("{prefix}is_punc"), 1.0));
        }
        if AMBIGUOUS_UNITS.contains(token.as_str()) {
            features.push((format!("{prefix}is_ambiguous"), 1.0));
        }
        if self.in_parens[index] {
            features.push((format!("{prefix}is_in_parens"), 1.0));
        }
        if self.follows_comma[index] {
            features.push((format!("{prefix}is_after_comma"), 1.0));
        }
        if self.follows_plus[index] {
            features.push((format!("{prefix}is_after_plus"), 1.0));
        }
        features.push((format!("{prefix}word_shape={}", word_shape(token)), 1.0));

        ngram_features(features, token, prefix);

        let flags = self.structure.flags(index);
        if flags.mip_start {
            features.push((format!("{prefix}mip_start"), 1.0));
        }
        if flags.mip_end {
            features.push((format!("{prefix}mip_end"), 1.0));
        }
        if flags.after_sentence_split {
            features.push((format!("{prefix}after_sentence_split"), 1.0));
        }
        if flags.example_phrase {
            features.push((format!("{prefix}example_phrase"), 1.0));
        }

        if let Some(embeddings) = embeddings {
            self.embedding_features(features, index, prefix, embeddings);
        }
    }

    fn embedding_features(
        &self,
        features: &mut FeatureVec,
        index: usize,
        prefix: &str,
        embeddings: &EmbeddingTable,
    ) {
        let token = self.tokens[index].feat_text.to_lowercase();
        if let Some(vector) = embeddings.get(&stem(&token)) {
            for (dim, value) in vector.iter().take(EMBEDDING_FEATURE_DIMS).enumerate() {
                features.push((format!("{prefix}v{dim}"), *value));
            }
        }
    }
}

/// Prefixes and suffixes of length 3, 4 and 5, emitted when the token is
/// long enough and is not the numeric sentinel.
fn ngram_features(features: &mut FeatureVec, token: &str, prefix: &str) {
    if token == NUMERIC_SENTINEL {
        return;
    }
    let chars: Vec<char> = token.chars().collect();
    for n in 3..=5 {
        if chars.len() >= n + 1 {
            let head: String = chars[..n].iter().collect();
            let tail: String = chars[chars.len() - n..].iter().collect();
            features.push((format!("{prefix}prefix_{n}={head}"), 1.0));
            features.push((format!("{prefix}suffix_{n}={tail}"), 1.0));
        }
    }
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation())
}

/// Word shape: lowercase -> `x`, uppercase -> `X`, digits -> `d`, accents
/// stripped first, everything else unchanged.
pub fn word_shape(token: &str) -> String {
    token
        .nfd()
        .filter(|&c| !is_combining_mark(c))
        .map(|c| {
            if c.is_lowercase() {
                'x'
            } else if c.is_uppercase() {
                'X'
            } else if c.is_ascii_digit() {
                'd'
            } else {
                c
            }
        })
        .collect()
}

/// True at every index where any preceding token equals `what`. The index
/// of `what` itself is not marked.
fn follows_token(texts: &[String], what: &str) -> Vec<bool> {
    let mut seen = false;
    texts
        .iter()
        .map(|t| {
            let flag = seen;
            if t == what {
                seen = true;
            }
            flag
        })
        .collect()
}

/// True for tokens that are brackets or sit between a matched pair of
/// brackets. Open and close brackets are paired positionally.
fn inside_parentheses(texts: &[String]) -> Vec<bool> {
    let mut open = Vec::new();
    let mut close = Vec::new();
    for (i, t) in texts.iter().enumerate() {
        match t.as_str() {
            "(" | "[" => open.push(i),
            ")" | "]" => close.push(i),
            _ => {}
        }
    }

    let mut inside = vec![false; texts.len()];
    for (i, t) in texts.iter().enumerate() {
        if matches!(t.as_str(), "(" | ")" | "[" | "]") {
            inside[i] = true;
        }
    }
    for (&start, &end) in open.iter().zip(close.iter()) {
        for flag in inside.iter_mut().take(end).skip(start + 1) {
            *flag = true;
        }
    }
    inside
}
