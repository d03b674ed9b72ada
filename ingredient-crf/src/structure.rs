//! Sentence-structure analysis.
//!
//! Three recognizers run over the (text, POS) pairs of a tokenized
//! sentence and mark structure the labeler needs help with:
//!
//! * multi-ingredient phrases: alternatives for one amount, e.g.
//!   "2 tbsp butter or olive oil";
//! * compound-sentence splits: a second ingredient sub-sentence, e.g.
//!   "1 tbsp fresh sage or 1 tsp dried sage";
//! * example phrases: "such as King Edward or Maris Piper".
//!
//! Each is a small hand-rolled finite-state scan rather than a chunk
//! grammar engine. The conjunction inside a recognised phrase must be
//! "or"; anything else voids the match.

use crate::lexicon::{FLATTENED_UNITS, SIZES};

/// Phrase starts recognised as introducing examples.
static EXAMPLE_PHRASE_STARTS: &[&str] = &["as", "like", "e.g."];

fn is_noun_or_adj(tag: &str) -> bool {
    tag.starts_with("NN") || tag.starts_with("JJ")
}

fn is_noun(tag: &str) -> bool {
    tag.starts_with("NN")
}

/// Structure flags for one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureFlags {
    pub mip_start: bool,
    pub mip_end: bool,
    pub after_sentence_split: bool,
    pub example_phrase: bool,
}

/// Detected structure for a whole sentence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureFeatures {
    mip_phrases: Vec<Vec<usize>>,
    sentence_splits: Vec<usize>,
    example_phrases: Vec<Vec<usize>>,
}

impl StructureFeatures {
    /// Run all three recognizers.
    ///
    /// `texts` are the original token spellings, `feat_texts` the
    /// feature-side spellings with numerics collapsed to the sentinel, and
    /// `pos_tags` the POS tag per token.
    pub fn analyze(texts: &[String], feat_texts: &[String], pos_tags: &[&'static str]) -> Self {
        StructureFeatures {
            mip_phrases: detect_mip_phrases(texts, pos_tags),
            sentence_splits: detect_sentence_splits(texts, feat_texts, pos_tags),
            example_phrases: detect_example_phrases(texts, pos_tags),
        }
    }

    /// Flags for the token at `index`.
    pub fn flags(&self, index: usize) -> StructureFlags {
        let mut flags = StructureFlags::default();
        for phrase in &self.mip_phrases {
            if phrase.first() == Some(&index) {
                flags.mip_start = true;
            }
            if phrase.last() == Some(&index) {
                flags.mip_end = true;
            }
        }
        flags.after_sentence_split = self.sentence_splits.iter().any(|&split| index >= split);
        flags.example_phrase = self
            .example_phrases
            .iter()
            .any(|phrase| phrase.contains(&index));
        flags
    }

    pub fn mip_phrases(&self) -> &[Vec<usize>] {
        &self.mip_phrases
    }

    pub fn sentence_splits(&self) -> &[usize] {
        &self.sentence_splits
    }

    pub fn example_phrases(&self) -> &[Vec<usize>] {
        &self.example_phrases
    }
}

/// Consume a maximal run of tokens matching `pred`, returning the end.
fn run_end(pos_tags: &[&str], mut i: usize, pred: impl Fn(&str) -> bool) -> usize {
    while i < pos_tags.len() && pred(pos_tags[i]) {
        i += 1;
    }
    i
}

/// Match the tail common to both phrase shapes: zero or more
/// determiner/noun/adjective tokens ending on a noun. Returns the end
/// index (exclusive) of the final noun.
fn noun_tail_end(pos_tags: &[&str], start: usize) -> Option<usize> {
    let run = run_end(pos_tags, start, |t| t == "DT" || is_noun_or_adj(t));
    (start..run).rev().find(|&i| is_noun(pos_tags[i])).map(|i| i + 1)
}

/// Extended multi-ingredient phrase: `w, x[,] or y z`.
fn match_extended_mip(pos_tags: &[&str], start: usize) -> Option<usize> {
    let mut i = run_end(pos_tags, start, is_noun_or_adj);
    if i == start || pos_tags.get(i) != Some(&",") {
        return None;
    }
    i += 1;
    let second = run_end(pos_tags, i, is_noun_or_adj);
    if second == i {
        return None;
    }
    i = second;
    if pos_tags.get(i) == Some(&",") {
        i += 1;
    }
    if pos_tags.get(i) != Some(&"CC") {
        return None;
    }
    noun_tail_end(pos_tags, i + 1)
}

/// Multi-ingredient phrase: `x or y z`.
fn match_mip(pos_tags: &[&str], start: usize) -> Option<usize> {
    let i = run_end(pos_tags, start, is_noun_or_adj);
    if i == start || pos_tags.get(i) != Some(&"CC") {
        return None;
    }
    noun_tail_end(pos_tags, i + 1)
}

/// True if the phrase's conjunction is anything other than "or".
fn conjunction_is_not_or(texts: &[String], pos_tags: &[&str], indices: &[usize]) -> bool {
    match indices.iter().find(|&&i| pos_tags[i] == "CC") {
        Some(&cc) => !texts[cc].eq_ignore_ascii_case("or"),
        None => false,
    }
}

fn detect_mip_phrases(texts: &[String], pos_tags: &[&'static str]) -> Vec<Vec<usize>> {
    let mut phrases = Vec::new();
    let mut i = 0;
    while i < pos_tags.len() {
        let matched = match_extended_mip(pos_tags, i).or_else(|| match_mip(pos_tags, i));
        let Some(end) = matched else {
            i += 1;
            continue;
        };

        let mut indices: Vec<usize> = (i..end).collect();
        i = end;

        if conjunction_is_not_or(texts, pos_tags, &indices) {
            continue;
        }

        // Remove units and sizes from the beginning of the phrase.
        while let Some(&first) = indices.first() {
            let lowered = texts[first].to_lowercase();
            if FLATTENED_UNITS.contains(lowered.as_str()) || SIZES.contains(lowered.as_str()) {
                indices.remove(0);
            } else {
                break;
            }
        }

        if indices.is_empty() {
            continue;
        }
        if pos_tags[indices[0]] == "CC" {
            continue;
        }

        phrases.push(indices);
    }
    phrases
}

/// Indices of tokens that start a second ingredient sub-sentence:
/// a conjunction, one or more numerals, then a noun/adjective/unit/size.
fn detect_sentence_splits(
    texts: &[String],
    feat_texts: &[String],
    pos_tags: &[&'static str],
) -> Vec<usize> {
    // Retag unit and size words so the pattern can refer to them.
    let retagged: Vec<&str> = texts
        .iter()
        .zip(pos_tags.iter())
        .map(|(text, &tag)| {
            let lowered = text.to_lowercase();
            if FLATTENED_UNITS.contains(lowered.as_str()) {
                "UNIT"
            } else if SIZES.contains(lowered.as_str()) {
                "SIZE"
            } else {
                tag
            }
        })
        .collect();

    let mut splits = Vec::new();
    let mut i = 0;
    while i < retagged.len() {
        if retagged[i] != "CC" {
            i += 1;
            continue;
        }
        let numbers = run_end(&retagged, i + 1, |t| t == "CD");
        if numbers == i + 1 {
            i += 1;
            continue;
        }
        let next = retagged.get(numbers).copied();
        let closes = matches!(next, Some(t) if is_noun_or_adj(t) || t == "UNIT" || t == "SIZE");
        if !closes {
            i += 1;
            continue;
        }
        if feat_texts[i].eq_ignore_ascii_case("or") {
            splits.push(i);
        }
        i = numbers + 1;
    }
    splits
}

/// Noun phrase tail for example phrases: nouns, adjectives, commas,
/// conjunctions and determiners, ending on a noun.
fn match_example_np(pos_tags: &[&str], start: usize) -> Option<usize> {
    let run = run_end(pos_tags, start, |t| {
        is_noun_or_adj(t) || t == "," || t == "CC" || t == "DT"
    });
    (start..run).rev().find(|&i| is_noun(pos_tags[i])).map(|i| i + 1)
}

fn detect_example_phrases(texts: &[String], pos_tags: &[&'static str]) -> Vec<Vec<usize>> {
    let mut phrases = Vec::new();
    let mut i = 0;
    while i < pos_tags.len() {
        if pos_tags[i] != "IN" {
            i += 1;
            continue;
        }
        let Some(end) = match_example_np(pos_tags, i + 1) else {
            i += 1;
            continue;
        };

        let lead_jj = i > 0 && pos_tags[i - 1].starts_with("JJ");
        let in_text = texts[i].to_lowercase();
        let phrase: Option<Vec<usize>> = if lead_jj
            && texts[i - 1].eq_ignore_ascii_case("such")
            && in_text == "as"
        {
            // "such as ..." keeps the adjective in the phrase
            Some(((i - 1)..end).collect())
        } else if EXAMPLE_PHRASE_STARTS.contains(&in_text.as_str()) {
            // "like ...", "as ...", "e.g. ..." with or without a stray
            // leading adjective, which is not part of the phrase
            Some((i..end).collect())
        } else {
            None
        };

        if let Some(phrase) = phrase {
            i = end;
            phrases.push(phrase);
        } else {
            i += 1;
        }
    }
    phrases
}
