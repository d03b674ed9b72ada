//! Post-processing of labeled tokens into structured output.
//!
//! The post-processor receives the tokenized sentence, its POS tags, the
//! label sequence and per-token label marginals, and turns them into a
//! [`ParsedIngredient`]. Amount extraction runs first and consumes the
//! tokens it uses; text fields are then built from maximal runs of the
//! remaining tokens per label.

mod amounts;

use std::collections::HashSet;

use itertools::Itertools;

use crate::foundation::FoundationFoodResolver;
use crate::label::{Label, NameLabel};
use crate::lexicon::STOP_WORDS;
use crate::normalize::{is_fraction_token, render_fraction_token};
use crate::output::{mean, Amount, FoundationFood, IngredientText, ParsedIngredient};
use crate::ParserOptions;

/// Kind of a name group, derived from its first non-punctuation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameGroupKind {
    Tok,
    Var,
    Mod,
    Empty,
}

/// Converts `(tokens, pos_tags, labels, scores)` into a
/// [`ParsedIngredient`].
///
/// Constructed directly in tests so no trained model is needed to
/// exercise the post-processing stages.
pub struct PostProcessor<'a> {
    sentence: String,
    tokens: Vec<String>,
    pos_tags: Vec<&'static str>,
    labels: Vec<Label>,
    scores: Vec<f64>,
    options: &'a ParserOptions,
    resolver: Option<&'a FoundationFoodResolver>,
    /// Per-token marginal mass over the name label family, for the
    /// best-effort name guess.
    name_marginal_mass: Option<Vec<f64>>,
    consumed: HashSet<usize>,
}

impl<'a> PostProcessor<'a> {
    pub fn new(
        sentence: &str,
        tokens: Vec<String>,
        pos_tags: Vec<&'static str>,
        labels: Vec<Label>,
        scores: Vec<f64>,
        options: &'a ParserOptions,
    ) -> Self {
        PostProcessor {
            sentence: sentence.to_string(),
            tokens,
            pos_tags,
            labels,
            scores,
            options,
            resolver: None,
            name_marginal_mass: None,
            consumed: HashSet::new(),
        }
    }

    /// Attach a foundation-food resolver, used when the
    /// `foundation_foods` option is set.
    pub fn with_resolver(mut self, resolver: &'a FoundationFoodResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Attach per-token marginal mass over the name labels, enabling the
    /// `expect_name_in_output` fallback guess.
    pub fn with_name_marginal_mass(mut self, mass: Vec<f64>) -> Self {
        self.name_marginal_mass = Some(mass);
        self
    }

    /// Run all post-processing phases.
    pub fn parse(mut self) -> ParsedIngredient {
        let mut amounts = self.postprocess_amounts();
        amounts.sort_by_key(Amount::starting_index);

        let (mut names, foundation_foods) = if self.options.separate_names {
            self.postprocess_names()
        } else {
            self.postprocess_joined_name()
        };

        // The fallback guess runs before the text fields are built, so the
        // guessed tokens end up in the name rather than the comment.
        if names.is_empty() && self.options.expect_name_in_output {
            if let Some(guess) = self.guess_name() {
                names.push(guess);
            }
        }

        let size = self.postprocess_field(Label::Size);
        let preparation = self.postprocess_field(Label::Prep);
        let comment = self.postprocess_field(Label::Comment);
        let purpose = self.postprocess_field(Label::Purpose);

        let mut parsed = ParsedIngredient {
            names,
            size,
            amounts,
            preparation,
            comment,
            purpose,
            foundation_foods,
            sentence: self.sentence,
        };
        parsed.propagate_prepared_ingredient();
        parsed
    }

    /// Build the text field for one label.
    fn postprocess_field(&mut self, selected: Label) -> Option<IngredientText> {
        let label_idx: Vec<usize> = (0..self.labels.len())
            .filter(|&i| {
                (self.labels[i] == selected || self.labels[i] == Label::Punc)
                    && !self.consumed.contains(&i)
            })
            .collect();

        if label_idx.is_empty() || label_idx.iter().all(|&i| self.labels[i] == Label::Punc) {
            return None;
        }

        self.postprocess_indices(&label_idx, false)
    }

    /// Build one or more ingredient names from the name sub-labels, and
    /// resolve each against the foundation-food catalog when enabled.
    fn postprocess_names(&mut self) -> (Vec<IngredientText>, Vec<FoundationFood>) {
        let name_idx: Vec<usize> = (0..self.labels.len())
            .filter(|&i| {
                (self.labels[i].is_name() || self.labels[i] == Label::Punc)
                    && !self.consumed.contains(&i)
            })
            .collect();

        if name_idx.is_empty() || name_idx.iter().all(|&i| self.labels[i] == Label::Punc) {
            return (Vec::new(), Vec::new());
        }

        let name_labels: Vec<Label> = name_idx.iter().map(|&i| self.labels[i]).collect();
        let groups = group_name_labels(&name_labels);
        let constructed = construct_names(&groups);

        let mut names: Vec<IngredientText> = Vec::new();
        let mut foundation_foods: Vec<FoundationFood> = Vec::new();
        for group in constructed {
            let token_idx: Vec<usize> = group.iter().map(|&pos| name_idx[pos]).collect();
            let Some(text) = self.postprocess_indices(&token_idx, true) else {
                continue;
            };
            if names.iter().any(|existing| existing.text == text.text) {
                continue;
            }

            if self.options.foundation_foods {
                if let Some(resolver) = self.resolver {
                    let tokens: Vec<String> =
                        token_idx.iter().map(|&i| self.tokens[i].clone()).collect();
                    let pos_tags: Vec<&str> =
                        token_idx.iter().map(|&i| self.pos_tags[i]).collect();
                    if let Some(food) = resolver.resolve(&tokens, &pos_tags, names.len()) {
                        if !foundation_foods
                            .iter()
                            .any(|existing| existing.fdc_id == food.fdc_id)
                        {
                            foundation_foods.push(food);
                        }
                    }
                }
            }

            names.push(text);
        }

        (names, foundation_foods)
    }

    /// All name tokens joined into a single name, for
    /// `separate_names = false`.
    fn postprocess_joined_name(&mut self) -> (Vec<IngredientText>, Vec<FoundationFood>) {
        let name_idx: Vec<usize> = (0..self.labels.len())
            .filter(|&i| {
                (self.labels[i].is_name() || self.labels[i] == Label::Punc)
                    && !self.consumed.contains(&i)
            })
            .collect();

        if name_idx.is_empty() || name_idx.iter().all(|&i| self.labels[i] == Label::Punc) {
            return (Vec::new(), Vec::new());
        }

        let Some(text) = self.postprocess_indices(&name_idx, true) else {
            return (Vec::new(), Vec::new());
        };

        let mut foundation_foods = Vec::new();
        if self.options.foundation_foods {
            if let Some(resolver) = self.resolver {
                let tokens: Vec<String> =
                    name_idx.iter().map(|&i| self.tokens[i].clone()).collect();
                let pos_tags: Vec<&str> = name_idx.iter().map(|&i| self.pos_tags[i]).collect();
                if let Some(food) = resolver.resolve(&tokens, &pos_tags, 0) {
                    foundation_foods.push(food);
                }
            }
        }

        (vec![text], foundation_foods)
    }

    /// Process a list of token indices into one text field.
    ///
    /// Consecutive tokens are joined; non-consecutive groups are joined
    /// with a comma unless this is a name. Ungrammatical leading/trailing
    /// punctuation and unmatched brackets are dropped, adjacent duplicate
    /// parts removed, and fraction sentinels rendered back to text.
    fn postprocess_indices(&mut self, label_idx: &[usize], is_name: bool) -> Option<IngredientText> {
        let mut parts: Vec<String> = Vec::new();
        let mut confidence_parts: Vec<f64> = Vec::new();
        let mut starting_index = *label_idx.last()?;

        for group in group_consecutive(label_idx) {
            let idx = self.remove_invalid_indices(group);
            if idx.is_empty() || idx.iter().all(|&i| self.labels[i] == Label::Punc) {
                continue;
            }

            let group_tokens: Vec<String> = idx
                .iter()
                .map(|&i| {
                    let token = &self.tokens[i];
                    if is_fraction_token(token) {
                        render_fraction_token(token)
                    } else {
                        token.clone()
                    }
                })
                .collect();
            let joined = group_tokens.join(" ");
            let confidence = mean(idx.iter().map(|&i| self.scores[i]));

            if self.options.discard_isolated_stop_words
                && STOP_WORDS.contains(joined.to_lowercase().as_str())
            {
                continue;
            }

            self.consumed.extend(idx.iter().copied());
            starting_index = starting_index.min(idx[0]);
            parts.push(joined);
            confidence_parts.push(confidence);
        }

        // Drop adjacent duplicate parts, keeping the last of each run.
        let keep: Vec<usize> = (0..parts.len())
            .filter(|&i| i + 1 >= parts.len() || parts[i] != parts[i + 1])
            .collect();
        let parts: Vec<String> = keep.iter().map(|&i| parts[i].clone()).collect();
        let confidence_parts: Vec<f64> = keep.iter().map(|&i| confidence_parts[i]).collect();

        if parts.is_empty() {
            return None;
        }

        let joined = if is_name {
            parts.join(" ")
        } else {
            parts.join(", ")
        };
        let text = fix_punctuation(&joined);

        Some(IngredientText {
            text,
            confidence: round6(mean(confidence_parts.iter().copied())),
            starting_index,
        })
    }

    /// Remove indices of tokens that can't grammatically lead or trail the
    /// group, plus brackets without a partner.
    fn remove_invalid_indices(&self, mut idx: Vec<usize>) -> Vec<usize> {
        const INVALID_LEADING: &[&str] = &[")", "]", "}", ",", ":", ";", "-", ".", "!", "?", "*"];
        const INVALID_TRAILING: &[&str] = &["[", "(", "{", ",", ":", ";", "-"];

        while idx.len() > 1 && INVALID_LEADING.contains(&self.tokens[idx[0]].as_str()) {
            idx.remove(0);
        }
        while idx.len() > 1 && INVALID_TRAILING.contains(&self.tokens[idx[idx.len() - 1]].as_str())
        {
            idx.pop();
        }

        // Remove brackets that aren't part of a matching pair, tracking
        // each bracket type separately.
        let mut paren_stack: Vec<usize> = Vec::new();
        let mut square_stack: Vec<usize> = Vec::new();
        let mut to_remove: HashSet<usize> = HashSet::new();
        for (pos, &i) in idx.iter().enumerate() {
            match self.tokens[i].as_str() {
                "(" => paren_stack.push(pos),
                "[" => square_stack.push(pos),
                ")" => {
                    if paren_stack.pop().is_none() {
                        to_remove.insert(pos);
                    }
                }
                "]" => {
                    if square_stack.pop().is_none() {
                        to_remove.insert(pos);
                    }
                }
                _ => {}
            }
        }
        to_remove.extend(paren_stack);
        to_remove.extend(square_stack);

        idx.iter()
            .enumerate()
            .filter(|(pos, _)| !to_remove.contains(pos))
            .map(|(_, &i)| i)
            .collect()
    }

    /// Best-effort name guess for `expect_name_in_output`: the
    /// consecutive run of unconsumed, non-punctuation tokens with the
    /// highest mean marginal mass over the name labels.
    fn guess_name(&mut self) -> Option<IngredientText> {
        const NAME_MASS_THRESHOLD: f64 = 0.2;

        let mass = self.name_marginal_mass.as_ref()?;
        // Only text-field tokens can be mistaken for a name; amounts and
        // punctuation are never candidates.
        let candidate_idx: Vec<usize> = (0..self.tokens.len())
            .filter(|&i| {
                !self.consumed.contains(&i)
                    && matches!(
                        self.labels[i],
                        Label::Comment | Label::Prep | Label::Size | Label::Purpose
                    )
                    && self.tokens[i].chars().any(|c| c.is_alphanumeric())
            })
            .collect();

        let mut best: Option<(f64, Vec<usize>)> = None;
        for group in group_consecutive(&candidate_idx) {
            let group_mass = mean(group.iter().map(|&i| mass[i]));
            if best.as_ref().is_none_or(|(m, _)| group_mass > *m) {
                best = Some((group_mass, group));
            }
        }

        let (best_mass, idx) = best?;
        if best_mass <= NAME_MASS_THRESHOLD {
            return None;
        }

        let text = fix_punctuation(
            &idx.iter()
                .map(|&i| self.tokens[i].clone())
                .collect::<Vec<_>>()
                .join(" "),
        );
        self.consumed.extend(idx.iter().copied());
        Some(IngredientText {
            text,
            confidence: round6(best_mass),
            starting_index: idx[0],
        })
    }
}

/// Group name labels into runs that build one name each.
///
/// A `B_*` label or a separator starts a new group; consecutive `Variant`
/// or `Modifier` labels group together; everything else extends the
/// current group.
fn group_name_labels(name_labels: &[Label]) -> Vec<Vec<(usize, Label)>> {
    let mut groups: Vec<Vec<(usize, Label)>> = Vec::new();
    let mut current: Vec<(usize, Label)> = Vec::new();
    let mut prev_label: Option<Label> = None;

    for (idx, &label) in name_labels.iter().enumerate() {
        match label {
            Label::Name(NameLabel::Separator) => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
            }
            Label::Name(NameLabel::BeginTok) => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current.push((idx, label));
            }
            Label::Name(NameLabel::Variant) | Label::Name(NameLabel::Modifier) => {
                if prev_label == Some(label) {
                    current.push((idx, label));
                } else {
                    if !current.is_empty() {
                        groups.push(std::mem::take(&mut current));
                    }
                    current.push((idx, label));
                }
            }
            _ => {
                // InsideTok or PUNC extends the current group.
                current.push((idx, label));
            }
        }
        prev_label = Some(label);
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn name_group_kind(group: &[(usize, Label)]) -> NameGroupKind {
    for &(_, label) in group {
        match label {
            Label::Name(NameLabel::BeginTok) | Label::Name(NameLabel::InsideTok) => {
                return NameGroupKind::Tok
            }
            Label::Name(NameLabel::Variant) => return NameGroupKind::Var,
            Label::Name(NameLabel::Modifier) => return NameGroupKind::Mod,
            _ => continue,
        }
    }
    NameGroupKind::Empty
}

/// Compose groups into names, iterating in reverse so variants and
/// modifiers know which root name they attach to.
///
/// A variant group is prepended to the most recent token group ("beef" +
/// "stock" from `beef or chicken stock`); a modifier group is prepended
/// to every name built so far ("hot" onto both stocks).
fn construct_names(groups: &[Vec<(usize, Label)>]) -> Vec<Vec<usize>> {
    let mut constructed: Vec<Vec<usize>> = Vec::new();
    let mut last_name: Option<Vec<usize>> = None;
    let mut last_name_used = false;

    for group in groups.iter().rev() {
        let indices: Vec<usize> = group.iter().map(|&(idx, _)| idx).collect();
        match name_group_kind(group) {
            NameGroupKind::Tok => {
                if let Some(last) = last_name.take() {
                    if !last_name_used {
                        constructed.push(last);
                    }
                }
                last_name = Some(indices);
                last_name_used = false;
            }
            NameGroupKind::Var => {
                if let Some(last) = &last_name {
                    let mut name = indices;
                    name.extend(last.iter().copied());
                    constructed.push(name);
                    last_name_used = true;
                } else {
                    // A variant with no following token group is a
                    // labeling error; keep it as a name anyway.
                    constructed.push(indices);
                }
            }
            NameGroupKind::Mod => {
                if let Some(last) = &last_name {
                    if !last_name_used {
                        constructed.push(last.clone());
                        last_name_used = true;
                    }
                }
                for name in &mut constructed {
                    let mut with_mod = indices.clone();
                    with_mod.extend(name.iter().copied());
                    *name = with_mod;
                }
            }
            NameGroupKind::Empty => {}
        }
    }

    if let Some(last) = last_name {
        if !last_name_used {
            constructed.push(last);
        }
    }

    constructed.reverse();
    constructed
}

/// Group a sorted index list into runs of consecutive values, keyed by
/// the difference between each index and its position.
pub(crate) fn group_consecutive(indices: &[usize]) -> Vec<Vec<usize>> {
    let chunks = indices
        .iter()
        .enumerate()
        .chunk_by(|&(position, &index)| index - position);
    chunks
        .into_iter()
        .map(|(_, group)| group.map(|(_, &index)| index).collect())
        .collect()
}

/// Fix spacing artifacts from joining tokens with spaces.
pub(crate) fn fix_punctuation(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut text = text.replace("( ", "(").replace(" )", ")");
    text = text.replace(" / ", "/");
    for punctuation in [",", ":", ";", ".", "!", "?", "*", "'"] {
        text = text.replace(&format!(" {punctuation}"), punctuation);
    }
    text.trim().to_string()
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserOptions;

    fn labels(labels: &[&str]) -> Vec<Label> {
        labels.iter().map(|l| l.parse().unwrap()).collect()
    }

    fn tokens(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_group_consecutive() {
        assert_eq!(
            group_consecutive(&[0, 1, 2, 4, 5, 7]),
            vec![vec![0, 1, 2], vec![4, 5], vec![7]]
        );
        assert!(group_consecutive(&[]).is_empty());
    }

    #[test]
    fn test_fix_punctuation() {
        assert_eq!(fix_punctuation(", some words ( inside ),"), ", some words (inside),");
        assert_eq!(fix_punctuation("a , b"), "a, b");
        assert_eq!(fix_punctuation("5 mm/ 1/4 in"), "5 mm/1/4 in");
    }

    #[test]
    fn test_name_field_from_labels() {
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "2 cups coconut milk, drained",
            tokens(&["2", "cup", "coconut", "milk", ",", "drained"]),
            vec!["CD", "NN", "NN", "NN", ",", "VBN"],
            labels(&["QTY", "UNIT", "B_NAME_TOK", "I_NAME_TOK", "PUNC", "PREP"]),
            vec![0.99, 0.98, 0.97, 0.96, 0.95, 0.94],
            &options,
        );
        let parsed = processor.parse();
        assert_eq!(parsed.names.len(), 1);
        assert_eq!(parsed.names[0].text, "coconut milk");
        assert_eq!(parsed.names[0].starting_index, 2);
        assert_eq!(parsed.preparation.as_ref().unwrap().text, "drained");
        assert_eq!(parsed.amounts.len(), 1);
    }

    #[test]
    fn test_separate_names_variants() {
        // "beef or chicken stock" -> "beef stock" and "chicken stock"
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "2 cups beef or chicken stock",
            tokens(&["2", "cup", "beef", "or", "chicken", "stock"]),
            vec!["CD", "NN", "NN", "CC", "NN", "NN"],
            labels(&["QTY", "UNIT", "NAME_VAR", "NAME_SEP", "NAME_VAR", "B_NAME_TOK"]),
            vec![0.99; 6],
            &options,
        );
        let parsed = processor.parse();
        let names: Vec<&str> = parsed.names.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(names, vec!["beef stock", "chicken stock"]);
    }

    #[test]
    fn test_modifier_applies_to_all_names() {
        // "hot beef or chicken stock" -> "hot beef stock", "hot chicken stock"
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "hot beef or chicken stock",
            tokens(&["hot", "beef", "or", "chicken", "stock"]),
            vec!["JJ", "NN", "CC", "NN", "NN"],
            labels(&["NAME_MOD", "NAME_VAR", "NAME_SEP", "NAME_VAR", "B_NAME_TOK"]),
            vec![0.99; 5],
            &options,
        );
        let parsed = processor.parse();
        let names: Vec<&str> = parsed.names.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(names, vec!["hot beef stock", "hot chicken stock"]);
    }

    #[test]
    fn test_duplicate_names_deduplicated() {
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "1/2 cup sugar plus 1 1/2 tablespoons sugar",
            tokens(&["#1$2", "cup", "sugar", "plus", "1#1$2", "tablespoon", "sugar"]),
            vec!["CD", "NN", "NN", "CC", "CD", "NN", "NN"],
            labels(&["QTY", "UNIT", "B_NAME_TOK", "COMMENT", "QTY", "UNIT", "B_NAME_TOK"]),
            vec![0.99; 7],
            &options,
        );
        let parsed = processor.parse();
        let names: Vec<&str> = parsed.names.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(names, vec!["sugar"]);
        assert_eq!(parsed.names[0].starting_index, 2);
    }

    #[test]
    fn test_joined_name_when_not_separating() {
        let options = ParserOptions::default().with_separate_names(false);
        let processor = PostProcessor::new(
            "2 cups beef or chicken stock",
            tokens(&["2", "cup", "beef", "or", "chicken", "stock"]),
            vec!["CD", "NN", "NN", "CC", "NN", "NN"],
            labels(&["QTY", "UNIT", "NAME_VAR", "NAME_SEP", "NAME_VAR", "B_NAME_TOK"]),
            vec![0.99; 6],
            &options,
        );
        let parsed = processor.parse();
        let names: Vec<&str> = parsed.names.iter().map(|n| n.text.as_str()).collect();
        // All name tokens, the separator included, join into one name.
        assert_eq!(names, vec!["beef or chicken stock"]);
    }

    #[test]
    fn test_isolated_stop_word_discarded() {
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "2 cans of coconut milk",
            tokens(&["2", "can", "of", "coconut", "milk"]),
            vec!["CD", "NN", "IN", "NN", "NN"],
            labels(&["QTY", "UNIT", "COMMENT", "B_NAME_TOK", "I_NAME_TOK"]),
            vec![0.99; 5],
            &options,
        );
        let parsed = processor.parse();
        assert!(parsed.comment.is_none());

        let options = ParserOptions::default().with_discard_isolated_stop_words(false);
        let processor = PostProcessor::new(
            "2 cans of coconut milk",
            tokens(&["2", "can", "of", "coconut", "milk"]),
            vec!["CD", "NN", "IN", "NN", "NN"],
            labels(&["QTY", "UNIT", "COMMENT", "B_NAME_TOK", "I_NAME_TOK"]),
            vec![0.99; 5],
            &options,
        );
        let parsed = processor.parse();
        assert_eq!(parsed.comment.as_ref().unwrap().text, "of");
    }

    #[test]
    fn test_unmatched_brackets_removed() {
        let options = ParserOptions::default();
        let mut processor = PostProcessor::new(
            "",
            tokens(&["(", "chopped", ")", ")"]),
            vec!["(", "VBN", ")", ")"],
            labels(&["PUNC", "PREP", "PUNC", "PUNC"]),
            vec![0.9; 4],
            &options,
        );
        let text = processor.postprocess_field(Label::Prep).unwrap();
        assert_eq!(text.text, "(chopped)");
    }

    #[test]
    fn test_fraction_rendering_in_text_field() {
        let options = ParserOptions::default();
        let processor = PostProcessor::new(
            "3 carrots, sliced into 5-10 mm (1/4-1/2 in) coins",
            tokens(&[
                "3", "carrots", ",", "sliced", "into", "5-10", "mm", "(", "#1$4-#1$2", "in", ")",
                "coins",
            ]),
            vec!["CD", "NN", ",", "VBN", "IN", "CD", "NN", "(", "CD", "IN", ")", "NNS"],
            labels(&[
                "QTY", "B_NAME_TOK", "PUNC", "PREP", "PREP", "PREP", "PREP", "PUNC", "PREP",
                "PREP", "PUNC", "PREP",
            ]),
            vec![0.99; 12],
            &options,
        );
        let parsed = processor.parse();
        assert_eq!(
            parsed.preparation.as_ref().unwrap().text,
            "sliced into 5-10 mm (1/4-1/2 in) coins"
        );
    }

    #[test]
    fn test_name_guess_fallback() {
        let options = ParserOptions::default().with_expect_name_in_output(true);
        let name_mass = vec![0.01, 0.02, 0.6, 0.7, 0.05];
        let processor = PostProcessor::new(
            "2 cups plain flour sifted",
            tokens(&["2", "cup", "plain", "flour", "sifted"]),
            vec!["CD", "NN", "JJ", "NN", "VBN"],
            labels(&["QTY", "UNIT", "COMMENT", "COMMENT", "PREP"]),
            vec![0.99, 0.99, 0.5, 0.5, 0.9],
            &options,
        )
        .with_name_marginal_mass(name_mass);
        let parsed = processor.parse();
        assert_eq!(parsed.names.len(), 1);
        assert_eq!(parsed.names[0].text, "plain flour");
    }

    #[test]
    fn test_name_guess_respects_threshold() {
        let options = ParserOptions::default().with_expect_name_in_output(true);
        let processor = PostProcessor::new(
            "2 tablespoons",
            tokens(&["2", "tablespoon"]),
            vec!["CD", "NN"],
            labels(&["QTY", "UNIT"]),
            vec![0.99, 0.99],
            &options,
        )
        .with_name_marginal_mass(vec![0.01, 0.01]);
        let parsed = processor.parse();
        assert!(parsed.names.is_empty());
    }
}
