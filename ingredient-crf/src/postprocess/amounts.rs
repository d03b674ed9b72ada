//! Amount extraction: the sizable-unit, composite and fallback patterns.
//!
//! The phases run in order over the tokens not yet consumed by an earlier
//! phase. Pattern matches are non-overlapping; tokens used by a match are
//! consumed so later phases and the text fields never reuse them.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::label::Label;
use crate::lexicon::{
    APPROXIMATE_TOKENS, PREPARED_INGREDIENT_PHRASES, SINGULAR_TOKENS, SIZABLE_UNITS,
    STRING_NUMBERS,
};
use crate::normalize::{
    combine_quantities_split_by_and, is_fraction_token, render_fraction_token,
    replace_string_range,
};
use crate::output::{
    mean, Amount, AmountFlags, CompositeIngredientAmount, IngredientAmount, Quantity,
};
use crate::quantity::resolve_quantity;
use crate::unit::{pluralize_units, Unit};

use super::{group_consecutive, round6, PostProcessor};

/// Matches number words, for rewriting QTY tokens like "three".
static STRING_NUMBER_WORD: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<&str> = STRING_NUMBERS.iter().map(|&(word, _)| word).collect();
    #[allow(clippy::expect_used)]
    Regex::new(&format!(r"(?i)\b({})\b", words.join("|"))).expect("invalid number word pattern")
});

/// How pattern matching treats labels outside the pattern.
#[derive(Clone, Copy, PartialEq)]
enum MatchMode {
    /// Only labels that appear in the pattern are considered; matches may
    /// span unrelated labels.
    IgnoreForeignLabels,
    /// All labels are considered except the name family, which amounts
    /// may legitimately straddle ("1/2 cup sugar plus 1 1/2 tablespoons
    /// sugar").
    SkipNameLabels,
}

struct CompositePattern {
    pattern: &'static [Label],
    /// Conjunction token required at `conjunction_index`, lowercased.
    conjunction: Option<&'static str>,
    conjunction_index: Option<usize>,
    /// Index in the pattern where the second amount starts.
    start2: usize,
    join: &'static str,
    subtractive: bool,
    /// When set, the first and last unit tokens must come from the
    /// lb/pint and oz families respectively.
    unit_constrained: bool,
}

const QTY: Label = Label::Qty;
const UNIT: Label = Label::Unit;
const COMMENT: Label = Label::Comment;
const PUNC: Label = Label::Punc;

static COMPOSITE_PATTERNS: &[CompositePattern] = &[
    // 1 pint 2 fl oz
    CompositePattern {
        pattern: &[QTY, UNIT, QTY, UNIT, UNIT],
        conjunction: None,
        conjunction_index: None,
        start2: 2,
        join: "",
        subtractive: false,
        unit_constrained: true,
    },
    // 1 lb 2 oz
    CompositePattern {
        pattern: &[QTY, UNIT, QTY, UNIT],
        conjunction: None,
        conjunction_index: None,
        start2: 2,
        join: "",
        subtractive: false,
        unit_constrained: true,
    },
    // 1 cup plus 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, COMMENT, QTY, UNIT],
        conjunction: Some("plus"),
        conjunction_index: Some(2),
        start2: 3,
        join: " plus ",
        subtractive: false,
        unit_constrained: false,
    },
    // 1 cup + 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, PUNC, QTY, UNIT],
        conjunction: Some("+"),
        conjunction_index: Some(2),
        start2: 3,
        join: " + ",
        subtractive: false,
        unit_constrained: false,
    },
    // 1 cup, plus 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, PUNC, COMMENT, QTY, UNIT],
        conjunction: Some("plus"),
        conjunction_index: Some(3),
        start2: 4,
        join: " plus ",
        subtractive: false,
        unit_constrained: false,
    },
    // 1 cup and 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, COMMENT, QTY, UNIT],
        conjunction: Some("and"),
        conjunction_index: Some(2),
        start2: 3,
        join: " and ",
        subtractive: false,
        unit_constrained: false,
    },
    // 1 cup minus 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, COMMENT, QTY, UNIT],
        conjunction: Some("minus"),
        conjunction_index: Some(2),
        start2: 3,
        join: " minus ",
        subtractive: true,
        unit_constrained: false,
    },
    // 1 cup less 2 tablespoons
    CompositePattern {
        pattern: &[QTY, UNIT, COMMENT, QTY, UNIT],
        conjunction: Some("less"),
        conjunction_index: Some(2),
        start2: 3,
        join: " minus ",
        subtractive: true,
        unit_constrained: false,
    },
];

/// An amount being assembled by the fallback pattern.
#[derive(Debug, Clone)]
struct PartialAmount {
    quantity: String,
    units: Vec<String>,
    confidences: Vec<f64>,
    starting_index: usize,
    related_to_previous: bool,
    approximate: bool,
    singular: bool,
    prepared: bool,
}

impl PartialAmount {
    fn new(quantity: &str, starting_index: usize, related_to_previous: bool) -> Self {
        PartialAmount {
            quantity: quantity.to_string(),
            units: Vec::new(),
            confidences: Vec::new(),
            starting_index,
            related_to_previous,
            approximate: false,
            singular: false,
            prepared: false,
        }
    }
}

impl<'a> PostProcessor<'a> {
    /// Extract all amounts from the labeled tokens, in three passes. Each
    /// pass sees only the tokens the previous passes left unconsumed.
    pub(super) fn postprocess_amounts(&mut self) -> Vec<Amount> {
        self.convert_string_number_qty();

        let mut amounts: Vec<Amount> = Vec::new();

        let (idx, tokens, labels, scores) = self.unconsumed_view();
        amounts.extend(self.sizable_unit_pattern(&idx, &tokens, &labels, &scores));

        let (idx, tokens, labels, scores) = self.unconsumed_view();
        amounts.extend(self.composite_amounts_pattern(&idx, &tokens, &labels, &scores));

        let (idx, tokens, labels, scores) = self.unconsumed_view();
        amounts.extend(self.fallback_pattern(&idx, &tokens, &labels, &scores));

        amounts
    }

    /// Tokens, labels and scores not yet consumed, with their original
    /// indices.
    #[allow(clippy::type_complexity)]
    fn unconsumed_view(&self) -> (Vec<usize>, Vec<String>, Vec<Label>, Vec<f64>) {
        let idx: Vec<usize> = (0..self.tokens.len())
            .filter(|i| !self.consumed.contains(i))
            .collect();
        let tokens: Vec<String> = idx.iter().map(|&i| self.tokens[i].clone()).collect();
        let labels: Vec<Label> = idx.iter().map(|&i| self.labels[i]).collect();
        let scores: Vec<f64> = idx.iter().map(|&i| self.scores[i]).collect();
        (idx, tokens, labels, scores)
    }

    /// Rewrite QTY tokens that are number words and collapse QTY token
    /// groups that form "N and M/K" fractions or "A to B" ranges into a
    /// single token.
    fn convert_string_number_qty(&mut self) {
        for i in 0..self.tokens.len() {
            if self.labels[i] == Label::Qty {
                self.tokens[i] = replace_string_numbers(&self.tokens[i]);
            }
        }

        let qty_idx: Vec<usize> =
            (0..self.labels.len()).filter(|&i| self.labels[i] == Label::Qty).collect();

        let mut idx_to_remove: HashSet<usize> = HashSet::new();
        for group in group_consecutive(&qty_idx) {
            if group.len() < 2 {
                continue;
            }
            let fragment = group
                .iter()
                .map(|&i| self.tokens[i].clone())
                .collect::<Vec<_>>()
                .join(" ");

            let mut replacement = combine_quantities_split_by_and(&fragment);
            if replacement == fragment {
                replacement = replace_string_range(&fragment);
            }
            if replacement != fragment {
                let first = group[0];
                self.scores[first] = mean(group.iter().map(|&i| self.scores[i]));
                self.tokens[first] = replacement;
                idx_to_remove.extend(group.iter().skip(1).copied());
            }
        }

        if !idx_to_remove.is_empty() {
            let keep = |i: &usize| !idx_to_remove.contains(i);
            self.tokens = filter_by_index(std::mem::take(&mut self.tokens), keep);
            self.pos_tags = filter_by_index(std::mem::take(&mut self.pos_tags), keep);
            self.labels = filter_by_index(std::mem::take(&mut self.labels), keep);
            self.scores = filter_by_index(std::mem::take(&mut self.scores), keep);
            if let Some(mass) = self.name_marginal_mass.take() {
                self.name_marginal_mass = Some(filter_by_index(mass, keep));
            }
        }
    }

    /// Quantity-unit pairs nested inside an outer quantity and container
    /// unit, e.g. "2 14 ounce cans": the outer amount is (2, cans) and the
    /// inner pairs are singular.
    fn sizable_unit_pattern(
        &mut self,
        idx: &[usize],
        tokens: &[String],
        labels: &[Label],
        scores: &[f64],
    ) -> Vec<Amount> {
        static PATTERNS: &[&[Label]] = &[
            &[QTY, QTY, UNIT, QTY, UNIT, QTY, UNIT, UNIT],
            &[QTY, QTY, UNIT, QTY, UNIT, UNIT],
            &[QTY, QTY, UNIT, UNIT],
        ];

        let mut amounts = Vec::new();
        for pattern in PATTERNS {
            for matched in match_pattern(labels, pattern, MatchMode::IgnoreForeignLabels) {
                let last = matched[matched.len() - 1];
                if !SIZABLE_UNITS.contains(&tokens[last].as_str()) {
                    continue;
                }

                self.consumed.extend(matched.iter().map(|&i| idx[i]));

                // The first amount pairs the first quantity with the
                // container unit at the end. It may be approximate but is
                // never singular.
                let quantity = &tokens[matched[0]];
                let unit = &tokens[last];
                let text = format!("{quantity} {unit}").trim().to_string();
                let approximate = self.is_approximate(matched[0], tokens, labels, idx);
                let first = amount_from_parts(
                    quantity,
                    unit,
                    &text,
                    mean([scores[matched[0]], scores[last]].into_iter()),
                    idx[matched[0]],
                    AmountFlags {
                        approximate,
                        ..AmountFlags::default()
                    },
                    self.options.string_units,
                );
                let first_approximate = first.flags.approximate;
                amounts.push(Amount::Single(first));

                // Interior (quantity, unit) pairs are singular, and share
                // the approximate flag of the outer amount.
                let interior = &matched[1..matched.len() - 1];
                for pair in interior.chunks(2) {
                    let &[qty_pos, unit_pos] = pair else {
                        continue;
                    };
                    let quantity = &tokens[qty_pos];
                    let unit = &tokens[unit_pos];
                    let text = format!("{quantity} {unit}").trim().to_string();
                    amounts.push(Amount::Single(amount_from_parts(
                        quantity,
                        unit,
                        &text,
                        scores[qty_pos],
                        idx[qty_pos],
                        AmountFlags {
                            singular: true,
                            approximate: first_approximate,
                            ..AmountFlags::default()
                        },
                        self.options.string_units,
                    )));
                }
            }
        }
        amounts
    }

    /// Adjacent amounts that combine into one, e.g. "1 lb 2 oz" or
    /// "1 cup plus 2 tablespoons".
    fn composite_amounts_pattern(
        &mut self,
        idx: &[usize],
        tokens: &[String],
        labels: &[Label],
        scores: &[f64],
    ) -> Vec<Amount> {
        let valid_first_units = ["lb", "pound", "pt", "pint"];
        let valid_last_units = ["oz", "ounce"];

        let mut composites = Vec::new();
        for pattern_def in COMPOSITE_PATTERNS {
            for matched in match_pattern(labels, pattern_def.pattern, MatchMode::SkipNameLabels) {
                let last = matched[matched.len() - 1];

                if pattern_def.unit_constrained {
                    let first_unit = tokens[matched[1]].as_str();
                    let last_unit = tokens[last].as_str();
                    if !valid_first_units.contains(&first_unit)
                        || !valid_last_units.contains(&last_unit)
                    {
                        continue;
                    }
                } else if let (Some(conjunction), Some(conjunction_index)) =
                    (pattern_def.conjunction, pattern_def.conjunction_index)
                {
                    if tokens[matched[conjunction_index]].to_lowercase() != conjunction {
                        continue;
                    }
                }

                // Flags are read off the tokens surrounding the match.
                let singular_and_approximate =
                    self.is_singular_and_approximate(matched[0], tokens, labels, idx);
                let approximate = self.is_approximate(matched[0], tokens, labels, idx)
                    || singular_and_approximate;
                let singular =
                    self.is_singular(last, tokens, labels, idx) || singular_and_approximate;
                let prepared = self.is_prepared(matched[0], tokens, labels, idx);
                let flags = AmountFlags {
                    approximate,
                    singular,
                    prepared_ingredient: prepared,
                    ..AmountFlags::default()
                };

                let start2 = pattern_def.start2;
                let quantity_1 = &tokens[matched[0]];
                let unit_1 = &tokens[matched[1]];
                let text_1 = format!("{quantity_1} {unit_1}").trim().to_string();
                let first = amount_from_parts(
                    quantity_1,
                    unit_1,
                    &text_1,
                    mean(matched[..2].iter().map(|&i| scores[i])),
                    idx[matched[0]],
                    flags,
                    self.options.string_units,
                );

                let quantity_2 = &tokens[matched[start2]];
                let unit_2 = matched[start2 + 1..]
                    .iter()
                    .map(|&i| tokens[i].clone())
                    .collect::<Vec<_>>()
                    .join(" ");
                let text_2 = format!("{quantity_2} {unit_2}").trim().to_string();
                let second = amount_from_parts(
                    quantity_2,
                    &unit_2,
                    &text_2,
                    mean(matched[start2..].iter().map(|&i| scores[i])),
                    idx[matched[start2]],
                    flags,
                    self.options.string_units,
                );

                composites.push(Amount::Composite(CompositeIngredientAmount::new(
                    vec![first, second],
                    pattern_def.join,
                    pattern_def.subtractive,
                    self.options.volumetric_units,
                )));

                self.consumed.extend(matched.iter().map(|&i| idx[i]));
            }
        }
        composites
    }

    /// Group each quantity with the units that follow it, up to the next
    /// quantity.
    fn fallback_pattern(
        &mut self,
        idx: &[usize],
        tokens: &[String],
        labels: &[Label],
        scores: &[f64],
    ) -> Vec<Amount> {
        // An amount opened directly after one of these tokens relates to
        // the previous amount, e.g. "2 cups (16 oz) water".
        let related_idx: HashSet<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t.as_str(), "(" | "/" | "["))
            .map(|(i, _)| i + 1)
            .collect();

        let mut partials: Vec<PartialAmount> = Vec::new();
        for i in 0..tokens.len() {
            let token = &tokens[i];
            let score = scores[i];

            if labels[i] == Label::Qty {
                if token == "dozen" && i > 0 && labels[i - 1] == Label::Qty {
                    if let Some(last) = partials.last_mut() {
                        last.quantity.push_str(" dozen");
                        last.confidences.push(score);
                    }
                } else {
                    let mut partial =
                        PartialAmount::new(token, idx[i], related_idx.contains(&i));
                    partial.confidences.push(score);
                    partials.push(partial);
                }
            }

            if labels[i] == Label::Unit {
                if partials.is_empty() {
                    // A unit before any quantity opens an amount with no
                    // quantity.
                    partials.push(PartialAmount::new("", idx[i], false));
                }
                if let Some(last) = partials.last_mut() {
                    last.units.push(token.clone());
                    last.confidences.push(score);
                }
            }

            let approximate = self.is_approximate(i, tokens, labels, idx);
            let singular = self.is_singular(i, tokens, labels, idx);
            let singular_and_approximate =
                self.is_singular_and_approximate(i, tokens, labels, idx);
            let prepared = self.is_prepared(i, tokens, labels, idx);
            if let Some(last) = partials.last_mut() {
                last.approximate |= approximate || singular_and_approximate;
                last.singular |= singular || singular_and_approximate;
                last.prepared |= prepared;
            }
        }

        distribute_related_flags(&mut partials);

        partials
            .into_iter()
            .map(|partial| {
                let unit = partial.units.join(" ");
                let text = format!("{} {unit}", partial.quantity).trim().to_string();
                Amount::Single(amount_from_parts(
                    &partial.quantity,
                    &unit,
                    &text,
                    mean(partial.confidences.iter().copied()),
                    partial.starting_index,
                    AmountFlags {
                        approximate: partial.approximate,
                        singular: partial.singular,
                        prepared_ingredient: partial.prepared,
                        ..AmountFlags::default()
                    },
                    self.options.string_units,
                ))
            })
            .collect()
    }

    /// True when the quantity at `i` is preceded by an approximation
    /// marker ("about 3 cups"). The marker token is consumed.
    fn is_approximate(&mut self, i: usize, tokens: &[String], labels: &[Label], idx: &[usize]) -> bool {
        if i == 0 || labels[i] != Label::Qty {
            return false;
        }
        if APPROXIMATE_TOKENS.contains(tokens[i - 1].to_lowercase().as_str()) {
            self.consumed.insert(idx[i - 1]);
            return true;
        }
        // "approx ." tokenizes into two tokens
        if i > 1
            && tokens[i - 1] == "."
            && APPROXIMATE_TOKENS.contains(tokens[i - 2].to_lowercase().as_str())
        {
            self.consumed.insert(idx[i - 1]);
            self.consumed.insert(idx[i - 2]);
            return true;
        }
        false
    }

    /// True when the unit at `i` is followed by a singular marker
    /// ("3 oz each"), optionally through a closing bracket. The marker is
    /// consumed.
    fn is_singular(&mut self, i: usize, tokens: &[String], labels: &[Label], idx: &[usize]) -> bool {
        if labels[i] != Label::Unit {
            return false;
        }
        if i + 1 < tokens.len()
            && SINGULAR_TOKENS.contains(tokens[i + 1].to_lowercase().as_str())
        {
            self.consumed.insert(idx[i + 1]);
            return true;
        }
        if i + 2 < tokens.len()
            && matches!(tokens[i + 1].as_str(), ")" | "]")
            && SINGULAR_TOKENS.contains(tokens[i + 2].to_lowercase().as_str())
        {
            self.consumed.insert(idx[i + 2]);
            return true;
        }
        false
    }

    /// True for a quantity preceded by an approximation marker that is
    /// itself preceded by a singular marker ("each about 1 lb"). Both
    /// markers are consumed.
    fn is_singular_and_approximate(
        &mut self,
        i: usize,
        tokens: &[String],
        labels: &[Label],
        idx: &[usize],
    ) -> bool {
        if i < 2 || labels[i] != Label::Qty {
            return false;
        }
        if APPROXIMATE_TOKENS.contains(tokens[i - 1].to_lowercase().as_str())
            && SINGULAR_TOKENS.contains(tokens[i - 2].to_lowercase().as_str())
        {
            self.consumed.insert(idx[i - 1]);
            self.consumed.insert(idx[i - 2]);
            return true;
        }
        false
    }

    /// True when the quantity at `i` is preceded by a prepared-ingredient
    /// phrase ("to yield 2 cups"), optionally through an approximation
    /// marker. The phrase tokens are consumed.
    fn is_prepared(&mut self, i: usize, tokens: &[String], labels: &[Label], idx: &[usize]) -> bool {
        if i < 2 || labels[i] != Label::Qty {
            return false;
        }
        for phrase in PREPARED_INGREDIENT_PHRASES {
            let preceding: Vec<String> = tokens[i - 2..i]
                .iter()
                .map(|t| t.to_lowercase())
                .collect();
            if preceding == phrase[..] {
                self.consumed.insert(idx[i - 1]);
                self.consumed.insert(idx[i - 2]);
                return true;
            }
            if i > 2
                && APPROXIMATE_TOKENS.contains(tokens[i - 1].to_lowercase().as_str())
                && tokens[i - 3..i - 1]
                    .iter()
                    .map(|t| t.to_lowercase())
                    .collect::<Vec<_>>()
                    == phrase[..]
            {
                self.consumed.insert(idx[i - 2]);
                self.consumed.insert(idx[i - 3]);
                return true;
            }
        }
        false
    }
}

/// Find non-overlapping occurrences of a label pattern, returning the
/// positions of the matching labels in the input list.
fn match_pattern(labels: &[Label], pattern: &[Label], mode: MatchMode) -> Vec<Vec<usize>> {
    let pattern_set: HashSet<Label> = pattern.iter().copied().collect();
    let keep = |label: &Label| match mode {
        MatchMode::IgnoreForeignLabels => pattern_set.contains(label),
        MatchMode::SkipNameLabels => !label.is_name(),
    };

    let filtered: Vec<(usize, Label)> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| keep(label))
        .map(|(i, &label)| (i, label))
        .collect();

    if pattern.len() > filtered.len() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    let mut i = 0;
    while i + pattern.len() <= filtered.len() {
        let window = &filtered[i..i + pattern.len()];
        if window.iter().map(|&(_, l)| l).eq(pattern.iter().copied()) {
            matches.push(window.iter().map(|&(pos, _)| pos).collect());
            i += pattern.len();
        } else {
            i += 1;
        }
    }
    matches
}

/// Build an [`IngredientAmount`] from its token parts, resolving the
/// quantity, mapping the unit and pluralising the output text.
pub(crate) fn amount_from_parts(
    quantity: &str,
    unit: &str,
    text: &str,
    confidence: f64,
    starting_index: usize,
    flags: AmountFlags,
    string_units: bool,
) -> IngredientAmount {
    let resolved = resolve_quantity(quantity);

    // Units stay singular for exactly 1 and for ranges.
    let pluralise = !resolved.range
        && match &resolved.quantity {
            Quantity::Value(v) => *v != 1.0,
            Quantity::Text(t) => !t.is_empty(),
        };

    let mut text = render_fractions_in(text);
    if pluralise {
        text = pluralize_units(&text).into_owned();
    }

    let unit = if string_units {
        let unit = if pluralise {
            pluralize_units(unit).into_owned()
        } else {
            unit.to_string()
        };
        Unit::Other(unit)
    } else {
        match unit.parse::<Unit>() {
            Ok(Unit::Other(other)) if pluralise => Unit::Other(pluralize_units(&other).into_owned()),
            Ok(parsed) => parsed,
            Err(_) => Unit::Other(unit.to_string()),
        }
    };

    IngredientAmount {
        quantity: resolved.quantity,
        quantity_max: resolved.quantity_max,
        unit,
        text,
        confidence: round6(confidence),
        starting_index,
        flags: AmountFlags {
            range: resolved.range,
            multiplier: resolved.multiplier,
            ..flags
        },
    }
}

/// Render any fraction sentinel tokens inside a space-joined string.
fn render_fractions_in(text: &str) -> String {
    text.split(' ')
        .map(|part| {
            if is_fraction_token(part) {
                render_fraction_token(part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn filter_by_index<T>(items: Vec<T>, keep: impl Fn(&usize) -> bool) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep(i))
        .map(|(_, item)| item)
        .collect()
}

fn replace_string_numbers(token: &str) -> String {
    STRING_NUMBER_WORD
        .replace_all(token, |caps: &regex::Captures| {
            let word = caps[1].to_lowercase();
            STRING_NUMBERS
                .iter()
                .find(|&&(w, _)| w == word)
                .map(|&(_, number)| number.to_string())
                .unwrap_or_else(|| caps[1].to_string())
        })
        .into_owned()
}

/// Spread flags across chains of related amounts so that a flag set on
/// any member applies to the whole chain.
fn distribute_related_flags(partials: &mut [PartialAmount]) {
    let mut start = 0;
    while start < partials.len() {
        let mut end = start + 1;
        while end < partials.len() && partials[end].related_to_previous {
            end += 1;
        }

        let group = &mut partials[start..end];
        let approximate = group.iter().any(|p| p.approximate);
        let singular = group.iter().any(|p| p.singular);
        let prepared = group.iter().any(|p| p.prepared);
        for partial in group {
            partial.approximate = approximate;
            partial.singular = singular;
            partial.prepared = prepared;
        }

        start = end;
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserOptions;

    fn labels_of(labels: &[&str]) -> Vec<Label> {
        labels.iter().map(|l| l.parse().unwrap()).collect()
    }

    fn tokens_of(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn parse(
        sentence: &str,
        tokens: &[&str],
        pos: Vec<&'static str>,
        labels: &[&str],
        options: &ParserOptions,
    ) -> crate::output::ParsedIngredient {
        let scores = vec![0.9; tokens.len()];
        PostProcessor::new(
            sentence,
            tokens_of(tokens),
            pos,
            labels_of(labels),
            scores,
            options,
        )
        .parse()
    }

    #[test]
    fn test_match_pattern() {
        let labels = labels_of(&["QTY", "QTY", "UNIT", "UNIT", "COMMENT", "B_NAME_TOK"]);
        let pattern = labels_of(&["QTY", "QTY", "UNIT", "UNIT"]);
        let matches = match_pattern(&labels, &pattern, MatchMode::IgnoreForeignLabels);
        assert_eq!(matches, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_match_pattern_skips_name_labels() {
        let labels = labels_of(&["QTY", "UNIT", "B_NAME_TOK", "COMMENT", "QTY", "UNIT"]);
        let pattern = labels_of(&["QTY", "UNIT", "COMMENT", "QTY", "UNIT"]);
        assert!(match_pattern(&labels, &pattern, MatchMode::IgnoreForeignLabels).is_empty());
        let matches = match_pattern(&labels, &pattern, MatchMode::SkipNameLabels);
        assert_eq!(matches, vec![vec![0, 1, 3, 4, 5]]);
    }

    #[test]
    fn test_match_pattern_non_overlapping() {
        let labels = labels_of(&["QTY", "UNIT", "QTY", "UNIT", "QTY", "UNIT"]);
        let pattern = labels_of(&["QTY", "UNIT"]);
        let matches = match_pattern(&labels, &pattern, MatchMode::IgnoreForeignLabels);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_sizable_unit_pattern() {
        // "2 14 ounce cans of coconut milk"
        let options = ParserOptions::default();
        let parsed = parse(
            "2 14 ounce cans of coconut milk",
            &["2", "14", "ounce", "can", "of", "coconut", "milk"],
            vec!["CD", "CD", "NN", "NN", "IN", "NN", "NN"],
            &["QTY", "QTY", "UNIT", "UNIT", "COMMENT", "B_NAME_TOK", "I_NAME_TOK"],
            &options,
        );

        assert_eq!(parsed.amounts.len(), 2);
        let first = parsed.amounts[0].as_single().unwrap();
        assert_eq!(first.quantity, Quantity::Value(2.0));
        assert_eq!(first.unit, Unit::Other("cans".to_string()));
        assert_eq!(first.text, "2 cans");
        assert!(!first.flags.singular);

        let second = parsed.amounts[1].as_single().unwrap();
        assert_eq!(second.quantity, Quantity::Value(14.0));
        assert_eq!(second.unit, Unit::Ounce);
        assert_eq!(second.text, "14 ounces");
        assert!(second.flags.singular);

        assert_eq!(parsed.names[0].text, "coconut milk");
        assert!(parsed.comment.is_none());
    }

    #[test]
    fn test_sizable_unit_pattern_single_nested() {
        // "1 28 ounce can chickpeas"
        let options = ParserOptions::default();
        let parsed = parse(
            "1 28 ounce can chickpeas",
            &["1", "28", "ounce", "can", "chickpeas"],
            vec!["CD", "CD", "NN", "NN", "NNS"],
            &["QTY", "QTY", "UNIT", "UNIT", "B_NAME_TOK"],
            &options,
        );

        assert_eq!(parsed.amounts.len(), 2);
        let first = parsed.amounts[0].as_single().unwrap();
        assert_eq!(first.quantity, Quantity::Value(1.0));
        assert_eq!(first.unit, Unit::Other("can".to_string()));
        let second = parsed.amounts[1].as_single().unwrap();
        assert_eq!(second.quantity, Quantity::Value(28.0));
        assert!(second.flags.singular);
        assert_eq!(parsed.names[0].text, "chickpeas");
    }

    #[test]
    fn test_composite_lb_oz() {
        let options = ParserOptions::default();
        let parsed = parse(
            "500g/1lb 2oz pecorino romano cheese",
            &["500", "g", "/", "1", "lb", "2", "oz", "pecorino", "romano", "cheese"],
            vec!["CD", "NN", ":", "CD", "NN", "CD", "NN", "NN", "NN", "NN"],
            &[
                "QTY",
                "UNIT",
                "PUNC",
                "QTY",
                "UNIT",
                "QTY",
                "UNIT",
                "B_NAME_TOK",
                "I_NAME_TOK",
                "I_NAME_TOK",
            ],
            &options,
        );

        let composite = parsed
            .amounts
            .iter()
            .find_map(Amount::as_composite)
            .unwrap();
        assert_eq!(composite.amounts.len(), 2);
        assert_eq!(composite.amounts[0].quantity, Quantity::Value(1.0));
        assert_eq!(composite.amounts[0].unit, Unit::Pound);
        assert_eq!(composite.amounts[1].quantity, Quantity::Value(2.0));
        assert_eq!(composite.amounts[1].unit, Unit::Ounce);
        assert_eq!(composite.text, "1 lb 2 oz");
        assert!(!composite.subtractive);
        assert_eq!(composite.starting_index, 3);

        // The 500 g amount still comes out of the fallback pattern.
        let single = parsed
            .amounts
            .iter()
            .find_map(Amount::as_single)
            .unwrap();
        assert_eq!(single.quantity, Quantity::Value(500.0));
        assert_eq!(single.unit, Unit::Gram);
    }

    #[test]
    fn test_composite_plus_with_name_between() {
        // "1/2 cup sugar plus 1 1/2 tablespoons sugar"
        let options = ParserOptions::default();
        let parsed = parse(
            "1/2 cup sugar plus 1 1/2 tablespoons sugar",
            &["#1$2", "cup", "sugar", "plus", "1#1$2", "tablespoon", "sugar"],
            vec!["CD", "NN", "NN", "CC", "CD", "NN", "NN"],
            &["QTY", "UNIT", "B_NAME_TOK", "COMMENT", "QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );

        assert_eq!(parsed.names.len(), 1);
        assert_eq!(parsed.names[0].text, "sugar");

        assert_eq!(parsed.amounts.len(), 1);
        let composite = parsed.amounts[0].as_composite().unwrap();
        assert_eq!(composite.join, " plus ");
        assert_eq!(composite.amounts[0].quantity, Quantity::Value(0.5));
        assert_eq!(composite.amounts[0].unit, Unit::Cup);
        assert_eq!(composite.amounts[1].quantity, Quantity::Value(1.5));
        assert_eq!(composite.amounts[1].unit, Unit::Tablespoon);
        assert_eq!(composite.text, "1/2 cups plus 1 1/2 tablespoons");
    }

    #[test]
    fn test_composite_singular_and_approximate() {
        // "2 large butternut squash, each about 1lb 1oz"
        let options = ParserOptions::default();
        let parsed = parse(
            "2 large butternut squash, each about 1lb 1 oz",
            &[
                "2", "large", "butternut", "squash", ",", "each", "about", "1", "lb", "1", "oz",
            ],
            vec!["CD", "JJ", "NN", "NN", ",", "DT", "IN", "CD", "NN", "CD", "NN"],
            &[
                "QTY",
                "SIZE",
                "B_NAME_TOK",
                "I_NAME_TOK",
                "PUNC",
                "COMMENT",
                "COMMENT",
                "QTY",
                "UNIT",
                "QTY",
                "UNIT",
            ],
            &options,
        );

        assert_eq!(parsed.names[0].text, "butternut squash");
        assert_eq!(parsed.size.as_ref().unwrap().text, "large");

        assert_eq!(parsed.amounts.len(), 2);
        let bare = parsed.amounts[0].as_single().unwrap();
        assert_eq!(bare.quantity, Quantity::Value(2.0));
        assert_eq!(bare.unit, Unit::Other("".to_string()));

        let composite = parsed.amounts[1].as_composite().unwrap();
        for amount in &composite.amounts {
            assert!(amount.flags.approximate);
            assert!(amount.flags.singular);
        }
        assert_eq!(composite.amounts[0].quantity, Quantity::Value(1.0));
        assert_eq!(composite.amounts[0].unit, Unit::Pound);
        assert_eq!(composite.amounts[1].unit, Unit::Ounce);

        // "each about" consumed; comment is empty.
        assert!(parsed.comment.is_none());
    }

    #[test]
    fn test_fallback_approximate() {
        let options = ParserOptions::default();
        let parsed = parse(
            "about 3 cups flour",
            &["about", "3", "cup", "flour"],
            vec!["IN", "CD", "NN", "NN"],
            &["COMMENT", "QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 1);
        let amount = parsed.amounts[0].as_single().unwrap();
        assert!(amount.flags.approximate);
        assert_eq!(amount.quantity, Quantity::Value(3.0));
        assert!(parsed.comment.is_none());
    }

    #[test]
    fn test_fallback_approx_with_period() {
        let options = ParserOptions::default();
        let parsed = parse(
            "approx. 250 g butter",
            &["approx", ".", "250", "g", "butter"],
            vec!["NN", ".", "CD", "NN", "NN"],
            &["COMMENT", "PUNC", "QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );
        let amount = parsed.amounts[0].as_single().unwrap();
        assert!(amount.flags.approximate);
        assert!(parsed.comment.is_none());
    }

    #[test]
    fn test_fallback_singular() {
        let options = ParserOptions::default();
        let parsed = parse(
            "2 fillets salmon, 3 oz each",
            &["2", "fillet", "salmon", ",", "3", "oz", "each"],
            vec!["CD", "NN", "NN", ",", "CD", "NN", "DT"],
            &["QTY", "UNIT", "B_NAME_TOK", "PUNC", "QTY", "UNIT", "COMMENT"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 2);
        let second = parsed.amounts[1].as_single().unwrap();
        assert!(second.flags.singular);
        assert!(!parsed.amounts[0].as_single().unwrap().flags.singular);
    }

    #[test]
    fn test_fallback_prepared_ingredient() {
        let options = ParserOptions::default();
        let parsed = parse(
            "spinach, cooked to yield 1 cup",
            &["spinach", ",", "cooked", "to", "yield", "1", "cup"],
            vec!["NN", ",", "VBN", "TO", "NN", "CD", "NN"],
            &["B_NAME_TOK", "PUNC", "PREP", "COMMENT", "COMMENT", "QTY", "UNIT"],
            &options,
        );
        let amount = parsed.amounts[0].as_single().unwrap();
        assert!(amount.flags.prepared_ingredient);
        assert!(parsed.comment.is_none());
    }

    #[test]
    fn test_fallback_dozen() {
        let options = ParserOptions::default();
        let parsed = parse(
            "1 dozen eggs",
            &["1", "dozen", "eggs"],
            vec!["CD", "CD", "NNS"],
            &["QTY", "QTY", "B_NAME_TOK"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 1);
        let amount = parsed.amounts[0].as_single().unwrap();
        assert_eq!(amount.quantity, Quantity::Text("1 dozen".to_string()));
    }

    #[test]
    fn test_fallback_related_amounts_share_flags() {
        // "about 2 cups (500 ml) stock": the bracketed amount relates to
        // the first, so the approximate flag spreads to both.
        let options = ParserOptions::default();
        let parsed = parse(
            "about 2 cups (500 ml) stock",
            &["about", "2", "cup", "(", "500", "ml", ")", "stock"],
            vec!["IN", "CD", "NN", "(", "CD", "NN", ")", "NN"],
            &["COMMENT", "QTY", "UNIT", "PUNC", "QTY", "UNIT", "PUNC", "B_NAME_TOK"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 2);
        for amount in &parsed.amounts {
            let single = match amount {
                Amount::Single(s) => s,
                Amount::Composite(_) => continue,
            };
            assert!(single.flags.approximate);
        }
    }

    #[test]
    fn test_string_number_qty_replacement() {
        let options = ParserOptions::default();
        let parsed = parse(
            "three large onions",
            &["three", "large", "onions"],
            vec!["CD", "JJ", "NNS"],
            &["QTY", "SIZE", "B_NAME_TOK"],
            &options,
        );
        let amount = parsed.amounts[0].as_single().unwrap();
        assert_eq!(amount.quantity, Quantity::Value(3.0));
    }

    #[test]
    fn test_string_range_qty_collapsed() {
        // "one or two pounds" -> 1-2 pounds
        let options = ParserOptions::default();
        let parsed = parse(
            "one or two pounds butter",
            &["one", "or", "two", "pound", "butter"],
            vec!["CD", "CC", "CD", "NN", "NN"],
            &["QTY", "QTY", "QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 1);
        let amount = parsed.amounts[0].as_single().unwrap();
        assert_eq!(amount.quantity, Quantity::Value(1.0));
        assert_eq!(amount.quantity_max, Quantity::Value(2.0));
        assert!(amount.flags.range);
    }

    #[test]
    fn test_quantities_split_by_and_collapsed() {
        // "one and one-half pounds" style input after string number
        // replacement: "1 and #1$2"
        let options = ParserOptions::default();
        let parsed = parse(
            "1 and 1/2 pounds butter",
            &["1", "and", "#1$2", "pound", "butter"],
            vec!["CD", "CC", "CD", "NN", "NN"],
            &["QTY", "QTY", "QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );
        assert_eq!(parsed.amounts.len(), 1);
        let amount = parsed.amounts[0].as_single().unwrap();
        assert_eq!(amount.quantity, Quantity::Value(1.5));
    }

    #[test]
    fn test_string_units_option() {
        let options = ParserOptions::default().with_string_units(true);
        let parsed = parse(
            "2 cups flour",
            &["2", "cup", "flour"],
            vec!["CD", "NN", "NN"],
            &["QTY", "UNIT", "B_NAME_TOK"],
            &options,
        );
        let amount = parsed.amounts[0].as_single().unwrap();
        assert_eq!(amount.unit, Unit::Other("cups".to_string()));
    }

    #[test]
    fn test_multiplier_quantity() {
        let options = ParserOptions::default();
        let parsed = parse(
            "2x 400 g cans tomatoes",
            &["2x", "400", "g", "can", "tomatoes"],
            vec!["CD", "CD", "NN", "NN", "NNS"],
            &["QTY", "QTY", "UNIT", "UNIT", "B_NAME_TOK"],
            &options,
        );
        let multiplier = parsed
            .amounts
            .iter()
            .filter_map(Amount::as_single)
            .find(|a| a.flags.multiplier)
            .unwrap();
        assert_eq!(multiplier.quantity, Quantity::Value(2.0));
    }

    #[test]
    fn test_amount_from_parts_pluralisation() {
        let amount = amount_from_parts(
            "2",
            "can",
            "2 can",
            0.9,
            0,
            AmountFlags::default(),
            false,
        );
        assert_eq!(amount.text, "2 cans");
        assert_eq!(amount.unit, Unit::Other("cans".to_string()));

        let amount = amount_from_parts(
            "1",
            "can",
            "1 can",
            0.9,
            0,
            AmountFlags::default(),
            false,
        );
        assert_eq!(amount.text, "1 can");
        assert_eq!(amount.unit, Unit::Other("can".to_string()));

        // Ranges do not pluralise.
        let amount = amount_from_parts(
            "1-2",
            "cup",
            "1-2 cup",
            0.9,
            0,
            AmountFlags::default(),
            false,
        );
        assert_eq!(amount.text, "1-2 cup");
        assert!(amount.flags.range);
    }
}
