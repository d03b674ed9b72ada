//! Sentence normalization.
//!
//! An ordered sequence of deterministic rewrites that brings free-text
//! ingredient sentences into the standard form the tokenizer and feature
//! emitter expect. The order of the steps is load-bearing: fractions must
//! be identified before quantities and units are split, ranges are only
//! collapsed after duplicate units have been merged, and so on.
//!
//! Fractions are rewritten to a sentinel form that survives tokenization:
//! `1/2` becomes `#1$2` and `2 3/4` becomes `2#3$4`. The post-processor
//! renders the sentinel back to text where the token ends up in a text
//! field.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::lexicon::{
    is_unit_synonym, FLATTENED_UNITS, STRING_NUMBERS, UNICODE_FRACTIONS, UNITS_LONGEST_FIRST,
};

/// Matches `[int ]num/den` fraction parts.
static FRACTION_PARTS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\d*\s*\d/\d+").expect("invalid fraction parts pattern")
});

/// Matches a complete fraction sentinel token, e.g. `#1$2` or `1#2$3`.
pub(crate) static FRACTION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d*#\d+\$\d+$").expect("invalid fraction token pattern")
});

/// Quantity followed directly (or through a hyphen) by a unit.
///
/// The final group stands in for a negative lookahead: matching one
/// following character that may not be a letter (other than `x`, so
/// constructs like `2cmx2cm` still split) keeps `c` from matching the
/// start of an arbitrary word. The rewrite runs to fixpoint because that
/// following character may itself start the next quantity.
static QUANTITY_UNITS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(&format!(
        r"(\d)-?({})([^a-wyzA-WYZ]|$)",
        UNITS_LONGEST_FIRST.join("|")
    ))
    .expect("invalid quantity-units pattern")
});

static UNITS_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(&format!(r"({})(\d)", UNITS_LONGEST_FIRST.join("|")))
        .expect("invalid units-quantity pattern")
});

static UNITS_HYPHEN_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(&format!(r"({})-(\d)", UNITS_LONGEST_FIRST.join("|")))
        .expect("invalid units-hyphen-quantity pattern")
});

static STRING_QUANTITY_HYPHEN: Lazy<Regex> = Lazy::new(|| {
    let numbers: Vec<&str> = STRING_NUMBERS.iter().map(|&(word, _)| word).collect();
    #[allow(clippy::expect_used)]
    Regex::new(&format!(
        r"(?i)\b({})\b-\b({})\b",
        numbers.join("|"),
        UNITS_LONGEST_FIRST.join("|")
    ))
    .expect("invalid string-quantity-hyphen pattern")
});

/// String range e.g. `1 to 2`, `8.5 or 12`. Fractions are assumed to be in
/// sentinel form already. A leading zero not followed by a decimal point
/// does not match, protecting text like "Type 00 or 1 flour".
static STRING_RANGE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"(0\.[0-9]|[1-9][0-9.]*?|\d*#\d+\$\d+)\s*(-)?\s*(to|or)\s*(-)*\s*((0\.[0-9]+|[1-9][0-9.]*?|\d*#\d+\$\d+)(-)?)",
    )
    .expect("invalid string range pattern")
});

/// Range where the unit appears after both quantities, e.g. `100 g - 200 g`.
static DUPE_UNIT_RANGES: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"(?i)([0-9.]+|\d*#\d+\$\d+)\s([a-zA-Z]+)\s*(?:-|to|or)\s*([0-9.]+|\d*#\d+\$\d+)\s([a-zA-Z]+)",
    )
    .expect("invalid dupe unit ranges pattern")
});

/// Decimal or fraction sentinel followed by a lone `x`.
static QUANTITY_X: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"([0-9.]+|\d*#\d+\$\d+)\s[xX]\s*").expect("invalid quantity-x pattern")
});

/// Range with white space around the hyphen, e.g. `0.5 - 1`.
static EXPANDED_RANGE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d)\s*-\s*([\d#])").expect("invalid expanded range pattern")
});

/// Quantities split by "and", e.g. `1 and 1/2`, raw or sentinel form.
static FRACTION_SPLIT_AND: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+)\s+and\s+(\d/\d+)").expect("invalid fraction-and pattern")
});

static FRACTION_SPLIT_AND_SENTINEL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d+)\s+and\s+#(\d+\$\d+)").expect("invalid sentinel fraction-and pattern")
});

static CONSECUTIVE_SPACES: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\s+").expect("invalid spaces pattern")
});

/// Normalise a sentence prior to tokenization and feature extraction.
pub fn normalize(sentence: &str) -> String {
    let steps: &[fn(&str) -> String] = &[
        replace_en_em_dash,
        replace_html_fractions,
        replace_unicode_fractions,
        combine_quantities_split_by_and,
        identify_fractions,
        split_quantity_and_units,
        remove_unit_trailing_period,
        replace_string_range,
        replace_dupe_unit_ranges,
        merge_quantity_x,
        collapse_ranges,
    ];

    let mut sentence = sentence.to_string();
    for step in steps {
        sentence = step(&sentence);
    }
    sentence.trim().to_string()
}

/// Replace en-dashes with hyphens and em-dashes with spaced hyphens.
fn replace_en_em_dash(sentence: &str) -> String {
    sentence.replace('–', "-").replace('—', " - ")
}

/// Unescape HTML entities so `&frac12;` becomes `½`.
fn replace_html_fractions(sentence: &str) -> String {
    if !sentence.contains('&') {
        return sentence.to_string();
    }

    let mut out = String::with_capacity(sentence.len());
    let mut rest = sentence;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            // Entities are short; anything longer is not one.
            Some(end) if end <= 9 => {
                let entity = &tail[1..end];
                if let Some(decoded) = decode_entity(entity) {
                    out.push_str(&decoded);
                } else {
                    out.push_str(&tail[..=end]);
                }
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "amp" => Some("&"),
        "nbsp" => Some(" "),
        "frac12" => Some("½"),
        "frac13" => Some("⅓"),
        "frac23" => Some("⅔"),
        "frac14" => Some("¼"),
        "frac34" => Some("¾"),
        "frac15" => Some("⅕"),
        "frac25" => Some("⅖"),
        "frac35" => Some("⅗"),
        "frac45" => Some("⅘"),
        "frac16" => Some("⅙"),
        "frac56" => Some("⅚"),
        "frac18" => Some("⅛"),
        "frac38" => Some("⅜"),
        "frac58" => Some("⅝"),
        "frac78" => Some("⅞"),
        _ => None,
    };
    if let Some(named) = named {
        return Some(named.to_string());
    }

    let code = entity.strip_prefix('#')?;
    let value = if let Some(hex) = code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        code.parse::<u32>().ok()?
    };
    char::from_u32(value).map(String::from)
}

/// Replace unicode vulgar fractions with space-prefixed ASCII equivalents.
fn replace_unicode_fractions(sentence: &str) -> String {
    let mut sentence = sentence.to_string();
    for &(unicode, ascii) in UNICODE_FRACTIONS {
        if sentence.contains(unicode) {
            sentence = sentence.replace(unicode, ascii);
        }
    }
    sentence
}

/// Combine quantities split by "and" into a single fraction, e.g.
/// `1 and 1/2` becomes `1 1/2`. Also accepts the sentinel form so the
/// post-processor can reuse this on already-identified fractions.
pub(crate) fn combine_quantities_split_by_and(sentence: &str) -> String {
    let sentence = FRACTION_SPLIT_AND.replace_all(sentence, "$1 $2");
    FRACTION_SPLIT_AND_SENTINEL
        .replace_all(&sentence, "$1#$2")
        .into_owned()
}

/// Rewrite fractions to the sentinel form that survives tokenization.
///
/// When a short fraction is a substring of a longer one elsewhere in the
/// sentence (`1/2` and `1 1/2`), the longest match is replaced first so
/// the shorter replacement can't corrupt it.
fn identify_fractions(sentence: &str) -> String {
    let sentence = sentence.replace('\u{2044}', "/");

    let mut matches: Vec<String> = FRACTION_PARTS
        .find_iter(&sentence)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    if matches.is_empty() {
        return sentence;
    }

    matches.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut sentence = sentence;
    for m in matches {
        let mut replacement = m.replace('/', "$");
        if replacement.contains(char::is_whitespace) {
            replacement = CONSECUTIVE_SPACES.replace_all(&replacement, "#").into_owned();
        } else {
            replacement.insert(0, '#');
        }
        sentence = sentence.replace(&m, &replacement);
    }
    sentence
}

/// Insert a space between quantities and units that abut each other.
fn split_quantity_and_units(sentence: &str) -> String {
    // Run to fixpoint: the consumed trailing character may start the next
    // quantity-unit pair, as in "2lb1oz".
    let mut sentence = sentence.to_string();
    loop {
        let next = QUANTITY_UNITS.replace_all(&sentence, "$1 $2$3").into_owned();
        if next == sentence {
            break;
        }
        sentence = next;
    }
    let sentence = UNITS_QUANTITY.replace_all(&sentence, "$1 $2");
    let sentence = UNITS_HYPHEN_QUANTITY.replace_all(&sentence, "$1 - $2");
    STRING_QUANTITY_HYPHEN
        .replace_all(&sentence, "$1 $2")
        .into_owned()
}

/// Remove trailing periods from abbreviated units, e.g. `tsp.` -> `tsp`.
fn remove_unit_trailing_period(sentence: &str) -> String {
    const UNITS_WITH_PERIOD: &[&str] = &[
        "tsp.", "tsps.", "tbsp.", "tbsps.", "tbs.", "tb.", "lb.", "lbs.", "oz.",
    ];

    let mut sentence = sentence.to_string();
    for unit in UNITS_WITH_PERIOD {
        let without = &unit[..unit.len() - 1];
        sentence = sentence.replace(unit, without);

        let mut capitalized: String = unit[..1].to_uppercase();
        capitalized.push_str(&unit[1..]);
        let mut capitalized_without: String = without[..1].to_uppercase();
        capitalized_without.push_str(&without[1..]);
        sentence = sentence.replace(&capitalized, &capitalized_without);
    }
    sentence
}

/// Rewrite ranges written with "to" or "or" into hyphenated form, e.g.
/// `1 to 2` -> `1-2`.
pub(crate) fn replace_string_range(sentence: &str) -> String {
    STRING_RANGE.replace_all(sentence, "$1-$5").into_owned()
}

/// Collapse ranges where the same unit appears after both quantities, e.g.
/// `100 g - 200 g` -> `100-200 g`.
fn replace_dupe_unit_ranges(sentence: &str) -> String {
    let mut replacements: Vec<(String, String)> = Vec::new();
    for caps in DUPE_UNIT_RANGES.captures_iter(sentence) {
        let (quantity1, unit1) = (&caps[1], &caps[2]);
        let (quantity2, unit2) = (&caps[3], &caps[4]);

        if unit1 != unit2 && !is_unit_synonym(unit1, unit2) {
            continue;
        }
        if !FLATTENED_UNITS.contains(unit1.to_lowercase().as_str()) {
            continue;
        }

        replacements.push((caps[0].to_string(), format!("{quantity1}-{quantity2} {unit1}")));
    }

    let mut sentence = sentence.to_string();
    for (from, to) in replacements {
        sentence = sentence.replace(&from, &to);
    }
    sentence
}

/// Merge a quantity followed by a lone `x` into a single token, e.g.
/// `4 x 100 g` -> `4x 100 g`.
fn merge_quantity_x(sentence: &str) -> String {
    QUANTITY_X.replace_all(sentence, "${1}x ").into_owned()
}

/// Collapse white space inside ranges, e.g. `8 - 10` -> `8-10`.
fn collapse_ranges(sentence: &str) -> String {
    EXPANDED_RANGE
        .replace_all(sentence, |caps: &Captures| {
            format!("{}-{}", &caps[1], &caps[2])
        })
        .into_owned()
}

/// True if the token is a fraction sentinel (`#1$2`, `1#1$2`) or a
/// hyphenated range of sentinels (`#1$4-#1$2`).
pub fn is_fraction_token(token: &str) -> bool {
    !token.is_empty() && token.split('-').all(|part| FRACTION_TOKEN.is_match(part))
}

/// Render a fraction sentinel back to readable text: `1#1$2` -> `1 1/2`.
/// A hyphenated range of sentinels keeps the hyphen tight: `#1$4-#1$2`
/// -> `1/4-1/2`.
pub fn render_fraction_token(token: &str) -> String {
    token
        .replace('#', " ")
        .replace('$', "/")
        .trim()
        .replace("- ", "-")
}
