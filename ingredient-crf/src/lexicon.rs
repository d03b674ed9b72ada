//! Static token tables shared across the pipeline.
//!
//! Ordering inside the tables matters where noted: alternations built from
//! them are longest-first so abbreviated units never shadow full words.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Plural unit spelling mapped to its singular form.
///
/// Used to singularise tokens before feature extraction and to restore or
/// apply plurals in the output text.
pub static UNITS: &[(&str, &str)] = &[
    ("bags", "bag"),
    ("balls", "ball"),
    ("bars", "bar"),
    ("batons", "baton"),
    ("blocks", "block"),
    ("bottles", "bottle"),
    ("boxes", "box"),
    ("buckets", "bucket"),
    ("bulbs", "bulb"),
    ("bunches", "bunch"),
    ("cans", "can"),
    ("centimeters", "centimeter"),
    ("centimetres", "centimetre"),
    ("chunks", "chunk"),
    ("cloves", "clove"),
    ("containers", "container"),
    ("cubes", "cube"),
    ("cups", "cup"),
    ("dashes", "dash"),
    ("drops", "drop"),
    ("ears", "ear"),
    ("envelopes", "envelope"),
    ("fillets", "fillet"),
    ("gallons", "gallon"),
    ("glasses", "glass"),
    ("grams", "gram"),
    ("grammes", "gramme"),
    ("handfuls", "handful"),
    ("heads", "head"),
    ("inches", "inch"),
    ("jars", "jar"),
    ("kilograms", "kilogram"),
    ("knobs", "knob"),
    ("lbs", "lb"),
    ("leaves", "leaf"),
    ("liters", "liter"),
    ("litres", "litre"),
    ("loaves", "loaf"),
    ("milliliters", "milliliter"),
    ("millilitres", "millilitre"),
    ("ounces", "ounce"),
    ("packages", "package"),
    ("packets", "packet"),
    ("pieces", "piece"),
    ("pinches", "pinch"),
    ("pints", "pint"),
    ("pods", "pod"),
    ("pounds", "pound"),
    ("quarts", "quart"),
    ("rashers", "rasher"),
    ("sachets", "sachet"),
    ("scoops", "scoop"),
    ("sheets", "sheet"),
    ("slabs", "slab"),
    ("slices", "slice"),
    ("sprigs", "sprig"),
    ("squares", "square"),
    ("stalks", "stalk"),
    ("stems", "stem"),
    ("sticks", "stick"),
    ("strips", "strip"),
    ("tablespoons", "tablespoon"),
    ("teaspoons", "teaspoon"),
    ("tbsps", "tbsp"),
    ("tsps", "tsp"),
    ("tins", "tin"),
    ("wedges", "wedge"),
];

/// Unit abbreviations and spellings that never pluralise.
static UNIT_ABBREVIATIONS: &[&str] = &[
    "c", "cl", "cm", "dl", "fl", "g", "gal", "kg", "l", "lb", "mg", "ml", "mm", "oz", "pt", "qt",
    "tb", "tbs", "tbsp", "tsp",
];

/// Map from plural to singular unit spelling.
pub static PLURAL_TO_SINGULAR: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| UNITS.iter().copied().collect());

/// Map from singular to plural unit spelling.
pub static SINGULAR_TO_PLURAL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| UNITS.iter().map(|&(p, s)| (s, p)).collect());

/// Every unit spelling the normalizer recognises: singular and plural forms
/// plus abbreviations.
pub static FLATTENED_UNITS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    UNITS
        .iter()
        .flat_map(|&(plural, singular)| [plural, singular])
        .chain(UNIT_ABBREVIATIONS.iter().copied())
        .collect()
});

/// Unit spellings sorted longest first, for building regex alternations
/// where a short unit must not shadow a longer one (`l` vs `lb`).
pub static UNITS_LONGEST_FIRST: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut units: Vec<&str> = FLATTENED_UNITS.iter().copied().collect();
    units.extend(["in", "x"]);
    units.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    units
});

/// Units that are also common food words, e.g. a clove of garlic vs ground
/// cloves. The labeler gets these as a dedicated feature.
pub static AMBIGUOUS_UNITS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "clove", "cloves", "ear", "ears", "head", "heads", "leaf", "leaves", "square", "squares",
        "stalk", "stalks", "stem", "stems", "stick", "sticks", "wedge", "wedges",
    ]
    .into_iter()
    .collect()
});

/// Container words that close the sizable-unit pattern, e.g.
/// "2 14 ounce cans".
pub static SIZABLE_UNITS: &[&str] = &[
    "bag",
    "block",
    "bottle",
    "box",
    "bucket",
    "can",
    "container",
    "envelope",
    "jar",
    "loaf",
    "package",
    "packet",
    "piece",
    "sachet",
    "slice",
    "tin",
];

/// Size modifiers. Used to trim multi-ingredient phrases and to retag
/// tokens for the compound-sentence recognizer.
pub static SIZES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "small",
        "medium",
        "large",
        "big",
        "little",
        "jumbo",
        "baby",
        "mini",
        "thick",
        "thin",
        "extra-large",
    ]
    .into_iter()
    .collect()
});

/// Number words and their numeric replacements.
pub static STRING_NUMBERS: &[(&str, &str)] = &[
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
];

/// Unicode vulgar fractions mapped to a space-prefixed ASCII form.
///
/// The leading space keeps `3½` from becoming `31/2`; the fraction
/// identification step tolerates the space when building sentinels.
pub static UNICODE_FRACTIONS: &[(&str, &str)] = &[
    ("½", " 1/2"),
    ("⅓", " 1/3"),
    ("⅔", " 2/3"),
    ("¼", " 1/4"),
    ("¾", " 3/4"),
    ("⅕", " 1/5"),
    ("⅖", " 2/5"),
    ("⅗", " 3/5"),
    ("⅘", " 4/5"),
    ("⅙", " 1/6"),
    ("⅚", " 5/6"),
    ("⅛", " 1/8"),
    ("⅜", " 3/8"),
    ("⅝", " 5/8"),
    ("⅞", " 7/8"),
];

/// Stop words that are dropped from text fields when they appear in
/// isolation and `discard_isolated_stop_words` is set.
pub static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "as", "at", "but", "for", "from", "if", "in", "into", "of", "on", "or",
        "the", "to", "with",
    ]
    .into_iter()
    .collect()
});

/// Tokens preceding a quantity that mark the amount as approximate.
pub static APPROXIMATE_TOKENS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "about",
        "approx",
        "approximately",
        "almost",
        "around",
        "nearly",
        "roughly",
    ]
    .into_iter()
    .collect()
});

/// Tokens following a unit that mark the amount as singular.
pub static SINGULAR_TOKENS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["each", "apiece", "both"].into_iter().collect());

/// Two-token phrases preceding a quantity that mark the amount as applying
/// to the prepared ingredient, e.g. "sifted flour to yield 2 cups".
pub static PREPARED_INGREDIENT_PHRASES: &[[&str; 2]] = &[
    ["to", "yield"],
    ["to", "make"],
    ["to", "give"],
    ["to", "produce"],
];

/// Stemmed adjectives that are ambiguous at the head of an ingredient name
/// (temperature vs spiciness, and similar) and are stripped before
/// foundation-food matching.
pub static AMBIGUOUS_ADJECTIVES: &[&str] = &["hot", "cool", "strong", "hard"];

/// True if both spellings refer to the same unit, e.g. `c` and `cup`.
pub fn is_unit_synonym(a: &str, b: &str) -> bool {
    use crate::unit::Unit;
    use std::str::FromStr;

    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return true;
    }
    match (Unit::from_str(&a), Unit::from_str(&b)) {
        (Ok(ua), Ok(ub)) => !matches!(ua, Unit::Other(_)) && ua == ub,
        _ => false,
    }
}
