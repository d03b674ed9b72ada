use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon::{SINGULAR_TO_PLURAL, UNITS};

/// Selects the definitions used for the volume units whose size differs
/// between the US customary and imperial systems: cup, pint, quart, gallon
/// and fluid ounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumetricUnits {
    #[default]
    UsCustomary,
    Imperial,
}

/// A canonical measurement unit.
///
/// Unit strings that aren't recognised measurement units (container words
/// like "can", free text like "splash") are carried through as
/// [`Unit::Other`].
#[derive(Clone, PartialEq, Debug, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Milligram,
    Gram,
    Kilogram,
    Ounce,
    Pound,
    Teaspoon,
    Tablespoon,
    Cup,
    FluidOunce,
    Pint,
    Quart,
    Gallon,
    Milliliter,
    Centiliter,
    Deciliter,
    Liter,
    Millimeter,
    Centimeter,
    Meter,
    Inch,
    #[serde(untagged)]
    Other(String),
}

static UNIT_MAPPINGS: &[(&str, Unit)] = &[
    ("mg", Unit::Milligram),
    ("milligram", Unit::Milligram),
    ("g", Unit::Gram),
    ("gram", Unit::Gram),
    ("gramme", Unit::Gram),
    ("kg", Unit::Kilogram),
    ("kilogram", Unit::Kilogram),
    ("oz", Unit::Ounce),
    ("ounce", Unit::Ounce),
    ("lb", Unit::Pound),
    ("pound", Unit::Pound),
    ("tsp", Unit::Teaspoon),
    ("teaspoon", Unit::Teaspoon),
    ("tbsp", Unit::Tablespoon),
    ("tbs", Unit::Tablespoon),
    ("tb", Unit::Tablespoon),
    ("tablespoon", Unit::Tablespoon),
    ("c", Unit::Cup),
    ("cup", Unit::Cup),
    ("fl oz", Unit::FluidOunce),
    ("fluid oz", Unit::FluidOunce),
    ("fl ounce", Unit::FluidOunce),
    ("fluid ounce", Unit::FluidOunce),
    ("pt", Unit::Pint),
    ("pint", Unit::Pint),
    ("qt", Unit::Quart),
    ("quart", Unit::Quart),
    ("gal", Unit::Gallon),
    ("gallon", Unit::Gallon),
    ("ml", Unit::Milliliter),
    ("milliliter", Unit::Milliliter),
    ("millilitre", Unit::Milliliter),
    ("cl", Unit::Centiliter),
    ("centiliter", Unit::Centiliter),
    ("dl", Unit::Deciliter),
    ("deciliter", Unit::Deciliter),
    ("l", Unit::Liter),
    ("liter", Unit::Liter),
    ("litre", Unit::Liter),
    ("mm", Unit::Millimeter),
    ("millimeter", Unit::Millimeter),
    ("millimetre", Unit::Millimeter),
    ("cm", Unit::Centimeter),
    ("centimeter", Unit::Centimeter),
    ("centimetre", Unit::Centimeter),
    ("m", Unit::Meter),
    ("meter", Unit::Meter),
    ("in", Unit::Inch),
    ("inch", Unit::Inch),
];

/// O(1) lookup from string to Unit
static UNIT_MAP: Lazy<HashMap<&'static str, Unit>> = Lazy::new(|| {
    UNIT_MAPPINGS
        .iter()
        .map(|&(s, ref u)| (s, u.clone()))
        .collect()
});

impl Unit {
    /// Canonical singular spelling.
    pub fn to_str(&self) -> &str {
        match self {
            Unit::Milligram => "milligram",
            Unit::Gram => "gram",
            Unit::Kilogram => "kilogram",
            Unit::Ounce => "ounce",
            Unit::Pound => "pound",
            Unit::Teaspoon => "teaspoon",
            Unit::Tablespoon => "tablespoon",
            Unit::Cup => "cup",
            Unit::FluidOunce => "fluid ounce",
            Unit::Pint => "pint",
            Unit::Quart => "quart",
            Unit::Gallon => "gallon",
            Unit::Milliliter => "milliliter",
            Unit::Centiliter => "centiliter",
            Unit::Deciliter => "deciliter",
            Unit::Liter => "liter",
            Unit::Millimeter => "millimeter",
            Unit::Centimeter => "centimeter",
            Unit::Meter => "meter",
            Unit::Inch => "inch",
            Unit::Other(s) => s,
        }
    }

    /// True when the unit maps to a canonical measurement unit rather than
    /// a free string.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Unit::Other(_))
    }

    /// Grams per one of this unit, if it is a mass unit.
    pub fn grams(&self) -> Option<f64> {
        match self {
            Unit::Milligram => Some(0.001),
            Unit::Gram => Some(1.0),
            Unit::Kilogram => Some(1000.0),
            Unit::Ounce => Some(28.349_523_125),
            Unit::Pound => Some(453.592_37),
            _ => None,
        }
    }

    /// Milliliters per one of this unit, if it is a volume unit.
    ///
    /// The system parameter picks the definition of the five units that
    /// differ between US customary and imperial measures.
    pub fn milliliters(&self, system: VolumetricUnits) -> Option<f64> {
        let imperial = system == VolumetricUnits::Imperial;
        match self {
            Unit::Teaspoon => Some(if imperial { 5.919_39 } else { 4.928_922 }),
            Unit::Tablespoon => Some(if imperial { 17.758_16 } else { 14.786_765 }),
            Unit::Cup => Some(if imperial { 284.130_625 } else { 236.588_236 }),
            Unit::FluidOunce => Some(if imperial { 28.413_062_5 } else { 29.573_53 }),
            Unit::Pint => Some(if imperial { 568.261_25 } else { 473.176_473 }),
            Unit::Quart => Some(if imperial { 1_136.522_5 } else { 946.352_946 }),
            Unit::Gallon => Some(if imperial { 4_546.09 } else { 3_785.411_784 }),
            Unit::Milliliter => Some(1.0),
            Unit::Centiliter => Some(10.0),
            Unit::Deciliter => Some(100.0),
            Unit::Liter => Some(1000.0),
            _ => None,
        }
    }

    /// Display string, pluralised when the quantity calls for it.
    ///
    /// Canonical units keep their singular spelling, matching how they are
    /// reported as units rather than words. Free-string units pluralise
    /// through the unit spelling table.
    pub fn display_text(&self, pluralise: bool) -> Cow<'_, str> {
        match self {
            Unit::Other(s) if pluralise => pluralize_units(s),
            _ => Cow::Borrowed(self.to_str()),
        }
    }
}

impl FromStr for Unit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let normalized = singular(&lowered);
        if let Some(unit) = UNIT_MAP.get(&*normalized) {
            return Ok(unit.clone());
        }
        Ok(Unit::Other(s.to_string()))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Singular form of a unit spelling, via the unit table rather than naive
/// suffix stripping so `leaves` becomes `leaf`.
pub fn singular(s: &str) -> Cow<'_, str> {
    match crate::lexicon::PLURAL_TO_SINGULAR.get(s) {
        Some(singular) => Cow::Borrowed(singular),
        None => Cow::Borrowed(s),
    }
}

static SINGULAR_UNIT_WORD: Lazy<Regex> = Lazy::new(|| {
    let mut singulars: Vec<&str> = UNITS.iter().map(|&(_, s)| s).collect();
    singulars.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    #[allow(clippy::expect_used)]
    Regex::new(&format!(r"\b({})\b", singulars.join("|"))).expect("invalid unit word pattern")
});

/// Pluralise every singular unit word in the input.
///
/// ```
/// use ingredient_crf::unit::pluralize_units;
/// assert_eq!(pluralize_units("2 bag"), "2 bags");
/// assert_eq!(pluralize_units("1.5 loaf bread"), "1.5 loaves bread");
/// ```
pub fn pluralize_units(text: &str) -> Cow<'_, str> {
    SINGULAR_UNIT_WORD.replace_all(text, |caps: &regex::Captures| {
        SINGULAR_TO_PLURAL
            .get(&caps[1])
            .copied()
            .unwrap_or(&caps[1])
            .to_string()
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_canonical() {
        assert_eq!("cup".parse::<Unit>(), Ok(Unit::Cup));
        assert_eq!("Cups".parse::<Unit>(), Ok(Unit::Cup));
        assert_eq!("fl oz".parse::<Unit>(), Ok(Unit::FluidOunce));
        assert_eq!("oz".parse::<Unit>(), Ok(Unit::Ounce));
        assert_eq!("can".parse::<Unit>(), Ok(Unit::Other("can".to_string())));
    }

    #[test]
    fn test_volumetric_systems_differ() {
        let us = Unit::Cup.milliliters(VolumetricUnits::UsCustomary).unwrap();
        let imperial = Unit::Cup.milliliters(VolumetricUnits::Imperial).unwrap();
        assert!(imperial > us);
        assert_eq!(Unit::Gram.milliliters(VolumetricUnits::UsCustomary), None);
    }

    #[test]
    fn test_pluralize_units() {
        assert_eq!(pluralize_units("13 ounce"), "13 ounces");
        assert_eq!(pluralize_units("2 can"), "2 cans");
        assert_eq!(pluralize_units("1.5 loaf bread"), "1.5 loaves bread");
        assert_eq!(pluralize_units("no units here"), "no units here");
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Unit::Ounce.display_text(true), "ounce");
        assert_eq!(
            Unit::Other("can".to_string()).display_text(true),
            "cans".to_string()
        );
        assert_eq!(Unit::Other("can".to_string()).display_text(false), "can");
    }
}
