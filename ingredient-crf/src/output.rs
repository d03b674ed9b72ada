//! Structured output types returned by the parser.

use std::fmt;

use crate::error::{ParseError, ParseResult};
use crate::unit::{Unit, VolumetricUnits};

/// A parsed quantity: a number where the text resolved, otherwise the raw
/// string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Value(f64),
    Text(String),
}

impl Quantity {
    pub fn as_value(&self) -> Option<f64> {
        match self {
            Quantity::Value(v) => Some(*v),
            Quantity::Text(_) => None,
        }
    }

    /// True when this quantity is exactly 1, which keeps units singular.
    pub fn is_one(&self) -> bool {
        self.as_value() == Some(1.0)
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Quantity::Text(t) if t.is_empty())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Quantity::Value(v) => write!(f, "{}", format_value(*v)),
            Quantity::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Format a float with up to three decimal places, without trailing zeros.
pub(crate) fn format_value(value: f64) -> String {
    let mut formatted = format!("{value:.3}");
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }
    formatted
}

/// Flags attached to an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountFlags {
    /// The amount is approximate ("about 3 cups").
    pub approximate: bool,
    /// The amount refers to one item of the ingredient ("each").
    pub singular: bool,
    /// The quantity is a range; `quantity` and `quantity_max` differ.
    pub range: bool,
    /// The quantity is a multiplier ("2x").
    pub multiplier: bool,
    /// The amount applies to the ingredient after preparation.
    pub prepared_ingredient: bool,
}

/// A (quantity, unit) pair parsed from the sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientAmount {
    /// Parsed quantity; for a range, the lower limit.
    pub quantity: Quantity,
    /// Upper limit for a range, otherwise equal to `quantity`.
    pub quantity_max: Quantity,
    /// Canonical unit where recognised, free string otherwise.
    pub unit: Unit,
    /// Text of the amount, e.g. "2 cups".
    pub text: String,
    /// Mean marginal probability of the contributing tokens, 0 to 1.
    pub confidence: f64,
    /// Index of the first contributing token in the tokenized sentence.
    pub starting_index: usize,
    pub flags: AmountFlags,
}

/// Two or more amounts that combine into one, e.g. "1 lb 2 oz" or
/// "1 cup plus 1 tablespoon".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeIngredientAmount {
    /// Child amounts in sentence order.
    pub amounts: Vec<IngredientAmount>,
    /// Text joining the amounts, e.g. " plus ".
    pub join: String,
    /// When true the amounts combine subtractively.
    pub subtractive: bool,
    pub text: String,
    pub confidence: f64,
    pub starting_index: usize,
    /// Volume definitions used by [`CompositeIngredientAmount::combined`].
    pub volumetric_units: VolumetricUnits,
}

impl CompositeIngredientAmount {
    /// Build a composite amount, deriving text, confidence and starting
    /// index from the children.
    pub fn new(
        amounts: Vec<IngredientAmount>,
        join: &str,
        subtractive: bool,
        volumetric_units: VolumetricUnits,
    ) -> Self {
        let texts: Vec<&str> = amounts.iter().map(|a| a.text.as_str()).collect();
        let text = if join.is_empty() {
            texts.join(" ")
        } else {
            texts.join(join)
        };
        let confidence = mean(amounts.iter().map(|a| a.confidence));
        let starting_index = amounts
            .iter()
            .map(|a| a.starting_index)
            .min()
            .unwrap_or_default();
        CompositeIngredientAmount {
            amounts,
            join: join.to_string(),
            subtractive,
            text,
            confidence,
            starting_index,
            volumetric_units,
        }
    }

    /// Combine the child amounts into a single value in the first child's
    /// unit.
    ///
    /// All children must carry numeric quantities and units sharing a
    /// dimension (all mass or all volume).
    pub fn combined(&self) -> ParseResult<(f64, Unit)> {
        let system = self.volumetric_units;
        let first = self
            .amounts
            .first()
            .ok_or_else(|| ParseError::IncompatibleAmounts {
                reason: "no amounts to combine".to_string(),
            })?;

        enum Dimension {
            Mass,
            Volume,
        }
        let (dimension, first_factor) = if let Some(grams) = first.unit.grams() {
            (Dimension::Mass, grams)
        } else if let Some(ml) = first.unit.milliliters(system) {
            (Dimension::Volume, ml)
        } else {
            return Err(ParseError::IncompatibleAmounts {
                reason: format!("unit '{}' is not convertible", first.unit),
            });
        };

        let mut total = 0.0;
        for (i, amount) in self.amounts.iter().enumerate() {
            let value = amount.quantity.as_value().ok_or_else(|| {
                ParseError::IncompatibleAmounts {
                    reason: format!("quantity '{}' is not numeric", amount.quantity),
                }
            })?;
            let factor = match dimension {
                Dimension::Mass => amount.unit.grams(),
                Dimension::Volume => amount.unit.milliliters(system),
            }
            .ok_or_else(|| ParseError::IncompatibleAmounts {
                reason: format!("unit '{}' is not convertible", amount.unit),
            })?;

            let contribution = value * factor / first_factor;
            if self.subtractive && i > 0 {
                total -= contribution;
            } else {
                total += contribution;
            }
        }

        Ok((total, first.unit.clone()))
    }
}

/// Either kind of amount, in the order they appear in the sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Composite(CompositeIngredientAmount),
    Single(IngredientAmount),
}

impl Amount {
    pub fn starting_index(&self) -> usize {
        match self {
            Amount::Single(a) => a.starting_index,
            Amount::Composite(c) => c.starting_index,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Amount::Single(a) => &a.text,
            Amount::Composite(c) => &c.text,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Amount::Single(a) => a.confidence,
            Amount::Composite(c) => c.confidence,
        }
    }

    pub fn as_single(&self) -> Option<&IngredientAmount> {
        match self {
            Amount::Single(a) => Some(a),
            Amount::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeIngredientAmount> {
        match self {
            Amount::Composite(c) => Some(c),
            Amount::Single(_) => None,
        }
    }
}

/// A labeled free-text field: name, preparation, comment, size or purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientText {
    pub text: String,
    /// Mean marginal probability of the contributing tokens, 0 to 1.
    pub confidence: f64,
    /// Index of the first contributing token in the tokenized sentence.
    pub starting_index: usize,
}

/// Catalog groupings of foundation foods, most preferred last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdcDataType {
    SurveyFnddsFood,
    SrLegacyFood,
    FoundationFood,
}

impl FdcDataType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "foundation_food" => Some(FdcDataType::FoundationFood),
            "sr_legacy_food" => Some(FdcDataType::SrLegacyFood),
            "survey_fndds_food" => Some(FdcDataType::SurveyFnddsFood),
            _ => None,
        }
    }
}

/// A foundation food matched to a parsed ingredient name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundationFood {
    /// Catalog description of the matched entry.
    pub text: String,
    /// Match confidence, 0 to 1.
    pub confidence: f64,
    pub fdc_id: u32,
    pub category: String,
    pub data_type: FdcDataType,
    /// Index into [`ParsedIngredient::names`] this match belongs to.
    pub name_index: usize,
}

/// Structured data parsed from one ingredient sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    /// Parsed ingredient names, in sentence order. More than one entry
    /// means the sentence offered alternatives.
    pub names: Vec<IngredientText>,
    pub size: Option<IngredientText>,
    /// Amounts ordered by their first token.
    pub amounts: Vec<Amount>,
    pub preparation: Option<IngredientText>,
    pub comment: Option<IngredientText>,
    pub purpose: Option<IngredientText>,
    pub foundation_foods: Vec<FoundationFood>,
    /// The original input sentence.
    pub sentence: String,
}

impl ParsedIngredient {
    /// Mark amounts as applying to the prepared ingredient when the
    /// preparation text sits between the amount and a name, in either
    /// order ("100 g sifted flour", "onion, sliced (about 1 cup)").
    pub(crate) fn propagate_prepared_ingredient(&mut self) {
        let Some(prep) = &self.preparation else {
            return;
        };
        let prep_index = prep.starting_index;
        let name_indices: Vec<usize> = self.names.iter().map(|n| n.starting_index).collect();
        if name_indices.is_empty() {
            return;
        }

        for amount in &mut self.amounts {
            if let Amount::Single(single) = amount {
                let start = single.starting_index;
                let between = name_indices.iter().any(|&name_index| {
                    (start < prep_index && prep_index < name_index)
                        || (name_index < prep_index && prep_index < start)
                });
                if between {
                    single.flags.prepared_ingredient = true;
                }
            }
        }
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for value in values {
        total += value;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Unit;

    fn amount(quantity: f64, unit: Unit, text: &str, starting_index: usize) -> IngredientAmount {
        IngredientAmount {
            quantity: Quantity::Value(quantity),
            quantity_max: Quantity::Value(quantity),
            unit,
            text: text.to_string(),
            confidence: 0.9,
            starting_index,
            flags: AmountFlags::default(),
        }
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(0.5), "0.5");
        assert_eq!(format_value(1.0 / 3.0), "0.333");
        assert_eq!(format_value(14.0), "14");
    }

    #[test]
    fn test_composite_derived_fields() {
        let composite = CompositeIngredientAmount::new(
            vec![
                amount(1.0, Unit::Pound, "1 lb", 3),
                amount(2.0, Unit::Ounce, "2 oz", 5),
            ],
            "",
            false,
            VolumetricUnits::UsCustomary,
        );
        assert_eq!(composite.text, "1 lb 2 oz");
        assert_eq!(composite.starting_index, 3);
        assert!((composite.confidence - 0.9).abs() < 1e-9);

        let composite = CompositeIngredientAmount::new(
            vec![
                amount(0.5, Unit::Cup, "1/2 cup", 0),
                amount(1.5, Unit::Tablespoon, "1 1/2 tablespoons", 4),
            ],
            " plus ",
            false,
            VolumetricUnits::UsCustomary,
        );
        assert_eq!(composite.text, "1/2 cup plus 1 1/2 tablespoons");
    }

    #[test]
    fn test_composite_combined_mass() {
        let composite = CompositeIngredientAmount::new(
            vec![
                amount(1.0, Unit::Pound, "1 lb", 0),
                amount(2.0, Unit::Ounce, "2 oz", 2),
            ],
            "",
            false,
            VolumetricUnits::UsCustomary,
        );
        let (value, unit) = composite.combined().unwrap();
        assert_eq!(unit, Unit::Pound);
        assert!((value - 1.125).abs() < 1e-9);
    }

    #[test]
    fn test_composite_combined_subtractive() {
        let composite = CompositeIngredientAmount::new(
            vec![
                amount(1.0, Unit::Cup, "1 cup", 0),
                amount(1.0, Unit::Tablespoon, "1 tablespoon", 2),
            ],
            " minus ",
            true,
            VolumetricUnits::UsCustomary,
        );
        let (value, unit) = composite.combined().unwrap();
        assert_eq!(unit, Unit::Cup);
        assert!(value < 1.0 && value > 0.9);
    }

    #[test]
    fn test_composite_combined_incompatible() {
        let composite = CompositeIngredientAmount::new(
            vec![
                amount(1.0, Unit::Pound, "1 lb", 0),
                amount(1.0, Unit::Cup, "1 cup", 2),
            ],
            "",
            false,
            VolumetricUnits::UsCustomary,
        );
        assert!(composite.combined().is_err());

        let composite = CompositeIngredientAmount::new(
            vec![amount(1.0, Unit::Other("can".to_string()), "1 can", 0)],
            "",
            false,
            VolumetricUnits::UsCustomary,
        );
        assert!(composite.combined().is_err());
    }

    #[test]
    fn test_prepared_ingredient_propagation() {
        // amount ... prep ... name
        let mut parsed = ParsedIngredient {
            names: vec![IngredientText {
                text: "flour".to_string(),
                confidence: 0.99,
                starting_index: 4,
            }],
            size: None,
            amounts: vec![Amount::Single(amount(100.0, Unit::Gram, "100 g", 0))],
            preparation: Some(IngredientText {
                text: "sifted".to_string(),
                confidence: 0.97,
                starting_index: 2,
            }),
            comment: None,
            purpose: None,
            foundation_foods: vec![],
            sentence: "100 g sifted flour".to_string(),
        };
        parsed.propagate_prepared_ingredient();
        let single = parsed.amounts[0].as_single().unwrap();
        assert!(single.flags.prepared_ingredient);

        // prep before both amount and name: flag must not be set
        let mut parsed = ParsedIngredient {
            names: vec![IngredientText {
                text: "onion".to_string(),
                confidence: 0.99,
                starting_index: 2,
            }],
            size: None,
            amounts: vec![Amount::Single(amount(1.0, Unit::Other("".to_string()), "1", 1))],
            preparation: Some(IngredientText {
                text: "sliced".to_string(),
                confidence: 0.97,
                starting_index: 0,
            }),
            comment: None,
            purpose: None,
            foundation_foods: vec![],
            sentence: "sliced 1 onion".to_string(),
        };
        parsed.propagate_prepared_ingredient();
        let single = parsed.amounts[0].as_single().unwrap();
        assert!(!single.flags.prepared_ingredient);
    }

    #[test]
    fn test_data_type_preference_ordering() {
        assert!(FdcDataType::FoundationFood > FdcDataType::SrLegacyFood);
        assert!(FdcDataType::SrLegacyFood > FdcDataType::SurveyFnddsFood);
        assert_eq!(
            FdcDataType::parse("sr_legacy_food"),
            Some(FdcDataType::SrLegacyFood)
        );
        assert_eq!(FdcDataType::parse("unknown"), None);
    }
}
