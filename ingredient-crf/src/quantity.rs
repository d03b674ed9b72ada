//! Resolution of quantity token strings into numeric values.
//!
//! By the time the post-processor sees a QTY token it is one of: a decimal
//! (`2`, `0.5`), a fraction sentinel (`#1$2`, `1#1$2`), a hyphenated range
//! of either (`1-2`, `#1$4-#1$2`), a multiplier (`2x`) or free text that
//! never resolved (`1 dozen`). Anything unresolvable stays a string; that
//! is not an error.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, opt},
    error::context,
    number::complete::double,
    IResult, Parser,
};
use nom_language::error::VerboseError;

use crate::output::Quantity;

pub(crate) type Res<T, U> = IResult<T, U, VerboseError<T>>;

/// A quantity string resolved to its value(s) and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuantity {
    pub quantity: Quantity,
    pub quantity_max: Quantity,
    pub range: bool,
    pub multiplier: bool,
}

/// Parses the fraction sentinel form `[int]#num$den` into a decimal.
fn fraction_sentinel(input: &str) -> Res<&str, f64> {
    context("fraction_sentinel", (opt(digit1), tag("#"), digit1, tag("$"), digit1))
        .parse(input)
        .map(|(next_input, (whole, _, numerator, _, denominator))| {
            let whole: f64 = whole.and_then(|w| w.parse().ok()).unwrap_or(0.0);
            let numerator: f64 = numerator.parse().unwrap_or(0.0);
            let denominator: f64 = denominator.parse().unwrap_or(1.0);
            let fraction = if denominator == 0.0 {
                0.0
            } else {
                numerator / denominator
            };
            (next_input, whole + fraction)
        })
}

/// A single numeric value: fraction sentinel or decimal.
fn numeric(input: &str) -> Res<&str, f64> {
    context("numeric", alt((fraction_sentinel, double))).parse(input)
}

/// A hyphenated range of numeric values.
fn numeric_range(input: &str) -> Res<&str, (f64, f64)> {
    context("numeric_range", (numeric, tag("-"), numeric))
        .parse(input)
        .map(|(next_input, (start, _, end))| (next_input, (start, end)))
}

/// A multiplier: numeric value followed by `x`.
fn numeric_multiplier(input: &str) -> Res<&str, f64> {
    context("multiplier", (numeric, tag("x")))
        .parse(input)
        .map(|(next_input, (value, _))| (next_input, value))
}

/// Resolve a quantity string.
///
/// ```
/// use ingredient_crf::quantity::resolve_quantity;
/// use ingredient_crf::output::Quantity;
///
/// let resolved = resolve_quantity("#1$2");
/// assert_eq!(resolved.quantity, Quantity::Value(0.5));
///
/// let resolved = resolve_quantity("1-2");
/// assert!(resolved.range);
/// assert_eq!(resolved.quantity, Quantity::Value(1.0));
/// assert_eq!(resolved.quantity_max, Quantity::Value(2.0));
///
/// let resolved = resolve_quantity("1 dozen");
/// assert_eq!(resolved.quantity, Quantity::Text("1 dozen".to_string()));
/// ```
pub fn resolve_quantity(quantity: &str) -> ResolvedQuantity {
    if let Ok((_, value)) = all_consuming(numeric).parse(quantity) {
        return ResolvedQuantity {
            quantity: Quantity::Value(value),
            quantity_max: Quantity::Value(value),
            range: false,
            multiplier: false,
        };
    }

    if let Ok((_, (start, end))) = all_consuming(numeric_range).parse(quantity) {
        return ResolvedQuantity {
            quantity: Quantity::Value(start.min(end)),
            quantity_max: Quantity::Value(start.max(end)),
            range: true,
            multiplier: false,
        };
    }

    if let Ok((_, value)) = all_consuming(numeric_multiplier).parse(quantity) {
        return ResolvedQuantity {
            quantity: Quantity::Value(value),
            quantity_max: Quantity::Value(value),
            range: false,
            multiplier: true,
        };
    }

    ResolvedQuantity {
        quantity: Quantity::Text(quantity.to_string()),
        quantity_max: Quantity::Text(quantity.to_string()),
        range: false,
        multiplier: false,
    }
}
