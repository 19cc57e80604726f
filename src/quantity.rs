//! Free-text ingredient measures: parsing, scaling and gram estimates.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::unit_converter::{is_volume_unit, is_weight_unit, to_grams};

/// Leading run of digits, spaces, dots and slashes.
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[\d./ ]+").expect("valid leading-number regex"));

const UNICODE_FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
];

const COUNT_WORDS: &[&str] = &[
    "whole", "large", "medium", "small", "piece", "pieces", "clove", "cloves", "slice", "slices",
];

/// Ratios this close to 1 leave measures untouched.
const IDENTITY_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQuantity {
    pub name: String,
    pub raw_measure: String,
    pub grams: Option<f64>,
}

impl IngredientQuantity {
    pub fn parse(name: &str, raw_measure: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            raw_measure: raw_measure.trim().to_string(),
            grams: measure_to_grams(raw_measure, name),
        }
    }

    /// Returns a new quantity with the measure rescaled and grams recomputed.
    pub fn scaled(&self, serving_ratio: f64) -> Self {
        let measure = scale_measure(&self.raw_measure, serving_ratio);
        Self::parse(&self.name, &measure)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMeasure {
    pub quantity: Option<f64>,
    /// Lowercased unit word, empty for plain counts.
    pub unit: String,
    /// Text after the unit, untouched.
    pub remainder: String,
}

fn normalize_fractions(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| UNICODE_FRACTIONS.iter().any(|(f, _)| *f == c)) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match UNICODE_FRACTIONS.iter().find(|(f, _)| *f == c) {
            Some((_, ascii)) => {
                if out.chars().last().is_some_and(|p| p.is_ascii_digit()) {
                    out.push(' ');
                }
                out.push_str(ascii);
            }
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn parse_token(token: &str) -> Option<f64> {
    let value = match token.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => token.parse().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Parses `"1 1/2"`, `"0.75"`, `"3/4"` as a sum of space-separated terms.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let mut tokens = text.split_whitespace().peekable();
    tokens.peek()?;
    tokens.map(parse_token).sum()
}

/// Integer when exact after rounding to two decimals, else up to two decimals.
pub fn format_quantity(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Splits a measure into its leading numeric run and the rest.
fn split_leading_number(measure: &str) -> Option<(&str, &str)> {
    let found = LEADING_NUMBER.find(measure)?;
    let run = found.as_str();
    if !run.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((run, &measure[found.end()..]))
}

/// Multiplies the leading quantity in `original_measure` by `serving_ratio`.
///
/// The unit and descriptor suffix are kept verbatim. When there is nothing
/// to scale, or the number cannot be parsed, the input comes back unchanged.
pub fn scale_measure(original_measure: &str, serving_ratio: f64) -> String {
    if (serving_ratio - 1.0).abs() < IDENTITY_EPSILON {
        return original_measure.to_string();
    }
    if !serving_ratio.is_finite() || serving_ratio <= 0.0 {
        return original_measure.to_string();
    }

    let normalized = normalize_fractions(original_measure);
    let Some((run, suffix)) = split_leading_number(&normalized) else {
        return original_measure.to_string();
    };
    let Some(quantity) = parse_quantity(run) else {
        return original_measure.to_string();
    };

    let leading_ws = &run[..run.len() - run.trim_start().len()];
    let trailing_ws = &run[run.trim_end().len()..];
    format!(
        "{leading_ws}{}{trailing_ws}{suffix}",
        format_quantity(quantity * serving_ratio)
    )
}

pub fn parse_measure(raw: &str) -> ParsedMeasure {
    let normalized = normalize_fractions(raw.trim());
    let (quantity, rest) = match split_leading_number(&normalized) {
        Some((run, rest)) => (parse_quantity(run), rest.trim()),
        None => (None, normalized.trim()),
    };

    let lower = rest.to_lowercase();
    if lower.starts_with("fl oz") || lower.starts_with("fl. oz") {
        let cut = if lower.starts_with("fl oz") { 5 } else { 6 };
        return ParsedMeasure {
            quantity,
            unit: "fl oz".to_string(),
            remainder: rest[cut..].trim().trim_start_matches('.').trim().to_string(),
        };
    }

    let (first, remainder) = match rest.split_once(char::is_whitespace) {
        Some((first, remainder)) => (first, remainder.trim()),
        None => (rest, ""),
    };
    let candidate = first
        .trim_end_matches(|c: char| c == '.' || c == ',')
        .to_lowercase();

    if is_weight_unit(&candidate) || is_volume_unit(&candidate) || COUNT_WORDS.contains(&candidate.as_str()) {
        ParsedMeasure {
            quantity,
            unit: candidate,
            remainder: remainder.to_string(),
        }
    } else {
        ParsedMeasure {
            quantity,
            unit: String::new(),
            remainder: rest.to_string(),
        }
    }
}

/// Estimated grams for a measure of a named ingredient.
///
/// A bare unit such as `"pinch"` counts as one of that unit; measures with
/// neither number nor unit (`"to taste"`) have no weight.
pub fn measure_to_grams(measure: &str, ingredient_name: &str) -> Option<f64> {
    let parsed = parse_measure(measure);
    let quantity = match parsed.quantity {
        Some(q) => q,
        None if !parsed.unit.is_empty() => 1.0,
        None => return None,
    };
    Some(to_grams(quantity, &parsed.unit, ingredient_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_mixed_fraction() {
        assert_eq!(scale_measure("1 1/2 cups flour", 2.0), "3 cups flour");
    }

    #[test]
    fn identity_near_one() {
        for m in ["1 1/2 cups flour", "to taste", "2.333 tbsp", " 3 eggs", ""] {
            for r in [1.0, 0.995, 1.009, 0.9901] {
                assert_eq!(scale_measure(m, r), m);
            }
        }
    }

    #[test]
    fn keeps_suffix_verbatim() {
        assert_eq!(scale_measure("1/2 tsp Salt, to taste", 3.0), "1.5 tsp Salt, to taste");
        assert_eq!(scale_measure("200g", 0.5), "100g");
        assert_eq!(scale_measure("2 large Eggs", 1.5), "3 large Eggs");
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(scale_measure("1 cup", 1.0 / 3.0), "0.33 cup");
        assert_eq!(scale_measure("1 cup", 2.0 / 3.0), "0.67 cup");
    }

    #[test]
    fn unparsable_measures_are_unchanged() {
        assert_eq!(scale_measure("to taste", 2.0), "to taste");
        assert_eq!(scale_measure("1/0 cup", 2.0), "1/0 cup");
        assert_eq!(scale_measure("1.2.3 cups", 2.0), "1.2.3 cups");
        assert_eq!(scale_measure(". cups", 2.0), ". cups");
        assert_eq!(scale_measure("2 cups", f64::NAN), "2 cups");
        assert_eq!(scale_measure("2 cups", -1.0), "2 cups");
    }

    #[test]
    fn unicode_fractions() {
        assert_eq!(scale_measure("1½ cups milk", 2.0), "3 cups milk");
        assert_eq!(scale_measure("¼ tsp pepper", 4.0), "1 tsp pepper");
    }

    #[test]
    fn round_trip_restores_quantity() {
        for (measure, original) in [("1 1/2 cups", 1.5), ("3 tbsp", 3.0), ("250 g", 250.0)] {
            for r in [2.0, 0.5, 4.0, 1.5] {
                let there = scale_measure(measure, r);
                let back = scale_measure(&there, 1.0 / r);
                let value = parse_measure(&back).quantity.unwrap();
                assert!((value - original).abs() <= 0.02, "{measure} x{r}: {back}");
            }
        }
    }

    #[test]
    fn parse_quantity_terms() {
        assert_eq!(parse_quantity("1 1/2"), Some(1.5));
        assert_eq!(parse_quantity(" 3/4 "), Some(0.75));
        assert_eq!(parse_quantity("0.5"), Some(0.5));
        assert_eq!(parse_quantity("   "), None);
        assert_eq!(parse_quantity("1//2"), None);
    }

    #[test]
    fn parse_measure_units() {
        let m = parse_measure("2 tbsp chopped");
        assert_eq!(m.quantity, Some(2.0));
        assert_eq!(m.unit, "tbsp");
        assert_eq!(m.remainder, "chopped");

        let m = parse_measure("1 1/2 fl oz");
        assert_eq!(m.quantity, Some(1.5));
        assert_eq!(m.unit, "fl oz");

        let m = parse_measure("2 boneless");
        assert_eq!(m.unit, "");
        assert_eq!(m.remainder, "boneless");

        let m = parse_measure("to taste");
        assert_eq!(m.quantity, None);
    }

    #[test]
    fn grams_from_measures() {
        assert_eq!(measure_to_grams("2 tbsp", "butter"), Some(30.0));
        assert_eq!(measure_to_grams("3", "eggs"), Some(150.0));
        assert_eq!(measure_to_grams("to taste", "salt"), None);
        assert_eq!(measure_to_grams("Pinch", "water"), Some(0.3));
        assert_eq!(measure_to_grams("1kg", "potatoes"), Some(1000.0));
    }

    #[test]
    fn scaled_ingredient_recomputes_grams() {
        let q = IngredientQuantity::parse("butter", "2 tbsp");
        let doubled = q.scaled(2.0);
        assert_eq!(doubled.raw_measure, "4 tbsp");
        assert_eq!(doubled.grams, Some(60.0));
    }
}
