//! Best-effort conversion of `quantity unit ingredient` triples to grams.
//!
//! Weight units convert directly and volume units go through a density
//! table (water when nothing matches). Counted pieces ("2 eggs", "3 cloves
//! garlic") use per-piece weights keyed by ingredient substring. Anything
//! else is passed through unchanged with a warning.

use tracing::warn;

/// Grams per piece for ingredients usually counted rather than measured.
/// First substring match wins, so more specific keys come first.
const SPECIAL_CASES: &[(&str, f64)] = &[
    ("eggplant", 450.0),
    ("egg yolk", 17.0),
    ("egg white", 33.0),
    ("egg", 50.0),
    ("garlic", 3.0),
    ("chicken breast", 174.0),
    ("chicken thigh", 110.0),
    ("onion", 110.0),
    ("shallot", 40.0),
    ("lemon", 58.0),
    ("lime", 44.0),
    ("orange", 130.0),
    ("apple", 180.0),
    ("banana", 118.0),
    ("avocado", 150.0),
    ("potato", 150.0),
    ("tomato", 123.0),
    ("carrot", 60.0),
    ("bell pepper", 120.0),
    ("bay lea", 0.2),
];

const WEIGHT_UNITS: &[(&str, f64)] = &[
    ("g", 1.0),
    ("gr", 1.0),
    ("gram", 1.0),
    ("grams", 1.0),
    ("kg", 1000.0),
    ("kilogram", 1000.0),
    ("kilograms", 1000.0),
    ("mg", 0.001),
    ("oz", 28.35),
    ("ounce", 28.35),
    ("ounces", 28.35),
    ("lb", 453.6),
    ("lbs", 453.6),
    ("pound", 453.6),
    ("pounds", 453.6),
];

const VOLUME_UNITS: &[(&str, f64)] = &[
    ("ml", 1.0),
    ("milliliter", 1.0),
    ("milliliters", 1.0),
    ("millilitre", 1.0),
    ("cl", 10.0),
    ("dl", 100.0),
    ("l", 1000.0),
    ("liter", 1000.0),
    ("liters", 1000.0),
    ("litre", 1000.0),
    ("tsp", 5.0),
    ("teaspoon", 5.0),
    ("teaspoons", 5.0),
    ("tbsp", 15.0),
    ("tbs", 15.0),
    ("tblsp", 15.0),
    ("tablespoon", 15.0),
    ("tablespoons", 15.0),
    ("cup", 240.0),
    ("cups", 240.0),
    ("fl oz", 29.57),
    ("pint", 473.0),
    ("pints", 473.0),
    ("quart", 946.0),
    ("quarts", 946.0),
    ("gallon", 3785.0),
    ("shot", 44.0),
    ("shots", 44.0),
    ("jigger", 44.0),
    ("part", 30.0),
    ("parts", 30.0),
    ("splash", 5.0),
    ("dash", 0.6),
    ("dashes", 0.6),
    ("pinch", 0.3),
    ("pinches", 0.3),
];

/// Units that mean "one of the thing"; these defer to the special cases.
const COUNT_UNITS: &[&str] = &[
    "", "whole", "large", "medium", "small", "piece", "pieces", "clove", "cloves", "slice",
    "slices", "x",
];

/// Grams per millilitre, matched by substring. Butter is intentionally
/// absent: spoon measures of butter are treated as water-dense.
const DENSITIES: &[(&str, f64)] = &[
    ("oil", 0.92),
    ("honey", 1.42),
    ("syrup", 1.33),
    ("molasses", 1.4),
    ("flour", 0.53),
    ("brown sugar", 0.93),
    ("powdered sugar", 0.56),
    ("sugar", 0.85),
    ("salt", 1.2),
    ("milk", 1.03),
    ("cream", 1.01),
    ("rice", 0.85),
    ("oats", 0.36),
    ("cocoa", 0.42),
    ("cheese", 0.45),
    ("yogurt", 1.05),
];

fn normalize_unit(unit: &str) -> String {
    unit.trim().trim_end_matches('.').to_lowercase()
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn is_weight_unit(unit: &str) -> bool {
    lookup(WEIGHT_UNITS, &normalize_unit(unit)).is_some()
}

pub fn is_volume_unit(unit: &str) -> bool {
    lookup(VOLUME_UNITS, &normalize_unit(unit)).is_some()
}

/// Grams per piece for count-style ingredients, first substring match.
pub fn special_case_grams(ingredient_name: &str) -> Option<f64> {
    let name = ingredient_name.trim().to_lowercase();
    SPECIAL_CASES
        .iter()
        .find(|(key, _)| name.contains(key))
        .map(|(_, grams)| *grams)
}

/// Density in g/ml for an ingredient, defaulting to water.
pub fn density_for(ingredient_name: &str) -> f64 {
    let name = ingredient_name.trim().to_lowercase();
    DENSITIES
        .iter()
        .find(|(key, _)| name.contains(key))
        .map(|(_, density)| *density)
        .unwrap_or(1.0)
}

/// Millilitres for a quantity in a volume unit, if the unit is one.
pub fn to_milliliters(quantity: f64, unit: &str) -> Option<f64> {
    lookup(VOLUME_UNITS, &normalize_unit(unit)).map(|ml| quantity * ml)
}

/// Converts `quantity unit` of `ingredient_name` into grams.
///
/// Never fails: unknown units return `quantity` unchanged and log a warning.
pub fn to_grams(quantity: f64, unit: &str, ingredient_name: &str) -> f64 {
    if !quantity.is_finite() || quantity < 0.0 {
        warn!(quantity, unit, ingredient = ingredient_name, "invalid quantity, using 0 g");
        return 0.0;
    }

    let unit = normalize_unit(unit);

    if let Some(grams_per_unit) = lookup(WEIGHT_UNITS, &unit) {
        return quantity * grams_per_unit;
    }

    if let Some(ml_per_unit) = lookup(VOLUME_UNITS, &unit) {
        return quantity * ml_per_unit * density_for(ingredient_name);
    }

    if COUNT_UNITS.contains(&unit.as_str()) {
        if let Some(grams_per_piece) = special_case_grams(ingredient_name) {
            return quantity * grams_per_piece;
        }
    }

    warn!(
        quantity,
        unit = %unit,
        ingredient = ingredient_name,
        "unrecognized unit, passing quantity through"
    );
    quantity
}
