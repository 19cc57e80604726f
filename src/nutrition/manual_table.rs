//! Static per-100 g nutrition values, the third tier.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::{NutritionProfile, NutritionSource, NutritionStrategy};

/// One table row; values per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualNutritionRow {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl ManualNutritionRow {
    pub fn new(name: impl Into<String>, calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            calories,
            protein,
            fat,
            carbs,
        }
    }

    pub fn to_profile(&self) -> NutritionProfile {
        NutritionProfile::per_100g(
            self.calories,
            self.protein,
            self.fat,
            self.carbs,
            NutritionSource::ManualTable,
        )
    }
}

// name, kcal, protein, fat, carbs
const BUILTIN_ROWS: &[(&str, f64, f64, f64, f64)] = &[
    ("chicken", 165.0, 31.0, 3.6, 0.0),
    ("chicken breast", 165.0, 31.0, 3.6, 0.0),
    ("chicken thigh", 209.0, 26.0, 10.9, 0.0),
    ("beef", 250.0, 26.0, 15.0, 0.0),
    ("ground beef", 254.0, 17.2, 20.0, 0.0),
    ("pork", 242.0, 27.0, 14.0, 0.0),
    ("bacon", 541.0, 37.0, 42.0, 1.4),
    ("lamb", 294.0, 25.0, 21.0, 0.0),
    ("salmon", 208.0, 20.0, 13.0, 0.0),
    ("tuna", 132.0, 28.0, 1.0, 0.0),
    ("shrimp", 99.0, 24.0, 0.3, 0.2),
    ("prawns", 99.0, 24.0, 0.3, 0.2),
    ("egg", 155.0, 13.0, 11.0, 1.1),
    ("tofu", 76.0, 8.0, 4.8, 1.9),
    ("milk", 61.0, 3.2, 3.3, 4.8),
    ("cheese", 402.0, 25.0, 33.0, 1.3),
    ("parmesan", 431.0, 38.0, 29.0, 4.1),
    ("yogurt", 59.0, 10.0, 0.4, 3.6),
    ("cream", 340.0, 2.8, 36.0, 2.8),
    ("butter", 717.0, 0.9, 81.0, 0.1),
    ("olive oil", 884.0, 0.0, 100.0, 0.0),
    ("vegetable oil", 884.0, 0.0, 100.0, 0.0),
    ("flour", 364.0, 10.0, 1.0, 76.0),
    ("sugar", 387.0, 0.0, 0.0, 100.0),
    ("brown sugar", 380.0, 0.1, 0.0, 98.0),
    ("honey", 304.0, 0.3, 0.0, 82.0),
    ("rice", 130.0, 2.7, 0.3, 28.0),
    ("pasta", 131.0, 5.0, 1.1, 25.0),
    ("spaghetti", 158.0, 5.8, 0.9, 31.0),
    ("bread", 265.0, 9.0, 3.2, 49.0),
    ("potato", 77.0, 2.0, 0.1, 17.0),
    ("sweet potato", 86.0, 1.6, 0.1, 20.0),
    ("onion", 40.0, 1.1, 0.1, 9.3),
    ("garlic", 149.0, 6.4, 0.5, 33.0),
    ("tomato", 18.0, 0.9, 0.2, 3.9),
    ("carrot", 41.0, 0.9, 0.2, 9.6),
    ("broccoli", 34.0, 2.8, 0.4, 7.0),
    ("spinach", 23.0, 2.9, 0.4, 3.6),
    ("mushroom", 22.0, 3.1, 0.3, 3.3),
    ("bell pepper", 31.0, 1.0, 0.3, 6.0),
    ("lemon", 29.0, 1.1, 0.3, 9.3),
    ("lime", 30.0, 0.7, 0.2, 10.5),
    ("apple", 52.0, 0.3, 0.2, 14.0),
    ("banana", 89.0, 1.1, 0.3, 23.0),
    ("avocado", 160.0, 2.0, 15.0, 9.0),
    ("beans", 127.0, 8.7, 0.5, 23.0),
    ("lentils", 116.0, 9.0, 0.4, 20.0),
    ("chickpeas", 164.0, 8.9, 2.6, 27.0),
    ("almonds", 579.0, 21.0, 50.0, 22.0),
    ("peanut butter", 588.0, 25.0, 50.0, 20.0),
    ("coconut milk", 230.0, 2.3, 24.0, 6.0),
    ("vodka", 231.0, 0.0, 0.0, 0.0),
    ("gin", 263.0, 0.0, 0.0, 0.0),
    ("rum", 231.0, 0.0, 0.0, 0.0),
    ("tequila", 231.0, 0.0, 0.0, 0.0),
    ("whiskey", 250.0, 0.0, 0.0, 0.1),
    ("orange juice", 45.0, 0.7, 0.2, 10.4),
    ("simple syrup", 260.0, 0.0, 0.0, 65.0),
];

/// Category keyword patterns with a representative per-100 g row, checked in order.
static CATEGORY_RULES: LazyLock<Vec<(Regex, ManualNutritionRow)>> = LazyLock::new(|| {
    [
        (
            r"\b(meat|steak|fillet|filet|fish|cod|haddock|turkey|duck|veal|sausage|ham|mince|chop)s?\b",
            ManualNutritionRow::new("protein-heavy", 200.0, 25.0, 10.0, 0.0),
        ),
        (
            r"\b(oil|lard|ghee|margarine|shortening|dripping|mayonnaise|nuts?|seeds?)\b",
            ManualNutritionRow::new("fat-heavy", 700.0, 2.0, 75.0, 3.0),
        ),
        (
            r"\b(lettuce|cabbage|kale|celery|cucumber|zucchini|courgette|leek|pepper|chilli|chili|squash|greens?|herbs?|parsley|coriander|cilantro|basil|peas|vegetables?)\b",
            ManualNutritionRow::new("vegetable", 30.0, 2.0, 0.3, 5.0),
        ),
        (
            r"\b(noodles?|oats|cereal|couscous|quinoa|tortillas?|cornmeal|polenta)\b",
            ManualNutritionRow::new("grain", 350.0, 10.0, 2.0, 70.0),
        ),
        (
            r"\b(liqueur|vermouth|brandy|cognac|schnapps|bitters|wine)\b",
            ManualNutritionRow::new("spirit", 250.0, 0.0, 0.0, 15.0),
        ),
    ]
    .into_iter()
    .map(|(pattern, row)| (Regex::new(pattern).expect("valid category regex"), row))
    .collect()
});

/// Matches by exact name, then by the longest key contained in the name, then
/// by category keywords.
pub struct ManualNutritionTable {
    rows: Vec<ManualNutritionRow>,
}

impl Default for ManualNutritionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualNutritionTable {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Built-in rows plus `extra`; an extra row replaces a built-in of the same name.
    pub fn with_rows(extra: Vec<ManualNutritionRow>) -> Self {
        let mut rows: Vec<ManualNutritionRow> = BUILTIN_ROWS
            .iter()
            .map(|(name, kcal, p, f, c)| ManualNutritionRow::new(*name, *kcal, *p, *f, *c))
            .filter(|row| !extra.iter().any(|e| e.name == row.name))
            .collect();
        rows.extend(extra);
        // Longest first so substring matching prefers "olive oil" over "oil".
        rows.sort_by(|a, b| b.name.len().cmp(&a.name.len()));
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, ingredient: &str) -> Option<NutritionProfile> {
        let name = ingredient.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        if let Some(row) = self.rows.iter().find(|r| r.name == name) {
            return Some(row.to_profile());
        }
        if let Some(row) = self.rows.iter().find(|r| contains_word(&name, &r.name)) {
            debug!(ingredient, matched = %row.name, "manual table substring match");
            return Some(row.to_profile());
        }
        CATEGORY_RULES
            .iter()
            .find(|(pattern, _)| pattern.is_match(&name))
            .map(|(_, row)| {
                debug!(ingredient, category = %row.name, "manual table category match");
                row.to_profile()
            })
    }
}

/// `key` occurs in `name` on word boundaries, so "egg" does not match "eggplant".
/// A plural `s`/`es` before the boundary is allowed.
fn contains_word(name: &str, key: &str) -> bool {
    name.match_indices(key).any(|(start, _)| {
        let end = start + key.len();
        let before_ok = name[..start].chars().next_back().map_or(true, |c| !c.is_alphanumeric());
        let after = &name[end..];
        let at_boundary = |rest: &str| rest.chars().next().map_or(true, |c| !c.is_alphanumeric());
        let after_ok = at_boundary(after)
            || after.strip_prefix("es").is_some_and(at_boundary)
            || after.strip_prefix('s').is_some_and(at_boundary);
        before_ok && after_ok
    })
}

#[async_trait]
impl NutritionStrategy for ManualNutritionTable {
    fn source(&self) -> NutritionSource {
        NutritionSource::ManualTable
    }

    async fn lookup(&self, ingredient: &str, _measure: &str) -> Option<NutritionProfile> {
        self.find(ingredient)
    }
}
