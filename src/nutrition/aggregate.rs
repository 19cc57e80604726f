//! Recipe-level nutrition totals.

use serde::Serialize;
use tracing::debug;

use super::{macro_calories, NutritionProfile, NutritionSource, CALORIE_TOLERANCE_KCAL};
use crate::quantity::IngredientQuantity;

const MIN_RATIO: f64 = 0.01;
const MAX_RATIO: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl Macros {
    fn divided(&self, by: f64) -> Self {
        Self {
            calories: self.calories / by,
            protein: self.protein / by,
            fat: self.fat / by,
            carbs: self.carbs / by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionTotals {
    pub total: Macros,
    pub per_serving: Macros,
    pub servings: u32,
    /// Summed calories disagreed with the macros and were replaced.
    pub calories_reconciled: bool,
    /// Ingredients that fell through to the generic estimate.
    pub estimated_ingredients: Vec<String>,
}

/// How many servings of `profile` the ingredient amounts to.
///
/// Unknown weights and ratios outside `[0.01, 100]` count as one serving.
pub fn serving_ratio(grams: Option<f64>, profile: &NutritionProfile) -> f64 {
    match grams {
        Some(g) => {
            let ratio = g / profile.serving_size;
            if ratio.is_finite() && (MIN_RATIO..=MAX_RATIO).contains(&ratio) {
                ratio
            } else {
                debug!(grams = g, serving_size = profile.serving_size, "serving ratio out of range, using 1");
                1.0
            }
        }
        None => 1.0,
    }
}

pub fn sum_nutrition(items: &[(IngredientQuantity, NutritionProfile)], servings: u32) -> NutritionTotals {
    let mut total = Macros::default();
    let mut estimated_ingredients = Vec::new();

    for (quantity, profile) in items {
        let ratio = serving_ratio(quantity.grams, profile);
        total.calories += profile.calories * ratio;
        total.protein += profile.protein * ratio;
        total.fat += profile.fat * ratio;
        total.carbs += profile.carbs * ratio;
        if profile.source == NutritionSource::GenericFallback {
            estimated_ingredients.push(quantity.name.clone());
        }
    }

    let derived = macro_calories(total.protein, total.carbs, total.fat);
    let calories_reconciled = (total.calories - derived).abs() > CALORIE_TOLERANCE_KCAL;
    if calories_reconciled {
        debug!(summed = total.calories, derived, "replacing summed calories with macro total");
        total.calories = derived;
    }

    let servings = servings.max(1);
    NutritionTotals {
        total,
        per_serving: total.divided(f64::from(servings)),
        servings,
        calories_reconciled,
        estimated_ingredients,
    }
}
