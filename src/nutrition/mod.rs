//! Per-ingredient nutrition lookup with ordered fallback tiers, plus
//! recipe-level totals.

pub mod aggregate;
pub mod ai_estimate;
pub mod manual_table;
pub mod resolver;
pub mod table_loader;
pub mod usda;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use aggregate::{sum_nutrition, NutritionTotals};
pub use ai_estimate::AiNutritionEstimator;
pub use manual_table::ManualNutritionTable;
pub use resolver::NutritionResolver;
pub use usda::UsdaNutritionSource;

/// Allowed gap between stated calories and `4p + 4c + 9f`.
///
/// Used both when validating AI estimates and when reconciling recipe totals.
pub const CALORIE_TOLERANCE_KCAL: f64 = 100.0;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServingUnit {
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NutritionSource {
    PrimaryApi,
    AiEstimate,
    ManualTable,
    GenericFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionProfile {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub serving_size: f64,
    pub serving_unit: ServingUnit,
    pub source: NutritionSource,
}

pub fn macro_calories(protein: f64, carbs: f64, fat: f64) -> f64 {
    protein * KCAL_PER_G_PROTEIN + carbs * KCAL_PER_G_CARBS + fat * KCAL_PER_G_FAT
}

impl NutritionProfile {
    /// Values per 100 g.
    pub fn per_100g(
        calories: f64,
        protein: f64,
        fat: f64,
        carbs: f64,
        source: NutritionSource,
    ) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbs,
            serving_size: 100.0,
            serving_unit: ServingUnit::Grams,
            source,
        }
    }

    /// The last-resort estimate used when every other tier comes up empty.
    pub fn generic() -> Self {
        Self::per_100g(100.0, 5.0, 2.0, 10.0, NutritionSource::GenericFallback)
    }

    fn macros(&self) -> [f64; 4] {
        [self.calories, self.protein, self.fat, self.carbs]
    }

    pub fn macro_calories(&self) -> f64 {
        macro_calories(self.protein, self.carbs, self.fat)
    }

    /// Finite, non-negative, not all zero, and a positive serving size.
    pub fn is_usable(&self) -> bool {
        let macros = self.macros();
        macros.iter().all(|v| v.is_finite() && *v >= 0.0)
            && macros.iter().any(|v| *v > 0.0)
            && self.serving_size.is_finite()
            && self.serving_size > 0.0
    }

    /// Stated calories agree with the macro-derived figure.
    pub fn reconciles(&self) -> bool {
        (self.calories - self.macro_calories()).abs() <= CALORIE_TOLERANCE_KCAL
    }
}

/// One tier of the nutrition fallback chain.
#[async_trait]
pub trait NutritionStrategy: Send + Sync {
    fn source(&self) -> NutritionSource;

    /// A profile for the ingredient, or `None` to defer to the next tier.
    async fn lookup(&self, ingredient: &str, measure: &str) -> Option<NutritionProfile>;
}
