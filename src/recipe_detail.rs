//! Recipe detail view: fetch, scale to a serving count, attach nutrition.
//!
//! Measures are always fetched for the recipe's base serving count and scaled
//! locally, so a serving change never needs another round trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::PersistedCache;
use crate::error::SourceError;
use crate::models::{PerServing, Recipe};
use crate::nutrition::{sum_nutrition, NutritionResolver, NutritionTotals};
use crate::quantity::IngredientQuantity;
use crate::sources::BackendClient;

pub const DEFAULT_MEAL_SERVINGS: u32 = 4;
pub const DEFAULT_DRINK_SERVINGS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    Meal,
    Cocktail,
}

impl DetailKind {
    pub fn default_servings(self) -> u32 {
        match self {
            DetailKind::Meal => DEFAULT_MEAL_SERVINGS,
            DetailKind::Cocktail => DEFAULT_DRINK_SERVINGS,
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetailKind::Meal => "meal",
            DetailKind::Cocktail => "cocktail",
        })
    }
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("{kind} {id} not found")]
    NotFound { kind: DetailKind, id: String },
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl DetailError {
    /// Short text suitable for showing in place of the detail view.
    pub fn user_message(&self) -> String {
        match self {
            DetailError::NotFound { kind: DetailKind::Meal, .. } => "Recipe not found.".to_string(),
            DetailError::NotFound { kind: DetailKind::Cocktail, .. } => "Cocktail not found.".to_string(),
            DetailError::Source(e) if e.is_rate_limited() => {
                "The recipe service is busy right now. Please try again later.".to_string()
            }
            DetailError::Source(_) => "Could not load this recipe. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledIngredient {
    pub name: String,
    pub original_measure: String,
    pub measure: String,
    pub grams: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DetailNutrition {
    /// Figures the catalog shipped with the recipe.
    Reported { per_serving: PerServing, servings: u32 },
    /// Summed from per-ingredient lookups.
    Estimated(NutritionTotals),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub kind: DetailKind,
    pub recipe: Recipe,
    pub base_servings: u32,
    pub servings: u32,
    pub ingredients: Vec<ScaledIngredient>,
    pub nutrition: DetailNutrition,
}

impl RecipeDetail {
    fn base_quantities(&self) -> Vec<IngredientQuantity> {
        self.recipe
            .ingredients
            .iter()
            .map(|i| IngredientQuantity::parse(&i.name, &i.measure))
            .collect()
    }

    /// Recomputes every measure for a new serving count. Zero is treated as one.
    pub fn rescale(&mut self, servings: u32) {
        let servings = servings.max(1);
        let ratio = f64::from(servings) / f64::from(self.base_servings);
        self.ingredients = self
            .base_quantities()
            .iter()
            .map(|base| {
                let scaled = base.scaled(ratio);
                ScaledIngredient {
                    name: base.name.clone(),
                    original_measure: base.raw_measure.clone(),
                    measure: scaled.raw_measure,
                    grams: scaled.grams,
                }
            })
            .collect();
        self.servings = servings;
    }
}

fn base_servings(recipe: &Recipe, kind: DetailKind) -> u32 {
    recipe
        .nutrition
        .as_ref()
        .and_then(|n| n.servings)
        .filter(|s| *s > 0)
        .unwrap_or_else(|| kind.default_servings())
}

fn reported_nutrition(recipe: &Recipe, base: u32) -> Option<DetailNutrition> {
    let reported = recipe.nutrition.as_ref()?;
    reported.per_serving.calories?;
    Some(DetailNutrition::Reported {
        per_serving: reported.per_serving.clone(),
        servings: base,
    })
}

pub struct RecipeDetailService {
    backend: BackendClient,
    resolver: Arc<NutritionResolver>,
    cache: Option<PersistedCache>,
}

impl RecipeDetailService {
    pub fn new(backend: BackendClient, resolver: Arc<NutritionResolver>) -> Self {
        Self {
            backend,
            resolver,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: PersistedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn meal(&self, id: &str, servings: Option<u32>) -> Result<RecipeDetail, DetailError> {
        self.load(DetailKind::Meal, id, servings).await
    }

    pub async fn cocktail(&self, id: &str, servings: Option<u32>) -> Result<RecipeDetail, DetailError> {
        self.load(DetailKind::Cocktail, id, servings).await
    }

    async fn fetch(&self, kind: DetailKind, id: &str) -> Result<Recipe, DetailError> {
        let requested = kind.default_servings();
        let key = format!("{kind}-{id}-{requested}");
        if let Some(cache) = &self.cache {
            if let Some(recipe) = cache.get::<Recipe>(&key).await {
                debug!(%kind, id, "detail served from persisted cache");
                return Ok(recipe);
            }
        }

        let fetched = match kind {
            DetailKind::Meal => self.backend.meal_detail(id, requested).await?,
            DetailKind::Cocktail => self.backend.cocktail_detail(id, requested).await?,
        };
        let recipe = fetched.ok_or_else(|| DetailError::NotFound {
            kind,
            id: id.to_string(),
        })?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &recipe).await {
                warn!(%kind, id, error = %e, "could not persist recipe detail");
            }
        }
        Ok(recipe)
    }

    pub async fn load(&self, kind: DetailKind, id: &str, servings: Option<u32>) -> Result<RecipeDetail, DetailError> {
        let recipe = self.fetch(kind, id).await?;
        let base = base_servings(&recipe, kind);

        let nutrition = match reported_nutrition(&recipe, base) {
            Some(reported) => reported,
            None => {
                let quantities: Vec<IngredientQuantity> = recipe
                    .ingredients
                    .iter()
                    .map(|i| IngredientQuantity::parse(&i.name, &i.measure))
                    .collect();
                let resolved = self.resolver.resolve_all(&quantities).await;
                DetailNutrition::Estimated(sum_nutrition(&resolved, base))
            }
        };

        let mut detail = RecipeDetail {
            kind,
            recipe,
            base_servings: base,
            servings: base,
            ingredients: Vec::new(),
            nutrition,
        };
        detail.rescale(servings.unwrap_or(base));
        info!(%kind, id, servings = detail.servings, "recipe detail loaded");
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipeIngredient, ReportedNutrition};

    fn detail(recipe: Recipe, base: u32) -> RecipeDetail {
        let mut d = RecipeDetail {
            kind: DetailKind::Meal,
            recipe,
            base_servings: base,
            servings: base,
            ingredients: Vec::new(),
            nutrition: DetailNutrition::Reported {
                per_serving: PerServing::default(),
                servings: base,
            },
        };
        d.rescale(base);
        d
    }

    fn pancakes() -> Recipe {
        let mut r = Recipe::new("backend", "1", "Pancakes", false);
        r.ingredients = vec![
            RecipeIngredient { name: "Flour".into(), measure: "1 1/2 cups".into() },
            RecipeIngredient { name: "Eggs".into(), measure: "2".into() },
            RecipeIngredient { name: "Salt".into(), measure: "to taste".into() },
        ];
        r
    }

    #[test]
    fn rescale_scales_from_base() {
        let mut d = detail(pancakes(), 4);
        assert_eq!(d.ingredients[0].measure, "1 1/2 cups");
        d.rescale(8);
        assert_eq!(d.ingredients[0].measure, "3 cups");
        assert_eq!(d.ingredients[1].measure, "4");
        assert_eq!(d.ingredients[1].grams, Some(200.0));
        assert_eq!(d.ingredients[2].measure, "to taste");
        d.rescale(2);
        assert_eq!(d.ingredients[1].measure, "1");
        assert_eq!(d.ingredients[0].original_measure, "1 1/2 cups");
    }

    #[test]
    fn base_servings_prefer_reported() {
        let mut r = pancakes();
        assert_eq!(base_servings(&r, DetailKind::Meal), 4);
        assert_eq!(base_servings(&r, DetailKind::Cocktail), 1);
        r.nutrition = Some(ReportedNutrition {
            per_serving: PerServing { calories: Some(250.0), ..Default::default() },
            servings: Some(6),
        });
        assert_eq!(base_servings(&r, DetailKind::Meal), 6);
        assert!(matches!(
            reported_nutrition(&r, 6),
            Some(DetailNutrition::Reported { servings: 6, .. })
        ));
    }

    #[test]
    fn not_found_message() {
        let e = DetailError::NotFound { kind: DetailKind::Cocktail, id: "9".into() };
        assert_eq!(e.user_message(), "Cocktail not found.");
        assert_eq!(e.to_string(), "cocktail 9 not found");
    }
}
