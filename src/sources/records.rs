//! Wire records shared by the backend and the public meal/cocktail catalogs.
//!
//! Both catalogs number ingredients as `strIngredient1..N` / `strMeasure1..N`
//! (20 for meals, 15 for drinks). The backend reuses the same shape and may
//! attach a `nutrition` block.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{Recipe, RecipeIngredient, ReportedNutrition};

pub const MEAL_MAX_INGREDIENTS: usize = 20;
pub const DRINK_MAX_INGREDIENTS: usize = 15;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogRecord {
    #[serde(alias = "idMeal", alias = "idDrink", default)]
    pub id: Option<Value>,
    #[serde(alias = "strMeal", alias = "strDrink", default)]
    pub title: Option<String>,
    #[serde(alias = "strMealThumb", alias = "strDrinkThumb", alias = "image", default)]
    pub thumb: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strAlcoholic", default)]
    pub alcoholic: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub nutrition: Option<ReportedNutrition>,
    #[serde(flatten)]
    pub numbered: HashMap<String, Value>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl CatalogRecord {
    fn numbered_text(&self, prefix: &str, index: usize) -> Option<String> {
        self.numbered
            .get(&format!("{prefix}{index}"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Ingredient/measure pairs in listing order; blank slots are skipped.
    pub fn ingredients(&self, max: usize) -> Vec<RecipeIngredient> {
        (1..=max)
            .filter_map(|i| {
                let name = self.numbered_text("strIngredient", i)?;
                let measure = self.numbered_text("strMeasure", i).unwrap_or_default();
                Some(RecipeIngredient { name, measure })
            })
            .collect()
    }

    pub fn into_recipe(self, source: &str, is_drink: bool) -> Option<Recipe> {
        let Some(id) = self.id.as_ref().and_then(id_text) else {
            debug!(source, "skipping record without id");
            return None;
        };
        let Some(title) = non_empty(self.title.clone()) else {
            debug!(source, id = %id, "skipping record without title");
            return None;
        };

        let max = if is_drink { DRINK_MAX_INGREDIENTS } else { MEAL_MAX_INGREDIENTS };
        let mut recipe = Recipe::new(source, id, title, is_drink);
        recipe.ingredients = self.ingredients(max);
        recipe.image_url = non_empty(self.thumb);
        recipe.instructions = non_empty(self.instructions);
        recipe.category = non_empty(self.category);
        recipe.area = non_empty(self.area).or_else(|| non_empty(self.alcoholic));
        recipe.youtube = non_empty(self.youtube);
        recipe.nutrition = self.nutrition;
        Some(recipe)
    }
}

/// `{ "meals": [...], "drinks": [...] }` where either list may be absent,
/// `null`, or a placeholder string such as `"None Found"`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogEnvelope {
    #[serde(default)]
    pub meals: Value,
    #[serde(default)]
    pub drinks: Value,
}

fn records_from(value: &Value) -> Vec<CatalogRecord> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

impl CatalogEnvelope {
    pub fn meal_recipes(&self, source: &str) -> Vec<Recipe> {
        records_from(&self.meals)
            .into_iter()
            .filter_map(|r| r.into_recipe(source, false))
            .collect()
    }

    pub fn drink_recipes(&self, source: &str) -> Vec<Recipe> {
        records_from(&self.drinks)
            .into_iter()
            .filter_map(|r| r.into_recipe(source, true))
            .collect()
    }
}
