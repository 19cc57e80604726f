//! Relevance scoring for search results against the user's pantry.

use crate::models::{Recipe, SearchRequest};

pub const FOCUS_IN_TITLE_BONUS: f64 = 50.0;
pub const FOCUS_FIRST_INGREDIENT_BONUS: f64 = 30.0;
pub const OWNED_INGREDIENT_BONUS: f64 = 10.0;
pub const MISSING_INGREDIENT_PENALTY: f64 = 5.0;

fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

fn pantry_has(pantry: &[String], recipe_ingredient: &str) -> bool {
    pantry.iter().any(|p| names_match(p, recipe_ingredient))
}

/// Pantry items that appear somewhere in the recipe's ingredient list.
pub fn owned_count(recipe: &Recipe, pantry: &[String]) -> usize {
    pantry
        .iter()
        .filter(|p| recipe.ingredients.iter().any(|i| names_match(p, &i.name)))
        .count()
}

/// Recipe ingredients the pantry does not cover.
pub fn missing_count(recipe: &Recipe, pantry: &[String]) -> usize {
    recipe
        .ingredients
        .iter()
        .filter(|i| !pantry_has(pantry, &i.name))
        .count()
}

/// Whether the focus ingredient shows up in the title or ingredient list.
pub fn matches_focus(recipe: &Recipe, focus: &str) -> bool {
    let focus = focus.trim().to_lowercase();
    recipe.title.to_lowercase().contains(&focus)
        || recipe
            .ingredients
            .iter()
            .any(|i| i.name.to_lowercase().contains(&focus))
}

pub fn score(recipe: &Recipe, search_ingredients: &[String], focus_ingredient: Option<&str>) -> f64 {
    let mut total = 0.0;

    if let Some(focus) = focus_ingredient.map(str::trim).filter(|f| !f.is_empty()) {
        if recipe.title.to_lowercase().contains(&focus.to_lowercase()) {
            total += FOCUS_IN_TITLE_BONUS;
        }
        if recipe
            .ingredients
            .first()
            .is_some_and(|first| names_match(&first.name, focus))
        {
            total += FOCUS_FIRST_INGREDIENT_BONUS;
        }
    }

    total += OWNED_INGREDIENT_BONUS * owned_count(recipe, search_ingredients) as f64;
    total -= MISSING_INGREDIENT_PENALTY * missing_count(recipe, search_ingredients) as f64;
    total
}

/// Filters, scores and orders results for a request.
///
/// With a focus ingredient, recipes that never mention it are dropped. In
/// strict mode recipes needing anything outside the pantry are dropped;
/// entries without an ingredient list cannot be checked and are kept. The
/// sort is stable, so equal scores keep source order.
pub fn rank(recipes: Vec<Recipe>, request: &SearchRequest) -> Vec<Recipe> {
    let focus = request.focus_ingredient.as_deref();

    let mut ranked: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| focus.map_or(true, |f| matches_focus(r, f)))
        .filter(|r| !request.exact_match || missing_count(r, &request.ingredients) == 0)
        .map(|mut r| {
            r.relevance_score = score(&r, &request.ingredients, focus);
            r
        })
        .collect();

    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    ranked
}
