use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub measure: String,
}

/// Nutrition figures a catalog reported for one serving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerServing {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub alcohol: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedNutrition {
    #[serde(rename = "perServing", default)]
    pub per_serving: PerServing,
    #[serde(default)]
    pub servings: Option<u32>,
}

/// A recipe or drink as returned by any source, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub source_id: String,
    /// Name of the adapter that produced this entry.
    pub source: String,
    pub slug: String,
    pub title: String,
    pub image_url: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub youtube: Option<String>,
    pub is_drink: bool,
    pub relevance_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<ReportedNutrition>,
}

impl Recipe {
    pub fn new(source: &str, source_id: impl Into<String>, title: impl Into<String>, is_drink: bool) -> Self {
        let title = title.into();
        Self {
            source_id: source_id.into(),
            source: source.to_string(),
            slug: slugify(&title),
            title,
            image_url: None,
            ingredients: Vec::new(),
            instructions: None,
            category: None,
            area: None,
            youtube: None,
            is_drink,
            relevance_score: 0.0,
            nutrition: None,
        }
    }

    pub fn with_ingredients<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = names
            .into_iter()
            .map(|name| RecipeIngredient {
                name: name.into(),
                measure: String::new(),
            })
            .collect();
        self
    }
}

/// URL-style slug: lowercase alphanumerics separated by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Add at least one ingredient to search")]
    EmptyIngredients,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub ingredients: Vec<String>,
    pub diet: Option<String>,
    pub focus_ingredient: Option<String>,
    pub exact_match: bool,
}

/// Normalized identity of a search, used as the session cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    ingredients: Vec<String>,
    diet: Option<String>,
    focus_ingredient: Option<String>,
    exact_match: bool,
}

fn normalize_term(term: &str) -> Option<String> {
    let term = term.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

impl SearchRequest {
    /// Lowercases, trims and de-duplicates ingredients, keeping first-seen order.
    pub fn new<I, S>(ingredients: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ingredient in ingredients {
            if let Some(term) = normalize_term(ingredient.as_ref()) {
                if !normalized.contains(&term) {
                    normalized.push(term);
                }
            }
        }
        if normalized.is_empty() {
            return Err(SearchError::EmptyIngredients);
        }
        Ok(Self {
            ingredients: normalized,
            diet: None,
            focus_ingredient: None,
            exact_match: false,
        })
    }

    pub fn with_diet(mut self, diet: Option<&str>) -> Self {
        self.diet = diet.and_then(normalize_term);
        self
    }

    pub fn with_focus(mut self, focus: Option<&str>) -> Self {
        self.focus_ingredient = focus.and_then(normalize_term);
        self
    }

    pub fn with_exact_match(mut self, exact_match: bool) -> Self {
        self.exact_match = exact_match;
        self
    }

    pub fn ingredients_csv(&self) -> String {
        self.ingredients.join(",")
    }

    pub fn cache_key(&self) -> SearchKey {
        let mut ingredients = self.ingredients.clone();
        ingredients.sort();
        SearchKey {
            ingredients,
            diet: self.diet.clone(),
            focus_ingredient: self.focus_ingredient.clone(),
            exact_match: self.exact_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Chicken Tikka Masala"), "chicken-tikka-masala");
        assert_eq!(slugify("  Mom's  Best -- Pie! "), "mom-s-best-pie");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn request_normalizes_ingredients() {
        let req = SearchRequest::new(["Chicken", " rice ", "chicken", ""]).unwrap();
        assert_eq!(req.ingredients, vec!["chicken", "rice"]);
        assert_eq!(req.ingredients_csv(), "chicken,rice");
    }

    #[test]
    fn empty_request_is_rejected() {
        assert_eq!(
            SearchRequest::new(["  ", ""]).unwrap_err(),
            SearchError::EmptyIngredients
        );
        let none: [&str; 0] = [];
        assert!(SearchRequest::new(none).is_err());
    }

    #[test]
    fn cache_key_ignores_order_and_case() {
        let a = SearchRequest::new(["Rice", "chicken"]).unwrap().with_diet(Some("Vegan "));
        let b = SearchRequest::new(["chicken", "RICE"]).unwrap().with_diet(Some("vegan"));
        assert_eq!(a.cache_key(), b.cache_key());

        let c = b.clone().with_focus(Some("rice"));
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
