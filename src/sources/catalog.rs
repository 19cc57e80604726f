//! Public meal and cocktail catalogs (TheMealDB / TheCocktailDB).
//!
//! Both expose the same API shape, so one client serves either; `is_drink`
//! selects which envelope list to read.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::records::CatalogEnvelope;
use super::{fetch_json, RecipeSource, SourceRole};
use crate::error::SourceError;
use crate::models::{Recipe, RecipeIngredient, SearchRequest};

pub const MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";
pub const COCKTAILDB_BASE_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1";

#[derive(Debug, Clone)]
pub struct CatalogClient {
    name: String,
    base_url: String,
    is_drink: bool,
    http: Client,
}

impl CatalogClient {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        is_drink: bool,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let name = name.into();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::from_reqwest(&name, e))?;
        Ok(Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            is_drink,
            http,
        })
    }

    pub fn meals(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Self::new("mealdb", base_url, false, timeout)
    }

    pub fn cocktails(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Self::new("cocktaildb", base_url, true, timeout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<Recipe>, SourceError> {
        let request = self
            .http
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(query);
        let envelope: CatalogEnvelope = fetch_json(&self.name, request).await?;
        Ok(if self.is_drink {
            envelope.drink_recipes(&self.name)
        } else {
            envelope.meal_recipes(&self.name)
        })
    }

    /// Catalog entries using one ingredient. Summary records only: id, title, thumbnail.
    pub async fn filter_by_ingredient(&self, ingredient: &str) -> Result<Vec<Recipe>, SourceError> {
        let term = ingredient.trim().replace(' ', "_");
        self.get("filter.php", &[("i", term.as_str())]).await
    }

    pub async fn filter_by_category(&self, category: &str) -> Result<Vec<Recipe>, SourceError> {
        self.get("filter.php", &[("c", category.trim())]).await
    }

    pub async fn lookup(&self, id: &str) -> Result<Option<Recipe>, SourceError> {
        Ok(self.get("lookup.php", &[("i", id)]).await?.into_iter().next())
    }

    pub async fn random(&self) -> Result<Option<Recipe>, SourceError> {
        Ok(self.get("random.php", &[]).await?.into_iter().next())
    }
}

/// Most summaries hydrated through `lookup.php` for a strict search.
pub const STRICT_LOOKUP_LIMIT: usize = 20;

/// Search adapter over a catalog: one filter call per ingredient (or just the
/// focus ingredient when set), merged by id. Filter hits are summaries, so
/// each entry carries the searched terms it matched as its ingredient list;
/// entries matching more terms come first and ties keep first-seen order.
/// A term whose call fails is skipped; the search only fails when every
/// term does.
pub struct CatalogSource {
    client: CatalogClient,
    role: SourceRole,
}

impl CatalogSource {
    pub fn new(client: CatalogClient, role: SourceRole) -> Self {
        Self { client, role }
    }

    /// Swaps summaries for full records so strict mode can check real
    /// ingredient lists. Lookups that fail leave the summary in place.
    async fn hydrate(&self, summaries: Vec<Recipe>) -> Vec<Recipe> {
        let lookups = summaries.into_iter().enumerate().map(|(i, summary)| async move {
            if i >= STRICT_LOOKUP_LIMIT {
                return summary;
            }
            match self.client.lookup(&summary.source_id).await {
                Ok(Some(full)) => full,
                Ok(None) => summary,
                Err(e) => {
                    warn!(source = self.name(), id = %summary.source_id, error = %e, "catalog lookup failed");
                    summary
                }
            }
        });
        join_all(lookups).await
    }
}

#[async_trait]
impl RecipeSource for CatalogSource {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn role(&self) -> SourceRole {
        self.role
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Recipe>, SourceError> {
        let terms: Vec<&str> = match request.focus_ingredient.as_deref() {
            Some(focus) => vec![focus],
            None => request.ingredients.iter().map(String::as_str).collect(),
        };

        let mut merged: Vec<Recipe> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut last_error = None;
        let mut answered = 0;
        for term in terms {
            let found = match self.client.filter_by_ingredient(term).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(source = self.name(), term, error = %e, "catalog filter failed, skipping term");
                    last_error = Some(e);
                    continue;
                }
            };
            answered += 1;
            for recipe in found {
                let matched = RecipeIngredient {
                    name: term.to_string(),
                    measure: String::new(),
                };
                match positions.get(&recipe.source_id) {
                    Some(&at) => merged[at].ingredients.push(matched),
                    None => {
                        positions.insert(recipe.source_id.clone(), merged.len());
                        let mut recipe = recipe;
                        recipe.ingredients = vec![matched];
                        merged.push(recipe);
                    }
                }
            }
        }
        if answered == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        merged.sort_by_key(|r| std::cmp::Reverse(r.ingredients.len()));
        if request.exact_match {
            merged = self.hydrate(merged).await;
        }
        debug!(source = self.name(), count = merged.len(), "catalog search finished");
        Ok(merged)
    }
}
