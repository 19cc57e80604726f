//! Client for the companion backend's REST endpoints.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::records::CatalogEnvelope;
use super::{fetch_json, RecipeSource, SourceRole};
use crate::error::SourceError;
use crate::models::{Recipe, SearchRequest};

pub const BACKEND_SOURCE: &str = "backend";

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
    detail_timeout: Duration,
}

/// Outcome of `POST /validate-ingredient`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IngredientValidation {
    /// The (possibly corrected) ingredient name.
    Valid(String),
    /// The backend's `Error: ...` explanation.
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    validate: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IdentifyResponse {
    pub success: bool,
    #[serde(default)]
    pub ingredient: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedResults {
    pub meals: Vec<Recipe>,
    pub drinks: Vec<Recipe>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration, detail_timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SourceError::from_reqwest(BACKEND_SOURCE, e))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            detail_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn search_recipes(&self, ingredients_csv: &str, diet: Option<&str>) -> Result<Vec<Recipe>, SourceError> {
        let request = self
            .http
            .get(self.url("/general-recipes-search"))
            .query(&[("ingredients", ingredients_csv), ("diet", diet.unwrap_or(""))]);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.meal_recipes(BACKEND_SOURCE))
    }

    pub async fn search_cocktails(&self, ingredients_csv: &str) -> Result<Vec<Recipe>, SourceError> {
        let request = self
            .http
            .get(self.url("/general-cocktails-search"))
            .query(&[("ingredients", ingredients_csv)]);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.drink_recipes(BACKEND_SOURCE))
    }

    pub async fn search_all(&self, ingredients_csv: &str, diet: Option<&str>) -> Result<CombinedResults, SourceError> {
        let request = self
            .http
            .get(self.url("/search-all"))
            .query(&[("ingredients", ingredients_csv), ("diet", diet.unwrap_or(""))]);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(CombinedResults {
            meals: envelope.meal_recipes(BACKEND_SOURCE),
            drinks: envelope.drink_recipes(BACKEND_SOURCE),
        })
    }

    /// `GET /recipe/{id}`; `None` when the backend has no such meal.
    pub async fn meal_detail(&self, id: &str, servings: u32) -> Result<Option<Recipe>, SourceError> {
        let request = self
            .http
            .get(self.url(&format!("/recipe/{id}")))
            .query(&[("servings", servings)])
            .timeout(self.detail_timeout);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.meal_recipes(BACKEND_SOURCE).into_iter().next())
    }

    /// `GET /cocktail/{id}`; `None` when the backend has no such drink.
    pub async fn cocktail_detail(&self, id: &str, servings: u32) -> Result<Option<Recipe>, SourceError> {
        let request = self
            .http
            .get(self.url(&format!("/cocktail/{id}")))
            .query(&[("servings", servings)])
            .timeout(self.detail_timeout);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.drink_recipes(BACKEND_SOURCE).into_iter().next())
    }

    pub async fn latest_recipes(&self, count: u32) -> Result<Vec<Recipe>, SourceError> {
        let request = self
            .http
            .get(self.url("/latest-recipes"))
            .query(&[("count", count)]);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.meal_recipes(BACKEND_SOURCE))
    }

    pub async fn category_recipes(&self, category: &str, count: u32) -> Result<Vec<Recipe>, SourceError> {
        let count = count.to_string();
        let request = self
            .http
            .get(self.url("/category-recipes"))
            .query(&[("category", category), ("count", count.as_str())]);
        let envelope: CatalogEnvelope = fetch_json(BACKEND_SOURCE, request).await?;
        Ok(envelope.meal_recipes(BACKEND_SOURCE))
    }

    pub async fn validate_ingredient(&self, ingredient: &str) -> Result<IngredientValidation, SourceError> {
        let request = self
            .http
            .post(self.url("/validate-ingredient"))
            .json(&json!({ "ingredient": ingredient }));
        let response: ValidateResponse = fetch_json(BACKEND_SOURCE, request).await?;
        let verdict = response.validate.trim();
        debug!(ingredient, verdict, "ingredient validated");
        Ok(match verdict.strip_prefix("Error:") {
            Some(reason) => IngredientValidation::Rejected(reason.trim().to_string()),
            None => IngredientValidation::Valid(verdict.to_string()),
        })
    }

    pub async fn identify_ingredient(&self, image: Vec<u8>, file_name: &str) -> Result<IdentifyResponse, SourceError> {
        let mime = if file_name.to_lowercase().ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        };
        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| SourceError::from_reqwest(BACKEND_SOURCE, e))?;
        let request = self
            .http
            .post(self.url("/identify-ingredient"))
            .multipart(Form::new().part("image", part));
        fetch_json(BACKEND_SOURCE, request).await
    }
}

/// Primary recipe source: the backend's general recipe search.
pub struct BackendRecipeSource {
    client: BackendClient,
}

impl BackendRecipeSource {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipeSource for BackendRecipeSource {
    fn name(&self) -> &str {
        "recipes-api"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Primary
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Recipe>, SourceError> {
        let recipes = self
            .client
            .search_recipes(&request.ingredients_csv(), request.diet.as_deref())
            .await?;
        info!(source = self.name(), count = recipes.len(), "recipe search finished");
        Ok(recipes)
    }
}

/// Cocktail search through the backend.
pub struct BackendCocktailSource {
    client: BackendClient,
}

impl BackendCocktailSource {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecipeSource for BackendCocktailSource {
    fn name(&self) -> &str {
        "cocktails-api"
    }

    fn role(&self) -> SourceRole {
        SourceRole::Cocktails
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Recipe>, SourceError> {
        self.client.search_cocktails(&request.ingredients_csv()).await
    }
}
