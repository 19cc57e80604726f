//! Adapters for the recipe and cocktail catalogs the aggregator fans out to.

pub mod backend;
pub mod catalog;
pub mod records;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{mentions_quota, SourceError};
use crate::models::{Recipe, SearchRequest};

pub use backend::{BackendClient, BackendCocktailSource, BackendRecipeSource};
pub use catalog::{CatalogClient, CatalogSource};

/// Which slot a source fills; only the primary is subject to the quota latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    Primary,
    Secondary,
    Cocktails,
}

#[async_trait]
pub trait RecipeSource: Send + Sync {
    fn name(&self) -> &str;

    fn role(&self) -> SourceRole;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Recipe>, SourceError>;
}

/// Sends a request and decodes a JSON body.
///
/// Non-2xx statuses and 200 bodies whose `message`/`error` field reports an
/// exhausted quota both become `SourceError`s.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    source_name: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(source_name, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SourceError::from_reqwest(source_name, e))?;

    if !status.is_success() {
        return Err(SourceError::from_status(source_name, status.as_u16(), body));
    }

    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| SourceError::decode(source_name, e))?;

    let notice = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str);
    if let Some(notice) = notice.filter(|n| mentions_quota(n)) {
        return Err(SourceError::RateLimited {
            source_name: source_name.to_string(),
            status: Some(status.as_u16()),
            message: notice.to_string(),
        });
    }

    debug!(source = source_name, status = status.as_u16(), "decoded source response");
    serde_json::from_value(value).map_err(|e| SourceError::decode(source_name, e))
}
