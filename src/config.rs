//! Environment-driven configuration and the wiring built from it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api_connection::endpoints::OPENROUTER_BASE_URL;
use crate::api_connection::{CompletionClient, Provider};
use crate::cache::PersistedCache;
use crate::nutrition::table_loader::load_manual_table;
use crate::nutrition::usda::{UsdaConfig, USDA_BASE_URL};
use crate::nutrition::{
    AiNutritionEstimator, ManualNutritionTable, NutritionResolver, NutritionStrategy, UsdaNutritionSource,
};
use crate::recipe_aggregator::MultiSourceAggregator;
use crate::recipe_detail::RecipeDetailService;
use crate::sources::catalog::{COCKTAILDB_BASE_URL, MEALDB_BASE_URL};
use crate::sources::{
    BackendClient, BackendCocktailSource, BackendRecipeSource, CatalogClient, CatalogSource, RecipeSource,
    SourceRole,
};

pub const BACKEND_BASE_URL_ENV: &str = "BACKEND_BASE_URL";
pub const MEALDB_BASE_URL_ENV: &str = "MEALDB_BASE_URL";
pub const COCKTAILDB_BASE_URL_ENV: &str = "COCKTAILDB_BASE_URL";
pub const USDA_API_KEY_ENV: &str = "USDA_API_KEY";
pub const USDA_BASE_URL_ENV: &str = "USDA_BASE_URL";
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const OPENROUTER_BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";
pub const AI_MODEL_ENV: &str = "AI_MODEL";
pub const CACHE_DIR_ENV: &str = "CACHE_DIR";
pub const PANTRY_FILE_ENV: &str = "PANTRY_FILE";
pub const MANUAL_NUTRITION_CSV_ENV: &str = "MANUAL_NUTRITION_CSV";
pub const REQUEST_TIMEOUT_SECS_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const DETAIL_TIMEOUT_SECS_ENV: &str = "DETAIL_TIMEOUT_SECS";

pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DETAIL_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend_base_url: String,
    pub mealdb_base_url: String,
    pub cocktaildb_base_url: String,
    pub usda_api_key: Option<String>,
    pub usda_base_url: String,
    /// Name of the variable holding the OpenRouter key; the key itself is
    /// read when a request is made.
    pub openrouter_api_key_env: String,
    /// Whether that variable held a non-blank value at load time.
    pub openrouter_key_present: bool,
    pub openrouter_base_url: String,
    pub ai_model: Option<String>,
    pub cache_dir: PathBuf,
    pub pantry_file: PathBuf,
    pub manual_nutrition_csv: Option<PathBuf>,
    pub request_timeout: Duration,
    pub detail_timeout: Duration,
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> Result<Duration> {
    match lookup(name) {
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{name} must be a whole number of seconds, got '{raw}'"))?;
            Ok(Duration::from_secs(secs.max(1)))
        }
        None => Ok(Duration::from_secs(default)),
    }
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name → value lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let cache_dir = get(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".recipe_finder").join("cache"));

        Ok(Self {
            backend_base_url: get(BACKEND_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BACKEND_BASE_URL.to_string()),
            mealdb_base_url: get(MEALDB_BASE_URL_ENV).unwrap_or_else(|| MEALDB_BASE_URL.to_string()),
            cocktaildb_base_url: get(COCKTAILDB_BASE_URL_ENV).unwrap_or_else(|| COCKTAILDB_BASE_URL.to_string()),
            usda_api_key: get(USDA_API_KEY_ENV),
            usda_base_url: get(USDA_BASE_URL_ENV).unwrap_or_else(|| USDA_BASE_URL.to_string()),
            openrouter_api_key_env: OPENROUTER_API_KEY_ENV.to_string(),
            openrouter_key_present: get(OPENROUTER_API_KEY_ENV).is_some(),
            openrouter_base_url: get(OPENROUTER_BASE_URL_ENV).unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
            ai_model: get(AI_MODEL_ENV),
            pantry_file: get(PANTRY_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".recipe_finder").join("pantry.json")),
            cache_dir,
            manual_nutrition_csv: get(MANUAL_NUTRITION_CSV_ENV).map(PathBuf::from),
            request_timeout: parse_secs(&get, REQUEST_TIMEOUT_SECS_ENV, DEFAULT_REQUEST_TIMEOUT_SECS)?,
            detail_timeout: parse_secs(&get, DETAIL_TIMEOUT_SECS_ENV, DEFAULT_DETAIL_TIMEOUT_SECS)?,
        })
    }

    pub fn backend_client(&self) -> Result<BackendClient> {
        BackendClient::new(&self.backend_base_url, self.request_timeout, self.detail_timeout)
            .context("Failed to build backend HTTP client")
    }

    /// Primary backend recipes, the public meal catalog as fallback, and
    /// backend cocktails.
    pub fn build_aggregator(&self) -> Result<MultiSourceAggregator> {
        let backend = self.backend_client()?;
        let mealdb = CatalogClient::meals(&self.mealdb_base_url, self.request_timeout)
            .context("Failed to build meal catalog client")?;
        let sources: Vec<Arc<dyn RecipeSource>> = vec![
            Arc::new(BackendRecipeSource::new(backend.clone())),
            Arc::new(CatalogSource::new(mealdb, SourceRole::Secondary)),
            Arc::new(BackendCocktailSource::new(backend)),
        ];
        Ok(MultiSourceAggregator::new(sources))
    }

    pub fn cocktail_catalog(&self) -> Result<CatalogClient> {
        CatalogClient::cocktails(&self.cocktaildb_base_url, self.request_timeout)
            .context("Failed to build cocktail catalog client")
    }

    pub fn completion_client(&self) -> Option<Arc<dyn CompletionClient>> {
        if !self.openrouter_key_present {
            return None;
        }
        let mut provider =
            Provider::openrouter(&self.openrouter_api_key_env).with_base_url(&self.openrouter_base_url);
        if let Some(model) = &self.ai_model {
            provider = provider.with_model(model);
        }
        Some(Arc::new(provider))
    }

    fn manual_table(&self) -> ManualNutritionTable {
        let Some(path) = &self.manual_nutrition_csv else {
            return ManualNutritionTable::new();
        };
        match load_manual_table(path) {
            Ok(rows) => ManualNutritionTable::with_rows(rows),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring manual nutrition CSV");
                ManualNutritionTable::new()
            }
        }
    }

    /// Tiers in order: USDA (when keyed), AI estimate (when keyed), manual table.
    pub fn build_resolver(&self) -> Result<NutritionResolver> {
        let mut strategies: Vec<Box<dyn NutritionStrategy>> = Vec::new();
        if let Some(api_key) = &self.usda_api_key {
            let usda = UsdaNutritionSource::new(UsdaConfig {
                api_key: api_key.clone(),
                base_url: self.usda_base_url.clone(),
                timeout: self.request_timeout,
                ..UsdaConfig::default()
            })
            .context("Failed to build USDA client")?;
            strategies.push(Box::new(usda));
        }
        if let Some(client) = self.completion_client() {
            strategies.push(Box::new(AiNutritionEstimator::new(client)));
        }
        strategies.push(Box::new(self.manual_table()));
        info!(tiers = strategies.len(), "nutrition resolver ready");
        Ok(NutritionResolver::new(strategies))
    }

    pub fn detail_cache(&self) -> PersistedCache {
        PersistedCache::new(self.cache_dir.join("details"))
    }

    pub fn build_detail_service(&self) -> Result<RecipeDetailService> {
        Ok(
            RecipeDetailService::new(self.backend_client()?, Arc::new(self.build_resolver()?))
                .with_cache(self.detail_cache()),
        )
    }

    pub fn pantry_file(&self) -> &Path {
        &self.pantry_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_base_url, DEFAULT_BACKEND_BASE_URL);
        assert_eq!(config.mealdb_base_url, MEALDB_BASE_URL);
        assert_eq!(config.usda_api_key, None);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.detail_timeout, Duration::from_secs(5));
        assert_eq!(config.openrouter_api_key_env, "OPENROUTER_API_KEY");
        assert!(!config.openrouter_key_present);
        assert!(config.completion_client().is_none());
    }

    #[test]
    fn resolver_tiers_follow_configured_keys() {
        let bare = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(bare.build_resolver().unwrap().tier_count(), 1);

        let ai_only = AppConfig::from_lookup(lookup(&[("OPENROUTER_API_KEY", "sk-test")])).unwrap();
        assert!(ai_only.completion_client().is_some());
        assert_eq!(ai_only.build_resolver().unwrap().tier_count(), 2);

        let full = AppConfig::from_lookup(lookup(&[
            ("OPENROUTER_API_KEY", "sk-test"),
            ("USDA_API_KEY", "DEMO_KEY"),
        ]))
        .unwrap();
        assert_eq!(full.build_resolver().unwrap().tier_count(), 3);
    }

    #[test]
    fn overrides_and_blank_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BACKEND_BASE_URL", "http://api.test"),
            ("USDA_API_KEY", "  "),
            ("DETAIL_TIMEOUT_SECS", "2"),
            ("PANTRY_FILE", "/tmp/p.json"),
        ]))
        .unwrap();
        assert_eq!(config.backend_base_url, "http://api.test");
        assert_eq!(config.usda_api_key, None);
        assert_eq!(config.detail_timeout, Duration::from_secs(2));
        assert_eq!(config.pantry_file(), Path::new("/tmp/p.json"));
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn aggregator_has_three_sources() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.build_aggregator().unwrap().source_count(), 3);
        assert_eq!(config.cocktail_catalog().unwrap().name(), "cocktaildb");
    }
}
