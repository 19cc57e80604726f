//! USDA FoodData Central search, the first nutrition tier.
//!
//! API reference: <https://fdc.nal.usda.gov/api-guide.html>

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{NutritionProfile, NutritionSource, NutritionStrategy};
use crate::error::SourceError;
use crate::sources::fetch_json;

pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
const SOURCE_NAME: &str = "usda";

const ENERGY_KCAL_IDS: &[u32] = &[1008, 2047, 2048];
const PROTEIN_ID: u32 = 1003;
const FAT_ID: u32 = 1004;
const CARBS_ID: u32 = 1005;

/// Data types in order of preference; anything else ranks after these.
const PREFERRED_DATA_TYPES: &[&str] = &["Foundation", "SR Legacy"];

#[derive(Debug, Clone)]
pub struct UsdaConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_size: u32,
    pub timeout: Duration,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: USDA_BASE_URL.to_string(),
            page_size: 5,
            timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    #[serde(default)]
    pub nutrient_id: Option<u32>,
    #[serde(default)]
    pub nutrient_name: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSearchResult {
    pub fdc_id: u64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FoodSearchResult>,
}

impl FoodSearchResult {
    fn nutrient(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == Some(id))
            .and_then(|n| n.value)
    }

    fn energy_kcal(&self) -> Option<f64> {
        ENERGY_KCAL_IDS
            .iter()
            .find_map(|id| self.nutrient(*id))
            .or_else(|| {
                self.food_nutrients
                    .iter()
                    .find(|n| {
                        n.nutrient_name.as_deref().is_some_and(|name| name.starts_with("Energy"))
                            && n.unit_name.as_deref().is_some_and(|u| u.eq_ignore_ascii_case("kcal"))
                    })
                    .and_then(|n| n.value)
            })
    }

    /// Per-100 g profile; missing macros count as zero.
    pub fn to_profile(&self) -> NutritionProfile {
        NutritionProfile::per_100g(
            self.energy_kcal().unwrap_or(0.0),
            self.nutrient(PROTEIN_ID).unwrap_or(0.0),
            self.nutrient(FAT_ID).unwrap_or(0.0),
            self.nutrient(CARBS_ID).unwrap_or(0.0),
            NutritionSource::PrimaryApi,
        )
    }
}

/// Prefers foundational data types, else the first result.
pub fn best_match(foods: &[FoodSearchResult]) -> Option<&FoodSearchResult> {
    PREFERRED_DATA_TYPES
        .iter()
        .find_map(|wanted| foods.iter().find(|f| f.data_type.as_deref() == Some(*wanted)))
        .or_else(|| foods.first())
}

pub struct UsdaNutritionSource {
    config: UsdaConfig,
    http: Client,
}

impl UsdaNutritionSource {
    pub fn new(config: UsdaConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::from_reqwest(SOURCE_NAME, e))?;
        Ok(Self { config, http })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub async fn search_foods(&self, query: &str) -> Result<Vec<FoodSearchResult>, SourceError> {
        let page_size = self.config.page_size.clamp(1, 200).to_string();
        let request = self
            .http
            .get(format!("{}/foods/search", self.config.base_url.trim_end_matches('/')))
            .query(&[
                ("query", query),
                ("dataType", "Foundation,SR Legacy"),
                ("pageSize", page_size.as_str()),
                ("api_key", self.config.api_key.as_str()),
            ]);
        let response: SearchResponse = fetch_json(SOURCE_NAME, request).await?;
        Ok(response.foods)
    }
}

#[async_trait]
impl NutritionStrategy for UsdaNutritionSource {
    fn source(&self) -> NutritionSource {
        NutritionSource::PrimaryApi
    }

    async fn lookup(&self, ingredient: &str, _measure: &str) -> Option<NutritionProfile> {
        if !self.is_configured() {
            debug!("USDA API key not set, skipping tier");
            return None;
        }
        let foods = match self.search_foods(ingredient).await {
            Ok(foods) => foods,
            Err(e) => {
                warn!(ingredient, error = %e, "USDA lookup failed");
                return None;
            }
        };
        let food = best_match(&foods)?;
        debug!(ingredient, fdc_id = food.fdc_id, description = %food.description, "USDA match");
        Some(food.to_profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn foods() -> Vec<FoodSearchResult> {
        serde_json::from_value(json!([
            {"fdcId": 1, "description": "Chicken, branded", "dataType": "Branded", "foodNutrients": []},
            {"fdcId": 2, "description": "Chicken, broilers", "dataType": "SR Legacy", "foodNutrients": [
                {"nutrientId": 1008, "nutrientName": "Energy", "unitName": "KCAL", "value": 120.0},
                {"nutrientId": 1003, "nutrientName": "Protein", "unitName": "G", "value": 22.5},
                {"nutrientId": 1004, "nutrientName": "Total lipid (fat)", "unitName": "G", "value": 2.6},
                {"nutrientId": 1005, "nutrientName": "Carbohydrate, by difference", "unitName": "G", "value": 0.0}
            ]},
            {"fdcId": 3, "description": "Chicken breast", "dataType": "Foundation", "foodNutrients": [
                {"nutrientId": 2047, "nutrientName": "Energy (Atwater General Factors)", "unitName": "KCAL", "value": 118.0},
                {"nutrientId": 1003, "nutrientName": "Protein", "unitName": "G", "value": 22.5}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn prefers_foundation_then_legacy() {
        let all = foods();
        assert_eq!(best_match(&all).map(|f| f.fdc_id), Some(3));
        assert_eq!(best_match(&all[..2]).map(|f| f.fdc_id), Some(2));
        assert_eq!(best_match(&all[..1]).map(|f| f.fdc_id), Some(1));
        assert!(best_match(&[]).is_none());
    }

    #[test]
    fn profile_reads_nutrient_ids() {
        let all = foods();
        let p = all[1].to_profile();
        assert_eq!(p.calories, 120.0);
        assert_eq!(p.protein, 22.5);
        assert_eq!(p.fat, 2.6);
        assert_eq!(p.serving_size, 100.0);
        assert_eq!(all[2].to_profile().calories, 118.0);
    }

    #[tokio::test]
    async fn unconfigured_source_defers() {
        let source = UsdaNutritionSource::new(UsdaConfig::default()).unwrap();
        assert!(source.lookup("chicken", "1 lb").await.is_none());
    }
}
