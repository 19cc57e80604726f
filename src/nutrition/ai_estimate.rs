//! AI-estimated nutrition, the second tier.
//!
//! The model is asked for a fixed `key: value` block; each key is pulled out
//! with its own regex so stray prose or JSON punctuation around the values
//! does not matter.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::{NutritionProfile, NutritionSource, NutritionStrategy, ServingUnit};
use crate::api_connection::CompletionClient;

const SYSTEM_PROMPT: &str = "/no_thinking
You are a nutrition database. Reply with exactly six lines and nothing else:
calories: <number>
protein: <number>
fat: <number>
carbs: <number>
serving_size: <number>
serving_unit: <g or ml>
Values are for the stated serving of the raw ingredient. Use plain numbers without units.";

macro_rules! field_regex {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(concat!(r#"(?i)\b"#, $pattern, r#"\b["']?\s*[:=]\s*["']?(-?\d+(?:\.\d+)?)"#))
                .expect("valid nutrition field regex")
        });
    };
}

field_regex!(CALORIES_RE, r"(?:calories|kcal|energy)");
field_regex!(PROTEIN_RE, r"protein");
field_regex!(FAT_RE, r"(?:total[ _]fat|fat)");
field_regex!(CARBS_RE, r"(?:carbs|carbohydrates?)");
field_regex!(SERVING_SIZE_RE, r"serving[ _]size");

static SERVING_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bserving[ _]unit\b["']?\s*[:=]\s*["']?([a-z]+)"#)
        .expect("valid serving unit regex")
});

#[derive(Debug, Error, PartialEq)]
pub enum EstimateParseError {
    #[error("estimate is missing `{0}`")]
    MissingField(&'static str),
    #[error("estimate has a negative `{0}`")]
    Negative(&'static str),
    #[error("stated {stated} kcal does not match {derived} kcal from macros")]
    Inconsistent { stated: f64, derived: f64 },
    #[error("estimate has a non-positive serving size")]
    BadServingSize,
}

fn capture_number(re: &Regex, text: &str, field: &'static str) -> Result<f64, EstimateParseError> {
    let value = re
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or(EstimateParseError::MissingField(field))?;
    if value < 0.0 {
        return Err(EstimateParseError::Negative(field));
    }
    Ok(value)
}

/// Parses and validates a model reply into a profile.
pub fn parse_ai_nutrition(text: &str) -> Result<NutritionProfile, EstimateParseError> {
    let calories = capture_number(&CALORIES_RE, text, "calories")?;
    let protein = capture_number(&PROTEIN_RE, text, "protein")?;
    let fat = capture_number(&FAT_RE, text, "fat")?;
    let carbs = capture_number(&CARBS_RE, text, "carbs")?;

    let serving_size = match capture_number(&SERVING_SIZE_RE, text, "serving_size") {
        Ok(size) => size,
        Err(EstimateParseError::MissingField(_)) => 100.0,
        Err(e) => return Err(e),
    };
    if serving_size <= 0.0 {
        return Err(EstimateParseError::BadServingSize);
    }

    let serving_unit = match SERVING_UNIT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .as_deref()
    {
        Some("ml") | Some("milliliters") | Some("millilitres") => ServingUnit::Milliliters,
        _ => ServingUnit::Grams,
    };

    let profile = NutritionProfile {
        calories,
        protein,
        fat,
        carbs,
        serving_size,
        serving_unit,
        source: NutritionSource::AiEstimate,
    };
    if !profile.reconciles() {
        return Err(EstimateParseError::Inconsistent {
            stated: calories,
            derived: profile.macro_calories(),
        });
    }
    Ok(profile)
}

pub struct AiNutritionEstimator {
    client: Arc<dyn CompletionClient>,
}

impl AiNutritionEstimator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn prompt(ingredient: &str, measure: &str) -> String {
        if measure.trim().is_empty() {
            format!("Ingredient: {ingredient}\nServing: 100 g")
        } else {
            format!("Ingredient: {ingredient}\nServing: {measure}")
        }
    }
}

#[async_trait]
impl NutritionStrategy for AiNutritionEstimator {
    fn source(&self) -> NutritionSource {
        NutritionSource::AiEstimate
    }

    async fn lookup(&self, ingredient: &str, measure: &str) -> Option<NutritionProfile> {
        let reply = match self
            .client
            .complete(SYSTEM_PROMPT, &Self::prompt(ingredient, measure))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(ingredient, error = %e, "AI nutrition estimate unavailable");
                return None;
            }
        };
        match parse_ai_nutrition(&reply) {
            Ok(profile) => {
                debug!(ingredient, calories = profile.calories, "AI nutrition estimate accepted");
                Some(profile)
            }
            Err(e) => {
                warn!(ingredient, error = %e, "AI nutrition estimate rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_block() {
        let reply = "calories: 717\nprotein: 0.9\nfat: 81\ncarbs: 0.1\nserving_size: 100\nserving_unit: g";
        let p = parse_ai_nutrition(reply).unwrap();
        assert_eq!(p.calories, 717.0);
        assert_eq!(p.fat, 81.0);
        assert_eq!(p.serving_unit, ServingUnit::Grams);
        assert_eq!(p.source, NutritionSource::AiEstimate);
    }

    #[test]
    fn tolerates_json_like_output() {
        let reply = r#"{"calories": 42, "protein": 0.5, "fat": 0, "carbohydrates": 10.2, "serving_size": 240, "serving_unit": "ml"}"#;
        let p = parse_ai_nutrition(reply).unwrap();
        assert_eq!(p.carbs, 10.2);
        assert_eq!(p.serving_size, 240.0);
        assert_eq!(p.serving_unit, ServingUnit::Milliliters);
    }

    #[test]
    fn serving_defaults_to_100g() {
        let p = parse_ai_nutrition("Calories: 52\nProtein: 0.3\nFat: 0.2\nCarbs: 14").unwrap();
        assert_eq!(p.serving_size, 100.0);
    }

    #[test]
    fn rejects_missing_negative_and_inconsistent() {
        assert_eq!(
            parse_ai_nutrition("calories: 10\nprotein: 1\nfat: 0").unwrap_err(),
            EstimateParseError::MissingField("carbs")
        );
        assert_eq!(
            parse_ai_nutrition("calories: 10\nprotein: -1\nfat: 0\ncarbs: 2").unwrap_err(),
            EstimateParseError::Negative("protein")
        );
        assert!(matches!(
            parse_ai_nutrition("calories: 900\nprotein: 1\nfat: 1\ncarbs: 1").unwrap_err(),
            EstimateParseError::Inconsistent { .. }
        ));
        assert_eq!(
            parse_ai_nutrition("I'm not sure about that ingredient.").unwrap_err(),
            EstimateParseError::MissingField("calories")
        );
    }
}
