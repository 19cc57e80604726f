use async_trait::async_trait;
use recipe_finder::api_connection::{ApiConnectionError, CompletionClient};
use recipe_finder::nutrition::usda::UsdaConfig;
use recipe_finder::nutrition::{
    AiNutritionEstimator, ManualNutritionTable, NutritionProfile, NutritionResolver, NutritionSource,
    NutritionStrategy, UsdaNutritionSource,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CannedClient(Result<&'static str, ()>);

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, ApiConnectionError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(()) => Err(ApiConnectionError::EmptyResponse),
        }
    }
}

fn ai(reply: Result<&'static str, ()>) -> Box<dyn NutritionStrategy> {
    Box::new(AiNutritionEstimator::new(Arc::new(CannedClient(reply))))
}

fn usda(server: &MockServer) -> Box<dyn NutritionStrategy> {
    Box::new(
        UsdaNutritionSource::new(UsdaConfig {
            api_key: "DEMO_KEY".to_string(),
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            ..UsdaConfig::default()
        })
        .unwrap(),
    )
}

fn assert_non_negative(p: &NutritionProfile) {
    for v in [p.calories, p.protein, p.fat, p.carbs] {
        assert!(v.is_finite() && v >= 0.0, "bad value {v} in {p:?}");
    }
}

#[tokio::test]
async fn usda_tier_wins_when_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .and(query_param("query", "oats"))
        .and(query_param("api_key", "DEMO_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foods": [
            { "fdcId": 173904, "description": "Oats", "dataType": "SR Legacy", "foodNutrients": [
                { "nutrientId": 1008, "value": 389.0 },
                { "nutrientId": 1003, "value": 16.9 },
                { "nutrientId": 1004, "value": 6.9 },
                { "nutrientId": 1005, "value": 66.3 }
            ]}
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = NutritionResolver::new(vec![usda(&server), ai(Err(())), Box::new(ManualNutritionTable::new())]);
    let profile = resolver.resolve_ingredient_nutrition("Oats", "1 cup").await;
    assert_eq!(profile.source, NutritionSource::PrimaryApi);
    assert_eq!(profile.calories, 389.0);
}

#[tokio::test]
async fn failing_usda_falls_through_to_ai() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = NutritionResolver::new(vec![
        usda(&server),
        ai(Ok("calories: 52\nprotein: 0.3\nfat: 0.2\ncarbs: 14\nserving_size: 100\nserving_unit: g")),
        Box::new(ManualNutritionTable::new()),
    ]);
    let profile = resolver.resolve_ingredient_nutrition("quince", "1").await;
    assert_eq!(profile.source, NutritionSource::AiEstimate);
    assert_eq!(profile.carbs, 14.0);
}

#[tokio::test]
async fn rejected_ai_estimate_falls_through_to_table() {
    let resolver = NutritionResolver::new(vec![
        ai(Ok("calories: 5000\nprotein: 1\nfat: 1\ncarbs: 1")),
        Box::new(ManualNutritionTable::new()),
    ]);
    let profile = resolver.resolve_ingredient_nutrition("honey", "2 tbsp").await;
    assert_eq!(profile.source, NutritionSource::ManualTable);
    assert_eq!(profile.calories, 304.0);
}

#[tokio::test]
async fn everything_failing_gives_generic_and_never_negative() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/foods/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "foods": [] })))
        .mount(&server)
        .await;

    let resolver = NutritionResolver::new(vec![
        usda(&server),
        ai(Ok("calories: -20\nprotein: -1\nfat: 0\ncarbs: 0")),
        Box::new(ManualNutritionTable::new()),
    ]);
    for name in ["xanthan gum", "", "   ", "💥", "a very long ingredient name that nobody has ever heard of"] {
        let profile = resolver.resolve_ingredient_nutrition(name, "???").await;
        assert_non_negative(&profile);
        assert!(profile.is_usable());
    }
    let profile = resolver.resolve_ingredient_nutrition("xanthan gum", "1 tsp").await;
    assert_eq!(profile, NutritionProfile::generic());
}
