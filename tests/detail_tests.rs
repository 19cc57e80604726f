use recipe_finder::cache::PersistedCache;
use recipe_finder::nutrition::{ManualNutritionTable, NutritionResolver, NutritionSource};
use recipe_finder::recipe_detail::{DetailError, DetailKind, DetailNutrition, RecipeDetailService};
use recipe_finder::sources::BackendClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> RecipeDetailService {
    let backend = BackendClient::new(server.uri(), Duration::from_secs(5), Duration::from_secs(5)).unwrap();
    let resolver = NutritionResolver::new(vec![Box::new(ManualNutritionTable::new())]);
    RecipeDetailService::new(backend, Arc::new(resolver))
}

fn fried_rice() -> serde_json::Value {
    json!({ "meals": [{
        "idMeal": "7",
        "strMeal": "Egg Fried Rice",
        "strIngredient1": "Rice",
        "strMeasure1": "400 g",
        "strIngredient2": "Eggs",
        "strMeasure2": "2",
        "strIngredient3": "Soy Sauce",
        "strMeasure3": "to taste"
    }]})
}

#[tokio::test]
async fn meal_detail_estimates_nutrition_and_scales() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/7"))
        .and(query_param("servings", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fried_rice()))
        .mount(&server)
        .await;

    let detail = service(&server).meal("7", Some(2)).await.unwrap();
    assert_eq!(detail.kind, DetailKind::Meal);
    assert_eq!(detail.base_servings, 4);
    assert_eq!(detail.servings, 2);
    assert_eq!(detail.ingredients[0].measure, "200 g");
    assert_eq!(detail.ingredients[1].measure, "1");
    assert_eq!(detail.ingredients[2].measure, "to taste");

    match &detail.nutrition {
        DetailNutrition::Estimated(totals) => {
            assert_eq!(totals.servings, 4);
            assert!(totals.total.calories > 0.0);
            assert!(totals.per_serving.protein >= 0.0);
            // soy sauce is not in the manual table
            assert_eq!(totals.estimated_ingredients, vec!["Soy Sauce"]);
        }
        other => panic!("expected estimated nutrition, got {other:?}"),
    }
}

#[tokio::test]
async fn reported_nutrition_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cocktail/11007"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "drinks": [{
            "idDrink": "11007",
            "strDrink": "Margarita",
            "strAlcoholic": "Alcoholic",
            "strIngredient1": "Tequila",
            "strMeasure1": "1 1/2 oz",
            "strIngredient2": "Lime juice",
            "strMeasure2": "1 oz",
            "nutrition": { "perServing": { "calories": 168, "carbs": 7.2, "alcohol": 14 }, "servings": 1 }
        }]})))
        .mount(&server)
        .await;

    let detail = service(&server).cocktail("11007", Some(3)).await.unwrap();
    assert_eq!(detail.recipe.area.as_deref(), Some("Alcoholic"));
    assert_eq!(detail.ingredients[0].measure, "4.5 oz");
    match detail.nutrition {
        DetailNutrition::Reported { per_serving, servings } => {
            assert_eq!(per_serving.calories, Some(168.0));
            assert_eq!(per_serving.alcohol, Some(14.0));
            assert_eq!(servings, 1);
        }
        other => panic!("expected reported nutrition, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_recipe_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "meals": null })))
        .mount(&server)
        .await;

    let err = service(&server).meal("999", None).await.unwrap_err();
    assert!(matches!(err, DetailError::NotFound { kind: DetailKind::Meal, .. }));
    assert_eq!(err.user_message(), "Recipe not found.");
}

#[tokio::test]
async fn persisted_cache_avoids_second_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fried_rice()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let first = service(&server)
        .with_cache(PersistedCache::new(dir.path()))
        .meal("7", None)
        .await
        .unwrap();
    let second = service(&server)
        .with_cache(PersistedCache::new(dir.path()))
        .meal("7", Some(8))
        .await
        .unwrap();

    assert_eq!(first.recipe, second.recipe);
    assert_eq!(second.ingredients[0].measure, "800 g");
}

#[tokio::test]
async fn rate_limited_detail_has_friendly_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recipe/1"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = service(&server).meal("1", None).await.unwrap_err();
    assert!(matches!(err, DetailError::Source(_)));
    assert!(err.user_message().contains("busy"));
}

#[tokio::test]
async fn manual_table_covers_common_ingredients() {
    let resolver = NutritionResolver::new(vec![Box::new(ManualNutritionTable::new())]);
    let rice = resolver.resolve_ingredient_nutrition("Rice", "400 g").await;
    assert_eq!(rice.source, NutritionSource::ManualTable);
}
