use futures::future::join_all;
use tracing::{debug, info};

use super::{NutritionProfile, NutritionStrategy};
use crate::cache::SessionCache;
use crate::quantity::IngredientQuantity;

/// Runs the nutrition tiers in order and remembers what each ingredient
/// resolved to for the rest of the session.
pub struct NutritionResolver {
    strategies: Vec<Box<dyn NutritionStrategy>>,
    cache: SessionCache<String, NutritionProfile>,
}

impl NutritionResolver {
    pub fn new(strategies: Vec<Box<dyn NutritionStrategy>>) -> Self {
        Self {
            strategies,
            cache: SessionCache::new(),
        }
    }

    pub fn tier_count(&self) -> usize {
        self.strategies.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Never fails: when no tier produces a usable profile the generic
    /// estimate is returned.
    pub async fn resolve_ingredient_nutrition(&self, ingredient: &str, measure: &str) -> NutritionProfile {
        let key = ingredient.trim().to_lowercase();
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let mut resolved = None;
        for strategy in &self.strategies {
            match strategy.lookup(&key, measure).await {
                Some(profile) if profile.is_usable() => {
                    debug!(ingredient = %key, source = ?profile.source, "nutrition resolved");
                    resolved = Some(profile);
                    break;
                }
                Some(_) => debug!(ingredient = %key, tier = ?strategy.source(), "discarding unusable profile"),
                None => {}
            }
        }

        let profile = resolved.unwrap_or_else(|| {
            info!(ingredient = %key, "no nutrition data found, using generic estimate");
            NutritionProfile::generic()
        });
        if !key.is_empty() {
            self.cache.insert(key, profile.clone());
        }
        profile
    }

    /// Resolves every ingredient of a recipe concurrently, keeping input order.
    pub async fn resolve_all(
        &self,
        ingredients: &[IngredientQuantity],
    ) -> Vec<(IngredientQuantity, NutritionProfile)> {
        let lookups = ingredients
            .iter()
            .map(|item| self.resolve_ingredient_nutrition(&item.name, &item.raw_measure));
        let profiles = join_all(lookups).await;
        ingredients.iter().cloned().zip(profiles).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{ManualNutritionTable, NutritionSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        profile: Option<NutritionProfile>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NutritionStrategy for Fixed {
        fn source(&self) -> NutritionSource {
            NutritionSource::PrimaryApi
        }

        async fn lookup(&self, _ingredient: &str, _measure: &str) -> Option<NutritionProfile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.profile.clone()
        }
    }

    #[tokio::test]
    async fn skips_unusable_tiers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let zeros = NutritionProfile::per_100g(0.0, 0.0, 0.0, 0.0, NutritionSource::PrimaryApi);
        let resolver = NutritionResolver::new(vec![
            Box::new(Fixed { profile: Some(zeros), calls: calls.clone() }),
            Box::new(ManualNutritionTable::new()),
        ]);
        let p = resolver.resolve_ingredient_nutrition("Butter", "2 tbsp").await;
        assert_eq!(p.source, NutritionSource::ManualTable);
        assert_eq!(p.calories, 717.0);
    }

    #[tokio::test]
    async fn caches_by_normalized_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = NutritionResolver::new(vec![Box::new(Fixed { profile: None, calls: calls.clone() })]);
        let first = resolver.resolve_ingredient_nutrition("Saffron ", "1 pinch").await;
        let second = resolver.resolve_ingredient_nutrition("saffron", "2 pinch").await;
        assert_eq!(first, NutritionProfile::generic());
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolve_all_keeps_order() {
        let resolver = NutritionResolver::new(vec![Box::new(ManualNutritionTable::new())]);
        let items = vec![
            IngredientQuantity::parse("Rice", "200 g"),
            IngredientQuantity::parse("Unobtainium", "1"),
        ];
        let resolved = resolver.resolve_all(&items).await;
        assert_eq!(resolved[0].0.name, "Rice");
        assert_eq!(resolved[0].1.source, NutritionSource::ManualTable);
        assert_eq!(resolved[1].1.source, NutritionSource::GenericFallback);
    }
}
