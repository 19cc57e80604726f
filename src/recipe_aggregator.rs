//! Fans a search out to every configured source and merges what comes back.
//!
//! Every source gets its own future and the join waits for all of them; a
//! failing source only loses its own slice of the results. A quota failure
//! from the primary source latches: later searches skip it until
//! [`MultiSourceAggregator::reset_api_limit`] is called.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::SessionCache;
use crate::models::{Recipe, SearchKey, SearchRequest};
use crate::ranking::rank;
use crate::sources::{RecipeSource, SourceRole};

pub const FALLBACK_STATUS: &str = "using fallback sources";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub message: String,
    pub rate_limited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<Recipe>,
    /// At least one source failed or was skipped.
    pub partial_failure: bool,
    pub api_limit_reached: bool,
    pub failures: Vec<SourceFailure>,
    pub status: Option<String>,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Text to show the user alongside (or instead of) the results.
    pub fn message(&self) -> Option<String> {
        if self.results.is_empty() {
            return Some(if self.failures.is_empty() {
                "No recipes found for those ingredients.".to_string()
            } else {
                "No recipes found; some sources could not be reached.".to_string()
            });
        }
        self.status.clone()
    }
}

pub struct MultiSourceAggregator {
    sources: Vec<Arc<dyn RecipeSource>>,
    cache: SessionCache<SearchKey, Arc<SearchOutcome>>,
    api_limit_reached: AtomicBool,
}

impl MultiSourceAggregator {
    pub fn new(sources: Vec<Arc<dyn RecipeSource>>) -> Self {
        Self {
            sources,
            cache: SessionCache::new(),
            api_limit_reached: AtomicBool::new(false),
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn api_limit_reached(&self) -> bool {
        self.api_limit_reached.load(Ordering::SeqCst)
    }

    /// Lets the primary source be called again. Outcomes cached while the
    /// primary was over quota are dropped so their keys get re-dispatched.
    pub fn reset_api_limit(&self) {
        self.api_limit_reached.store(false, Ordering::SeqCst);
        self.cache.retain(|_, outcome| !outcome.api_limit_reached);
        info!("primary source re-enabled");
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub async fn search(&self, request: &SearchRequest) -> Arc<SearchOutcome> {
        let key = request.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            debug!(ingredients = %request.ingredients_csv(), "search served from session cache");
            return hit;
        }

        let skip_primary = self.api_limit_reached();
        let active: Vec<Arc<dyn RecipeSource>> = self
            .sources
            .iter()
            .filter(|s| !(skip_primary && s.role() == SourceRole::Primary))
            .cloned()
            .collect();
        if skip_primary {
            info!("primary source over quota, skipping it");
        }

        let calls = active.iter().map(|source| {
            let source = Arc::clone(source);
            async move {
                let result = source.search(request).await;
                (source, result)
            }
        });
        let settled = join_all(calls).await;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for (source, result) in settled {
            match result {
                Ok(recipes) => {
                    debug!(source = source.name(), count = recipes.len(), "source settled");
                    results.extend(recipes);
                }
                Err(e) => {
                    let rate_limited = e.is_rate_limited();
                    warn!(source = source.name(), error = %e, rate_limited, "source failed");
                    if rate_limited && source.role() == SourceRole::Primary {
                        self.api_limit_reached.store(true, Ordering::SeqCst);
                    }
                    failures.push(SourceFailure {
                        source: source.name().to_string(),
                        message: e.to_string(),
                        rate_limited,
                    });
                }
            }
        }

        let api_limit_reached = self.api_limit_reached();
        let outcome = Arc::new(SearchOutcome {
            results: rank(dedupe(results), request),
            partial_failure: !failures.is_empty() || skip_primary,
            api_limit_reached,
            failures,
            status: api_limit_reached.then(|| FALLBACK_STATUS.to_string()),
        });
        info!(
            ingredients = %request.ingredients_csv(),
            results = outcome.results.len(),
            partial_failure = outcome.partial_failure,
            "search finished"
        );

        self.cache.insert(key, Arc::clone(&outcome));
        outcome
    }
}

/// Keeps the first entry per (drink?, slug); entries without a slug are kept.
fn dedupe(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen = HashSet::new();
    recipes
        .into_iter()
        .filter(|r| r.slug.is_empty() || seen.insert((r.is_drink, r.slug.clone())))
        .collect()
}
