use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{
    cached,
    db::{ttl, CacheKey, ResponseCache},
    error::{AppError, AppResult},
    models::{Title, TitleType},
    services::providers::MetadataProvider,
};

/// Seed terms used when the caller does not pick one
pub const DEFAULT_SEEDS: [&str; 3] = ["star", "love", "war"];

const DEFAULT_POOL_KEY: &str = "_default";

/// Randomly drawn discover grid, split by section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscoverSample {
    pub movies: Vec<Title>,
    pub series: Vec<Title>,
}

impl DiscoverSample {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.series.is_empty()
    }

    /// Flattens to the grid order: movies first, then series
    pub fn into_titles(self) -> Vec<Title> {
        self.movies.into_iter().chain(self.series).collect()
    }
}

/// Merges seed batches into a pool: first occurrence of an id wins, then
/// entries without a poster are dropped.
pub fn merge_pool<I>(batches: I) -> Vec<Title>
where
    I: IntoIterator<Item = Vec<Title>>,
{
    let mut seen = HashSet::new();

    batches
        .into_iter()
        .flatten()
        .filter(|title| seen.insert(title.id.clone()))
        .filter(Title::has_poster)
        .collect()
}

fn normalize_seed(seed: Option<&str>) -> Option<String> {
    seed.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

/// Seeded candidate pool with per-request random sampling
///
/// The pool itself is cached for `pool_ttl`; every call draws a fresh sample
/// from it, so a shuffle never re-queries the seeds while the pool is valid.
pub struct DiscoverPool {
    provider: Arc<dyn MetadataProvider>,
    cache: ResponseCache,
    sample_size: usize,
    pool_ttl: Duration,
}

impl DiscoverPool {
    pub fn new(provider: Arc<dyn MetadataProvider>, cache: ResponseCache, sample_size: usize) -> Self {
        Self {
            provider,
            cache,
            sample_size,
            pool_ttl: ttl::DISCOVER_POOL,
        }
    }

    pub fn with_pool_ttl(mut self, pool_ttl: Duration) -> Self {
        self.pool_ttl = pool_ttl;
        self
    }

    /// Returns a random sample from the pool for `seed`, building the pool first
    /// if it is missing or expired.
    pub async fn build_or_refresh(&self, seed: Option<&str>) -> AppResult<DiscoverSample> {
        let seed = normalize_seed(seed);
        let seeds: Vec<String> = match &seed {
            Some(seed) => vec![seed.clone()],
            None => DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
        };
        let key = CacheKey::DiscoverPool(seed.unwrap_or_else(|| DEFAULT_POOL_KEY.to_string()));

        let pool: Vec<Title> = cached!(self.cache, key, self.pool_ttl, self.build_pool(&seeds))?;

        Ok(self.sample(&pool))
    }

    async fn build_pool(&self, seeds: &[String]) -> AppResult<Vec<Title>> {
        let mut batches = Vec::with_capacity(seeds.len());

        for seed in seeds {
            match self.provider.search_titles(seed, 1).await {
                Ok(page) => batches.push(page.titles),
                Err(e) => {
                    tracing::warn!(error = %e, seed = %seed, provider = self.provider.name(), "Discover seed search failed");
                }
            }
        }

        if batches.is_empty() {
            return Err(AppError::ExternalApi(
                "No discover seed returned results".to_string(),
            ));
        }

        let pool = merge_pool(batches);
        tracing::info!(seeds = seeds.len(), pool = pool.len(), "Discover pool built");

        Ok(pool)
    }

    /// Draws up to `sample_size` movies and `sample_size` series from the pool
    pub fn sample(&self, pool: &[Title]) -> DiscoverSample {
        let mut rng = rand::thread_rng();
        let mut draw = |wanted: TitleType| {
            let mut section: Vec<Title> = pool
                .iter()
                .filter(|t| t.title_type == wanted)
                .cloned()
                .collect();
            let (picked, _) = section.partial_shuffle(&mut rng, self.sample_size);
            picked.to_vec()
        };

        DiscoverSample {
            movies: draw(TitleType::Movie),
            series: draw(TitleType::Series),
        }
    }
}
