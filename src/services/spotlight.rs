use rand::seq::SliceRandom;

use crate::{
    error::AppResult,
    models::{Spotlight, Title},
    services::providers::MetadataProvider,
};

pub const SPOTLIGHT_SEEDS: [&str; 9] = [
    "classic",
    "top",
    "award",
    "best",
    "epic",
    "space",
    "detective",
    "romance",
    "thriller",
];

const MAX_ATTEMPTS: usize = 4;

/// Picks a featured title, or `None` when every attempt comes back empty.
///
/// Each attempt searches a random seed, picks a random hit that has a poster
/// and fetches its full record for genre and plot.
pub async fn pick_spotlight(provider: &dyn MetadataProvider) -> Option<Spotlight> {
    for attempt in 0..MAX_ATTEMPTS {
        let seed = {
            let mut rng = rand::thread_rng();
            SPOTLIGHT_SEEDS.choose(&mut rng).copied().unwrap_or("classic")
        };

        match try_seed(provider, seed).await {
            Ok(Some(spotlight)) => {
                tracing::debug!(seed = %seed, attempt, title_id = %spotlight.id, "Spotlight picked");
                return Some(spotlight);
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(error = %e, seed = %seed, attempt, "Spotlight attempt failed");
            }
        }
    }

    tracing::info!(attempts = MAX_ATTEMPTS, "No spotlight available");
    None
}

async fn try_seed(provider: &dyn MetadataProvider, seed: &str) -> AppResult<Option<Spotlight>> {
    let page = provider.search_titles(seed, 1).await?;
    let candidates: Vec<&Title> = page.titles.iter().filter(|t| t.has_poster()).collect();

    let pick = {
        let mut rng = rand::thread_rng();
        match candidates.choose(&mut rng) {
            Some(title) => title.id.clone(),
            None => return Ok(None),
        }
    };

    let record = provider.fetch_title(&pick).await?;
    Ok(Spotlight::from_record(&record))
}
