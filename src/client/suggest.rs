use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    client::{catalog::Catalog, transport::cancellable},
    error::AppError,
    models::Title,
    services::title_search::SUGGESTION_LIMIT,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Keys the suggestion list reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

/// Where Enter sends the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Detail(String),
    Results(String),
}

#[derive(Debug, Default)]
struct SuggestState {
    input: String,
    suggestions: Vec<Title>,
    open: bool,
    selected: Option<usize>,
    generation: u64,
    pending: Option<CancellationToken>,
}

/// Debounced, cancellable live search
///
/// Every keystroke invalidates the previous query's token, which drops both a
/// debounce that has not fired yet and a fetch that is still in flight. Only
/// the latest query can render.
#[derive(Clone)]
pub struct SuggestEngine {
    catalog: Arc<dyn Catalog>,
    state: Arc<Mutex<SuggestState>>,
    debounce: Duration,
}

impl SuggestEngine {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            state: Arc::new(Mutex::new(SuggestState::default())),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn lock(&self) -> MutexGuard<'_, SuggestState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles a change of the search input.
    ///
    /// A blank query clears the list synchronously and returns `None`.
    /// Otherwise the returned task completes once the query has rendered,
    /// failed, or been superseded.
    pub fn on_query_change(&self, text: &str) -> Option<JoinHandle<()>> {
        let query = text.trim().to_string();

        let (token, generation) = {
            let mut state = self.lock();
            state.input = text.to_string();
            state.generation += 1;
            if let Some(previous) = state.pending.take() {
                previous.cancel();
            }

            if query.is_empty() {
                state.suggestions.clear();
                state.open = false;
                state.selected = None;
                return None;
            }

            let token = CancellationToken::new();
            state.pending = Some(token.clone());
            (token, state.generation)
        };

        let engine = self.clone();
        Some(tokio::spawn(async move {
            engine.run_query(query, token, generation).await;
        }))
    }

    async fn run_query(&self, query: String, token: CancellationToken, generation: u64) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(self.debounce) => {}
        }

        match cancellable(&token, self.catalog.search(&query)).await {
            Ok(results) => {
                let mut state = self.lock();
                if token.is_cancelled() || state.generation != generation {
                    tracing::debug!(query = %query, "Discarding superseded suggestions");
                    return;
                }
                state.suggestions = results.into_iter().take(SUGGESTION_LIMIT).collect();
                state.open = true;
                state.selected = None;
                state.pending = None;
                tracing::debug!(query = %query, results = state.suggestions.len(), "Suggestions rendered");
            }
            Err(AppError::Cancelled) => {
                tracing::debug!(query = %query, "Suggestion fetch cancelled");
            }
            Err(e) => {
                tracing::debug!(error = %e, query = %query, "Suggestion fetch failed");
            }
        }
    }

    /// Moves the cursor or triggers navigation. The cursor wraps at both ends.
    pub fn on_key(&self, key: Key) -> Option<Navigation> {
        let mut state = self.lock();
        let count = if state.open { state.suggestions.len() } else { 0 };

        match key {
            Key::Down => {
                if count > 0 {
                    state.selected = Some(match state.selected {
                        Some(i) => (i + 1) % count,
                        None => 0,
                    });
                }
                None
            }
            Key::Up => {
                if count > 0 {
                    state.selected = Some(match state.selected {
                        Some(0) | None => count - 1,
                        Some(i) => i - 1,
                    });
                }
                None
            }
            Key::Enter => {
                let picked = state
                    .selected
                    .filter(|_| count > 0)
                    .and_then(|i| state.suggestions.get(i))
                    .map(|title| Navigation::Detail(title.id.clone()));

                let navigation = picked.or_else(|| {
                    let query = state.input.trim();
                    (!query.is_empty()).then(|| Navigation::Results(query.to_string()))
                });

                if navigation.is_some() {
                    state.open = false;
                    state.selected = None;
                }
                navigation
            }
            Key::Escape => {
                state.open = false;
                state.selected = None;
                None
            }
        }
    }

    /// Suggestions currently shown; empty while the list is closed
    pub fn suggestions(&self) -> Vec<Title> {
        let state = self.lock();
        if state.open {
            state.suggestions.clone()
        } else {
            Vec::new()
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.lock().selected
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::{MinimalTitle, Spotlight, TitleType};
    use serde_json::Value;
    use std::collections::HashMap;

    fn title(id: &str) -> Title {
        Title {
            id: id.to_string(),
            title: id.to_uppercase(),
            year: "2005".to_string(),
            title_type: TitleType::Movie,
            poster: None,
        }
    }

    /// Search-only catalog with per-query latency
    #[derive(Default)]
    struct SlowCatalog {
        responses: HashMap<String, (Duration, AppResult<Vec<Title>>)>,
        calls: Mutex<Vec<String>>,
    }

    impl SlowCatalog {
        fn respond(mut self, query: &str, delay_ms: u64, ids: &[&str]) -> Self {
            self.responses.insert(
                query.to_string(),
                (Duration::from_millis(delay_ms), Ok(ids.iter().map(|id| title(id)).collect())),
            );
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.responses.insert(
                query.to_string(),
                (Duration::ZERO, Err(AppError::ExternalApi("down".to_string()))),
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Catalog for SlowCatalog {
        async fn search(&self, query: &str) -> AppResult<Vec<Title>> {
            self.calls.lock().unwrap().push(query.to_string());
            let (delay, result) = match self.responses.get(query) {
                Some((delay, Ok(titles))) => (*delay, Ok(titles.clone())),
                Some((delay, Err(_))) => (*delay, Err(AppError::ExternalApi("down".to_string()))),
                None => (Duration::ZERO, Ok(Vec::new())),
            };
            tokio::time::sleep(delay).await;
            result
        }

        async fn detail(&self, id: &str) -> AppResult<Value> {
            Err(AppError::NotFound(id.to_string()))
        }

        async fn minimal(&self, id: &str) -> AppResult<MinimalTitle> {
            Ok(MinimalTitle::missing(id))
        }

        async fn spotlight(&self) -> AppResult<Option<Spotlight>> {
            Ok(None)
        }

        async fn discover(&self, _seed: Option<String>) -> AppResult<Vec<Title>> {
            Ok(Vec::new())
        }
    }

    fn ids(titles: &[Title]) -> Vec<String> {
        titles.iter().map(|t| t.id.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_earlier_response_never_overwrites_later_one() {
        let catalog = Arc::new(
            SlowCatalog::default()
                .respond("bat", 500, &["tt-bat"])
                .respond("batman", 20, &["tt-batman"]),
        );
        let engine = SuggestEngine::new(catalog.clone());

        let first = engine.on_query_change("bat").unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = engine.on_query_change("batman").unwrap();

        second.await.unwrap();
        first.await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(catalog.calls(), vec!["bat".to_string(), "batman".to_string()]);
        assert_eq!(ids(&engine.suggestions()), vec!["tt-batman".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_only_latest_keystroke() {
        let catalog = Arc::new(SlowCatalog::default().respond("bat", 0, &["tt1"]));
        let engine = SuggestEngine::new(catalog.clone());

        let handles: Vec<_> = ["b", "ba", "bat"]
            .iter()
            .filter_map(|q| engine.on_query_change(q))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(catalog.calls(), vec!["bat".to_string()]);
        assert_eq!(ids(&engine.suggestions()), vec!["tt1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_synchronously_without_fetch() {
        let catalog = Arc::new(SlowCatalog::default().respond("heat", 0, &["tt1", "tt2"]));
        let engine = SuggestEngine::new(catalog.clone());

        engine.on_query_change("heat").unwrap().await.unwrap();
        assert_eq!(engine.suggestions().len(), 2);

        assert!(engine.on_query_change("   ").is_none());
        assert!(engine.suggestions().is_empty());
        assert_eq!(catalog.calls(), vec!["heat".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_cancels_pending_fetch() {
        let catalog = Arc::new(SlowCatalog::default().respond("heat", 0, &["tt1"]));
        let engine = SuggestEngine::new(catalog.clone());

        let pending = engine.on_query_change("heat").unwrap();
        engine.on_query_change("");
        pending.await.unwrap();

        assert!(catalog.calls().is_empty());
        assert!(engine.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_leaves_current_suggestions() {
        let catalog = Arc::new(
            SlowCatalog::default()
                .respond("alien", 0, &["tt0078748"])
                .fail("aliens"),
        );
        let engine = SuggestEngine::new(catalog);

        engine.on_query_change("alien").unwrap().await.unwrap();
        engine.on_query_change("aliens").unwrap().await.unwrap();

        assert_eq!(ids(&engine.suggestions()), vec!["tt0078748".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_are_capped() {
        let many: Vec<String> = (0..9).map(|i| format!("tt{}", i)).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let catalog = Arc::new(SlowCatalog::default().respond("star", 0, &refs));
        let engine = SuggestEngine::new(catalog);

        engine.on_query_change("star").unwrap().await.unwrap();
        assert_eq!(engine.suggestions().len(), SUGGESTION_LIMIT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyboard_navigation() {
        let catalog = Arc::new(SlowCatalog::default().respond("up", 0, &["tt1", "tt2", "tt3"]));
        let engine = SuggestEngine::new(catalog);

        engine.on_query_change("up").unwrap().await.unwrap();

        assert_eq!(engine.on_key(Key::Up), None);
        assert_eq!(engine.selected(), Some(2));
        engine.on_key(Key::Down);
        assert_eq!(engine.selected(), Some(0));
        engine.on_key(Key::Down);
        assert_eq!(engine.selected(), Some(1));

        assert_eq!(engine.on_key(Key::Enter), Some(Navigation::Detail("tt2".to_string())));
        assert!(!engine.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_without_selection_opens_results() {
        let catalog = Arc::new(SlowCatalog::default().respond("heat", 0, &["tt1"]));
        let engine = SuggestEngine::new(catalog);

        engine.on_query_change(" heat ").unwrap().await.unwrap();
        assert_eq!(engine.on_key(Key::Enter), Some(Navigation::Results("heat".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_closes_but_keeps_input() {
        let catalog = Arc::new(SlowCatalog::default().respond("heat", 0, &["tt1"]));
        let engine = SuggestEngine::new(catalog);

        engine.on_query_change("heat").unwrap().await.unwrap();
        engine.on_key(Key::Down);
        assert_eq!(engine.on_key(Key::Escape), None);

        assert!(engine.suggestions().is_empty());
        assert_eq!(engine.selected(), None);
        assert_eq!(engine.input(), "heat");
    }
}
