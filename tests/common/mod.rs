//! In-process server fixture with a scriptable metadata provider.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cineseek::{
    api::{create_app, create_router, AppState},
    db::ResponseCache,
    error::{AppError, AppResult},
    models::{SearchPage, Title, TitleType},
    services::{DiscoverPool, MetadataProvider},
};

/// Metadata provider answering from fixed tables
#[derive(Default)]
pub struct FakeProvider {
    searches: HashMap<String, SearchPage>,
    /// Answer for any query not listed in `searches`
    fallback: Option<SearchPage>,
    records: HashMap<String, Value>,
    offline: AtomicBool,
    search_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, titles: Vec<Title>, total: u32) -> Self {
        self.searches
            .insert(query.to_lowercase(), SearchPage { titles, total });
        self
    }

    pub fn with_fallback(mut self, titles: Vec<Title>) -> Self {
        let total = titles.len() as u32;
        self.fallback = Some(SearchPage { titles, total });
        self
    }

    /// Registers the full record served for `title.id`
    pub fn with_record(mut self, title: &Title) -> Self {
        let record = json!({
            "imdbID": title.id,
            "Title": title.title,
            "Year": title.year,
            "Type": match title.title_type {
                TitleType::Series => "series",
                _ => "movie",
            },
            "Poster": title.poster.clone().unwrap_or_else(|| "N/A".to_string()),
            "Genre": "Drama",
            "Plot": format!("Plot of {}", title.title),
            "Response": "True",
        });
        self.records.insert(title.id.clone(), record);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi("provider offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataProvider for FakeProvider {
    async fn search_titles(&self, query: &str, _page: u32) -> AppResult<SearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        self.searches
            .get(&query.to_lowercase())
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| AppError::NotFound("Movie not found!".to_string()))
    }

    async fn fetch_title(&self, id: &str) -> AppResult<Value> {
        self.check_online()?;
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Incorrect IMDb ID.".to_string()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn title(id: &str, name: &str, year: &str, title_type: TitleType, poster: bool) -> Title {
    Title {
        id: id.to_string(),
        title: name.to_string(),
        year: year.to_string(),
        title_type,
        poster: poster.then(|| format!("http://img/{}.jpg", id)),
    }
}

fn state_for(provider: &Arc<FakeProvider>, sample_size: usize) -> AppState {
    let discover = DiscoverPool::new(
        provider.clone(),
        ResponseCache::in_memory("test"),
        sample_size,
    );
    AppState::new(provider.clone(), discover)
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

pub struct TestFixture {
    pub router: Router,
    pub provider: Arc<FakeProvider>,
}

impl TestFixture {
    pub fn new(provider: FakeProvider) -> Self {
        Self::with_sample_size(provider, 9)
    }

    pub fn with_sample_size(provider: FakeProvider, sample_size: usize) -> Self {
        let provider = Arc::new(provider);
        Self {
            router: create_router(state_for(&provider, sample_size)),
            provider,
        }
    }

    /// Full app including the shell assets under `static_dir`
    pub fn with_static_dir(provider: FakeProvider, static_dir: &Path) -> Self {
        let provider = Arc::new(provider);
        Self {
            router: create_app(state_for(&provider, 9), static_dir),
            provider,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }
}
