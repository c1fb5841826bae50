/// OMDb API provider
///
/// API Flow:
/// 1. Search: `?s={query}&page={n}` → `{Search: [...], totalResults}`
/// 2. Title: `?i={imdb_id}&plot=short` → full record
///
/// A 200 response with `"Response": "False"` is an OMDb-level failure.
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;

use crate::{
    cached,
    db::{ttl, CacheKey, ResponseCache},
    error::{AppError, AppResult},
    models::{OmdbSearchResponse, SearchPage},
    services::providers::MetadataProvider,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 3;
const BACKOFF_FACTOR: Duration = Duration::from_millis(300);
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: ResponseCache,
}

fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

/// Exponential backoff before retry number `attempt` (0-based)
fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_FACTOR * 2u32.pow(attempt)
}

/// Turns an OMDb body into a result, surfacing `Response: "False"` as an error
fn check_body(body: Value) -> AppResult<Value> {
    if body.is_null() || body.as_object().is_some_and(|o| o.is_empty()) {
        return Err(AppError::NotFound("Not found".to_string()));
    }
    if body.get("Response").and_then(Value::as_str) == Some("False") {
        let message = body
            .get("Error")
            .and_then(Value::as_str)
            .unwrap_or("Not found")
            .to_string();
        return Err(AppError::NotFound(message));
    }
    Ok(body)
}

impl OmdbProvider {
    pub fn new(cache: ResponseCache, api_key: String, api_url: String) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            cache,
        })
    }

    /// Calls OMDb with retries on transient failures
    async fn omdb_get(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        let mut attempt = 0;

        loop {
            let result = self
                .http_client
                .get(&self.api_url)
                .query(&[("apikey", self.api_key.as_str())])
                .query(params)
                .send()
                .await;

            let response = match result {
                Ok(response) if is_retryable(response.status()) && attempt < MAX_RETRIES => {
                    tracing::debug!(status = %response.status(), attempt, "Retrying OMDb request");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                    continue;
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < MAX_RETRIES => {
                    tracing::debug!(error = %e, attempt, "Retrying OMDb request");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                    continue;
                }
                other => other?,
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ExternalApi(format!(
                    "OMDb API returned status {}: {}",
                    status, body
                )));
            }

            let body: Value = response.json().await?;
            return check_body(body);
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn search_titles(&self, query: &str, page: u32) -> AppResult<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let key = CacheKey::Search {
            query: query.to_string(),
            page,
        };

        cached!(self.cache, key, ttl::SEARCH, async move {
            let page_param = page.to_string();
            let body = self
                .omdb_get(&[("s", query), ("page", page_param.as_str())])
                .await?;

            let response: OmdbSearchResponse = serde_json::from_value(body)?;
            let results = SearchPage::from(response);

            tracing::info!(
                query = %query,
                page = page,
                results = results.titles.len(),
                total = results.total,
                provider = "omdb",
                "Title search completed"
            );

            Ok(results)
        })
    }

    async fn fetch_title(&self, id: &str) -> AppResult<Value> {
        cached!(self.cache, CacheKey::Title(id.to_string()), ttl::DETAIL, async move {
            let record = self.omdb_get(&[("i", id), ("plot", "short")]).await?;
            tracing::info!(title_id = %id, provider = "omdb", "Title record fetched");
            Ok(record)
        })
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
