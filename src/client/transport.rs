use std::future::Future;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

/// Response as seen by the client core, cacheable as a whole
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: value.to_string().into_bytes(),
        }
    }

    /// Synthetic `{"results": []}` served when an API call fails with nothing cached
    pub fn empty_results() -> Self {
        Self::json(200, &serde_json::json!({ "results": [] }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse_json<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Outgoing GET requests relative to the application origin
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// `path` is the request path including its query string
    async fn get(&self, path: &str) -> AppResult<HttpResponse>;
}

/// Network transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: HttpClient,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, path: &str) -> AppResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http_client.get(&url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Runs `fetch` until it completes or `token` is cancelled.
///
/// A cancelled fetch is dropped mid-flight and reports `AppError::Cancelled`.
pub async fn cancellable<T, F>(token: &CancellationToken, fetch: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        _ = token.cancelled() => Err(AppError::Cancelled),
        result = fetch => result,
    }
}
