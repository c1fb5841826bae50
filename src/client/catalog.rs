use serde_json::Value;

use crate::{
    client::transport::{HttpResponse, Transport},
    error::{AppError, AppResult},
    models::{MinimalTitle, ResultsEnvelope, Spotlight, Title},
};

/// Remote catalog as consumed by the client core
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Live search; a blank query returns nothing without a request
    async fn search(&self, query: &str) -> AppResult<Vec<Title>>;

    /// Full raw title record
    async fn detail(&self, id: &str) -> AppResult<Value>;

    /// Reduced record used for watchlist reconciliation
    async fn minimal(&self, id: &str) -> AppResult<MinimalTitle>;

    /// Featured title, `None` when the catalog has nothing to feature
    async fn spotlight(&self) -> AppResult<Option<Spotlight>>;

    /// Discover grid for an optional seed
    async fn discover(&self, seed: Option<String>) -> AppResult<Vec<Title>>;
}

/// Catalog over the server's JSON API
pub struct HttpCatalog<T: Transport> {
    transport: T,
}

impl<T: Transport> HttpCatalog<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn get_ok(&self, path: &str) -> AppResult<HttpResponse> {
        let response = self.transport.get(path).await?;
        if !response.is_success() {
            return Err(AppError::UpstreamStatus(response.status));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl<T: Transport> Catalog for HttpCatalog<T> {
    async fn search(&self, query: &str) -> AppResult<Vec<Title>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!("/api/search?q={}", urlencoding::encode(query));
        let envelope: ResultsEnvelope = self.get_ok(&path).await?.parse_json()?;
        Ok(envelope.results)
    }

    async fn detail(&self, id: &str) -> AppResult<Value> {
        let path = format!("/api/title/{}", urlencoding::encode(id));
        let record: Value = self.get_ok(&path).await?.parse_json()?;

        // An offline fallback body carries no record fields
        if record.get("imdbID").is_none() {
            return Err(AppError::NotFound(format!("Title {} not found", id)));
        }
        Ok(record)
    }

    async fn minimal(&self, id: &str) -> AppResult<MinimalTitle> {
        let path = format!("/api/title_min/{}", urlencoding::encode(id));
        self.get_ok(&path).await?.parse_json()
    }

    async fn spotlight(&self) -> AppResult<Option<Spotlight>> {
        let body: Value = self.get_ok("/api/spotlight").await?.parse_json()?;

        if body.get("id").and_then(Value::as_str).is_none() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(body)?))
    }

    async fn discover(&self, seed: Option<String>) -> AppResult<Vec<Title>> {
        let path = match seed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(seed) => format!("/api/discover?seed={}", urlencoding::encode(seed)),
            None => "/api/discover".to_string(),
        };

        let envelope: ResultsEnvelope = self.get_ok(&path).await?.parse_json()?;
        Ok(envelope.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::MockTransport;
    use crate::models::TitleType;
    use serde_json::json;

    fn catalog_returning(path: &'static str, body: Value) -> HttpCatalog<MockTransport> {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(move |p| p == path)
            .times(1)
            .returning(move |_| Ok(HttpResponse::json(200, &body)));
        HttpCatalog::new(transport)
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let catalog = catalog_returning(
            "/api/search?q=star%20wars",
            json!({"results": [{"id": "tt0076759", "title": "Star Wars", "year": "1977", "type": "movie", "poster": null}]}),
        );

        let results = catalog.search(" star wars ").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title_type, TitleType::Movie);
    }

    #[tokio::test]
    async fn test_blank_search_makes_no_request() {
        let mut transport = MockTransport::new();
        transport.expect_get().never();

        let catalog = HttpCatalog::new(transport);
        assert!(catalog.search("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_spotlight_is_none() {
        let catalog = catalog_returning("/api/spotlight", json!({}));
        assert_eq!(catalog.spotlight().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_spotlight_parses_featured_title() {
        let catalog = catalog_returning(
            "/api/spotlight",
            json!({"id": "tt0114369", "title": "Se7en", "year": "1995", "type": "movie",
                   "poster": "http://img/se7en.jpg", "genre": "Crime", "plot": "Two detectives..."}),
        );

        let spotlight = catalog.spotlight().await.unwrap().unwrap();
        assert_eq!(spotlight.title, "Se7en");
    }

    #[tokio::test]
    async fn test_synthetic_empty_results_fails_minimal_lookup() {
        let catalog = catalog_returning("/api/title_min/tt9", json!({"results": []}));
        assert!(catalog.minimal("tt9").await.is_err());
    }

    #[tokio::test]
    async fn test_synthetic_empty_results_is_missing_detail() {
        let catalog = catalog_returning("/api/title/tt9", json!({"results": []}));
        assert!(matches!(catalog.detail("tt9").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_discover_with_and_without_seed() {
        let catalog = catalog_returning("/api/discover?seed=war", json!({"results": []}));
        assert!(catalog.discover(Some("war".to_string())).await.unwrap().is_empty());

        let catalog = catalog_returning("/api/discover", json!({"results": []}));
        assert!(catalog.discover(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(|_| Ok(HttpResponse::json(404, &json!({"error": "nope"}))));

        let catalog = HttpCatalog::new(transport);
        assert!(matches!(
            catalog.minimal("tt1").await,
            Err(AppError::UpstreamStatus(404))
        ));
    }
}
