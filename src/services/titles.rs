use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::MinimalTitle,
    services::providers::MetadataProvider,
};

/// Full title record; any upstream failure is reported as not found
pub async fn title_record(provider: &dyn MetadataProvider, id: &str) -> AppResult<Value> {
    provider.fetch_title(id).await.map_err(|e| {
        tracing::debug!(error = %e, title_id = %id, "Title lookup failed");
        AppError::NotFound(format!("Title {} not found", id))
    })
}

/// Minimal lookup used by watchlist reconciliation; failures yield `ok: false`
pub async fn minimal_title(provider: &dyn MetadataProvider, id: &str) -> MinimalTitle {
    match provider.fetch_title(id).await {
        Ok(record) => MinimalTitle::from_record(id, &record),
        Err(e) => {
            tracing::debug!(error = %e, title_id = %id, "Minimal title lookup failed");
            MinimalTitle::missing(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockMetadataProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_minimal_title_failure_is_not_ok() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_fetch_title()
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));

        let minimal = minimal_title(&mock, "tt9").await;
        assert_eq!(minimal, MinimalTitle::missing("tt9"));
    }

    #[tokio::test]
    async fn test_minimal_title_strips_na_poster() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_fetch_title().returning(|_| {
            Ok(json!({"Title": "Heat", "Year": "1995", "Poster": "N/A", "Type": "movie"}))
        });

        let minimal = minimal_title(&mock, "tt0113277").await;
        assert!(minimal.ok);
        assert_eq!(minimal.poster, None);
    }

    #[tokio::test]
    async fn test_title_record_maps_errors_to_not_found() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_fetch_title()
            .returning(|_| Err(AppError::ExternalApi("502".to_string())));

        let result = title_record(&mock, "tt404").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
