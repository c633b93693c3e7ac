//! Logging wrapper around the target-store client.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use strava_notion_client::{ClientError, NotionClient, NotionPage};
use tracing::debug;

/// Logs name, duration and outcome of every `NotionClient` call at debug level.
#[derive(Clone)]
pub struct LoggingMiddleware<C: NotionClient> {
    inner: Arc<C>,
}

impl<C: NotionClient> LoggingMiddleware<C> {
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    async fn with_logging<F, Fut, T>(&self, operation: F, name: &str) -> Result<T, ClientError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = Result<T, ClientError>>,
    {
        let start = Instant::now();
        debug!("Starting operation: {}", name);

        let result = operation(self.inner.clone()).await;

        let duration = start.elapsed();
        match &result {
            Ok(_) => debug!("Operation completed: {} in {:?}", name, duration),
            Err(e) => debug!("Operation failed: {} in {:?} - error: {}", name, duration, e),
        }

        result
    }
}

#[async_trait::async_trait]
impl<C: NotionClient> NotionClient for LoggingMiddleware<C> {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>, ClientError> {
        self.with_logging(
            |client| async move { client.query_database(database_id, filter).await },
            "query_database",
        )
        .await
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
        icon: Option<&str>,
    ) -> Result<NotionPage, ClientError> {
        self.with_logging(
            |client| async move { client.create_page(database_id, properties, icon).await },
            "create_page",
        )
        .await
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage, ClientError> {
        self.with_logging(
            |client| async move { client.update_page(page_id, properties).await },
            "update_page",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, logged_activity_page};

    #[tokio::test]
    async fn logging_middleware_forwards_calls() {
        let store = MemoryStore::new();
        store.seed("db", logged_activity_page("p1", 7)).await;
        let middleware = LoggingMiddleware::new(store);

        let pages = middleware.query_database("db", None).await.unwrap();
        assert_eq!(pages.len(), 1);

        let created = middleware
            .create_page("db", Map::new(), Some("\u{1F3CA}"))
            .await
            .unwrap();
        let updated = middleware.update_page(&created.id, Map::new()).await.unwrap();
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn logging_middleware_passes_errors_through() {
        let middleware = LoggingMiddleware::new(MemoryStore::new());
        let err = middleware.update_page("missing", Map::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
