use serde_json::json;
use std::sync::Arc;

use strava_notion_client::{NotionClient, NotionPage};

use crate::error::Result;
use crate::mapping::FieldMapping;

/// Read-only lookup of training-log records by Strava id.
#[derive(Clone)]
pub struct DuplicateGuard {
    store: Arc<dyn NotionClient>,
    database_id: String,
    mapping: Arc<FieldMapping>,
}

impl DuplicateGuard {
    pub fn new(
        store: Arc<dyn NotionClient>,
        database_id: impl Into<String>,
        mapping: Arc<FieldMapping>,
    ) -> Self {
        Self {
            store,
            database_id: database_id.into(),
            mapping,
        }
    }

    pub async fn exists(&self, external_id: u64) -> Result<bool> {
        Ok(self.find_existing(external_id).await?.is_some())
    }

    /// First record carrying `external_id`, if any.
    pub async fn find_existing(&self, external_id: u64) -> Result<Option<NotionPage>> {
        let filter = json!({
            "property": self.mapping.record.external_id,
            "number": { "equals": external_id }
        });
        let pages = self
            .store
            .query_database(&self.database_id, Some(filter))
            .await?;
        if pages.len() > 1 {
            tracing::warn!(
                "{} records already carry Strava id {}; using {}",
                pages.len(),
                external_id,
                pages[0].id
            );
        }
        Ok(pages.into_iter().next())
    }
}
