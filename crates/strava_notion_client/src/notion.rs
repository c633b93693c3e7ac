//! HTTP client implementation for the Notion API.
//!
//! This module provides a reqwest-based implementation of the [`NotionClient`](crate::NotionClient) trait.

use crate::config::{NOTION_VERSION, NotionConfig};
use crate::response::handle_json;
use crate::retry::RetryPolicy;
use crate::{ClientError, NotionClient, NotionPage};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

const QUERY_PAGE_SIZE: u32 = 100;

/// Client for the Notion API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestNotionClient {
    config: NotionConfig,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

impl ReqwestNotionClient {
    pub fn new(config: NotionConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let config = NotionConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Ok(Self {
            config,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Attach the bearer token and API version header.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(self.config.token.expose_secret())
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        let resp = self
            .authorized(self.client.post(url))
            .json(body)
            .send()
            .await?;
        handle_json(resp).await
    }

    async fn patch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        let resp = self
            .authorized(self.client.patch(url))
            .json(body)
            .send()
            .await?;
        handle_json(resp).await
    }
}

#[async_trait]
impl NotionClient for ReqwestNotionClient {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>, ClientError> {
        if database_id.is_empty() {
            return Err(ClientError::Config("missing Notion database id".into()));
        }
        let url = format!("{}/databases/{}/query", self.config.base_url, database_id);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
            if let Some(filter) = &filter {
                body["filter"] = filter.clone();
            }
            if let Some(c) = &cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let resp: QueryResponse = self
                .retry
                .retry_async(|| self.post_json(&url, &body))
                .await?;
            pages.extend(resp.results);

            match resp.next_cursor {
                Some(next) if resp.has_more => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Notion query {} returned {} pages", database_id, pages.len());
        Ok(pages)
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
        icon: Option<&str>,
    ) -> Result<NotionPage, ClientError> {
        if database_id.is_empty() {
            return Err(ClientError::Config("missing Notion database id".into()));
        }
        let url = format!("{}/pages", self.config.base_url);
        let mut body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });
        if let Some(emoji) = icon {
            body["icon"] = json!({ "type": "emoji", "emoji": emoji });
        }
        tracing::debug!(
            "creating page in {} with properties {:?}",
            database_id,
            body["properties"].as_object().map(|p| p.keys().collect::<Vec<_>>())
        );

        self.retry
            .retry_async(|| self.post_json(&url, &body))
            .await
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage, ClientError> {
        let url = format!("{}/pages/{}", self.config.base_url, page_id);
        let body = json!({ "properties": properties });

        self.retry
            .retry_async(|| self.patch_json(&url, &body))
            .await
    }
}
