//! HTTP client implementation for the Strava API.
//!
//! This module provides a reqwest-based implementation of the [`StravaClient`](crate::StravaClient) trait.

use crate::config::StravaConfig;
use crate::response::{error_from_response, handle_json};
use crate::retry::RetryPolicy;
use crate::{ClientError, RawActivity, StravaClient, TokenGrant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::sync::RwLock;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Client for the Strava API using reqwest.
#[derive(Debug)]
pub struct ReqwestStravaClient {
    config: StravaConfig,
    client: reqwest::Client,
    access_token: RwLock<Option<SecretString>>,
    retry: RetryPolicy,
    page_size: u32,
}

impl ReqwestStravaClient {
    pub fn new(config: StravaConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let config = StravaConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Ok(Self {
            config,
            client,
            access_token: RwLock::new(None),
            retry: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Cached access token, authenticating on first use.
    async fn access_token(&self) -> Result<SecretString, ClientError> {
        if let Some(token) = self.access_token.read().await.clone() {
            return Ok(token);
        }
        self.authenticate().await
    }

    async fn request_token(&self) -> Result<TokenGrant, ClientError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("refresh_token", self.config.refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];
        let resp = self
            .client
            .post(&self.config.oauth_url)
            .form(&form)
            .send()
            .await?;
        if resp.status().is_client_error() && resp.status().as_u16() != 429 {
            // Strava answers a revoked or malformed refresh token with 400.
            let err = error_from_response(resp).await;
            return Err(ClientError::Auth(err.to_string()));
        }
        handle_json(resp).await
    }

    async fn fetch_page(
        &self,
        token: &SecretString,
        after: i64,
        before: i64,
        page: u32,
    ) -> Result<Vec<RawActivity>, ClientError> {
        let url = format!("{}/athlete/activities", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .query(&[
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("page", page.to_string()),
                ("per_page", self.page_size.to_string()),
            ])
            .send()
            .await?;
        handle_json(resp).await
    }
}

#[async_trait]
impl StravaClient for ReqwestStravaClient {
    async fn authenticate(&self) -> Result<SecretString, ClientError> {
        let grant = self.retry.retry_async(|| self.request_token()).await?;
        if grant
            .refresh_token
            .as_deref()
            .is_some_and(|rt| rt != self.config.refresh_token.expose_secret())
        {
            tracing::warn!(
                "Strava rotated the refresh token; update STRAVA_REFRESH_TOKEN before the old one expires"
            );
        }
        tracing::debug!("Strava access token acquired (expires_at: {:?})", grant.expires_at);
        let token = SecretString::new(grant.access_token.into());
        *self.access_token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn list_activities(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<RawActivity>, ClientError> {
        let mut token = self.access_token().await?;
        let (after, before) = (since.timestamp(), until.timestamp());
        let mut refreshed = false;
        let mut activities = Vec::new();
        let mut page = 1u32;

        loop {
            let result = self
                .retry
                .retry_async(|| self.fetch_page(&token, after, before, page))
                .await;
            let batch = match result {
                Err(ClientError::Auth(_)) if !refreshed => {
                    // cached token expired mid-run
                    token = self.authenticate().await?;
                    refreshed = true;
                    continue;
                }
                other => other?,
            };
            let fetched = batch.len();
            tracing::debug!("Strava page {}: {} activities", page, fetched);
            activities.extend(batch);
            if fetched < self.page_size as usize {
                break;
            }
            page += 1;
        }

        Ok(activities)
    }
}
