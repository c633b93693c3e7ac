//! `StravaClient` and `NotionClient` traits with reqwest-based implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

pub mod config;
pub mod notion;
mod response;
pub mod retry;
pub mod strava;
pub mod utils;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited by remote API")]
    RateLimited { retry_after: Option<u64> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Map a non-success status without a dedicated variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => ClientError::RateLimited { retry_after: None },
            _ => ClientError::Api { status, message },
        }
    }

    /// Timeouts, connection failures, 429 and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e
                        .status()
                        .map(|s| s.is_server_error() || s.as_u16() == 429)
                        .unwrap_or(false)
            }
            ClientError::RateLimited { .. } => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Minimum wait requested by the server, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClientError::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Access token grant returned by the Strava OAuth endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// A Strava summary activity as returned by `GET /athlete/activities`.
///
/// Every metric is optional: an activity recorded without a power meter simply
/// has no `average_watts` key, which is different from a recorded zero.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawActivity {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_date_local: Option<String>,
    /// Meters.
    #[serde(default)]
    pub distance: Option<f64>,
    /// Seconds.
    #[serde(default)]
    pub moving_time: Option<f64>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub max_watts: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
}

impl RawActivity {
    /// Provider sport label, preferring the newer `sport_type` over `type`.
    pub fn sport_label(&self) -> Option<&str> {
        self.sport_type
            .as_deref()
            .or(self.activity_type.as_deref())
    }

    /// Calendar date of the activity in the athlete's own time zone.
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.start_date_local
            .as_deref()
            .and_then(utils::parse_calendar_date)
            .or_else(|| self.start_date.as_deref().and_then(utils::parse_calendar_date))
    }
}

/// A Notion page with its raw property payloads.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NotionPage {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Option name of a `select` or `status` property.
    pub fn select_name(&self, name: &str) -> Option<&str> {
        let prop = self.property(name)?;
        prop.get("select")
            .or_else(|| prop.get("status"))
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
    }

    /// `start` of a `date` property.
    pub fn date_start(&self, name: &str) -> Option<&str> {
        self.property(name)?
            .get("date")?
            .get("start")?
            .as_str()
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.property(name)?.get("number")?.as_f64()
    }

    /// Page ids referenced by a `relation` property.
    pub fn relation_ids(&self, name: &str) -> Vec<String> {
        self.property(name)
            .and_then(|p| p.get("relation"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|r| r.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
pub trait StravaClient: Send + Sync + 'static {
    /// Exchange the refresh token for a fresh access token.
    async fn authenticate(&self) -> Result<SecretString, ClientError>;

    /// All activities started within `[since, until]`, across every page.
    async fn list_activities(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<RawActivity>, ClientError>;
}

#[async_trait]
pub trait NotionClient: Send + Sync + 'static {
    /// Query a database, following pagination until exhausted.
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>, ClientError>;

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
        icon: Option<&str>,
    ) -> Result<NotionPage, ClientError>;

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage, ClientError>;
}
