//! In-memory `NotionClient` and `StravaClient` doubles shared by unit tests.
//!
//! `MemoryStore` understands the handful of filter shapes the sync issues
//! (`and`, number `equals`, select `equals`/`does_not_equal`, relation
//! `is_empty`, date `on_or_after`/`on_or_before`).
#![cfg(test)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use strava_notion_client::utils::parse_calendar_date;
use strava_notion_client::{ClientError, NotionClient, NotionPage, RawActivity, StravaClient};

#[derive(Default)]
struct StoreState {
    /// (database id, page) in insertion order.
    pages: Vec<(String, NotionPage)>,
    icons: HashMap<String, String>,
    failing: HashSet<String>,
    fail_creates: HashSet<u64>,
    fail_updates: HashSet<String>,
    writes: usize,
    next_id: usize,
}

/// Target store kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that panics on any create or update.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub async fn seed(&self, database_id: &str, page: NotionPage) {
        self.state
            .lock()
            .await
            .pages
            .push((database_id.to_string(), page));
    }

    /// Make every query against `database_id` fail with a 500.
    pub async fn fail_queries_on(&self, database_id: &str) {
        self.state.lock().await.failing.insert(database_id.to_string());
    }

    /// Make creating the record for `external_id` fail with a 500.
    pub async fn fail_create_of(&self, external_id: u64) {
        self.state.lock().await.fail_creates.insert(external_id);
    }

    /// Make every update of `page_id` fail with a 500.
    pub async fn fail_updates_of(&self, page_id: &str) {
        self.state.lock().await.fail_updates.insert(page_id.to_string());
    }

    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }

    pub async fn pages(&self, database_id: &str) -> Vec<NotionPage> {
        self.state
            .lock()
            .await
            .pages
            .iter()
            .filter(|(db, _)| db == database_id)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub async fn page(&self, page_id: &str) -> Option<NotionPage> {
        self.state
            .lock()
            .await
            .pages
            .iter()
            .find(|(_, p)| p.id == page_id)
            .map(|(_, p)| p.clone())
    }

    pub async fn icon_of(&self, page_id: &str) -> Option<String> {
        self.state.lock().await.icons.get(page_id).cloned()
    }

    fn assert_writable(&self, op: &str) {
        if self.read_only {
            panic!("{op} called on a read-only store");
        }
    }
}

fn server_error(what: &str) -> ClientError {
    ClientError::Api {
        status: 500,
        message: format!("{what} failed"),
    }
}

fn matches(page: &NotionPage, filter: &Value) -> bool {
    if let Some(all) = filter.get("and").and_then(Value::as_array) {
        return all.iter().all(|f| matches(page, f));
    }
    let Some(property) = filter.get("property").and_then(Value::as_str) else {
        return true;
    };
    if let Some(cond) = filter.get("number") {
        return page.number(property) == cond.get("equals").and_then(Value::as_f64);
    }
    if let Some(cond) = filter.get("select") {
        let actual = page.select_name(property);
        if let Some(expected) = cond.get("equals").and_then(Value::as_str) {
            return actual == Some(expected);
        }
        if let Some(excluded) = cond.get("does_not_equal").and_then(Value::as_str) {
            return actual != Some(excluded);
        }
    }
    if let Some(cond) = filter.get("relation") {
        if cond.get("is_empty") == Some(&Value::Bool(true)) {
            return page.relation_ids(property).is_empty();
        }
    }
    if let Some(cond) = filter.get("date") {
        let Some(actual) = page.date_start(property).and_then(parse_calendar_date) else {
            return false;
        };
        let bound = |key: &str| {
            cond.get(key)
                .and_then(Value::as_str)
                .and_then(parse_calendar_date)
        };
        if let Some(min) = bound("on_or_after") {
            return actual >= min;
        }
        if let Some(max) = bound("on_or_before") {
            return actual <= max;
        }
    }
    panic!("unsupported filter in MemoryStore: {filter}");
}

#[async_trait]
impl NotionClient for MemoryStore {
    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>, ClientError> {
        let state = self.state.lock().await;
        if state.failing.contains(database_id) {
            return Err(server_error("query"));
        }
        Ok(state
            .pages
            .iter()
            .filter(|(db, _)| db == database_id)
            .filter(|(_, p)| filter.as_ref().is_none_or(|f| matches(p, f)))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
        icon: Option<&str>,
    ) -> Result<NotionPage, ClientError> {
        self.assert_writable("create_page");
        let mut state = self.state.lock().await;
        let external_id = properties
            .get("Strava ID")
            .and_then(|p| p.get("number"))
            .and_then(Value::as_f64)
            .map(|n| n as u64);
        if external_id.is_some_and(|id| state.fail_creates.contains(&id)) {
            return Err(server_error("create"));
        }
        state.next_id += 1;
        state.writes += 1;
        let page = NotionPage {
            id: format!("page-{}", state.next_id),
            properties,
        };
        if let Some(icon) = icon {
            state.icons.insert(page.id.clone(), icon.to_string());
        }
        state.pages.push((database_id.to_string(), page.clone()));
        Ok(page)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<NotionPage, ClientError> {
        self.assert_writable("update_page");
        let mut state = self.state.lock().await;
        if state.fail_updates.contains(page_id) {
            return Err(server_error("update"));
        }
        state.writes += 1;
        let (_, page) = state
            .pages
            .iter_mut()
            .find(|(_, p)| p.id == page_id)
            .ok_or_else(|| ClientError::NotFound(page_id.to_string()))?;
        page.properties.extend(properties);
        Ok(page.clone())
    }
}

/// Activity provider returning a fixed batch.
pub struct StaticStrava {
    activities: Vec<RawActivity>,
    fail_auth: bool,
    fail_listing: bool,
    windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl StaticStrava {
    pub fn new(activities: Vec<RawActivity>) -> Self {
        Self {
            activities,
            fail_auth: false,
            fail_listing: false,
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_auth() -> Self {
        Self {
            fail_auth: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(Vec::new())
        }
    }

    /// Windows passed to `list_activities`, in call order.
    pub async fn windows(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.windows.lock().await.clone()
    }
}

#[async_trait]
impl StravaClient for StaticStrava {
    async fn authenticate(&self) -> Result<SecretString, ClientError> {
        if self.fail_auth {
            return Err(ClientError::Auth("invalid refresh token".into()));
        }
        Ok(SecretString::new("test-access-token".into()))
    }

    async fn list_activities(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<RawActivity>, ClientError> {
        self.windows.lock().await.push((since, until));
        if self.fail_listing {
            return Err(server_error("list activities"));
        }
        Ok(self.activities.clone())
    }
}

/// Activity with a full metric set for `label` on `date` (YYYY-MM-DD).
pub fn raw_activity(id: u64, label: &str, date: &str) -> RawActivity {
    RawActivity {
        id,
        name: Some(format!("{label} {id}")),
        sport_type: Some(label.to_string()),
        activity_type: Some(label.to_string()),
        start_date: Some(format!("{date}T06:30:00Z")),
        start_date_local: Some(format!("{date}T08:30:00Z")),
        distance: Some(10_000.0),
        moving_time: Some(3_000.0),
        elapsed_time: Some(3_100.0),
        total_elevation_gain: Some(55.0),
        average_heartrate: Some(148.0),
        max_heartrate: Some(171.0),
        average_cadence: Some(85.0),
        average_watts: Some(210.0),
        max_watts: Some(480.0),
        calories: Some(640.0),
    }
}

/// Training-log record already carrying `external_id` in the default layout.
pub fn logged_activity_page(id: &str, external_id: u64) -> NotionPage {
    let mut properties = Map::new();
    properties.insert(
        "Name".into(),
        json!({ "title": [{ "text": { "content": "Already synced" } }] }),
    );
    properties.insert("Strava ID".into(), json!({ "number": external_id as f64 }));
    NotionPage {
        id: id.to_string(),
        properties,
    }
}

/// Planning entry in the default layout.
pub fn planned_page(
    id: &str,
    sport_label: &str,
    date: &str,
    status: Option<&str>,
    linked_activity: Option<&str>,
) -> NotionPage {
    let mut properties = Map::new();
    properties.insert(
        "Sport relation".into(),
        json!({ "select": { "name": sport_label } }),
    );
    properties.insert("Date".into(), json!({ "date": { "start": date } }));
    if let Some(status) = status {
        properties.insert(
            "Selection status".into(),
            json!({ "select": { "name": status } }),
        );
    }
    let links: Vec<Value> = linked_activity
        .into_iter()
        .map(|id| json!({ "id": id }))
        .collect();
    properties.insert("Training Log Entries".into(), json!({ "relation": links }));
    NotionPage {
        id: id.to_string(),
        properties,
    }
}
