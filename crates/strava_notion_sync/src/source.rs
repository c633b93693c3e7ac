use chrono::{DateTime, Utc};
use std::sync::Arc;

use strava_notion_client::{RawActivity, StravaClient};

use crate::error::Result;
use crate::sport::Sport;

/// Activities of a synced sport, each paired with its sport, plus how many
/// others were dropped.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub activities: Vec<(Sport, RawActivity)>,
    pub unsupported: usize,
}

/// Time-bounded fetch of Strava activities, limited to synced sports.
#[derive(Clone)]
pub struct ActivitySource {
    client: Arc<dyn StravaClient>,
}

impl ActivitySource {
    pub fn new(client: Arc<dyn StravaClient>) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Batch> {
        let all = self.client.list_activities(since, until).await?;
        let total = all.len();
        let recognized: Vec<(Sport, RawActivity)> = all
            .into_iter()
            .filter_map(|a| match a.sport_label().and_then(Sport::from_provider_label) {
                Some(sport) => Some((sport, a)),
                None => {
                    tracing::debug!(
                        "activity {} ({}) is not synced",
                        a.id,
                        a.sport_label().unwrap_or("no sport")
                    );
                    None
                }
            })
            .collect();
        tracing::info!(
            "fetched {} activities since {}, {} are Swim/Bike/Run",
            total,
            since.format("%Y-%m-%d"),
            recognized.len()
        );
        Ok(Batch {
            unsupported: total - recognized.len(),
            activities: recognized,
        })
    }
}
