//! Strava → Notion training-log sync.
//!
//! A run authenticates with Strava, fetches the activities of the lookback
//! window, normalizes Run/Bike/Swim records and upserts each one into the
//! Notion training log, linking it to a matching planned workout when one
//! exists. Activities are processed one at a time; a failing activity is
//! recorded in the [`SyncResult`] and the run moves on.

use chrono::{DateTime, Days, Utc};
use std::sync::Arc;

use strava_notion_client::{NotionClient, StravaClient};

pub mod activity;
pub mod duplicate;
pub mod error;
pub mod mapping;
pub mod matcher;
pub mod middleware;
pub mod properties;
pub mod report;
pub mod settings;
pub mod source;
pub mod sport;
pub mod transform;
pub mod upsert;

mod test_utils;

pub use error::{Result, SyncError};
pub use mapping::FieldMapping;
pub use report::SyncResult;
pub use settings::Settings;

use source::ActivitySource;
use transform::{ActivityTransformer, UnitOptions};
use upsert::UpsertCoordinator;

pub struct SyncRunner {
    strava: Arc<dyn StravaClient>,
    notion: Arc<dyn NotionClient>,
    settings: Settings,
}

impl SyncRunner {
    pub fn new(
        strava: Arc<dyn StravaClient>,
        notion: Arc<dyn NotionClient>,
        settings: Settings,
    ) -> Self {
        Self {
            strava,
            notion,
            settings,
        }
    }

    pub async fn run(&self) -> Result<SyncResult> {
        self.run_at(Utc::now()).await
    }

    /// Sync the window ending at `now`. Errors returned here are setup
    /// failures; everything after the fetch lands in the report.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SyncResult> {
        let settings = &self.settings;
        let since = now
            .checked_sub_days(Days::new(u64::from(settings.lookback_days)))
            .ok_or_else(|| {
                SyncError::config(format!(
                    "a lookback of {} days from {} is out of range",
                    settings.lookback_days,
                    now.format("%Y-%m-%d")
                ))
            })?;
        self.strava
            .authenticate()
            .await
            .map_err(|e| SyncError::Authentication(e.to_string()))?;

        tracing::info!(
            "syncing activities from {} to {}{}",
            since.format("%Y-%m-%d"),
            now.format("%Y-%m-%d"),
            if settings.dry_run { " (dry run)" } else { "" }
        );
        let batch = ActivitySource::new(self.strava.clone())
            .fetch(since, now)
            .await?;

        let transformer =
            ActivityTransformer::new(UnitOptions::from(settings.mapping.options));
        let coordinator = UpsertCoordinator::new(
            self.notion.clone(),
            settings.activities_db_id.clone(),
            settings.planning_db_id.clone(),
            settings.mapping.clone(),
        )
        .with_dry_run(settings.dry_run)
        .with_update_existing(settings.update_existing);

        let mut report = SyncResult::new(settings.dry_run);
        report.ignored = batch.unsupported;
        for (sport, raw) in &batch.activities {
            match transformer.transform(*sport, raw) {
                Ok(activity) => coordinator.process(&activity, &mut report).await,
                Err(e) => {
                    tracing::warn!("activity {}: {}", raw.id, e);
                    report.record_error(raw.id, e.to_string());
                }
            }
        }

        tracing::info!(
            "sync finished: created={} updated={} skipped={} linked={} errors={}",
            report.created,
            report.updated,
            report.skipped_duplicate,
            report.linked,
            report.error_count()
        );
        Ok(report)
    }
}
