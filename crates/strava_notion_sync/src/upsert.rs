//! Per-activity create-or-skip and planned-workout linking.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use strava_notion_client::NotionClient;

use crate::activity::NormalizedActivity;
use crate::duplicate::DuplicateGuard;
use crate::error::{Result, SyncError};
use crate::mapping::FieldMapping;
use crate::matcher::PlannedWorkoutMatcher;
use crate::properties;
use crate::report::SyncResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created { linked: bool },
    Updated,
    SkippedDuplicate,
}

pub struct UpsertCoordinator {
    guard: DuplicateGuard,
    matcher: PlannedWorkoutMatcher,
    store: Arc<dyn NotionClient>,
    mapping: Arc<FieldMapping>,
    activities_db: String,
    dry_run: bool,
    update_existing: bool,
    /// Planned entries linked during this run, dry or not.
    claimed: Mutex<HashSet<String>>,
}

impl UpsertCoordinator {
    pub fn new(
        store: Arc<dyn NotionClient>,
        activities_db: impl Into<String>,
        planning_db: impl Into<String>,
        mapping: Arc<FieldMapping>,
    ) -> Self {
        let activities_db = activities_db.into();
        Self {
            guard: DuplicateGuard::new(store.clone(), activities_db.clone(), mapping.clone()),
            matcher: PlannedWorkoutMatcher::new(store.clone(), planning_db, mapping.clone()),
            update_existing: mapping.options.update_existing,
            store,
            mapping,
            activities_db,
            dry_run: false,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_update_existing(mut self, update_existing: bool) -> Self {
        self.update_existing = update_existing;
        self
    }

    /// Process one activity, folding its outcome or failure into `report`.
    pub async fn process(&self, activity: &NormalizedActivity, report: &mut SyncResult) {
        match self.upsert(activity, report).await {
            Ok(outcome) => tracing::debug!("activity {}: {:?}", activity.external_id, outcome),
            Err(e) => {
                tracing::error!(
                    "activity {} ({}): {}",
                    activity.external_id,
                    activity.name,
                    e
                );
                report.record_error(activity.external_id, e.to_string());
            }
        }
    }

    /// Counters are bumped as each write lands, so a failed link still
    /// leaves `created` accounted for.
    pub async fn upsert(
        &self,
        activity: &NormalizedActivity,
        report: &mut SyncResult,
    ) -> Result<Outcome> {
        if !self.update_existing {
            if self.guard.exists(activity.external_id).await? {
                tracing::info!("activity {} already synced; skipped", activity.external_id);
                report.skipped_duplicate += 1;
                return Ok(Outcome::SkippedDuplicate);
            }
        } else if let Some(existing) = self.guard.find_existing(activity.external_id).await? {
            let props = properties::metric_properties(activity, &self.mapping);
            if self.dry_run {
                tracing::info!("[dry-run] would refresh {} fields on {}", props.len(), existing.id);
            } else {
                self.store.update_page(&existing.id, props).await?;
                tracing::info!("refreshed record {} for activity {}", existing.id, activity.external_id);
            }
            report.updated += 1;
            return Ok(Outcome::Updated);
        }

        let page_id = self.create(activity).await?;
        report.created += 1;

        // held until the link is recorded so no other activity can take the entry
        let mut claimed = self.claimed.lock().await;
        let Some(planned) = self
            .matcher
            .find_match(activity.sport, activity.date, &claimed)
            .await?
        else {
            tracing::info!(
                "{} {} on {}: no planned workout",
                activity.sport,
                activity.external_id,
                activity.date
            );
            return Ok(Outcome::Created { linked: false });
        };

        if self.dry_run {
            tracing::info!(
                "[dry-run] would link activity {} to planned entry {} ({})",
                activity.external_id,
                planned.id,
                planned.date
            );
        } else {
            let planned_props = properties::planned_entry_link(&self.mapping, &page_id);
            self.store.update_page(&planned.id, planned_props).await?;
            tracing::info!(
                "linked activity {} to planned entry {} ({})",
                activity.external_id,
                planned.id,
                planned.date
            );
        }
        claimed.insert(planned.id.clone());
        report.linked += 1;

        if let Some(props) = properties::activity_link(&self.mapping, &planned.id) {
            if !self.dry_run {
                self.store
                    .update_page(&page_id, props)
                    .await
                    .map_err(|source| SyncError::PartialLink {
                        planned_id: planned.id.clone(),
                        source,
                    })?;
            }
        }
        Ok(Outcome::Created { linked: true })
    }

    async fn create(&self, activity: &NormalizedActivity) -> Result<String> {
        let props = properties::activity_properties(activity, &self.mapping);
        if self.dry_run {
            tracing::info!(
                "[dry-run] would create {} '{}' ({}) with {} properties",
                activity.sport,
                activity.name,
                activity.external_id,
                props.len()
            );
            return Ok(format!("dry-run-{}", activity.external_id));
        }
        let icon = self.mapping.icon(activity.sport);
        let page = self
            .store
            .create_page(&self.activities_db, props, Some(icon))
            .await?;
        tracing::info!(
            "created {} '{}' ({}) as {}",
            activity.sport,
            activity.name,
            activity.external_id,
            page.id
        );
        Ok(page.id)
    }
}
