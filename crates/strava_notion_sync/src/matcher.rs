//! Association of a completed activity with a planned workout.
//!
//! Candidates are planned entries of the same sport that are not Done and not
//! yet linked. Entries dated exactly on the activity date form the exact tier;
//! otherwise entries within the tolerance window form the fuzzy tier. Within the
//! chosen tier the smallest absolute day distance wins; equal distances go to
//! the earlier planned date, then to the lowest page id.

use chrono::{Days, NaiveDate};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use strava_notion_client::utils::parse_calendar_date;
use strava_notion_client::{NotionClient, NotionPage};

use crate::error::{Result, SyncError};
use crate::mapping::FieldMapping;
use crate::sport::Sport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlannedStatus {
    Pending,
    Done,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedEntry {
    pub id: String,
    pub sport: Sport,
    pub date: NaiveDate,
    pub status: PlannedStatus,
    /// Completed record already linked to this entry.
    pub linked_activity: Option<String>,
}

impl PlannedEntry {
    /// Read an entry from a planning page; `None` when sport or date is unusable.
    pub fn from_page(page: &NotionPage, mapping: &FieldMapping) -> Option<Self> {
        let fields = &mapping.planning;
        let sport = page
            .select_name(&fields.sport)
            .and_then(|label| mapping.sport_from_target_label(label))?;
        let date = page.date_start(&fields.date).and_then(parse_calendar_date)?;
        let status = match page.select_name(&fields.status) {
            Some(s) if s == fields.done_label => PlannedStatus::Done,
            _ => PlannedStatus::Pending,
        };
        Some(Self {
            id: page.id.clone(),
            sport,
            date,
            status,
            linked_activity: page.relation_ids(&fields.activity_link).into_iter().next(),
        })
    }

    pub fn is_eligible(&self) -> bool {
        self.status != PlannedStatus::Done && self.linked_activity.is_none()
    }

    fn distance_days(&self, date: NaiveDate) -> i64 {
        (self.date - date).num_days().abs()
    }
}

/// Pick the best candidate from a planning snapshot. Pure and deterministic.
pub fn select_match<'a>(
    candidates: &'a [PlannedEntry],
    sport: Sport,
    date: NaiveDate,
    tolerance_days: u32,
) -> Option<&'a PlannedEntry> {
    let eligible: Vec<&PlannedEntry> = candidates
        .iter()
        .filter(|e| e.sport == sport && e.is_eligible())
        .collect();

    let exact: Vec<&PlannedEntry> = eligible.iter().copied().filter(|e| e.date == date).collect();
    let tier: Vec<&PlannedEntry> = if exact.is_empty() {
        eligible
            .into_iter()
            .filter(|e| e.distance_days(date) <= i64::from(tolerance_days))
            .collect()
    } else {
        exact
    };

    tier.into_iter().min_by(|a, b| closeness(a, b, date))
}

fn closeness(a: &PlannedEntry, b: &PlannedEntry, date: NaiveDate) -> Ordering {
    a.distance_days(date)
        .cmp(&b.distance_days(date))
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone)]
pub struct PlannedWorkoutMatcher {
    store: Arc<dyn NotionClient>,
    database_id: String,
    mapping: Arc<FieldMapping>,
}

impl PlannedWorkoutMatcher {
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

    /// Best pending entry for `sport` on `date`. Entries in `claimed` were
    /// already taken earlier in the run and are skipped even if the store
    /// still reports them as open.
    pub async fn find_match(
        &self,
        sport: Sport,
        date: NaiveDate,
        claimed: &HashSet<String>,
    ) -> Result<Option<PlannedEntry>> {
        let mut candidates = self.candidates(sport, date).await?;
        candidates.retain(|e| !claimed.contains(&e.id));
        let tolerance = self.mapping.options.match_tolerance_days;
        let found = select_match(&candidates, sport, date, tolerance).cloned();
        match &found {
            Some(entry) => tracing::debug!(
                "{} on {}: matched planned entry {} dated {} ({} candidates)",
                sport,
                date,
                entry.id,
                entry.date,
                candidates.len()
            ),
            None => tracing::debug!(
                "{} on {}: no planned entry among {} candidates",
                sport,
                date,
                candidates.len()
            ),
        }
        Ok(found)
    }

    /// Eligible entries within the tolerance window, as the store returns them.
    async fn candidates(&self, sport: Sport, date: NaiveDate) -> Result<Vec<PlannedEntry>> {
        let filter = self.candidate_filter(sport, date)?;
        let pages = self
            .store
            .query_database(&self.database_id, Some(filter))
            .await?;
        Ok(pages
            .iter()
            .filter_map(|page| {
                let entry = PlannedEntry::from_page(page, &self.mapping);
                if entry.is_none() {
                    tracing::warn!("planned entry {} has no usable sport or date; ignored", page.id);
                }
                entry
            })
            .collect())
    }

    fn candidate_filter(&self, sport: Sport, date: NaiveDate) -> Result<Value> {
        let fields = &self.mapping.planning;
        let tolerance = self.mapping.options.match_tolerance_days;
        let window = Days::new(u64::from(tolerance));
        let (Some(from), Some(to)) = (date.checked_sub_days(window), date.checked_add_days(window))
        else {
            return Err(SyncError::config(format!(
                "match window of {tolerance} days around {date} is out of range"
            )));
        };
        Ok(json!({
            "and": [
                { "property": fields.sport, "select": { "equals": self.mapping.target_label(sport) } },
                { "property": fields.status, "select": { "does_not_equal": fields.done_label } },
                { "property": fields.activity_link, "relation": { "is_empty": true } },
                { "property": fields.date, "date": { "on_or_after": from.to_string() } },
                { "property": fields.date, "date": { "on_or_before": to.to_string() } }
            ]
        }))
    }
}
