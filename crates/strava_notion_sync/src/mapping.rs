//! Field mapping between semantic fields and Notion property names.
//!
//! Loaded once at start from a YAML file layered over built-in defaults, then
//! shared read-only by every component. Each entry is either a property name or
//! `false` to disable the field:
//!
//! ```yaml
//! common_fields:
//!   name: Name
//!   calories: false
//! run_fields:
//!   pace_text: Pace
//! planning_fields:
//!   status: Selection status
//! options:
//!   include_pace_suffix: false
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::activity::Metric;
use crate::error::{Result, SyncError};
use crate::sport::Sport;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum FieldSetting {
    Name(String),
    Toggle(bool),
}

impl FieldSetting {
    fn resolve(self, section: &str, key: &str) -> Result<Option<String>> {
        match self {
            FieldSetting::Name(name) if name.trim().is_empty() => Err(SyncError::field_mapping(
                format!("{section}.{key} has an empty property name"),
            )),
            FieldSetting::Name(name) => Ok(Some(name)),
            FieldSetting::Toggle(false) => Ok(None),
            FieldSetting::Toggle(true) => Err(SyncError::field_mapping(format!(
                "{section}.{key} is enabled but names no property"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MappingFile {
    #[serde(default)]
    common_fields: BTreeMap<String, FieldSetting>,
    #[serde(default)]
    run_fields: BTreeMap<String, FieldSetting>,
    #[serde(default)]
    bike_fields: BTreeMap<String, FieldSetting>,
    #[serde(default)]
    swim_fields: BTreeMap<String, FieldSetting>,
    #[serde(default)]
    planning_fields: BTreeMap<String, String>,
    #[serde(default)]
    sport_labels: BTreeMap<Sport, String>,
    #[serde(default)]
    sport_icons: BTreeMap<Sport, String>,
    #[serde(default)]
    sport_categories: BTreeMap<Sport, String>,
    #[serde(default)]
    options: OptionsFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    distance_unit_divisor: Option<f64>,
    time_unit_divisor: Option<f64>,
    include_pace_suffix: Option<bool>,
    match_tolerance_days: Option<u32>,
    update_existing: Option<bool>,
}

/// Non-metric properties of a training-log record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordFields {
    pub title: String,
    pub date: Option<String>,
    /// Number property holding the Strava id; the duplicate guard's key.
    pub external_id: String,
    /// Select property for the canonical sport label.
    pub sport: Option<String>,
    /// Relation to the sport lookup table.
    pub sport_category: Option<String>,
    /// Relation from the record to its planned workout.
    pub planned_workout: Option<String>,
}

/// Properties of the planning database.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanningFields {
    pub sport: String,
    pub date: String,
    pub status: String,
    pub done_label: String,
    /// Relation from the planned entry to the completed record.
    pub activity_link: String,
}

/// Widest accepted planned-workout matching window, in days either side.
pub const MAX_MATCH_TOLERANCE_DAYS: u32 = 366;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappingOptions {
    pub distance_unit_divisor: f64,
    pub time_unit_divisor: f64,
    pub include_pace_suffix: bool,
    pub match_tolerance_days: u32,
    pub update_existing: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            distance_unit_divisor: 1000.0,
            time_unit_divisor: 60.0,
            include_pace_suffix: true,
            match_tolerance_days: 3,
            update_existing: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldMapping {
    pub record: RecordFields,
    pub planning: PlanningFields,
    pub options: MappingOptions,
    common_metrics: BTreeMap<Metric, Option<String>>,
    sport_metrics: BTreeMap<Sport, BTreeMap<Metric, Option<String>>>,
    sport_labels: BTreeMap<Sport, String>,
    sport_icons: BTreeMap<Sport, String>,
    sport_categories: BTreeMap<Sport, String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        let common_metrics = [
            (Metric::DistanceKm, "Distance (km)"),
            (Metric::DurationMin, "Duration (min)"),
            (Metric::ElevationGain, "Elevation Gain (m)"),
            (Metric::HeartRateAvg, "Heart Rate Avg"),
            (Metric::HeartRateMax, "Heart Rate Max"),
            (Metric::Calories, "Calories"),
        ];
        let run = [
            (Metric::Pace, "Average pace"),
            (Metric::PaceText, "Pace"),
            (Metric::Cadence, "Average Cadence"),
        ];
        let bike = [
            (Metric::Speed, "Speed (km/h)"),
            (Metric::Cadence, "Average Cadence"),
            (Metric::PowerAvg, "Power Avg (Watts)"),
            (Metric::PowerMax, "Power Max (Watts)"),
        ];
        let swim = [
            (Metric::SwimPace, "Swim Pace (min/100m)"),
            (Metric::StrokeRate, "Stroke Rate"),
        ];
        let named = |pairs: &[(Metric, &str)]| -> BTreeMap<Metric, Option<String>> {
            pairs
                .iter()
                .map(|(m, n)| (*m, Some(n.to_string())))
                .collect()
        };

        Self {
            record: RecordFields {
                title: "Name".into(),
                date: Some("Date".into()),
                external_id: "Strava ID".into(),
                sport: None,
                sport_category: None,
                planned_workout: None,
            },
            planning: PlanningFields {
                sport: "Sport relation".into(),
                date: "Date".into(),
                status: "Selection status".into(),
                done_label: "Done".into(),
                activity_link: "Training Log Entries".into(),
            },
            options: MappingOptions::default(),
            common_metrics: named(&common_metrics),
            sport_metrics: BTreeMap::from([
                (Sport::Run, named(&run)),
                (Sport::Bike, named(&bike)),
                (Sport::Swim, named(&swim)),
            ]),
            sport_labels: BTreeMap::new(),
            sport_icons: BTreeMap::new(),
            sport_categories: BTreeMap::new(),
        }
    }
}

impl FieldMapping {
    /// Load a mapping file, layering its entries over the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::field_mapping(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: MappingFile = serde_yaml::from_str(raw)
            .map_err(|e| SyncError::field_mapping(format!("invalid YAML: {e}")))?;
        let mut mapping = Self::default();
        mapping.apply(file)?;
        Ok(mapping)
    }

    fn apply(&mut self, file: MappingFile) -> Result<()> {
        for (key, setting) in file.common_fields {
            let value = setting.resolve("common_fields", &key)?;
            match key.as_str() {
                "name" => self.record.title = required(value, "common_fields.name")?,
                "external_id" => {
                    self.record.external_id = required(value, "common_fields.external_id")?
                }
                "date" => self.record.date = value,
                "sport" => self.record.sport = value,
                "sport_category" => self.record.sport_category = value,
                "planned_workout" => self.record.planned_workout = value,
                other => {
                    let metric = Metric::from_key(other).ok_or_else(|| {
                        SyncError::field_mapping(format!("common_fields.{other} is not a known field"))
                    })?;
                    self.common_metrics.insert(metric, value);
                }
            }
        }

        for (sport, section) in [
            (Sport::Run, file.run_fields),
            (Sport::Bike, file.bike_fields),
            (Sport::Swim, file.swim_fields),
        ] {
            let section_name = format!("{}_fields", sport.key());
            for (key, setting) in section {
                let metric = Metric::from_key(&key)
                    .filter(|m| sport.metrics().contains(m))
                    .ok_or_else(|| {
                        SyncError::field_mapping(format!(
                            "{section_name}.{key} is not a {} metric",
                            sport.key()
                        ))
                    })?;
                let value = setting.resolve(&section_name, &key)?;
                self.sport_metrics
                    .entry(sport)
                    .or_default()
                    .insert(metric, value);
            }
        }

        for (key, name) in file.planning_fields {
            if name.trim().is_empty() {
                return Err(SyncError::field_mapping(format!(
                    "planning_fields.{key} has an empty property name"
                )));
            }
            let slot = match key.as_str() {
                "sport" => &mut self.planning.sport,
                "date" => &mut self.planning.date,
                "status" => &mut self.planning.status,
                "done_label" => &mut self.planning.done_label,
                "activity_link" => &mut self.planning.activity_link,
                other => {
                    return Err(SyncError::field_mapping(format!(
                        "planning_fields.{other} is not a known field"
                    )));
                }
            };
            *slot = name;
        }

        self.sport_labels.extend(file.sport_labels);
        self.sport_icons.extend(file.sport_icons);
        self.sport_categories.extend(file.sport_categories);

        let o = file.options;
        if let Some(d) = o.distance_unit_divisor {
            self.options.distance_unit_divisor = positive(d, "options.distance_unit_divisor")?;
        }
        if let Some(d) = o.time_unit_divisor {
            self.options.time_unit_divisor = positive(d, "options.time_unit_divisor")?;
        }
        if let Some(v) = o.include_pace_suffix {
            self.options.include_pace_suffix = v;
        }
        if let Some(v) = o.match_tolerance_days {
            if v > MAX_MATCH_TOLERANCE_DAYS {
                return Err(SyncError::field_mapping(format!(
                    "options.match_tolerance_days must be at most {MAX_MATCH_TOLERANCE_DAYS}, got {v}"
                )));
            }
            self.options.match_tolerance_days = v;
        }
        if let Some(v) = o.update_existing {
            self.options.update_existing = v;
        }
        Ok(())
    }

    /// Notion property for `metric` on a `sport` record, or `None` when unmapped
    /// or disabled. Sport sections take precedence over `common_fields`.
    pub fn metric_property(&self, sport: Sport, metric: Metric) -> Option<&str> {
        if let Some(entry) = self.sport_metrics.get(&sport).and_then(|s| s.get(&metric)) {
            return entry.as_deref();
        }
        self.common_metrics.get(&metric).and_then(|v| v.as_deref())
    }

    pub fn target_label(&self, sport: Sport) -> &str {
        self.sport_labels
            .get(&sport)
            .map(String::as_str)
            .unwrap_or_else(|| sport.default_target_label())
    }

    /// Notion select label → canonical tag.
    pub fn sport_from_target_label(&self, label: &str) -> Option<Sport> {
        Sport::ALL
            .into_iter()
            .find(|s| self.target_label(*s) == label)
    }

    pub fn icon(&self, sport: Sport) -> &str {
        self.sport_icons
            .get(&sport)
            .map(String::as_str)
            .unwrap_or_else(|| sport.default_icon())
    }

    /// Page id in the sport lookup table, when configured.
    pub fn sport_category(&self, sport: Sport) -> Option<&str> {
        self.sport_categories.get(&sport).map(String::as_str)
    }
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    value.ok_or_else(|| SyncError::field_mapping(format!("{what} cannot be disabled")))
}

fn positive(v: f64, what: &str) -> Result<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(SyncError::field_mapping(format!("{what} must be > 0, got {v}")))
    }
}
