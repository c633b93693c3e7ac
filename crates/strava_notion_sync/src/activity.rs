use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::sport::Sport;

/// Semantic metric names, independent of any Notion property naming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DistanceKm,
    DurationMin,
    ElevationGain,
    HeartRateAvg,
    HeartRateMax,
    Calories,
    /// Minutes per km, numeric.
    Pace,
    /// "5:30 /km"
    PaceText,
    /// Steps/min for runs, rpm for rides.
    Cadence,
    /// km/h
    Speed,
    PowerAvg,
    PowerMax,
    /// "1:45" per 100 m
    SwimPace,
    StrokeRate,
}

impl Metric {
    pub const ALL: [Metric; 14] = [
        Metric::DistanceKm,
        Metric::DurationMin,
        Metric::ElevationGain,
        Metric::HeartRateAvg,
        Metric::HeartRateMax,
        Metric::Calories,
        Metric::Pace,
        Metric::PaceText,
        Metric::Cadence,
        Metric::Speed,
        Metric::PowerAvg,
        Metric::PowerMax,
        Metric::SwimPace,
        Metric::StrokeRate,
    ];

    /// Key used in the field mapping file.
    pub fn key(self) -> &'static str {
        match self {
            Metric::DistanceKm => "distance_km",
            Metric::DurationMin => "duration_min",
            Metric::ElevationGain => "elevation_gain",
            Metric::HeartRateAvg => "heart_rate_avg",
            Metric::HeartRateMax => "heart_rate_max",
            Metric::Calories => "calories",
            Metric::Pace => "pace",
            Metric::PaceText => "pace_text",
            Metric::Cadence => "cadence",
            Metric::Speed => "speed",
            Metric::PowerAvg => "power_avg",
            Metric::PowerMax => "power_max",
            Metric::SwimPace => "swim_pace",
            Metric::StrokeRate => "stroke_rate",
        }
    }

    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            MetricValue::Number(_) => None,
        }
    }
}

/// Provider-agnostic activity, created once by the transformer and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedActivity {
    pub external_id: u64,
    pub name: String,
    pub sport: Sport,
    /// Calendar date in the athlete's time zone.
    pub date: NaiveDate,
    /// Original start timestamp, written to the record's date field when present.
    pub start: Option<String>,
    pub metrics: BTreeMap<Metric, MetricValue>,
}

impl NormalizedActivity {
    pub fn metric(&self, metric: Metric) -> Option<&MetricValue> {
        self.metrics.get(&metric)
    }
}
