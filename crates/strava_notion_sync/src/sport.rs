//! Canonical sport vocabulary and its conversion tables.
//!
//! Three vocabularies meet here: Strava's activity labels, the canonical
//! [`Sport`] tag used internally, and the select-option labels of the Notion
//! databases. Provider labels are fixed; Notion labels are configurable through
//! the field mapping and default to [`Sport::default_target_label`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::activity::Metric;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sport {
    Run,
    Bike,
    Swim,
}

const RUN_METRICS: [Metric; 9] = [
    Metric::DistanceKm,
    Metric::DurationMin,
    Metric::ElevationGain,
    Metric::HeartRateAvg,
    Metric::HeartRateMax,
    Metric::Calories,
    Metric::Pace,
    Metric::PaceText,
    Metric::Cadence,
];

const BIKE_METRICS: [Metric; 10] = [
    Metric::DistanceKm,
    Metric::DurationMin,
    Metric::ElevationGain,
    Metric::HeartRateAvg,
    Metric::HeartRateMax,
    Metric::Calories,
    Metric::Speed,
    Metric::Cadence,
    Metric::PowerAvg,
    Metric::PowerMax,
];

// pool swims report no meaningful elevation
const SWIM_METRICS: [Metric; 7] = [
    Metric::DistanceKm,
    Metric::DurationMin,
    Metric::HeartRateAvg,
    Metric::HeartRateMax,
    Metric::Calories,
    Metric::SwimPace,
    Metric::StrokeRate,
];

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Run, Sport::Bike, Sport::Swim];

    /// Strava label → canonical tag. Anything else (yoga, strength, ...) is `None`.
    pub fn from_provider_label(label: &str) -> Option<Sport> {
        match label {
            "Run" => Some(Sport::Run),
            "Ride" => Some(Sport::Bike),
            "Swim" => Some(Sport::Swim),
            _ => None,
        }
    }

    /// Notion select label used when the mapping does not override it.
    pub fn default_target_label(self) -> &'static str {
        match self {
            Sport::Run => "Run",
            Sport::Bike => "Bike",
            Sport::Swim => "Swim",
        }
    }

    /// Lower-case key used for `<sport>_fields` sections of the mapping file.
    pub fn key(self) -> &'static str {
        match self {
            Sport::Run => "run",
            Sport::Bike => "bike",
            Sport::Swim => "swim",
        }
    }

    pub fn default_icon(self) -> &'static str {
        match self {
            Sport::Run => "\u{1F3C3}",
            Sport::Bike => "\u{1F6B4}",
            Sport::Swim => "\u{1F3CA}",
        }
    }

    /// Exact metric set a fully-instrumented activity of this sport produces.
    pub fn metrics(self) -> &'static [Metric] {
        match self {
            Sport::Run => &RUN_METRICS,
            Sport::Bike => &BIKE_METRICS,
            Sport::Swim => &SWIM_METRICS,
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_target_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_labels_cover_every_sport() {
        let mapped: Vec<_> = ["Run", "Ride", "Swim"]
            .into_iter()
            .filter_map(Sport::from_provider_label)
            .collect();
        assert_eq!(mapped, Sport::ALL);
    }

    #[test]
    fn ride_maps_to_bike() {
        assert_eq!(Sport::from_provider_label("Ride"), Some(Sport::Bike));
        assert_eq!(Sport::Bike.default_target_label(), "Bike");
    }

    #[test]
    fn unrecognized_labels_are_dropped() {
        for label in ["WeightTraining", "Yoga", "Walk", "run", ""] {
            assert_eq!(Sport::from_provider_label(label), None, "{label}");
        }
    }

    #[test]
    fn metric_sets_have_no_duplicates() {
        for sport in Sport::ALL {
            let set: std::collections::BTreeSet<_> = sport.metrics().iter().collect();
            assert_eq!(set.len(), sport.metrics().len());
        }
    }

    #[test]
    fn bike_and_run_carry_every_shared_metric() {
        let shared = [
            Metric::DistanceKm,
            Metric::DurationMin,
            Metric::ElevationGain,
            Metric::HeartRateAvg,
            Metric::HeartRateMax,
            Metric::Calories,
        ];
        for sport in [Sport::Run, Sport::Bike] {
            for m in &shared {
                assert!(sport.metrics().contains(m), "{sport} missing {m:?}");
            }
        }
        assert!(!Sport::Swim.metrics().contains(&Metric::ElevationGain));
    }
}
