//! Raw Strava activity → [`NormalizedActivity`].
//!
//! Only metrics present on the raw record are emitted. A ride without a power
//! meter yields no `power_avg` key at all, never a zero.

use std::collections::BTreeMap;

use strava_notion_client::RawActivity;

use crate::activity::{Metric, MetricValue, NormalizedActivity};
use crate::error::{Result, SyncError};
use crate::mapping::MappingOptions;
use crate::sport::Sport;

const UNTITLED: &str = "Untitled Activity";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitOptions {
    pub distance_unit_divisor: f64,
    pub time_unit_divisor: f64,
    pub include_pace_suffix: bool,
}

impl Default for UnitOptions {
    fn default() -> Self {
        MappingOptions::default().into()
    }
}

impl From<MappingOptions> for UnitOptions {
    fn from(o: MappingOptions) -> Self {
        Self {
            distance_unit_divisor: o.distance_unit_divisor,
            time_unit_divisor: o.time_unit_divisor,
            include_pace_suffix: o.include_pace_suffix,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ActivityTransformer {
    units: UnitOptions,
}

impl ActivityTransformer {
    pub fn new(units: UnitOptions) -> Self {
        Self { units }
    }

    /// Normalize `raw` as `sport`; the caller has already classified the sport.
    pub fn transform(&self, sport: Sport, raw: &RawActivity) -> Result<NormalizedActivity> {
        let date = raw.local_date().ok_or_else(|| {
            SyncError::Transform(format!("activity {} has no usable start date", raw.id))
        })?;

        let metrics = match sport {
            Sport::Run => self.run_metrics(raw),
            Sport::Bike => self.bike_metrics(raw),
            Sport::Swim => self.swim_metrics(raw),
        };

        Ok(NormalizedActivity {
            external_id: raw.id,
            name: raw
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            sport,
            date,
            start: raw.start_date.clone().or_else(|| raw.start_date_local.clone()),
            metrics,
        })
    }

    fn distance_and_duration(&self, raw: &RawActivity, out: &mut BTreeMap<Metric, MetricValue>) {
        if let Some(d) = raw.distance {
            put(out, Metric::DistanceKm, round_to(d / self.units.distance_unit_divisor, 2));
        }
        if let Some(t) = raw.moving_time {
            put(out, Metric::DurationMin, round_to(t / self.units.time_unit_divisor, 1));
        }
    }

    fn heart_rate_and_calories(raw: &RawActivity, out: &mut BTreeMap<Metric, MetricValue>) {
        if let Some(hr) = raw.average_heartrate {
            put(out, Metric::HeartRateAvg, hr.round());
        }
        if let Some(hr) = raw.max_heartrate {
            put(out, Metric::HeartRateMax, hr.round());
        }
        if let Some(kcal) = raw.calories {
            put(out, Metric::Calories, kcal.round());
        }
    }

    fn elevation(raw: &RawActivity, out: &mut BTreeMap<Metric, MetricValue>) {
        if let Some(e) = raw.total_elevation_gain {
            put(out, Metric::ElevationGain, e.round());
        }
    }

    fn run_metrics(&self, raw: &RawActivity) -> BTreeMap<Metric, MetricValue> {
        let mut out = BTreeMap::new();
        self.distance_and_duration(raw, &mut out);
        Self::elevation(raw, &mut out);
        Self::heart_rate_and_calories(raw, &mut out);

        if let Some(pace) = minutes_per(raw, 1000.0) {
            put(&mut out, Metric::Pace, round_to(pace, 2));
            let suffix = if self.units.include_pace_suffix { " /km" } else { "" };
            out.insert(
                Metric::PaceText,
                MetricValue::Text(format!("{}{}", format_minutes(pace), suffix)),
            );
        }
        // Strava reports single-leg cadence for runs
        if let Some(c) = raw.average_cadence {
            put(&mut out, Metric::Cadence, (c * 2.0).round());
        }
        out
    }

    fn bike_metrics(&self, raw: &RawActivity) -> BTreeMap<Metric, MetricValue> {
        let mut out = BTreeMap::new();
        self.distance_and_duration(raw, &mut out);
        Self::elevation(raw, &mut out);
        Self::heart_rate_and_calories(raw, &mut out);

        if let (Some(d), Some(t)) = (raw.distance, raw.moving_time) {
            if t > 0.0 {
                put(&mut out, Metric::Speed, round_to((d / 1000.0) / (t / 3600.0), 2));
            }
        }
        if let Some(c) = raw.average_cadence {
            put(&mut out, Metric::Cadence, c.round());
        }
        if let Some(w) = raw.average_watts {
            put(&mut out, Metric::PowerAvg, w.round());
        }
        if let Some(w) = raw.max_watts {
            put(&mut out, Metric::PowerMax, w.round());
        }
        out
    }

    fn swim_metrics(&self, raw: &RawActivity) -> BTreeMap<Metric, MetricValue> {
        let mut out = BTreeMap::new();
        self.distance_and_duration(raw, &mut out);
        Self::heart_rate_and_calories(raw, &mut out);

        if let Some(pace) = minutes_per(raw, 100.0) {
            out.insert(Metric::SwimPace, MetricValue::Text(format_minutes(pace)));
        }
        if let Some(c) = raw.average_cadence {
            put(&mut out, Metric::StrokeRate, c.round());
        }
        out
    }
}

fn put(out: &mut BTreeMap<Metric, MetricValue>, metric: Metric, value: f64) {
    if value.is_finite() {
        out.insert(metric, MetricValue::Number(value));
    }
}

/// Moving minutes per `meters`, when distance is positive.
fn minutes_per(raw: &RawActivity, meters: f64) -> Option<f64> {
    let (d, t) = (raw.distance?, raw.moving_time?);
    (d > 0.0).then(|| (t / 60.0) / (d / meters))
}

/// 5.5 → "5:30". Seconds are truncated, never rounded up to 60.
fn format_minutes(minutes: f64) -> String {
    let whole = minutes.trunc();
    let seconds = ((minutes - whole) * 60.0).trunc() as u32;
    format!("{}:{:02}", whole as u64, seconds.min(59))
}

fn round_to(v: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (v * factor).round() / factor
}
