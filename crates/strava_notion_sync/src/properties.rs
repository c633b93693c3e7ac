//! Notion property payloads for training-log and planning records.

use serde_json::{Map, Value, json};

use crate::activity::{MetricValue, NormalizedActivity};
use crate::mapping::FieldMapping;

pub fn title(content: &str) -> Value {
    json!({ "title": [{ "text": { "content": content } }] })
}

pub fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

pub fn number(value: f64) -> Value {
    json!({ "number": value })
}

pub fn date(start: &str) -> Value {
    json!({ "date": { "start": start } })
}

pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

pub fn relation(page_ids: &[&str]) -> Value {
    let items: Vec<Value> = page_ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "relation": items })
}

fn metric_value(value: &MetricValue) -> Value {
    match value {
        MetricValue::Number(n) => number(*n),
        MetricValue::Text(s) => rich_text(s),
    }
}

/// Mapped metric properties only; metrics without an enabled property are left out.
pub fn metric_properties(activity: &NormalizedActivity, mapping: &FieldMapping) -> Map<String, Value> {
    let mut props = Map::new();
    for (metric, value) in &activity.metrics {
        if let Some(name) = mapping.metric_property(activity.sport, *metric) {
            props.insert(name.to_string(), metric_value(value));
        }
    }
    props
}

/// Full property set for a new training-log record.
pub fn activity_properties(
    activity: &NormalizedActivity,
    mapping: &FieldMapping,
) -> Map<String, Value> {
    let record = &mapping.record;
    let mut props = metric_properties(activity, mapping);

    props.insert(record.title.clone(), title(&activity.name));
    props.insert(record.external_id.clone(), number(activity.external_id as f64));
    if let Some(field) = &record.date {
        let start = activity
            .start
            .clone()
            .unwrap_or_else(|| activity.date.to_string());
        props.insert(field.clone(), date(&start));
    }
    if let Some(field) = &record.sport {
        props.insert(field.clone(), select(mapping.target_label(activity.sport)));
    }
    if let (Some(field), Some(category)) =
        (&record.sport_category, mapping.sport_category(activity.sport))
    {
        props.insert(field.clone(), relation(&[category]));
    }
    props
}

/// Update for a matched planned entry: back-link to the record and status Done.
pub fn planned_entry_link(mapping: &FieldMapping, activity_page_id: &str) -> Map<String, Value> {
    let planning = &mapping.planning;
    let mut props = Map::new();
    props.insert(planning.activity_link.clone(), relation(&[activity_page_id]));
    props.insert(planning.status.clone(), select(&planning.done_label));
    props
}

/// Update for the record's own relation to its planned entry, when the schema has one.
pub fn activity_link(mapping: &FieldMapping, planned_page_id: &str) -> Option<Map<String, Value>> {
    let field = mapping.record.planned_workout.as_ref()?;
    let mut props = Map::new();
    props.insert(field.clone(), relation(&[planned_page_id]));
    Some(props)
}
