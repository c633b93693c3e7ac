use std::sync::Arc;

use crate::error::{Result, SyncError};
use crate::mapping::FieldMapping;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;
/// Strava has no activities older than this many days.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Immutable run configuration handed to every component at construction.
#[derive(Clone, Debug)]
pub struct Settings {
    pub activities_db_id: String,
    pub planning_db_id: String,
    pub lookback_days: u32,
    pub dry_run: bool,
    pub update_existing: bool,
    pub mapping: Arc<FieldMapping>,
}

/// Values given on the command line; each one set wins over the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub lookback_days: Option<u32>,
    pub dry_run: bool,
    pub update_existing: bool,
}

impl Settings {
    pub fn from_env(mapping: FieldMapping) -> Result<Self> {
        Self::from_env_with(|k| std::env::var(k).ok(), mapping)
    }

    pub fn from_env_with<F>(mut get: F, mapping: FieldMapping) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let activities_db_id = required(&mut get, "NOTION_ACTIVITIES_DB_ID")?;
        let planning_db_id = required(&mut get, "NOTION_PLANNED_DB_ID")?;
        let lookback_days = match get("DAYS_BACK") {
            None => DEFAULT_LOOKBACK_DAYS,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "DAYS_BACK={raw:?} is not a whole number of days; using {DEFAULT_LOOKBACK_DAYS}"
                );
                DEFAULT_LOOKBACK_DAYS
            }),
        };
        let lookback_days = bounded_lookback(lookback_days, "DAYS_BACK")?;
        let dry_run = get("DRY_RUN")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            activities_db_id,
            planning_db_id,
            lookback_days,
            dry_run,
            update_existing: mapping.options.update_existing,
            mapping: Arc::new(mapping),
        })
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(days) = overrides.lookback_days {
            self.lookback_days = bounded_lookback(days, "--days-back")?;
        }
        self.dry_run |= overrides.dry_run;
        self.update_existing |= overrides.update_existing;
        Ok(self)
    }
}

fn bounded_lookback(days: u32, source: &str) -> Result<u32> {
    if days > MAX_LOOKBACK_DAYS {
        return Err(SyncError::config(format!(
            "{source}={days} exceeds the maximum of {MAX_LOOKBACK_DAYS} days"
        )));
    }
    Ok(days)
}

fn required<F>(get: &mut F, key: &str) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::config(format!("{key} missing")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl FnMut(&str) -> Option<String> {
        move |k| {
            pairs
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.to_string())
        }
    }

    const BASE: &[(&str, &str)] = &[
        ("NOTION_ACTIVITIES_DB_ID", "acts"),
        ("NOTION_PLANNED_DB_ID", "plans"),
    ];

    #[test]
    fn defaults() {
        let s = Settings::from_env_with(env(BASE), FieldMapping::default()).unwrap();
        assert_eq!(s.activities_db_id, "acts");
        assert_eq!(s.planning_db_id, "plans");
        assert_eq!(s.lookback_days, 7);
        assert!(!s.dry_run);
        assert!(!s.update_existing);
    }

    #[test]
    fn missing_database_is_fatal() {
        let err = Settings::from_env_with(
            env(&[("NOTION_ACTIVITIES_DB_ID", "acts")]),
            FieldMapping::default(),
        )
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("NOTION_PLANNED_DB_ID"));
    }

    #[test]
    fn reads_days_back_and_dry_run() {
        let s = Settings::from_env_with(
            env(&[
                ("NOTION_ACTIVITIES_DB_ID", "acts"),
                ("NOTION_PLANNED_DB_ID", "plans"),
                ("DAYS_BACK", "14"),
                ("DRY_RUN", "TRUE"),
            ]),
            FieldMapping::default(),
        )
        .unwrap();
        assert_eq!(s.lookback_days, 14);
        assert!(s.dry_run);
    }

    #[test]
    fn invalid_days_back_falls_back() {
        let s = Settings::from_env_with(
            env(&[
                ("NOTION_ACTIVITIES_DB_ID", "acts"),
                ("NOTION_PLANNED_DB_ID", "plans"),
                ("DAYS_BACK", "a week"),
                ("DRY_RUN", "yes"),
            ]),
            FieldMapping::default(),
        )
        .unwrap();
        assert_eq!(s.lookback_days, DEFAULT_LOOKBACK_DAYS);
        assert!(!s.dry_run);
    }

    #[test]
    fn cli_overrides_win() {
        let mapping = FieldMapping::from_yaml_str("options:\n  update_existing: false\n").unwrap();
        let s = Settings::from_env_with(env(BASE), mapping)
            .unwrap()
            .with_overrides(&Overrides {
                lookback_days: Some(30),
                dry_run: true,
                update_existing: true,
            })
            .unwrap();
        assert_eq!(s.lookback_days, 30);
        assert!(s.dry_run);
        assert!(s.update_existing);
    }

    #[test]
    fn lookback_beyond_the_maximum_is_a_config_error() {
        let err = Settings::from_env_with(
            env(&[
                ("NOTION_ACTIVITIES_DB_ID", "acts"),
                ("NOTION_PLANNED_DB_ID", "plans"),
                ("DAYS_BACK", "200000000"),
            ]),
            FieldMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        assert!(err.to_string().contains("DAYS_BACK"));

        let err = Settings::from_env_with(env(BASE), FieldMapping::default())
            .unwrap()
            .with_overrides(&Overrides {
                lookback_days: Some(u32::MAX),
                ..Overrides::default()
            })
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("--days-back"));
    }

    #[test]
    fn update_existing_comes_from_mapping_options() {
        let mapping = FieldMapping::from_yaml_str("options:\n  update_existing: true\n").unwrap();
        let s = Settings::from_env_with(env(BASE), mapping).unwrap();
        assert!(s.update_existing);
    }
}
