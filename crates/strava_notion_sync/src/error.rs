//! Custom error types for the sync engine.

use thiserror::Error;

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] strava_notion_client::ClientError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed field mapping: {0}")]
    FieldMapping(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Cannot normalize activity: {0}")]
    Transform(String),

    /// The planned entry was linked and marked done; only the record's
    /// relation back to it failed.
    #[error("planned entry {planned_id} linked, but the back-reference failed: {source}")]
    PartialLink {
        planned_id: String,
        #[source]
        source: strava_notion_client::ClientError,
    },
}

impl SyncError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn field_mapping(msg: impl Into<String>) -> Self {
        Self::FieldMapping(msg.into())
    }

    /// Setup failures that stop the run before any activity is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_) | SyncError::FieldMapping(_) | SyncError::Authentication(_)
        )
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use strava_notion_client::ClientError;

    #[test]
    fn setup_errors_are_fatal() {
        assert!(SyncError::config("NOTION_PLANNED_DB_ID missing").is_fatal());
        assert!(SyncError::field_mapping("bad key").is_fatal());
        assert!(SyncError::Authentication("revoked".into()).is_fatal());
    }

    #[test]
    fn per_activity_errors_are_not_fatal() {
        let api = SyncError::from(ClientError::from_status(500, "boom".into()));
        assert!(!api.is_fatal());
        assert!(!SyncError::Transform("no start date".into()).is_fatal());
        let partial = SyncError::PartialLink {
            planned_id: "plan-1".into(),
            source: ClientError::from_status(500, "boom".into()),
        };
        assert!(!partial.is_fatal());
        assert!(partial.to_string().starts_with("planned entry plan-1 linked"));
    }

    #[test]
    fn display_includes_cause() {
        let err = SyncError::field_mapping("run_fields.power_avg is not a run metric");
        assert_eq!(
            err.to_string(),
            "Malformed field mapping: run_fields.power_avg is not a run metric"
        );
    }
}
