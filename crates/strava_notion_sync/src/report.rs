use serde::Serialize;
use std::fmt;

/// Failure confined to one activity; the run continues past it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityError {
    pub external_id: u64,
    pub message: String,
}

/// Per-run counters. In dry-run mode `created`, `linked` and `updated`
/// count what would have been written.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SyncResult {
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped_duplicate: usize,
    pub linked: usize,
    /// Fetched activities of a sport that is not synced.
    pub ignored: usize,
    pub errors: Vec<ActivityError>,
}

impl SyncResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn record_error(&mut self, external_id: u64, message: impl Into<String>) {
        self.errors.push(ActivityError {
            external_id,
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (create, link, update) = if self.dry_run {
            ("Would create", "Would link", "Would update")
        } else {
            ("Created", "Linked", "Updated")
        };
        if self.dry_run {
            writeln!(f, "Dry run: nothing was written")?;
        }
        writeln!(f, "{}: {}", create, self.created)?;
        writeln!(f, "{}: {}", link, self.linked)?;
        if self.updated > 0 {
            writeln!(f, "{}: {}", update, self.updated)?;
        }
        writeln!(f, "Skipped (already synced): {}", self.skipped_duplicate)?;
        if self.ignored > 0 {
            writeln!(f, "Ignored: {}", self.ignored)?;
        }
        write!(f, "Errors: {}", self.error_count())?;
        for e in &self.errors {
            write!(f, "\n  {}: {}", e.external_id, e.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_counts_and_errors() {
        let mut r = SyncResult::new(false);
        r.created = 2;
        r.linked = 1;
        r.skipped_duplicate = 3;
        r.record_error(99, "notion returned 500");
        let text = r.to_string();
        assert!(text.contains("Created: 2"));
        assert!(text.contains("Linked: 1"));
        assert!(text.contains("Skipped (already synced): 3"));
        assert!(text.contains("Errors: 1"));
        assert!(text.contains("99: notion returned 500"));
        assert!(!text.contains("Updated"));
    }

    #[test]
    fn dry_run_labels() {
        let mut r = SyncResult::new(true);
        r.created = 1;
        let text = r.to_string();
        assert!(text.starts_with("Dry run"));
        assert!(text.contains("Would create: 1"));
        assert!(text.contains("Would link: 0"));
    }

    #[test]
    fn serializes_for_json_output() {
        let mut r = SyncResult::new(false);
        r.record_error(7, "boom");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["errors"][0]["external_id"], 7);
        assert_eq!(v["dry_run"], false);
    }
}
