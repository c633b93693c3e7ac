//! Date parsing shared by both clients.

use chrono::NaiveDate;

/// Calendar date of a provider timestamp, in the timestamp's own offset.
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (date in its stated offset)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_date_only() {
        assert_eq!(
            parse_calendar_date("2024-06-03"),
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
    }

    #[test]
    fn keeps_offset_date_of_rfc3339() {
        assert_eq!(
            parse_calendar_date("2024-06-03T23:30:00-07:00"),
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
    }

    #[test]
    fn accepts_naive_datetime() {
        assert_eq!(
            parse_calendar_date("2024-06-03T10:30:00"),
            NaiveDate::from_ymd_opt(2024, 6, 3)
        );
    }

    #[test]
    fn rejects_invalid() {
        assert!(parse_calendar_date("not-a-date").is_none());
    }
}
