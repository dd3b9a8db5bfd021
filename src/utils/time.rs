//! Time and file naming utilities

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// File name for a session document created at `created`.
///
/// Components are not zero padded: `2024-3-7-9-5-0.json`.
pub fn session_file_name<Tz: TimeZone>(created: &DateTime<Tz>) -> String {
    format!(
        "{}-{}-{}-{}-{}-{}.json",
        created.year(),
        created.month(),
        created.day(),
        created.hour(),
        created.minute(),
        created.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_file_name_is_unpadded() {
        let created = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(session_file_name(&created), "2024-3-7-9-5-0.json");
    }

    #[test]
    fn test_session_file_name_two_digit_fields() {
        let created = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(session_file_name(&created), "2025-12-31-23-59-58.json");
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2024-01-01T00:00:00Z
        assert!(current_timestamp() > 1_704_067_200);
    }
}
