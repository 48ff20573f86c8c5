use chrono::{DateTime, Duration, FixedOffset};
use dailys_schemas::{DailysData, DailysError, DailysResult};
use serde::Serialize;
use serde_json::Value;

use crate::models::parse_timestamp;

/// Whether the user is currently asleep, from the latest sleep payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepStatus {
    pub is_sleeping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awake_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_start: Option<String>,
    pub time_asleep: String,
    pub time_awake: String,
    pub time_asleep_text: String,
    pub time_awake_text: String,
}

/// `latest` holds the most recent sleep payloads, newest first. The newest
/// one lacking a wake time means the user is asleep right now.
pub fn sleep_status(latest: &[DailysData], now: DateTime<FixedOffset>) -> DailysResult<SleepStatus> {
    let newest = latest
        .first()
        .ok_or_else(|| DailysError::EmptyRange("no sleep entries recorded".to_string()))?;
    let (sleep_raw, sleep_time) = timestamp_field(newest, "sleep_time")?;
    let is_sleeping = newest.get("wake_time").map_or(true, Value::is_null);

    let (awake_start, sleep_start, time_asleep, time_awake) = if is_sleeping {
        let previous = latest.get(1).ok_or_else(|| {
            DailysError::MissingField("no previous sleep entry to measure time awake from".to_string())
        })?;
        let (_, previous_wake) = timestamp_field(previous, "wake_time")?;
        (None, Some(sleep_raw), now - sleep_time, sleep_time - previous_wake)
    } else {
        let (wake_raw, wake_time) = timestamp_field(newest, "wake_time")?;
        (Some(wake_raw), None, wake_time - sleep_time, now - wake_time)
    };

    Ok(SleepStatus {
        is_sleeping,
        awake_start,
        sleep_start,
        time_asleep: iso_duration(time_asleep),
        time_awake: iso_duration(time_awake),
        time_asleep_text: human_duration(time_asleep),
        time_awake_text: human_duration(time_awake),
    })
}

fn timestamp_field(data: &DailysData, field: &str) -> DailysResult<(String, DateTime<FixedOffset>)> {
    let raw = data
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| DailysError::MissingField(format!("sleep entry has no {}", field)))?;
    Ok((raw.to_string(), parse_timestamp(raw)?))
}

/// Days plus the within-day remainder, the remainder always non-negative
fn split(duration: Duration) -> (i64, i64, i64, i64) {
    let total = duration.num_seconds();
    let days = total.div_euclid(86_400);
    let remainder = total.rem_euclid(86_400);
    (days, remainder / 3600, remainder % 3600 / 60, remainder % 60)
}

/// `P{d}DT{h}H{m}M{s}S`, every component always present.
pub fn iso_duration(duration: Duration) -> String {
    let (days, hours, minutes, seconds) = split(duration);
    format!("P{}DT{}H{}M{}S", days, hours, minutes, seconds)
}

/// `1 days, 2 hours, 3 minutes, and 4 seconds`.
pub fn human_duration(duration: Duration) -> String {
    let (days, hours, minutes, seconds) = split(duration);
    format!(
        "{} days, {} hours, {} minutes, and {} seconds",
        days, hours, minutes, seconds
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<FixedOffset> {
        parse_timestamp("2024-01-02T12:30:15Z").unwrap()
    }

    #[test]
    fn test_awake_status() {
        let latest = vec![
            json!({"sleep_time": "2024-01-01T23:00:00Z", "wake_time": "2024-01-02T07:00:00Z"}),
            json!({"sleep_time": "2023-12-31T23:00:00Z", "wake_time": "2024-01-01T07:00:00Z"}),
        ];
        let status = sleep_status(&latest, now()).unwrap();
        assert!(!status.is_sleeping);
        assert_eq!(status.awake_start.as_deref(), Some("2024-01-02T07:00:00Z"));
        assert_eq!(status.time_asleep, "P0DT8H0M0S");
        assert_eq!(status.time_awake, "P0DT5H30M15S");
        assert_eq!(status.time_awake_text, "0 days, 5 hours, 30 minutes, and 15 seconds");
    }

    #[test]
    fn test_sleeping_status() {
        let latest = vec![
            json!({"sleep_time": "2024-01-02T11:00:00Z"}),
            json!({"sleep_time": "2024-01-01T23:00:00Z", "wake_time": "2024-01-02T07:00:00Z"}),
        ];
        let status = sleep_status(&latest, now()).unwrap();
        assert!(status.is_sleeping);
        assert_eq!(status.sleep_start.as_deref(), Some("2024-01-02T11:00:00Z"));
        assert_eq!(status.time_asleep, "P0DT1H30M15S");
        assert_eq!(status.time_awake, "P0DT4H0M0S");
    }

    #[test]
    fn test_null_wake_time_means_sleeping() {
        let latest = vec![
            json!({"sleep_time": "2024-01-02T11:00:00Z", "wake_time": null}),
            json!({"sleep_time": "2024-01-01T23:00:00Z", "wake_time": "2024-01-02T07:00:00Z"}),
        ];
        let status = sleep_status(&latest, now()).unwrap();
        assert!(status.is_sleeping);
        assert_eq!(status.time_asleep, "P0DT1H30M15S");
    }

    #[test]
    fn test_no_sleeps_is_empty_range() {
        assert!(matches!(sleep_status(&[], now()), Err(DailysError::EmptyRange(_))));
        let only_sleeping = vec![json!({"sleep_time": "2024-01-02T11:00:00Z"})];
        assert!(matches!(
            sleep_status(&only_sleeping, now()),
            Err(DailysError::MissingField(_))
        ));
    }

    #[test]
    fn test_durations_normalise_like_timedeltas() {
        assert_eq!(iso_duration(Duration::seconds(90_061)), "P1DT1H1M1S");
        // Negative durations borrow a whole day
        assert_eq!(iso_duration(Duration::seconds(-60)), "P-1DT23H59M0S");
        assert_eq!(human_duration(Duration::zero()), "0 days, 0 hours, 0 minutes, and 0 seconds");
    }
}
