use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use dailys_schemas::{DailysError, DailysResult, Entry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{payload, SleepData, StatModel};

/// Key stored alongside ratings that is not itself a rating.
const MESSAGE_ID: &str = "message_id";

/// Static reference data for the mood stat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodStatic {
    /// Mood axes, e.g. "happiness", "anxiety"
    pub moods: Vec<String>,
    /// Measurement slots in display order
    pub times: Vec<String>,
}

impl MoodStatic {
    /// Whether any slot has to be resolved against sleep data
    pub fn needs_sleep_data(&self) -> bool {
        self.times
            .iter()
            .any(|time| matches!(time.parse::<MoodTime>(), Ok(MoodTime::WakeUpTime | MoodTime::SleepTime)))
    }
}

/// A time-of-day slot a mood measurement is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodTime {
    /// Wake time of the previous day's sleep entry
    WakeUpTime,
    /// Sleep time of the same day's sleep entry
    SleepTime,
    Clock(NaiveTime),
}

impl FromStr for MoodTime {
    type Err = DailysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WakeUpTime" => Ok(MoodTime::WakeUpTime),
            "SleepTime" => Ok(MoodTime::SleepTime),
            _ => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .map(MoodTime::Clock)
                .map_err(|_| DailysError::Validation(format!("'{}' is not a mood time slot", s))),
        }
    }
}

impl fmt::Display for MoodTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MoodTime::WakeUpTime => write!(f, "WakeUpTime"),
            MoodTime::SleepTime => write!(f, "SleepTime"),
            MoodTime::Clock(time) => write!(f, "{}", time.format("%H:%M:%S")),
        }
    }
}

/// One day's mood ratings, keyed by time slot and then by axis.
#[derive(Debug, Clone)]
pub struct MoodDay {
    pub date: NaiveDate,
    pub source: String,
    pub measurements: BTreeMap<String, BTreeMap<String, i64>>,
}

/// A single slot's ratings with the slot resolved to a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodMeasurement {
    pub date: NaiveDate,
    pub time_str: String,
    pub datetime: NaiveDateTime,
    pub mood: BTreeMap<String, i64>,
}

impl MoodDay {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        let date = entry.require_day()?;
        let raw: BTreeMap<String, BTreeMap<String, Value>> = payload(entry)?;
        let measurements = raw
            .into_iter()
            .map(|(time_str, slot)| -> DailysResult<(String, BTreeMap<String, i64>)> {
                let ratings = slot
                    .into_iter()
                    .filter(|(axis, _)| axis != MESSAGE_ID)
                    .map(|(axis, value)| -> DailysResult<(String, i64)> {
                        let rating = parse_rating(&value).ok_or_else(|| {
                            DailysError::InvalidPayload(format!(
                                "mood rating {} at {} on {} is not an integer",
                                axis, time_str, date
                            ))
                        })?;
                        Ok((axis, rating))
                    })
                    .collect::<DailysResult<BTreeMap<_, _>>>()?;
                Ok((time_str, ratings))
            })
            .collect::<DailysResult<BTreeMap<_, _>>>()?;

        Ok(Self {
            date,
            source: entry.source.clone(),
            measurements,
        })
    }

    /// Resolve each declared slot present on this day, in declared order.
    ///
    /// `sleeps` must hold the previous day's sleep for `WakeUpTime` and the
    /// same day's sleep for `SleepTime`.
    pub fn resolved_measurements(
        &self,
        times: &[String],
        sleeps: &BTreeMap<NaiveDate, SleepData>,
    ) -> DailysResult<Vec<MoodMeasurement>> {
        times
            .iter()
            .filter_map(|time_str| self.measurements.get(time_str).map(|mood| (time_str, mood)))
            .map(|(time_str, mood)| -> DailysResult<MoodMeasurement> {
                Ok(MoodMeasurement {
                    date: self.date,
                    time_str: time_str.clone(),
                    datetime: self.resolve_time(time_str.parse()?, sleeps)?,
                    mood: mood.clone(),
                })
            })
            .collect()
    }

    fn resolve_time(
        &self,
        time: MoodTime,
        sleeps: &BTreeMap<NaiveDate, SleepData>,
    ) -> DailysResult<NaiveDateTime> {
        let sleep_on = |date: NaiveDate| {
            sleeps.get(&date).ok_or_else(|| {
                DailysError::MissingField(format!(
                    "mood {} on {} needs a sleep entry on {}",
                    time, self.date, date
                ))
            })
        };
        Ok(match time {
            MoodTime::WakeUpTime => sleep_on(self.date - Duration::days(1))?.wake_time.naive_local(),
            MoodTime::SleepTime => sleep_on(self.date)?.sleep_time.naive_local(),
            MoodTime::Clock(clock) => self.date.and_time(clock),
        })
    }
}

fn parse_rating(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

impl StatModel for MoodDay {
    fn stat_name(&self) -> &'static str {
        "mood"
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn value_count(&self) -> usize {
        self.measurements.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sleep(date: NaiveDate, sleep_time: &str, wake_time: &str) -> SleepData {
        let entry = Entry::on_day(
            "sleep",
            date,
            "bot",
            json!({"sleep_time": sleep_time, "wake_time": wake_time}),
        );
        SleepData::from_entry(&entry).unwrap()
    }

    fn mood_day() -> MoodDay {
        let entry = Entry::on_day(
            "mood",
            day(2024, 1, 2),
            "telegram",
            json!({
                "WakeUpTime": {"happiness": 3, "anxiety": "2", "message_id": 1234},
                "12:00": {"happiness": 4, "anxiety": 1},
                "SleepTime": {"happiness": 5, "anxiety": 1}
            }),
        );
        MoodDay::from_entry(&entry).unwrap()
    }

    #[test]
    fn test_message_id_is_not_a_rating() {
        let mood = mood_day();
        assert_eq!(mood.measurements["WakeUpTime"].len(), 2);
        assert_eq!(mood.measurements["WakeUpTime"]["anxiety"], 2);
        assert_eq!(mood.value_count(), 6);
    }

    #[test]
    fn test_dynamic_slots_resolve_against_sleep() {
        let mood = mood_day();
        let sleeps: BTreeMap<NaiveDate, SleepData> = [
            sleep(day(2024, 1, 1), "2024-01-01T23:00:00Z", "2024-01-02T07:30:00Z"),
            sleep(day(2024, 1, 2), "2024-01-02T23:15:00Z", "2024-01-03T08:00:00Z"),
        ]
        .into_iter()
        .map(|sleep| (sleep.date, sleep))
        .collect();

        let times = vec!["WakeUpTime".to_string(), "12:00".to_string(), "SleepTime".to_string(), "18:00".to_string()];
        let measurements = mood.resolved_measurements(&times, &sleeps).unwrap();

        assert_eq!(measurements.len(), 3);
        assert_eq!(measurements[0].datetime, day(2024, 1, 2).and_hms_opt(7, 30, 0).unwrap());
        assert_eq!(measurements[1].datetime, day(2024, 1, 2).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(measurements[2].datetime, day(2024, 1, 2).and_hms_opt(23, 15, 0).unwrap());
    }

    #[test]
    fn test_missing_companion_sleep_fails() {
        let mood = mood_day();
        let times = vec!["WakeUpTime".to_string()];
        assert!(matches!(
            mood.resolved_measurements(&times, &BTreeMap::new()),
            Err(DailysError::MissingField(_))
        ));
    }

    #[test]
    fn test_static_detects_dynamic_slots() {
        let fixed = MoodStatic {
            moods: vec!["happiness".to_string()],
            times: vec!["09:00".to_string(), "21:00".to_string()],
        };
        assert!(!fixed.needs_sleep_data());
        let dynamic = MoodStatic {
            moods: vec![],
            times: vec!["SleepTime".to_string()],
        };
        assert!(dynamic.needs_sleep_data());
        assert!("noonish".parse::<MoodTime>().is_err());
    }
}
