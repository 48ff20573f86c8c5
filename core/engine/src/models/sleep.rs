use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use dailys_schemas::{DailysError, DailysResult, Entry};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_timestamp, payload, StatModel};

#[derive(Debug, Deserialize)]
struct SleepPayload {
    sleep_time: Option<String>,
    wake_time: Option<String>,
    interruptions: Option<Vec<Value>>,
}

/// One interruption during a night's sleep.
#[derive(Debug, Clone, PartialEq)]
pub enum Interruption {
    /// Awake from `wake_time` until falling back asleep at `sleep_time`
    Interval {
        wake_time: DateTime<FixedOffset>,
        sleep_time: DateTime<FixedOffset>,
    },
    Note(String),
    Unrecognised,
}

impl Interruption {
    fn from_value(value: &Value) -> DailysResult<Self> {
        let wake_time = value.get("wake_time").and_then(Value::as_str);
        let sleep_time = value.get("sleep_time").and_then(Value::as_str);
        if let (Some(wake_time), Some(sleep_time)) = (wake_time, sleep_time) {
            return Ok(Interruption::Interval {
                wake_time: parse_timestamp(wake_time)?,
                sleep_time: parse_timestamp(sleep_time)?,
            });
        }
        Ok(match value.get("notes").and_then(Value::as_str) {
            Some(notes) => Interruption::Note(notes.to_string()),
            None => Interruption::Unrecognised,
        })
    }

    pub fn summary(&self) -> String {
        match self {
            Interruption::Interval {
                wake_time,
                sleep_time,
            } => {
                let minutes = (*sleep_time - *wake_time).num_seconds().div_euclid(60);
                format!(
                    "{} minutes ({} - {})",
                    minutes,
                    wake_time.time().format("%H:%M:%S"),
                    sleep_time.time().format("%H:%M:%S")
                )
            }
            Interruption::Note(notes) => notes.clone(),
            Interruption::Unrecognised => "Unknown interruption".to_string(),
        }
    }
}

/// A night's sleep, stored against the evening it starts on.
#[derive(Debug, Clone)]
pub struct SleepData {
    pub date: NaiveDate,
    pub source: String,
    pub sleep_time: DateTime<FixedOffset>,
    pub wake_time: DateTime<FixedOffset>,
    /// `None` when the entry has no interruptions field at all
    pub interruptions: Option<Vec<Interruption>>,
}

impl SleepData {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        let date = entry.require_day()?;
        let raw: SleepPayload = payload(entry)?;
        let missing = || {
            DailysError::MissingField(format!(
                "sleep data missing a wake or sleep time on {}",
                date
            ))
        };
        let sleep_time = parse_timestamp(&raw.sleep_time.ok_or_else(missing)?)?;
        let wake_time = parse_timestamp(&raw.wake_time.ok_or_else(missing)?)?;
        let interruptions = raw
            .interruptions
            .map(|values| values.iter().map(Interruption::from_value).collect::<DailysResult<Vec<_>>>())
            .transpose()?;

        Ok(Self {
            date,
            source: entry.source.clone(),
            sleep_time,
            wake_time,
            interruptions,
        })
    }

    pub fn time_sleeping(&self) -> Duration {
        self.wake_time - self.sleep_time
    }

    /// e.g. `2 interruptions (15 minutes (03:00:00 - 03:15:00), cat)`.
    /// Empty when the entry records no interruptions field.
    pub fn interruptions_text(&self) -> String {
        let interruptions = match &self.interruptions {
            Some(interruptions) => interruptions,
            None => return String::new(),
        };
        let summaries: Vec<String> = interruptions.iter().map(Interruption::summary).collect();
        format!(
            "{} interruption{} ({})",
            interruptions.len(),
            if interruptions.len() == 1 { "" } else { "s" },
            summaries.join(", ")
        )
    }
}

impl StatModel for SleepData {
    fn stat_name(&self) -> &'static str {
        "sleep"
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn value_count(&self) -> usize {
        2 + usize::from(self.interruptions.is_some())
    }
}
