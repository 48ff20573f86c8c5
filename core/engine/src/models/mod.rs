//! Typed, read-only views over raw entry payloads, one per stat type.

pub mod chores;
pub mod dreams;
pub mod furaffinity;
pub mod mood;
pub mod questions;
pub mod sleep;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use dailys_schemas::{DailysError, DailysResult, Entry};
use std::collections::BTreeMap;

pub use chores::{Chore, ChoreDefinition, ChoresStatic};
pub use dreams::{Dream, DreamNight, DreamsStatic};
pub use furaffinity::FuraffinityData;
pub use mood::{MoodDay, MoodMeasurement, MoodStatic, MoodTime};
pub use questions::{Answer, QuestionsDay, QuestionsStatic, Response, StaticQuestion};
pub use sleep::{Interruption, SleepData};

/// Suggestion text → JSON paths inside the entry that could be filled in.
pub type Suggestions = BTreeMap<String, Vec<String>>;

/// Capabilities shared by every decoded entity.
pub trait StatModel {
    fn stat_name(&self) -> &'static str;

    fn date(&self) -> NaiveDate;

    fn source(&self) -> &str;

    /// How much information the entry holds, for completeness reporting.
    fn value_count(&self) -> usize;

    fn suggest_enrichments(&self) -> Suggestions {
        Suggestions::new()
    }

    fn url_path(&self) -> String {
        format!("/{}/{}/", self.stat_name(), self.date())
    }
}

/// Stat types the dashboard knows about. Some have a decoder, some are
/// recognised but stored as opaque payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatKind {
    Chores,
    Dreams,
    Duolingo,
    Furaffinity,
    Mood,
    Questions,
    Sleep,
    Sploo,
}

impl StatKind {
    pub const ALL: [StatKind; 8] = [
        StatKind::Chores,
        StatKind::Dreams,
        StatKind::Duolingo,
        StatKind::Furaffinity,
        StatKind::Mood,
        StatKind::Questions,
        StatKind::Sleep,
        StatKind::Sploo,
    ];

    pub fn from_stat_name(stat_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.stat_name() == stat_name)
    }

    pub fn stat_name(&self) -> &'static str {
        match self {
            StatKind::Chores => "chores",
            StatKind::Dreams => "dreams",
            StatKind::Duolingo => "duolingo",
            StatKind::Furaffinity => "furaffinity",
            StatKind::Mood => "mood",
            StatKind::Questions => "questions",
            StatKind::Sleep => "sleep",
            StatKind::Sploo => "sploo",
        }
    }

    pub fn has_decoder(&self) -> bool {
        matches!(
            self,
            StatKind::Dreams
                | StatKind::Furaffinity
                | StatKind::Mood
                | StatKind::Questions
                | StatKind::Sleep
        )
    }
}

/// Result of running an entry through the decoder registry.
#[derive(Debug, Clone)]
pub enum Decoded {
    Dreams(DreamNight),
    Furaffinity(FuraffinityData),
    Mood(MoodDay),
    Questions(QuestionsDay),
    Sleep(SleepData),
    /// A known stat type without a decoder
    Undecoded(StatKind),
    /// A stat name the registry has never heard of
    Unknown(String),
}

impl Decoded {
    pub fn model(&self) -> Option<&dyn StatModel> {
        match self {
            Decoded::Dreams(night) => Some(night),
            Decoded::Furaffinity(fa) => Some(fa),
            Decoded::Mood(mood) => Some(mood),
            Decoded::Questions(questions) => Some(questions),
            Decoded::Sleep(sleep) => Some(sleep),
            Decoded::Undecoded(_) | Decoded::Unknown(_) => None,
        }
    }
}

/// Decode a dated entry with whatever decoder is registered for its stat.
pub fn decode(entry: &Entry) -> DailysResult<Decoded> {
    let kind = match StatKind::from_stat_name(&entry.stat_name) {
        Some(kind) => kind,
        None => return Ok(Decoded::Unknown(entry.stat_name.clone())),
    };
    Ok(match kind {
        StatKind::Dreams => Decoded::Dreams(DreamNight::from_entry(entry)?),
        StatKind::Furaffinity => Decoded::Furaffinity(FuraffinityData::from_entry(entry)?),
        StatKind::Mood => Decoded::Mood(MoodDay::from_entry(entry)?),
        StatKind::Questions => Decoded::Questions(QuestionsDay::from_entry(entry)?),
        StatKind::Sleep => Decoded::Sleep(SleepData::from_entry(entry)?),
        StatKind::Chores | StatKind::Duolingo | StatKind::Sploo => Decoded::Undecoded(kind),
    })
}

/// Decode a payload fragment with serde, naming the entry on failure.
pub(crate) fn payload<T: serde::de::DeserializeOwned>(entry: &Entry) -> DailysResult<T> {
    serde_json::from_value(entry.data.clone()).map_err(|e| {
        DailysError::InvalidPayload(format!(
            "{} entry on {}: {}",
            entry.stat_name, entry.date, e
        ))
    })
}

/// Parse a stored timestamp. Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> DailysResult<DateTime<FixedOffset>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(DailysError::InvalidPayload(format!(
        "'{}' is not a recognised timestamp",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_dispatch() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let chores = Entry::on_day("chores", day, "web", json!({"chores_done": []}));
        assert!(matches!(decode(&chores).unwrap(), Decoded::Undecoded(StatKind::Chores)));

        let unknown = Entry::on_day("steps", day, "phone", json!({"steps": 4000}));
        match decode(&unknown).unwrap() {
            Decoded::Unknown(name) => assert_eq!(name, "steps"),
            other => panic!("expected unknown, got {:?}", other),
        }

        let fa = Entry::on_day("furaffinity", day, "bot", json!({"notes": 2}));
        let decoded = decode(&fa).unwrap();
        let model = decoded.model().unwrap();
        assert_eq!(model.stat_name(), "furaffinity");
        assert_eq!(model.url_path(), "/furaffinity/2024-01-01/");
    }

    #[test]
    fn test_registry_covers_every_kind() {
        for kind in StatKind::ALL {
            assert_eq!(StatKind::from_stat_name(kind.stat_name()), Some(kind));
        }
        assert!(StatKind::Sleep.has_decoder());
        assert!(!StatKind::Sploo.has_decoder());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let with_zone = parse_timestamp("2024-01-01T23:00:00Z").unwrap();
        let with_offset = parse_timestamp("2024-01-02T00:00:00+01:00").unwrap();
        assert_eq!(with_zone, with_offset);

        let naive = parse_timestamp("2024-01-01T23:00:00").unwrap();
        assert_eq!(naive, with_zone);
        assert!(parse_timestamp("last tuesday").is_err());
    }
}
