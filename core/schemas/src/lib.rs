use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Calendar date format used for stored dates and date tokens.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DailysError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("can't update: {0}")]
    CantUpdate(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("empty range: {0}")]
    EmptyRange(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for DailysError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidPayload(value.to_string())
    }
}

pub type DailysResult<T> = Result<T, DailysError>;

// ============================================================================
// Dates
// ============================================================================

/// The date an entry is stored under: a calendar day, or the per-stat
/// static slot holding reference data.
///
/// Ordering puts every calendar day before `Static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntryDate {
    Day(NaiveDate),
    Static,
}

impl EntryDate {
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            EntryDate::Day(day) => Some(*day),
            EntryDate::Static => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, EntryDate::Static)
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntryDate::Day(day) => write!(f, "{}", day.format(DATE_FORMAT)),
            EntryDate::Static => write!(f, "static"),
        }
    }
}

impl FromStr for EntryDate {
    type Err = DailysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("static") {
            return Ok(EntryDate::Static);
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(EntryDate::Day)
            .map_err(|_| DailysError::Validation(format!("'{}' is not a stored entry date", s)))
    }
}

impl TryFrom<String> for EntryDate {
    type Error = DailysError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryDate> for String {
    fn from(value: EntryDate) -> Self {
        value.to_string()
    }
}

/// A request-level date: a calendar day or one of the three sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailysDate {
    Earliest,
    Latest,
    Static,
    Day(NaiveDate),
}

impl DailysDate {
    /// The stored slot this token names, if it names exactly one.
    pub fn as_entry_date(&self) -> Option<EntryDate> {
        match self {
            DailysDate::Day(day) => Some(EntryDate::Day(*day)),
            DailysDate::Static => Some(EntryDate::Static),
            DailysDate::Earliest | DailysDate::Latest => None,
        }
    }
}

impl fmt::Display for DailysDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DailysDate::Earliest => write!(f, "earliest"),
            DailysDate::Latest => write!(f, "latest"),
            DailysDate::Static => write!(f, "static"),
            DailysDate::Day(day) => write!(f, "{}", day.format(DATE_FORMAT)),
        }
    }
}

impl From<EntryDate> for DailysDate {
    fn from(value: EntryDate) -> Self {
        match value {
            EntryDate::Day(day) => DailysDate::Day(day),
            EntryDate::Static => DailysDate::Static,
        }
    }
}

/// Lower bound of a range query. `Earliest` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartDate {
    Earliest,
    Day(NaiveDate),
}

impl StartDate {
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            StartDate::Earliest => None,
            StartDate::Day(day) => Some(*day),
        }
    }
}

impl fmt::Display for StartDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        DailysDate::from(*self).fmt(f)
    }
}

impl From<StartDate> for DailysDate {
    fn from(value: StartDate) -> Self {
        match value {
            StartDate::Earliest => DailysDate::Earliest,
            StartDate::Day(day) => DailysDate::Day(day),
        }
    }
}

/// Upper bound of a range query, inclusive of the whole day. `Latest` means
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndDate {
    Latest,
    Day(NaiveDate),
}

impl EndDate {
    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            EndDate::Latest => None,
            EndDate::Day(day) => Some(*day),
        }
    }
}

impl fmt::Display for EndDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        DailysDate::from(*self).fmt(f)
    }
}

impl From<EndDate> for DailysDate {
    fn from(value: EndDate) -> Self {
        match value {
            EndDate::Latest => DailysDate::Latest,
            EndDate::Day(day) => DailysDate::Day(day),
        }
    }
}

/// True when a range has neither a lower nor an upper bound.
pub fn is_unbounded(start: StartDate, end: EndDate) -> bool {
    start == StartDate::Earliest && end == EndDate::Latest
}

/// Whether `date` falls inside `start..=end`. Static entries are never
/// inside any range.
pub fn in_range(date: EntryDate, start: StartDate, end: EndDate) -> bool {
    let day = match date {
        EntryDate::Day(day) => day,
        EntryDate::Static => return false,
    };
    let after_start = start.day().map_or(true, |start| day >= start);
    let before_end = end.day().map_or(true, |end| day <= end);
    after_start && before_end
}

// ============================================================================
// Entry Schema
// ============================================================================

/// Raw JSON payload of an entry, specific to its stat name.
pub type DailysData = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub stat_name: String,
    pub date: EntryDate,
    pub source: String,
    pub data: DailysData,
}

impl Entry {
    pub fn new(
        stat_name: impl Into<String>,
        date: EntryDate,
        source: impl Into<String>,
        data: DailysData,
    ) -> Self {
        Self {
            stat_name: stat_name.into(),
            date,
            source: source.into(),
            data,
        }
    }

    /// Entry on a calendar day.
    pub fn on_day(
        stat_name: impl Into<String>,
        day: NaiveDate,
        source: impl Into<String>,
        data: DailysData,
    ) -> Self {
        Self::new(stat_name, EntryDate::Day(day), source, data)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.date.day()
    }

    /// Calendar day of a dated entry, failing for the static slot.
    pub fn require_day(&self) -> DailysResult<NaiveDate> {
        self.day().ok_or_else(|| {
            DailysError::Validation(format!(
                "{} entry is static, expected a dated entry",
                self.stat_name
            ))
        })
    }

    /// Path of this entry in the stats listing, e.g. `/sleep/2024-01-02/`.
    pub fn url_path(&self) -> String {
        format!("/{}/{}/", self.stat_name, self.date)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Static configuration, loaded once at process start and shared by
/// reference afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailysConfig {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// Human-readable aliases for concrete dates, e.g. "christmas-2020".
    #[serde(default)]
    pub named_dates: BTreeMap<String, NaiveDate>,
}

impl DailysConfig {
    pub fn from_json_str(raw: &str) -> DailysResult<Self> {
        serde_json::from_str(raw).map_err(|e| DailysError::Config(e.to_string()))
    }

    /// Load config from a JSON file. A missing file gives the default config.
    pub fn load<P: AsRef<Path>>(path: P) -> DailysResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DailysError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_entry_serialization() {
        let entry = Entry::on_day(
            "sleep",
            day(2024, 1, 2),
            "manual",
            json!({"sleep_time": "2024-01-01T23:00:00Z"}),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-01-02");

        let restored: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_static_entry_serialization() {
        let raw = json!({
            "stat_name": "chores",
            "date": "static",
            "source": "setup",
            "data": {"chores": []}
        });
        let entry: Entry = serde_json::from_value(raw).unwrap();
        assert!(entry.date.is_static());
        assert!(entry.require_day().is_err());
        assert_eq!(entry.url_path(), "/chores/static/");
    }

    #[test]
    fn test_entry_date_ordering_puts_static_last() {
        let mut dates = vec![
            EntryDate::Static,
            EntryDate::Day(day(2024, 3, 1)),
            EntryDate::Day(day(2023, 1, 1)),
        ];
        dates.sort();
        assert_eq!(dates[0], EntryDate::Day(day(2023, 1, 1)));
        assert_eq!(dates[2], EntryDate::Static);
    }

    #[test]
    fn test_range_membership() {
        let date = EntryDate::Day(day(2024, 1, 5));
        assert!(in_range(date, StartDate::Earliest, EndDate::Latest));
        assert!(in_range(date, StartDate::Day(day(2024, 1, 5)), EndDate::Day(day(2024, 1, 5))));
        assert!(!in_range(date, StartDate::Day(day(2024, 1, 6)), EndDate::Latest));
        assert!(!in_range(EntryDate::Static, StartDate::Earliest, EndDate::Latest));
        assert!(is_unbounded(StartDate::Earliest, EndDate::Latest));
        assert!(!is_unbounded(StartDate::Earliest, EndDate::Day(day(2024, 1, 5))));
    }

    #[test]
    fn test_token_display() {
        assert_eq!(DailysDate::Earliest.to_string(), "earliest");
        assert_eq!(EndDate::Latest.to_string(), "latest");
        assert_eq!(StartDate::Day(day(2020, 12, 25)).to_string(), "2020-12-25");
        assert_eq!(DailysDate::Latest.as_entry_date(), None);
    }

    #[test]
    fn test_config_loading() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"named_dates": {{"christmas-2020": "2020-12-25"}}}}"#
        )
        .unwrap();

        let config = DailysConfig::load(file.path()).unwrap();
        assert_eq!(config.named_dates["christmas-2020"], day(2020, 12, 25));
        assert!(config.db_path.is_none());

        let missing = DailysConfig::load("/nonexistent/dailys-config.json").unwrap();
        assert_eq!(missing, DailysConfig::default());

        assert!(matches!(
            DailysConfig::from_json_str("{\"named_dates\": 4}"),
            Err(DailysError::Config(_))
        ));
    }
}
