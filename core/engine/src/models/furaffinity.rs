use chrono::NaiveDate;
use dailys_schemas::{DailysResult, Entry};
use serde::Deserialize;

use super::{payload, StatModel};

#[derive(Debug, Clone, Default, Deserialize)]
struct FuraffinityPayload {
    submissions: Option<i64>,
    comments: Option<i64>,
    journals: Option<i64>,
    notes: Option<i64>,
    watches: Option<i64>,
    favourites: Option<i64>,
    total: Option<i64>,
}

/// Daily notification counters from furaffinity.
#[derive(Debug, Clone)]
pub struct FuraffinityData {
    pub date: NaiveDate,
    pub source: String,
    pub submissions: Option<i64>,
    pub comments: Option<i64>,
    pub journals: Option<i64>,
    pub notes: Option<i64>,
    pub watches: Option<i64>,
    pub favourites: Option<i64>,
    /// Stored total when present, else the sum of present counters
    pub total: i64,
}

impl FuraffinityData {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        let raw: FuraffinityPayload = payload(entry)?;
        let mut data = Self {
            date: entry.require_day()?,
            source: entry.source.clone(),
            submissions: raw.submissions,
            comments: raw.comments,
            journals: raw.journals,
            notes: raw.notes,
            watches: raw.watches,
            favourites: raw.favourites,
            total: 0,
        };
        data.total = raw
            .total
            .unwrap_or_else(|| data.counters().iter().flatten().sum());
        Ok(data)
    }

    pub fn counters(&self) -> [Option<i64>; 6] {
        [
            self.submissions,
            self.comments,
            self.journals,
            self.notes,
            self.watches,
            self.favourites,
        ]
    }
}

impl StatModel for FuraffinityData {
    fn stat_name(&self) -> &'static str {
        "furaffinity"
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn value_count(&self) -> usize {
        self.counters().iter().filter(|counter| counter.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fa_entry(data: serde_json::Value) -> Entry {
        Entry::on_day("furaffinity", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "bot", data)
    }

    #[test]
    fn test_total_sums_present_counters() {
        let fa = FuraffinityData::from_entry(&fa_entry(json!({
            "submissions": 10, "comments": 2, "notes": null, "favourites": 3
        })))
        .unwrap();
        assert_eq!(fa.total, 15);
        assert_eq!(fa.value_count(), 3);
    }

    #[test]
    fn test_stored_total_wins() {
        let fa = FuraffinityData::from_entry(&fa_entry(json!({"submissions": 10, "total": 4}))).unwrap();
        assert_eq!(fa.total, 4);
    }

    #[test]
    fn test_empty_payload_totals_zero() {
        let fa = FuraffinityData::from_entry(&fa_entry(json!({}))).unwrap();
        assert_eq!(fa.total, 0);
        assert_eq!(fa.value_count(), 0);
    }
}
