use chrono::NaiveDate;
use dailys_schemas::{DailysResult, Entry};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::chores::chores_done;
use crate::models::{decode, Decoded, StatKind};

/// How many values an entry holds. Decoded stats use their own count;
/// duolingo counts its keys and chores the chores done; anything else is 0.
pub fn value_count(entry: &Entry) -> DailysResult<usize> {
    let decoded = decode(entry)?;
    if let Some(model) = decoded.model() {
        return Ok(model.value_count());
    }
    Ok(match decoded {
        Decoded::Undecoded(StatKind::Duolingo) => entry.data.as_object().map_or(0, |data| data.len()),
        Decoded::Undecoded(StatKind::Chores) => chores_done(entry)?.len(),
        _ => 0,
    })
}

/// Number of stats and values counted in one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub stats: usize,
    pub values: usize,
}

impl Totals {
    fn add(&mut self, values: usize) {
        self.stats += 1;
        self.values += values;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateTotals {
    pub stats: usize,
    pub values: usize,
    pub values_by_stat: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatTotalsReport {
    pub date_totals: BTreeMap<NaiveDate, DateTotals>,
    pub source_totals: BTreeMap<String, Totals>,
    pub stat_totals: BTreeMap<String, Totals>,
    pub total_stats: usize,
    pub total_values: usize,
}

/// Completeness rollups by date, source and stat. Static entries are skipped.
pub fn stat_totals(entries: &[Entry]) -> DailysResult<StatTotalsReport> {
    let mut report = StatTotalsReport::default();
    for entry in entries {
        let date = match entry.day() {
            Some(date) => date,
            None => continue,
        };
        let values = value_count(entry)?;

        let date_totals = report.date_totals.entry(date).or_default();
        date_totals.stats += 1;
        date_totals.values += values;
        date_totals.values_by_stat.insert(entry.stat_name.clone(), values);

        report.source_totals.entry(entry.source.clone()).or_default().add(values);
        report.stat_totals.entry(entry.stat_name.clone()).or_default().add(values);
        report.total_stats += 1;
        report.total_values += values;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailys_schemas::EntryDate;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn entries() -> Vec<Entry> {
        vec![
            Entry::on_day("duolingo", day(1), "bot", json!({"french": 10, "german": 3})),
            Entry::on_day("chores", day(1), "web", json!({"chores_done": ["hoover", "dishes", "bins"]})),
            Entry::on_day("furaffinity", day(2), "bot", json!({"notes": 1, "comments": 4})),
            Entry::on_day("sploo", day(2), "web", json!({"count": 7})),
            Entry::on_day("steps", day(2), "phone", json!({"steps": 9000})),
            Entry::new("chores", EntryDate::Static, "web", json!({"chores": []})),
        ]
    }

    #[test]
    fn test_value_count_heuristics() {
        let entries = entries();
        let counts: Vec<usize> = entries[..5].iter().map(|entry| value_count(entry).unwrap()).collect();
        assert_eq!(counts, vec![2, 3, 2, 0, 0]);
    }

    #[test]
    fn test_rollups() {
        let report = stat_totals(&entries()).unwrap();

        assert_eq!(report.total_stats, 5);
        assert_eq!(report.total_values, 7);
        assert_eq!(report.date_totals[&day(1)].stats, 2);
        assert_eq!(report.date_totals[&day(1)].values, 5);
        assert_eq!(report.date_totals[&day(2)].values_by_stat["furaffinity"], 2);
        assert_eq!(report.source_totals["bot"], Totals { stats: 2, values: 4 });
        assert_eq!(report.stat_totals["chores"], Totals { stats: 1, values: 3 });
    }

    #[test]
    fn test_decode_errors_propagate() {
        let broken = Entry::on_day("sleep", day(1), "bot", json!({"sleep_time": "2024-01-01T23:00:00Z"}));
        assert!(stat_totals(&[broken]).is_err());
    }
}
