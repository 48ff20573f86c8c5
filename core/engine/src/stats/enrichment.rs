use chrono::NaiveDate;
use dailys_schemas::{DailysResult, Entry};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{decode, Decoded, Suggestions};

/// Ways one entry could be filled in further.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentSuggestion {
    pub stat_name: String,
    pub date: NaiveDate,
    pub source: String,
    pub url_path: String,
    pub suggestions: Suggestions,
}

/// Suggestions for a dated entry, or `None` when there is nothing to add.
///
/// Stat names with no registered kind get a single suggestion pointing at
/// the whole entry. Known kinds without a decoder are never reported.
pub fn suggest_enrichment(entry: &Entry) -> DailysResult<Option<EnrichmentSuggestion>> {
    let date = entry.require_day()?;
    let suggestions = match decode(entry)? {
        Decoded::Unknown(stat_name) => {
            let mut unknown = Suggestions::new();
            unknown.insert(
                format!("stat type {} has no enrichment decoder.", stat_name),
                vec![".".to_string()],
            );
            unknown
        }
        decoded => match decoded.model() {
            Some(model) => model.suggest_enrichments(),
            None => return Ok(None),
        },
    };
    if suggestions.is_empty() {
        return Ok(None);
    }
    Ok(Some(EnrichmentSuggestion {
        stat_name: entry.stat_name.clone(),
        date,
        source: entry.source.clone(),
        url_path: entry.url_path(),
        suggestions,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionTotals {
    pub total_entries: usize,
    pub total_paths: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatSuggestionTotals {
    /// Entries of this stat with at least one suggestion
    pub total: usize,
    pub suggestion_totals: BTreeMap<String, SuggestionTotals>,
}

pub fn total_suggestions(suggestions: &[EnrichmentSuggestion]) -> BTreeMap<String, StatSuggestionTotals> {
    let mut totals: BTreeMap<String, StatSuggestionTotals> = BTreeMap::new();
    for suggestion in suggestions {
        let stat = totals.entry(suggestion.stat_name.clone()).or_default();
        stat.total += 1;
        for (text, paths) in &suggestion.suggestions {
            let totals = stat.suggestion_totals.entry(text.clone()).or_default();
            totals.total_entries += 1;
            totals.total_paths += paths.len();
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentReport {
    pub suggestions: Vec<EnrichmentSuggestion>,
    pub totals: BTreeMap<String, StatSuggestionTotals>,
}

/// Scan dated entries for enrichment suggestions. Static entries are skipped.
pub fn enrichment_report(entries: &[Entry]) -> DailysResult<EnrichmentReport> {
    let mut suggestions = Vec::new();
    for entry in entries.iter().filter(|entry| !entry.date.is_static()) {
        if let Some(suggestion) = suggest_enrichment(entry)? {
            suggestions.push(suggestion);
        }
    }
    let totals = total_suggestions(&suggestions);
    Ok(EnrichmentReport { suggestions, totals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn complete_dream() -> serde_json::Value {
        json!({"text": "x", "disorientation": 1, "lewdness": 1, "false_facts": [],
               "famous_people": [], "known_people": [], "tags": []})
    }

    #[test]
    fn test_unknown_stat_points_at_whole_entry() {
        let entry = Entry::on_day("steps", day(1), "phone", json!({"steps": 100}));
        let suggestion = suggest_enrichment(&entry).unwrap().unwrap();
        assert_eq!(
            suggestion.suggestions["stat type steps has no enrichment decoder."],
            vec!["."]
        );
        assert_eq!(suggestion.url_path, "/steps/2024-01-01/");
    }

    #[test]
    fn test_nothing_to_suggest() {
        let chores = Entry::on_day("chores", day(1), "web", json!({"chores_done": []}));
        assert_eq!(suggest_enrichment(&chores).unwrap(), None);

        let complete = Entry::on_day("dreams", day(1), "telegram", json!({"dreams": [complete_dream()]}));
        assert_eq!(suggest_enrichment(&complete).unwrap(), None);

        let sleep = Entry::on_day(
            "sleep",
            day(1),
            "bot",
            json!({"sleep_time": "2024-01-01T23:00:00Z", "wake_time": "2024-01-02T07:00:00Z"}),
        );
        assert_eq!(suggest_enrichment(&sleep).unwrap(), None);
    }

    #[test]
    fn test_report_totals() {
        let entries = vec![
            Entry::on_day("dreams", day(1), "telegram", json!({"dreams": [{"text": "a"}, {"text": "b"}]})),
            Entry::on_day("dreams", day(2), "telegram", json!({"dreams": [complete_dream(), {"text": "c", "tags": []}]})),
            Entry::on_day("steps", day(2), "phone", json!({})),
        ];
        let report = enrichment_report(&entries).unwrap();

        assert_eq!(report.suggestions.len(), 3);
        let dreams = &report.totals["dreams"];
        assert_eq!(dreams.total, 2);
        assert_eq!(
            dreams.suggestion_totals["could add tags."],
            SuggestionTotals { total_entries: 1, total_paths: 2 }
        );
        assert_eq!(
            dreams.suggestion_totals["could add lewdness rating"],
            SuggestionTotals { total_entries: 2, total_paths: 3 }
        );
        assert_eq!(report.totals["steps"].total, 1);
    }
}
