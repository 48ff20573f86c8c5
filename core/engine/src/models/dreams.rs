use chrono::NaiveDate;
use dailys_schemas::{DailysData, DailysError, DailysResult, Entry, DATE_FORMAT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{parse_timestamp, payload, StatModel, Suggestions};

/// Source recorded on nights filled in for days with no entry.
pub const AUTO_GENERATED_SOURCE: &str = "Auto-generated";

/// Shown in place of a maximum rating when no dream carries one.
pub const NO_RATING: &str = "-";

const PREVIEW_LENGTH: usize = 50;

/// Optional dream keys, with the suggestion shown when a dream lacks one.
const ENRICHMENT_FIELDS: [(&str, &str); 6] = [
    ("disorientation", "could add disorientation rating"),
    ("lewdness", "could add lewdness rating"),
    ("false_facts", "could list false facts"),
    ("famous_people", "could tag famous people."),
    ("known_people", "could tag known people."),
    ("tags", "could add tags."),
];

/// A single remembered dream and its optional enrichment fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dream {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disorientation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lewdness: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_facts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub famous_people: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_people: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Dream {
    pub fn value_count(&self) -> usize {
        let optional = [
            self.disorientation.is_some(),
            self.lewdness.is_some(),
            self.false_facts.is_some(),
            self.famous_people.is_some(),
            self.known_people.is_some(),
            self.tags.is_some(),
        ];
        usize::from(!self.text.is_empty()) + optional.iter().filter(|present| **present).count()
    }
}

#[derive(Debug, Deserialize)]
struct DreamNightPayload {
    dreams: Vec<Dream>,
}

/// Static reference data for the dreams stat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DreamsStatic {
    /// First night that should have an entry, if every night is tracked
    pub all_nights_start: Option<String>,
}

impl DreamsStatic {
    pub fn all_nights_start(&self) -> DailysResult<Option<NaiveDate>> {
        self.all_nights_start
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .or_else(|_| parse_timestamp(raw).map(|timestamp| timestamp.date_naive()))
            })
            .transpose()
    }
}

/// All the dreams recorded for one night.
#[derive(Debug, Clone)]
pub struct DreamNight {
    pub date: NaiveDate,
    pub source: String,
    pub dreams: Vec<Dream>,
    raw: DailysData,
}

impl DreamNight {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        let raw: DreamNightPayload = payload(entry)?;
        Ok(Self {
            date: entry.require_day()?,
            source: entry.source.clone(),
            dreams: raw.dreams,
            raw: entry.data.clone(),
        })
    }

    /// An empty night standing in for a day with no recorded entry.
    pub fn auto_generated(date: NaiveDate) -> Self {
        Self {
            date,
            source: AUTO_GENERATED_SOURCE.to_string(),
            dreams: Vec::new(),
            raw: json!({"dreams": []}),
        }
    }

    pub fn is_auto_generated(&self) -> bool {
        self.source == AUTO_GENERATED_SOURCE
    }

    pub fn dream_count(&self) -> usize {
        self.dreams.len()
    }

    /// Total characters across every dream's text
    pub fn total_dreams_length(&self) -> usize {
        self.dreams.iter().map(|dream| dream.text.chars().count()).sum()
    }

    /// First dream's text, cut to 50 characters with a trailing ellipsis.
    pub fn dream_preview(&self) -> String {
        let first = match self.dreams.first() {
            Some(dream) => &dream.text,
            None => return String::new(),
        };
        if first.chars().count() < PREVIEW_LENGTH {
            return first.clone();
        }
        let cut: String = first.chars().take(PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    }

    /// Highest non-zero disorientation rating; a 0 counts as unrated.
    pub fn max_disorientation(&self) -> Option<i64> {
        max_rating(self.dreams.iter().map(|dream| dream.disorientation))
    }

    pub fn max_lewdness(&self) -> Option<i64> {
        max_rating(self.dreams.iter().map(|dream| dream.lewdness))
    }

    pub fn all_false_facts(&self) -> Option<Vec<String>> {
        flatten(self.dreams.iter().map(|dream| dream.false_facts.as_ref()))
    }

    pub fn all_famous_people(&self) -> Option<Vec<String>> {
        flatten(self.dreams.iter().map(|dream| dream.famous_people.as_ref()))
    }

    pub fn all_known_people(&self) -> Option<Vec<String>> {
        flatten(self.dreams.iter().map(|dream| dream.known_people.as_ref()))
    }

    pub fn all_tags(&self) -> Option<Vec<String>> {
        flatten(self.dreams.iter().map(|dream| dream.tags.as_ref()))
    }

    /// Apply an enrichment form to the stored payload.
    ///
    /// Form keys are suffixed with the dream index: `disorientation-0`,
    /// `tags-2`. Ratings must be integers, list fields are `|`-separated.
    pub fn enriched_data(&self, form: &BTreeMap<String, String>) -> DailysResult<DailysData> {
        let mut data = self.raw.clone();
        let dreams = data
            .get_mut("dreams")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| DailysError::InvalidPayload(format!("dreams entry on {} has no dream list", self.date)))?;

        for (index, dream) in dreams.iter_mut().enumerate() {
            let dream = dream.as_object_mut().ok_or_else(|| {
                DailysError::InvalidPayload(format!("dream {} on {} is not an object", index, self.date))
            })?;
            for field in ["disorientation", "lewdness"] {
                if let Some(raw) = form.get(&format!("{}-{}", field, index)) {
                    let rating: i64 = raw.trim().parse().map_err(|_| {
                        DailysError::Validation(format!("{} rating '{}' is not an integer", field, raw))
                    })?;
                    dream.insert(field.to_string(), json!(rating));
                }
            }
            for field in ["false_facts", "famous_people", "known_people", "tags"] {
                if let Some(raw) = form.get(&format!("{}-{}", field, index)) {
                    let items: Vec<&str> = raw
                        .split('|')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .collect();
                    dream.insert(field.to_string(), json!(items));
                }
            }
        }
        Ok(data)
    }
}

fn max_rating<I: Iterator<Item = Option<i64>>>(ratings: I) -> Option<i64> {
    ratings.flatten().filter(|rating| *rating != 0).max()
}

/// Keys missing from one raw dream object. A key set to `null` is present.
fn missing_fields(raw_dream: &Value) -> impl Iterator<Item = &'static str> + '_ {
    ENRICHMENT_FIELDS
        .iter()
        .filter(move |(key, _)| raw_dream.get(key).is_none())
        .map(|(_, suggestion)| *suggestion)
}

/// Concatenate the lists present, or `None` if no dream had the field.
fn flatten<'a, I>(lists: I) -> Option<Vec<String>>
where
    I: Iterator<Item = Option<&'a Vec<String>>>,
{
    let mut seen_any = false;
    let mut flattened = Vec::new();
    for list in lists.flatten() {
        seen_any = true;
        flattened.extend(list.iter().cloned());
    }
    seen_any.then_some(flattened)
}

impl StatModel for DreamNight {
    fn stat_name(&self) -> &'static str {
        "dreams"
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn value_count(&self) -> usize {
        self.dreams.iter().map(Dream::value_count).sum()
    }

    fn suggest_enrichments(&self) -> Suggestions {
        let mut suggestions = Suggestions::new();
        let raw_dreams = self.raw.get("dreams").and_then(Value::as_array);
        for (index, raw_dream) in raw_dreams.into_iter().flatten().enumerate() {
            for suggestion in missing_fields(raw_dream) {
                suggestions
                    .entry(suggestion.to_string())
                    .or_default()
                    .push(format!("$.data.dreams[{}]", index));
            }
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night(dreams: Value) -> DreamNight {
        let entry = Entry::on_day(
            "dreams",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "telegram",
            json!({"dreams": dreams}),
        );
        DreamNight::from_entry(&entry).unwrap()
    }

    #[test]
    fn test_aggregate_properties() {
        let night = night(json!([
            {"text": "flying", "disorientation": 2, "tags": ["flight"]},
            {"text": "exam", "disorientation": 4, "lewdness": 0, "tags": ["school", "stress"]},
            {"text": "blank"}
        ]));

        assert_eq!(night.dream_count(), 3);
        assert_eq!(night.total_dreams_length(), 15);
        assert_eq!(night.max_disorientation(), Some(4));
        assert_eq!(night.max_lewdness(), None);
        assert_eq!(
            night.all_tags(),
            Some(vec!["flight".to_string(), "school".to_string(), "stress".to_string()])
        );
        assert_eq!(night.all_false_facts(), None);
        // text + disorientation + tags, text + 3 fields, text
        assert_eq!(night.value_count(), 3 + 4 + 1);
    }

    #[test]
    fn test_zero_ratings_count_as_unrated() {
        let zeros = night(json!([
            {"text": "one", "disorientation": 0, "lewdness": 0},
            {"text": "two", "disorientation": 0}
        ]));
        assert_eq!(zeros.max_disorientation(), None);
        assert_eq!(zeros.max_lewdness(), None);

        let mixed = night(json!([{"text": "one", "lewdness": 0}, {"text": "two", "lewdness": 2}]));
        assert_eq!(mixed.max_lewdness(), Some(2));
    }

    #[test]
    fn test_null_fields_are_not_suggested() {
        let nulls = night(json!([{"text": "one", "disorientation": 2, "lewdness": null,
            "false_facts": null, "famous_people": [], "known_people": [], "tags": null}]));
        assert!(nulls.suggest_enrichments().is_empty());
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = night(json!([{"text": "a".repeat(60)}]));
        assert_eq!(long.dream_preview(), format!("{}...", "a".repeat(50)));

        let short = night(json!([{"text": "short"}]));
        assert_eq!(short.dream_preview(), "short");
        assert_eq!(DreamNight::auto_generated(short.date).dream_preview(), "");
    }

    #[test]
    fn test_suggestions_list_missing_fields() {
        let partial = night(json!([
            {"text": "one", "disorientation": 1, "lewdness": 1, "false_facts": [],
             "famous_people": [], "known_people": [], "tags": []},
            {"text": "two", "disorientation": 3}
        ]));

        let suggestions = partial.suggest_enrichments();
        assert_eq!(suggestions.len(), 5);
        assert_eq!(suggestions["could add tags."], vec!["$.data.dreams[1]"]);
        assert!(!suggestions.contains_key("could add disorientation rating"));

        let complete = night(json!([{"text": "x", "disorientation": 1, "lewdness": 1,
            "false_facts": [], "famous_people": [], "known_people": [], "tags": []}]));
        assert!(complete.suggest_enrichments().is_empty());
    }

    #[test]
    fn test_enriched_data_applies_form() {
        let night = night(json!([{"text": "one"}, {"text": "two", "tags": ["old"]}]));
        let form: BTreeMap<String, String> = [
            ("disorientation-0", "3"),
            ("tags-1", "castle | dragon||"),
            ("known_people-0", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let data = night.enriched_data(&form).unwrap();
        assert_eq!(data["dreams"][0]["disorientation"], 3);
        assert_eq!(data["dreams"][0]["known_people"], json!([]));
        assert_eq!(data["dreams"][1]["tags"], json!(["castle", "dragon"]));
        assert_eq!(data["dreams"][1]["text"], "two");

        let bad: BTreeMap<String, String> =
            [("lewdness-0".to_string(), "very".to_string())].into_iter().collect();
        assert!(matches!(night.enriched_data(&bad), Err(DailysError::Validation(_))));
    }

    #[test]
    fn test_all_nights_start_formats() {
        let plain = DreamsStatic { all_nights_start: Some("2024-01-01".to_string()) };
        assert_eq!(plain.all_nights_start().unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1));
        let timestamp = DreamsStatic { all_nights_start: Some("2024-01-01T00:00:00".to_string()) };
        assert_eq!(timestamp.all_nights_start().unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(DreamsStatic::default().all_nights_start().unwrap(), None);
    }
}
