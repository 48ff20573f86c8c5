use chrono::{Datelike, Days, NaiveDate};
use dailys_schemas::{DailysError, DailysResult};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::iso_week_key;
use crate::colour::{Colour, ColourScale, Rgb};
use crate::models::dreams::NO_RATING;
use crate::models::DreamNight;

/// Fill calendar gaps with empty auto-generated nights.
///
/// Gaps are filled from `all_nights_start` (or the first recorded night, if
/// later) up to the last recorded night. Without a start boundary the
/// nights are only sorted.
pub fn fill_missing_nights(
    mut nights: Vec<DreamNight>,
    all_nights_start: Option<NaiveDate>,
) -> Vec<DreamNight> {
    nights.sort_by_key(|night| night.date);
    let (start, first, last) = match (all_nights_start, nights.first(), nights.last()) {
        (Some(start), Some(first), Some(last)) => (start, first.date, last.date),
        _ => return nights,
    };

    let recorded: BTreeSet<NaiveDate> = nights.iter().map(|night| night.date).collect();
    let mut missing = Vec::new();
    let mut day = start.max(first);
    while day <= last {
        if !recorded.contains(&day) {
            missing.push(DreamNight::auto_generated(day));
        }
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    if !missing.is_empty() {
        debug!("Synthesized {} empty dream nights", missing.len());
        nights.extend(missing);
        nights.sort_by_key(|night| night.date);
    }
    nights
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamStats {
    pub total_nights: usize,
    pub nights_with_dreams: usize,
    pub nights_without_dreams: usize,
    /// Share of nights with at least one dream, e.g. `62.50%`
    pub percentage_with_dreams: String,
    pub max_dreams: usize,
    pub max_dreams_length: usize,
}

pub fn dream_stats(nights: &[DreamNight]) -> DailysResult<DreamStats> {
    if nights.is_empty() {
        return Err(DailysError::EmptyRange("no dream nights in range".to_string()));
    }
    let nights_with_dreams = nights.iter().filter(|night| night.dream_count() > 0).count();
    let percentage = 100.0 * nights_with_dreams as f64 / nights.len() as f64;
    Ok(DreamStats {
        total_nights: nights.len(),
        nights_with_dreams,
        nights_without_dreams: nights.len() - nights_with_dreams,
        percentage_with_dreams: format!("{:.2}%", percentage),
        max_dreams: nights.iter().map(DreamNight::dream_count).max().unwrap_or(0),
        max_dreams_length: nights.iter().map(DreamNight::total_dreams_length).max().unwrap_or(0),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FalseFact {
    pub false_fact: String,
    pub date: NaiveDate,
}

/// Every false fact with the night it was dreamt.
pub fn false_facts(nights: &[DreamNight]) -> Vec<FalseFact> {
    nights
        .iter()
        .flat_map(|night| {
            night
                .all_false_facts()
                .unwrap_or_default()
                .into_iter()
                .map(move |false_fact| FalseFact {
                    false_fact,
                    date: night.date,
                })
        })
        .collect()
}

fn count<F>(nights: &[DreamNight], field: F) -> BTreeMap<String, usize>
where
    F: Fn(&DreamNight) -> Option<Vec<String>>,
{
    let mut counter = BTreeMap::new();
    for item in nights.iter().filter_map(field).flatten() {
        *counter.entry(item).or_insert(0) += 1;
    }
    counter
}

pub fn tag_counts(nights: &[DreamNight]) -> BTreeMap<String, usize> {
    count(nights, DreamNight::all_tags)
}

pub fn known_people_counts(nights: &[DreamNight]) -> BTreeMap<String, usize> {
    count(nights, DreamNight::all_known_people)
}

pub fn famous_people_counts(nights: &[DreamNight]) -> BTreeMap<String, usize> {
    count(nights, DreamNight::all_famous_people)
}

/// ISO year-week → the nights of that week, Monday first.
pub fn nights_by_week(nights: &[DreamNight]) -> BTreeMap<String, [Option<NaiveDate>; 7]> {
    let mut weeks: BTreeMap<String, [Option<NaiveDate>; 7]> = BTreeMap::new();
    for night in nights {
        let slot = night.date.weekday().num_days_from_monday() as usize;
        weeks.entry(iso_week_key(night.date)).or_default()[slot] = Some(night.date);
    }
    weeks
}

/// Known values for each list field, for building enrichment forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichmentVocabulary {
    pub tags: BTreeSet<String>,
    pub known_people: BTreeSet<String>,
    pub famous_people: BTreeSet<String>,
}

pub fn enrichment_vocabulary(nights: &[DreamNight]) -> EnrichmentVocabulary {
    let mut vocabulary = EnrichmentVocabulary::default();
    for night in nights {
        vocabulary.tags.extend(night.all_tags().unwrap_or_default());
        vocabulary.known_people.extend(night.all_known_people().unwrap_or_default());
        vocabulary.famous_people.extend(night.all_famous_people().unwrap_or_default());
    }
    vocabulary
}

/// One row of the dreams table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamNightView {
    pub date: NaiveDate,
    pub source: String,
    pub auto_generated: bool,
    pub dream_count: usize,
    pub dream_count_colour: Colour,
    pub total_length: usize,
    pub total_length_colour: Colour,
    pub preview: String,
    /// A number, or `-` when no dream that night was rated
    pub max_disorientation: Value,
    pub disorientation_colour: Colour,
    pub max_lewdness: Value,
    pub lewdness_colour: Colour,
}

fn rating_value(rating: Option<i64>) -> Value {
    rating.map_or_else(|| json!(NO_RATING), |rating| json!(rating))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamsReport {
    pub nights: Vec<DreamNightView>,
    pub stats: DreamStats,
    pub weeks: BTreeMap<String, [Option<NaiveDate>; 7]>,
    pub tags: BTreeMap<String, usize>,
    pub known_people: BTreeMap<String, usize>,
    pub famous_people: BTreeMap<String, usize>,
    pub false_facts: Vec<FalseFact>,
}

/// Dreams report over nights already gap-filled by [`fill_missing_nights`].
pub fn dreams_report(nights: &[DreamNight]) -> DailysResult<DreamsReport> {
    let stats = dream_stats(nights)?;
    let count_scale = ColourScale::new(0, stats.max_dreams as i64, Rgb::WHITE, Rgb::RED);
    let length_scale = ColourScale::new(0, stats.max_dreams_length as i64, Rgb::WHITE, Rgb::RED);
    let rating_scale = ColourScale::new(1, 5, Rgb::WHITE, Rgb::RED);

    let views = nights
        .iter()
        .map(|night| DreamNightView {
            date: night.date,
            source: night.source.clone(),
            auto_generated: night.is_auto_generated(),
            dream_count: night.dream_count(),
            dream_count_colour: count_scale.colour_for_value(night.dream_count() as i64),
            total_length: night.total_dreams_length(),
            total_length_colour: length_scale.colour_for_value(night.total_dreams_length() as i64),
            preview: night.dream_preview(),
            max_disorientation: rating_value(night.max_disorientation()),
            disorientation_colour: rating_scale.colour_for(night.max_disorientation()),
            max_lewdness: rating_value(night.max_lewdness()),
            lewdness_colour: rating_scale.colour_for(night.max_lewdness()),
        })
        .collect();

    Ok(DreamsReport {
        nights: views,
        stats,
        weeks: nights_by_week(nights),
        tags: tag_counts(nights),
        known_people: known_people_counts(nights),
        famous_people: famous_people_counts(nights),
        false_facts: false_facts(nights),
    })
}
