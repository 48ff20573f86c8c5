use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{iso_week_key, WEEKDAYS};
use crate::colour::{Colour, ColourScale, Rgb};
use crate::models::MoodMeasurement;

/// Ratings are on a fixed 1..5 scale.
const RATING_MIN: f64 = 1.0;
const RATING_MAX: f64 = 5.0;

/// Neutral, good and bad colourings for a single rating.
pub fn rating_scales() -> [ColourScale<f64>; 3] {
    [
        ColourScale::new(RATING_MIN, RATING_MAX, Rgb::WHITE, Rgb::DANDELION),
        ColourScale::new(RATING_MIN, RATING_MAX, Rgb::WHITE, Rgb::GREEN),
        ColourScale::new(RATING_MIN, RATING_MAX, Rgb::WHITE, Rgb::RED),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodRating {
    pub value: i64,
    pub colour: Colour,
    pub colour_good: Colour,
    pub colour_bad: Colour,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodRow {
    pub date: NaiveDate,
    pub time_str: String,
    pub datetime: NaiveDateTime,
    pub ratings: BTreeMap<String, MoodRating>,
}

/// Per-measurement table, one row per resolved time slot.
pub fn mood_table(measurements: &[MoodMeasurement]) -> Vec<MoodRow> {
    let [neutral, good, bad] = rating_scales();
    measurements
        .iter()
        .map(|measurement| MoodRow {
            date: measurement.date,
            time_str: measurement.time_str.clone(),
            datetime: measurement.datetime,
            ratings: measurement
                .mood
                .iter()
                .map(|(axis, value)| {
                    let value_f = *value as f64;
                    let rating = MoodRating {
                        value: *value,
                        colour: neutral.colour_for_value(value_f),
                        colour_good: good.colour_for_value(value_f),
                        colour_bad: bad.colour_for_value(value_f),
                    };
                    (axis.clone(), rating)
                })
                .collect(),
        })
        .collect()
}

/// Every rating for one axis in one bucket, and their mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoodBucket {
    pub list: Vec<i64>,
    /// Absent when the bucket has no ratings
    pub avg: Option<f64>,
    pub colour: Colour,
}

impl MoodBucket {
    fn push(&mut self, value: i64) {
        self.list.push(value);
        self.avg = Some(self.list.iter().sum::<i64>() as f64 / self.list.len() as f64);
    }
}

/// Axis → bucket, for every declared axis.
pub type MoodBuckets = BTreeMap<String, MoodBucket>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayMood {
    pub weekday: String,
    pub moods: MoodBuckets,
}

/// Range of valid bucket means for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodWeekly {
    pub moods: Vec<String>,
    /// Monday..Sunday
    pub weekdays: Vec<WeekdayMood>,
    /// ISO year-week → axis buckets
    pub weeks: BTreeMap<String, MoodBuckets>,
    /// Axis → range of its weekday means, absent if no weekday has data
    pub weekday_scales: BTreeMap<String, Option<ScaleRange>>,
    pub weekly_scales: BTreeMap<String, Option<ScaleRange>>,
}

fn empty_buckets(moods: &[String]) -> MoodBuckets {
    moods.iter().map(|mood| (mood.clone(), MoodBucket::default())).collect()
}

/// Weekday and ISO-week rollups for each declared axis. Undeclared axes are
/// ignored.
pub fn mood_weekly(measurements: &[MoodMeasurement], moods: &[String]) -> MoodWeekly {
    let mut weekdays: Vec<MoodBuckets> = (0..7).map(|_| empty_buckets(moods)).collect();
    let mut weeks: BTreeMap<String, MoodBuckets> = BTreeMap::new();

    for measurement in measurements {
        let weekday = measurement.date.weekday().num_days_from_monday() as usize;
        let week = weeks
            .entry(iso_week_key(measurement.date))
            .or_insert_with(|| empty_buckets(moods));
        for (axis, value) in &measurement.mood {
            if let Some(bucket) = weekdays[weekday].get_mut(axis) {
                bucket.push(*value);
            }
            if let Some(bucket) = week.get_mut(axis) {
                bucket.push(*value);
            }
        }
    }

    let weekday_scales = colour_buckets(moods, weekdays.iter_mut());
    let weekly_scales = colour_buckets(moods, weeks.values_mut());

    MoodWeekly {
        moods: moods.to_vec(),
        weekdays: WEEKDAYS
            .iter()
            .zip(weekdays)
            .map(|(weekday, moods)| WeekdayMood {
                weekday: weekday.to_string(),
                moods,
            })
            .collect(),
        weeks,
        weekday_scales,
        weekly_scales,
    }
}

/// Colour each axis over the min..max of its non-empty bucket means, and
/// return those ranges.
fn colour_buckets<'a, I>(moods: &[String], buckets: I) -> BTreeMap<String, Option<ScaleRange>>
where
    I: Iterator<Item = &'a mut MoodBuckets>,
{
    let mut buckets: Vec<&mut MoodBuckets> = buckets.collect();
    moods
        .iter()
        .map(|mood| {
            let averages = buckets.iter().filter_map(|axes| axes.get(mood).and_then(|bucket| bucket.avg));
            let range = averages.clone().reduce(f64::min).zip(averages.reduce(f64::max));
            let range = range.map(|(min, max)| ScaleRange { min, max });
            if let Some(range) = range {
                let scale = ColourScale::new(range.min, range.max, Rgb::WHITE, Rgb::DANDELION);
                for axes in buckets.iter_mut() {
                    if let Some(bucket) = axes.get_mut(mood) {
                        bucket.colour = scale.colour_for(bucket.avg);
                    }
                }
            }
            (mood.clone(), range)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(date: (i32, u32, u32), ratings: &[(&str, i64)]) -> MoodMeasurement {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        MoodMeasurement {
            date,
            time_str: "12:00".to_string(),
            datetime: date.and_hms_opt(12, 0, 0).unwrap(),
            mood: ratings.iter().map(|(axis, value)| (axis.to_string(), *value)).collect(),
        }
    }

    fn moods() -> Vec<String> {
        vec!["happiness".to_string(), "anxiety".to_string()]
    }

    #[test]
    fn test_monday_average_over_three_weeks() {
        let measurements = vec![
            measurement((2024, 1, 1), &[("happiness", 3)]),
            measurement((2024, 1, 8), &[("happiness", 4)]),
            measurement((2024, 1, 15), &[("happiness", 5)]),
        ];
        let weekly = mood_weekly(&measurements, &moods());

        let monday = &weekly.weekdays[0];
        assert_eq!(monday.weekday, "Monday");
        assert_eq!(monday.moods["happiness"].list, vec![3, 4, 5]);
        assert_eq!(monday.moods["happiness"].avg, Some(4.0));

        // Only Monday has data, so the scale spans just its mean
        assert_eq!(
            weekly.weekday_scales["happiness"],
            Some(ScaleRange { min: 4.0, max: 4.0 })
        );
        assert_eq!(weekly.weekdays[1].moods["happiness"].avg, None);
        assert_eq!(weekly.weekdays[1].moods["happiness"].colour, Colour::Transparent);
        assert_eq!(weekly.weekday_scales["anxiety"], None);
    }

    #[test]
    fn test_weekly_buckets_and_scales() {
        let measurements = vec![
            measurement((2024, 1, 1), &[("happiness", 2), ("anxiety", 4)]),
            measurement((2024, 1, 2), &[("happiness", 4), ("focus", 3)]),
            measurement((2024, 1, 8), &[("happiness", 5)]),
        ];
        let weekly = mood_weekly(&measurements, &moods());

        assert_eq!(weekly.weeks.len(), 2);
        assert_eq!(weekly.weeks["2024-01"]["happiness"].avg, Some(3.0));
        assert_eq!(weekly.weeks["2024-02"]["happiness"].avg, Some(5.0));
        assert!(!weekly.weeks["2024-01"].contains_key("focus"));
        assert_eq!(
            weekly.weekly_scales["happiness"],
            Some(ScaleRange { min: 3.0, max: 5.0 })
        );
        assert_eq!(weekly.weeks["2024-01"]["happiness"].colour, Colour::Rgb(Rgb::WHITE));
        assert_eq!(weekly.weeks["2024-02"]["happiness"].colour, Colour::Rgb(Rgb::DANDELION));
    }

    #[test]
    fn test_mood_table_colours_ratings() {
        let rows = mood_table(&[measurement((2024, 1, 1), &[("happiness", 5), ("anxiety", 1)])]);
        assert_eq!(rows[0].ratings["happiness"].colour, Colour::Rgb(Rgb::DANDELION));
        assert_eq!(rows[0].ratings["anxiety"].colour_bad, Colour::Rgb(Rgb::WHITE));
        assert_eq!(rows[0].ratings["happiness"].colour_good, Colour::Rgb(Rgb::GREEN));
    }
}
