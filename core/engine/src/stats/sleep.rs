use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use dailys_schemas::{DailysError, DailysResult};
use serde::Serialize;

use super::{iso_duration, WEEKDAYS};
use crate::colour::{Colour, MidPointColourScale, Rgb};
use crate::diary::{DiaryLayout, SleepDiary};
use crate::models::{SleepData, StatModel};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Overall statistics across every night in the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepTotals {
    #[serde(with = "iso_duration")]
    pub max: Duration,
    #[serde(with = "iso_duration")]
    pub min: Duration,
    /// Mean, rounded to whole seconds
    #[serde(with = "iso_duration")]
    pub avg: Duration,
    /// Population standard deviation, in days
    pub stdev_days: f64,
    pub total_days: f64,
}

/// Nights falling in one day-of-week bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    pub name: String,
    /// Seconds slept each night in the bucket
    pub sleeps: Vec<i64>,
    #[serde(serialize_with = "iso_duration::option::serialize")]
    pub avg: Option<Duration>,
    pub colour: Colour,
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepNight {
    pub date: NaiveDate,
    pub source: String,
    pub sleep_time: DateTime<FixedOffset>,
    pub wake_time: DateTime<FixedOffset>,
    #[serde(with = "iso_duration")]
    pub time_sleeping: Duration,
    pub colour: Colour,
    pub interruptions: String,
    pub diary: SleepDiary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepSummary {
    pub nights: Vec<SleepNight>,
    pub stats: SleepTotals,
    /// Monday..Sunday, then "Weekday" and "Weekend"
    pub buckets: Vec<WeekdayBucket>,
}

/// Bucket index for a night: the day of the week it ends on, Monday = 0.
pub fn weekday_index(date: NaiveDate) -> usize {
    (date.weekday().num_days_from_monday() as usize + 1) % 7
}

pub fn sleep_totals(sleeps: &[SleepData]) -> DailysResult<SleepTotals> {
    let durations: Vec<Duration> = sleeps.iter().map(SleepData::time_sleeping).collect();
    let (min, max) = match (durations.iter().min(), durations.iter().max()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => return Err(DailysError::EmptyRange("no sleep entries in range".to_string())),
    };

    let days: Vec<f64> = durations
        .iter()
        .map(|duration| duration.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
        .collect();
    let total_days: f64 = days.iter().sum();
    let mean_days = total_days / days.len() as f64;
    let variance = days.iter().map(|day| (day - mean_days).powi(2)).sum::<f64>() / days.len() as f64;

    Ok(SleepTotals {
        max,
        min,
        avg: Duration::seconds((mean_days * SECONDS_PER_DAY).round() as i64),
        stdev_days: variance.sqrt(),
        total_days,
    })
}

/// Seven weekday buckets followed by the "Weekday" and "Weekend" buckets.
/// Colours are left transparent; see [`sleep_summary`].
pub fn weekday_buckets(sleeps: &[SleepData]) -> Vec<WeekdayBucket> {
    let mut sleeps_by_bucket: Vec<Vec<i64>> = vec![Vec::new(); 9];
    for sleep in sleeps {
        let seconds = sleep.time_sleeping().num_seconds();
        let index = weekday_index(sleep.date());
        sleeps_by_bucket[index].push(seconds);
        sleeps_by_bucket[if index >= 5 { 8 } else { 7 }].push(seconds);
    }

    let names = WEEKDAYS.iter().copied().chain(["Weekday", "Weekend"]);
    names
        .zip(sleeps_by_bucket)
        .map(|(name, sleeps)| {
            let avg = (!sleeps.is_empty()).then(|| {
                let mean = sleeps.iter().sum::<i64>() as f64 / sleeps.len() as f64;
                Duration::seconds(mean.round() as i64)
            });
            WeekdayBucket {
                name: name.to_string(),
                sleeps,
                avg,
                colour: Colour::Transparent,
            }
        })
        .collect()
}

fn sleep_scale(min: Duration, avg: Duration, max: Duration) -> MidPointColourScale<Duration> {
    MidPointColourScale::new(min, avg, max, Rgb::YELLOW, Rgb::WHITE, Rgb::GREEN)
}

/// Full sleep report. Fails with `EmptyRange` when there are no nights.
pub fn sleep_summary(sleeps: &[SleepData], layout: &DiaryLayout) -> DailysResult<SleepSummary> {
    let stats = sleep_totals(sleeps)?;

    let night_scale = sleep_scale(stats.min, stats.avg, stats.max);
    let nights = sleeps
        .iter()
        .map(|sleep| SleepNight {
            date: sleep.date,
            source: sleep.source.clone(),
            sleep_time: sleep.sleep_time,
            wake_time: sleep.wake_time,
            time_sleeping: sleep.time_sleeping(),
            colour: night_scale.colour_for_value(sleep.time_sleeping()),
            interruptions: sleep.interruptions_text(),
            diary: layout.diary_for(sleep),
        })
        .collect();

    let mut buckets = weekday_buckets(sleeps);
    let averages = buckets.iter().filter_map(|bucket| bucket.avg);
    if let (Some(min), Some(max)) = (averages.clone().min(), averages.max()) {
        let bucket_scale = sleep_scale(min, stats.avg, max);
        for bucket in &mut buckets {
            bucket.colour = bucket_scale.colour_for(bucket.avg);
        }
    }

    Ok(SleepSummary {
        nights,
        stats,
        buckets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailys_schemas::Entry;
    use serde_json::json;

    fn sleep(date: (i32, u32, u32), hours: i64) -> SleepData {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        let sleep_time = date.and_hms_opt(23, 0, 0).unwrap().and_utc();
        let wake_time = sleep_time + Duration::hours(hours);
        let entry = Entry::on_day(
            "sleep",
            date,
            "bot",
            json!({"sleep_time": sleep_time.to_rfc3339(), "wake_time": wake_time.to_rfc3339()}),
        );
        SleepData::from_entry(&entry).unwrap()
    }

    #[test]
    fn test_weekday_index_names_the_morning() {
        // Monday night ends on Tuesday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 1);
        // Sunday night ends on Monday
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2024, 1, 7).unwrap()), 0);
    }

    #[test]
    fn test_totals() {
        let sleeps = vec![sleep((2024, 1, 1), 6), sleep((2024, 1, 2), 8), sleep((2024, 1, 3), 10)];
        let totals = sleep_totals(&sleeps).unwrap();
        assert_eq!(totals.min, Duration::hours(6));
        assert_eq!(totals.max, Duration::hours(10));
        assert_eq!(totals.avg, Duration::hours(8));
        assert!((totals.total_days - 1.0).abs() < 1e-9);
        // Population stdev of 6h, 8h, 10h is sqrt(8/3) hours
        let expected = (8.0f64 / 3.0).sqrt() / 24.0;
        assert!((totals.stdev_days - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_range_is_an_error() {
        assert!(matches!(sleep_totals(&[]), Err(DailysError::EmptyRange(_))));
        assert!(sleep_summary(&[], &DiaryLayout::default()).is_err());
    }

    #[test]
    fn test_weekday_buckets() {
        // Friday and Saturday nights end on the weekend
        let sleeps = vec![sleep((2024, 1, 1), 7), sleep((2024, 1, 5), 9), sleep((2024, 1, 6), 11)];
        let buckets = weekday_buckets(&sleeps);

        assert_eq!(buckets.len(), 9);
        assert_eq!(buckets[1].name, "Tuesday");
        assert_eq!(buckets[1].avg, Some(Duration::hours(7)));
        assert_eq!(buckets[0].avg, None);
        assert_eq!(buckets[7].name, "Weekday");
        assert_eq!(buckets[7].avg, Some(Duration::hours(7)));
        assert_eq!(buckets[8].avg, Some(Duration::hours(10)));
    }

    #[test]
    fn test_summary_colours() {
        let sleeps = vec![sleep((2024, 1, 1), 6), sleep((2024, 1, 2), 8), sleep((2024, 1, 3), 10)];
        let summary = sleep_summary(&sleeps, &DiaryLayout::default()).unwrap();

        assert_eq!(summary.nights[0].colour, Colour::Rgb(Rgb::YELLOW));
        assert_eq!(summary.nights[1].colour, Colour::Rgb(Rgb::WHITE));
        assert_eq!(summary.nights[2].colour, Colour::Rgb(Rgb::GREEN));
        assert_eq!(summary.buckets[0].colour, Colour::Transparent);
        assert_eq!(summary.nights[0].diary.label, "TOTAL SLEEP TIME: 6h 00m");
    }
}
