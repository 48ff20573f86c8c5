//! Sleep diary geometry: where each stretch of sleep falls on a 24-hour
//! horizontal timeline.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone};
use serde::Serialize;

use crate::models::{Interruption, SleepData};

const HOURS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiaryLayout {
    pub pix_per_hour: u32,
    /// Clock hour at the left edge of the timeline, on the entry's date
    pub start_hour: u32,
}

impl Default for DiaryLayout {
    fn default() -> Self {
        Self {
            pix_per_hour: 20,
            start_hour: 18,
        }
    }
}

/// An asleep stretch, in pixels from the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiarySegment {
    pub x_start: f64,
    pub x_end: f64,
}

/// A vertical hour line, labelled every other hour with a 12-hour clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourTick {
    pub x: u32,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepDiary {
    pub width: u32,
    pub ticks: Vec<HourTick>,
    pub segments: Vec<DiarySegment>,
    pub label: String,
}

impl DiaryLayout {
    pub fn width(&self) -> u32 {
        self.pix_per_hour * HOURS
    }

    pub fn ticks(&self) -> Vec<HourTick> {
        (0..=HOURS)
            .map(|hour| HourTick {
                x: hour * self.pix_per_hour,
                label: (hour % 2 == 0).then(|| (((hour + self.start_hour + 11) % 12) + 1).to_string()),
            })
            .collect()
    }

    pub fn diary_for(&self, sleep: &SleepData) -> SleepDiary {
        let origin = self.origin(sleep);
        let mut segments = Vec::new();
        let mut start_time = sleep.sleep_time;
        for interruption in sleep.interruptions.iter().flatten() {
            if let Interruption::Interval {
                wake_time,
                sleep_time,
            } = interruption
            {
                segments.push(self.segment(origin, start_time, *wake_time));
                start_time = *sleep_time;
            }
        }
        segments.push(self.segment(origin, start_time, sleep.wake_time));

        SleepDiary {
            width: self.width(),
            ticks: self.ticks(),
            segments,
            label: total_sleep_label(sleep.time_sleeping()),
        }
    }

    /// Left edge of the timeline, in the sleep's own offset
    fn origin(&self, sleep: &SleepData) -> DateTime<FixedOffset> {
        let start = NaiveTime::from_hms_opt(self.start_hour % HOURS, 0, 0).unwrap_or_default();
        let local = sleep.date.and_time(start);
        sleep
            .sleep_time
            .offset()
            .from_local_datetime(&local)
            .single()
            .unwrap_or_else(|| local.and_utc().fixed_offset())
    }

    fn segment(
        &self,
        origin: DateTime<FixedOffset>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DiarySegment {
        let to_x = |time: DateTime<FixedOffset>| {
            (time - origin).num_seconds() as f64 / 3600.0 * self.pix_per_hour as f64
        };
        DiarySegment {
            x_start: to_x(start),
            x_end: to_x(end),
        }
    }
}

/// `TOTAL SLEEP TIME: 7h 05m`. Whole days are dropped.
pub fn total_sleep_label(time_sleeping: Duration) -> String {
    let seconds = time_sleeping.num_seconds().rem_euclid(86_400);
    let hours = seconds / 3600;
    let minutes = (seconds - hours * 3600) / 60;
    format!("TOTAL SLEEP TIME: {}h {:02}m", hours, minutes)
}
