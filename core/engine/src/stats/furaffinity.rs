use chrono::{Days, NaiveDate};
use dailys_schemas::{DailysError, DailysResult};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::colour::{Colour, ColourScale, Rgb};
use crate::models::FuraffinityData;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaDay {
    pub date: NaiveDate,
    pub submissions: Option<i64>,
    pub comments: Option<i64>,
    pub journals: Option<i64>,
    pub notes: Option<i64>,
    pub watches: Option<i64>,
    pub favourites: Option<i64>,
    pub total: i64,
    /// Change from the previous calendar day's total. Absent when that day
    /// has no data or the total went down.
    pub diff: Option<i64>,
    pub colour: Colour,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaReport {
    pub days: Vec<FaDay>,
    pub max_total: i64,
}

pub fn fa_report(notifications: &[FuraffinityData]) -> DailysResult<FaReport> {
    let max_total = notifications
        .iter()
        .map(|fa| fa.total)
        .max()
        .ok_or_else(|| DailysError::EmptyRange("no furaffinity entries in range".to_string()))?;
    let scale = ColourScale::new(0, max_total, Rgb::WHITE, Rgb::RED);

    let totals: BTreeMap<NaiveDate, i64> = notifications.iter().map(|fa| (fa.date, fa.total)).collect();
    let days = notifications
        .iter()
        .map(|fa| {
            let previous = fa
                .date
                .checked_sub_days(Days::new(1))
                .and_then(|yesterday| totals.get(&yesterday));
            FaDay {
                date: fa.date,
                submissions: fa.submissions,
                comments: fa.comments,
                journals: fa.journals,
                notes: fa.notes,
                watches: fa.watches,
                favourites: fa.favourites,
                total: fa.total,
                diff: previous.map(|previous| fa.total - previous).filter(|diff| *diff >= 0),
                colour: scale.colour_for_value(fa.total),
            }
        })
        .collect();

    Ok(FaReport { days, max_total })
}
