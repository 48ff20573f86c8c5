use chrono::NaiveDate;
use dailys_schemas::{DailysError, DailysResult, Entry};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::colour::{Colour, ColourScale, Rgb};
use crate::models::chores::chores_done;
use crate::models::{Chore, ChoresStatic};
use crate::period::Period;

/// Fold every dated chores entry into the catalogue.
pub fn build_chores(chores_static: &ChoresStatic, entries: &[Entry]) -> DailysResult<Vec<Chore>> {
    let mut chores: Vec<Chore> = chores_static.chores.iter().cloned().map(Chore::new).collect();
    for entry in entries {
        let date = entry.require_day()?;
        let done = chores_done(entry)?;
        for chore in &mut chores {
            chore.record(date, &done);
        }
    }
    Ok(chores)
}

/// Chores with a period that are due or overdue, most overdue first.
pub fn overdue_chores(chores: &[Chore], today: NaiveDate) -> DailysResult<Vec<&Chore>> {
    let mut overdue = Vec::new();
    for chore in chores {
        if let Some(days) = chore.days_overdue(today)? {
            if days >= 0 {
                overdue.push((days, chore));
            }
        }
    }
    overdue.sort_by_key(|(days, _)| Reverse(*days));
    Ok(overdue.into_iter().map(|(_, chore)| chore).collect())
}

/// Chores without a period, stalest first. Never-done chores lead.
pub fn neglected_chores(chores: &[Chore], today: NaiveDate) -> Vec<&Chore> {
    let mut neglected: Vec<&Chore> = chores.iter().filter(|chore| !chore.has_period()).collect();
    neglected.sort_by_key(|chore| Reverse(chore.days_since_done(today).unwrap_or(i64::MAX)));
    neglected
}

/// When a chore is next due; `Today` when that is today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextDate {
    Today,
    On(NaiveDate),
}

impl Serialize for NextDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NextDate::Today => serializer.serialize_str("Today"),
            NextDate::On(date) => date.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoreView {
    pub id: String,
    pub display_name: String,
    pub category: String,
    pub recommended_period: Option<Period>,
    pub latest_done: Option<NaiveDate>,
    pub next_date: Option<NextDate>,
    pub is_overdue: bool,
    pub days_overdue: Option<i64>,
    pub days_since_done: Option<i64>,
    pub next_date_colour: Colour,
    pub latest_date_colour: Colour,
}

/// Colouring for when a period-less chore was last done: red two months
/// ago fading to white one week ago.
pub fn latest_done_scale(today: NaiveDate) -> DailysResult<ColourScale<NaiveDate>> {
    let offset = |raw: &str| -> DailysResult<NaiveDate> {
        raw.parse::<Period>()?
            .subtract_from(today)
            .ok_or_else(|| DailysError::Validation(format!("{} before {} is out of range", raw, today)))
    };
    Ok(ColourScale::new(offset("P2M")?, offset("P1W")?, Rgb::RED, Rgb::WHITE))
}

impl ChoreView {
    pub fn new(chore: &Chore, today: NaiveDate, scale: &ColourScale<NaiveDate>) -> DailysResult<Self> {
        let next_due = chore.next_due(today)?;
        let is_overdue = chore.is_overdue(today)?;
        let latest_date_colour = match (chore.has_period(), chore.latest_done) {
            (true, _) => Colour::Transparent,
            (false, None) => Colour::Rgb(scale.start_colour),
            (false, Some(latest)) => scale.colour_for_value(latest),
        };
        Ok(Self {
            id: chore.definition.id.clone(),
            display_name: chore.definition.display_name.clone(),
            category: chore.definition.category.clone(),
            recommended_period: chore.definition.recommended_period.clone(),
            latest_done: chore.latest_done,
            next_date: next_due.map(|next| {
                if next == today {
                    NextDate::Today
                } else {
                    NextDate::On(next)
                }
            }),
            is_overdue,
            days_overdue: chore.days_overdue(today)?,
            days_since_done: chore.days_since_done(today),
            next_date_colour: if is_overdue {
                Colour::Rgb(Rgb::RED)
            } else {
                Colour::Transparent
            },
            latest_date_colour,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoresBoard {
    pub today: NaiveDate,
    /// Category → chores in catalogue order
    pub chores: BTreeMap<String, Vec<ChoreView>>,
    pub layout: Value,
    pub overdue: Vec<ChoreView>,
    pub neglected: Vec<ChoreView>,
}

pub fn chores_board(
    chores_static: &ChoresStatic,
    entries: &[Entry],
    today: NaiveDate,
) -> DailysResult<ChoresBoard> {
    let chores = build_chores(chores_static, entries)?;
    let scale = latest_done_scale(today)?;
    let view = |chore: &Chore| ChoreView::new(chore, today, &scale);

    let mut categorised: BTreeMap<String, Vec<ChoreView>> = BTreeMap::new();
    for chore in &chores {
        categorised
            .entry(chore.definition.category.clone())
            .or_default()
            .push(view(chore)?);
    }
    let overdue = overdue_chores(&chores, today)?
        .into_iter()
        .map(view)
        .collect::<DailysResult<Vec<_>>>()?;
    let neglected = neglected_chores(&chores, today)
        .into_iter()
        .map(view)
        .collect::<DailysResult<Vec<_>>>()?;

    Ok(ChoresBoard {
        today,
        chores: categorised,
        layout: chores_static.layout.clone(),
        overdue,
        neglected,
    })
}
