use chrono::NaiveDate;
use dailys_schemas::{DailysError, DailysResult, Entry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload;
use crate::period::Period;

/// Catalogue entry for one chore, from the static chores record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreDefinition {
    pub id: String,
    pub display_name: String,
    pub category: String,
    #[serde(default)]
    pub recommended_period: Option<Period>,
}

/// The static chores record: catalogue plus an opaque category layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoresStatic {
    pub chores: Vec<ChoreDefinition>,
    #[serde(default)]
    pub layout: Value,
}

impl ChoresStatic {
    pub fn from_entry(entry: &Entry) -> DailysResult<Self> {
        payload(entry)
    }
}

#[derive(Debug, Deserialize)]
struct ChoresDonePayload {
    #[serde(default)]
    chores_done: Vec<String>,
}

/// Chore ids completed on an entry's day.
pub fn chores_done(entry: &Entry) -> DailysResult<Vec<String>> {
    Ok(payload::<ChoresDonePayload>(entry)?.chores_done)
}

/// A chore with its completion history folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Chore {
    pub definition: ChoreDefinition,
    pub latest_done: Option<NaiveDate>,
}

impl Chore {
    pub fn new(definition: ChoreDefinition) -> Self {
        Self {
            definition,
            latest_done: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Fold in one dated chores entry.
    pub fn record(&mut self, date: NaiveDate, chores_done: &[String]) {
        if chores_done.iter().any(|id| *id == self.definition.id)
            && self.latest_done.map_or(true, |latest| date > latest)
        {
            self.latest_done = Some(date);
        }
    }

    pub fn has_period(&self) -> bool {
        self.definition.recommended_period.is_some()
    }

    /// Last completion plus the period, or today if never completed.
    /// `None` for chores without a recommended period.
    pub fn next_due(&self, today: NaiveDate) -> DailysResult<Option<NaiveDate>> {
        let period = match &self.definition.recommended_period {
            Some(period) => period,
            None => return Ok(None),
        };
        let latest = match self.latest_done {
            Some(latest) => latest,
            None => return Ok(Some(today)),
        };
        period.add_to(latest).map(Some).ok_or_else(|| {
            DailysError::Validation(format!(
                "chore {} next due date is out of range",
                self.definition.id
            ))
        })
    }

    /// Due today counts as overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> DailysResult<bool> {
        Ok(self.next_due(today)?.map_or(false, |next| today >= next))
    }

    pub fn days_overdue(&self, today: NaiveDate) -> DailysResult<Option<i64>> {
        Ok(self.next_due(today)?.map(|next| (today - next).num_days()))
    }

    pub fn days_since_done(&self, today: NaiveDate) -> Option<i64> {
        self.latest_done.map(|latest| (today - latest).num_days())
    }
}
