use chrono::{Days, Months, NaiveDate};
use dailys_schemas::{DailysError, DailysResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("hardcoded regex")
});

const SECONDS_PER_DAY: u64 = 86_400;

/// An ISO-8601 duration such as `P1W` or `P1Y2M10DT2H`, as used for chore
/// recurrence.
///
/// Calendar months are kept apart from fixed days so `P1M` after January
/// 31st lands on the last day of February.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    months: u32,
    days: u64,
    raw: String,
}

impl Period {
    pub fn months(&self) -> u32 {
        self.months
    }

    /// Whole days, with weeks folded in and the time part truncated.
    pub fn days(&self) -> u64 {
        self.days
    }

    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_add_months(Months::new(self.months))?
            .checked_add_days(Days::new(self.days()))
    }

    pub fn subtract_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_sub_months(Months::new(self.months))?
            .checked_sub_days(Days::new(self.days()))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Period {
    type Err = DailysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DailysError::Validation(format!("'{}' is not an ISO-8601 duration", s));
        let captures = ISO_DURATION.captures(s).ok_or_else(invalid)?;
        if s == "P" || s.ends_with('T') {
            return Err(invalid());
        }

        let number = |index: usize| -> DailysResult<u64> {
            captures
                .get(index)
                .map_or(Ok(0), |m| m.as_str().parse::<u64>().map_err(|_| invalid()))
        };
        let seconds = captures
            .get(7)
            .map_or(Ok(0.0), |m| m.as_str().parse::<f64>().map_err(|_| invalid()))?;

        let months = number(1)?
            .checked_mul(12)
            .and_then(|months| months.checked_add(number(2).ok()?))
            .and_then(|months| u32::try_from(months).ok())
            .ok_or_else(invalid)?;
        let seconds = number(5)?
            .checked_mul(3600)
            .and_then(|total| total.checked_add(number(6).ok()?.checked_mul(60)?))
            .and_then(|total| total.checked_add(seconds as u64))
            .ok_or_else(invalid)?;
        let days = number(3)?
            .checked_mul(7)
            .and_then(|days| days.checked_add(number(4).ok()?))
            .and_then(|days| days.checked_add(seconds / SECONDS_PER_DAY))
            .ok_or_else(invalid)?;

        Ok(Self {
            months,
            days,
            raw: s.to_string(),
        })
    }
}

impl TryFrom<String> for Period {
    type Error = DailysError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.raw
    }
}
