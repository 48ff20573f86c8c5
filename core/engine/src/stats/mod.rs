//! Derived statistics over decoded entities. Everything here is a pure
//! function of its inputs; "today" and "now" are passed in.

pub mod chores;
pub mod dreams;
pub mod enrichment;
pub mod furaffinity;
pub mod mood;
pub mod questions;
pub mod sleep;
pub mod sleep_status;
pub mod totals;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// ISO year-week key, e.g. `2024-01`.
pub fn iso_week_key(date: chrono::NaiveDate) -> String {
    date.format("%G-%V").to_string()
}

/// Serialize `chrono::Duration` as an ISO-8601 duration string.
pub(crate) mod iso_duration {
    use chrono::Duration;
    use serde::Serializer;

    use super::sleep_status::iso_duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&iso_duration(*value))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_str(&iso_duration(*value)),
                None => serializer.serialize_none(),
            }
        }
    }
}
