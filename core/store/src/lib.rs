pub mod memory;
pub mod sqlite;

use dailys_schemas::{
    DailysData, DailysDate, DailysError, DailysResult, EndDate, Entry, EntryDate, StartDate,
};
use std::collections::BTreeSet;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistence contract for dated and static entries.
///
/// At most one entry exists per `(stat_name, date)`, and at most one static
/// entry per stat name. Range queries never return static entries.
pub trait EntryStore {
    /// Distinct stat names across dated and static entries.
    fn stat_names(&self) -> DailysResult<BTreeSet<String>>;

    /// Every entry for a stat: dated entries ascending, then the static entry.
    fn entries_for_stat(&self, stat_name: &str) -> DailysResult<Vec<Entry>>;

    /// Zero or one entries. `Earliest`/`Latest` pick the chronological
    /// extreme, `Static` picks the static entry.
    fn entries_on_date(&self, stat_name: &str, date: DailysDate) -> DailysResult<Vec<Entry>>;

    /// Dated entries across all stats, ascending by date.
    fn entries_in_range(&self, start: StartDate, end: EndDate) -> DailysResult<Vec<Entry>>;

    /// Dated entries for one stat, ascending by date.
    fn entries_for_stat_in_range(
        &self,
        stat_name: &str,
        start: StartDate,
        end: EndDate,
    ) -> DailysResult<Vec<Entry>>;

    /// Insert or wholly replace the entry at `(stat_name, date)`.
    fn upsert_entry(
        &self,
        stat_name: &str,
        date: DailysDate,
        data: DailysData,
        source: &str,
    ) -> DailysResult<Entry>;

    /// Payloads of the `n` most recent dated entries, newest first.
    fn latest_entries_for_stat(&self, stat_name: &str, n: usize) -> DailysResult<Vec<DailysData>>;

    fn delete_entry(&self, stat_name: &str, date: DailysDate) -> DailysResult<()>;

    /// The static entry for a stat, if one exists.
    fn static_entry(&self, stat_name: &str) -> DailysResult<Option<Entry>> {
        Ok(self
            .entries_on_date(stat_name, DailysDate::Static)?
            .into_iter()
            .next())
    }
}

/// Concrete slot for a write or delete; `Earliest`/`Latest` are rejected.
pub fn write_target(stat_name: &str, date: DailysDate) -> DailysResult<EntryDate> {
    date.as_entry_date().ok_or_else(|| {
        DailysError::CantUpdate(format!(
            "{} entry on '{}' is not a concrete target",
            stat_name, date
        ))
    })
}
