use dailys_schemas::{
    in_range, DailysData, DailysDate, DailysError, DailysResult, EndDate, Entry, EntryDate,
    StartDate,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::{write_target, EntryStore};

type DocumentKey = (String, EntryDate);

/// Document-style entry store: whole entries keyed by stat name and date,
/// held in memory.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentKey, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from existing entries. Later duplicates win.
    pub fn from_entries<I: IntoIterator<Item = Entry>>(entries: I) -> Self {
        let documents = entries
            .into_iter()
            .map(|entry| ((entry.stat_name.clone(), entry.date), entry))
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    fn read(&self) -> DailysResult<RwLockReadGuard<'_, BTreeMap<DocumentKey, Entry>>> {
        self.documents
            .read()
            .map_err(|_| DailysError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> DailysResult<RwLockWriteGuard<'_, BTreeMap<DocumentKey, Entry>>> {
        self.documents
            .write()
            .map_err(|_| DailysError::Storage("memory store lock poisoned".to_string()))
    }

    /// Dated documents for one stat, already in date order thanks to the key
    fn dated_for_stat(&self, stat_name: &str) -> DailysResult<Vec<Entry>> {
        let documents = self.read()?;
        Ok(documents
            .values()
            .filter(|entry| entry.stat_name == stat_name && !entry.date.is_static())
            .cloned()
            .collect())
    }
}

impl EntryStore for MemoryStore {
    fn stat_names(&self) -> DailysResult<BTreeSet<String>> {
        let documents = self.read()?;
        Ok(documents.keys().map(|(name, _)| name.clone()).collect())
    }

    fn entries_for_stat(&self, stat_name: &str) -> DailysResult<Vec<Entry>> {
        // Key order already puts the static document after every dated one
        let documents = self.read()?;
        Ok(documents
            .values()
            .filter(|entry| entry.stat_name == stat_name)
            .cloned()
            .collect())
    }

    fn entries_on_date(&self, stat_name: &str, date: DailysDate) -> DailysResult<Vec<Entry>> {
        match date {
            DailysDate::Earliest => Ok(self.dated_for_stat(stat_name)?.into_iter().take(1).collect()),
            DailysDate::Latest => Ok(self.dated_for_stat(stat_name)?.into_iter().last().into_iter().collect()),
            DailysDate::Static | DailysDate::Day(_) => {
                let key = (stat_name.to_string(), write_target(stat_name, date)?);
                let documents = self.read()?;
                Ok(documents.get(&key).cloned().into_iter().collect())
            }
        }
    }

    fn entries_in_range(&self, start: StartDate, end: EndDate) -> DailysResult<Vec<Entry>> {
        let documents = self.read()?;
        let mut entries: Vec<Entry> = documents
            .values()
            .filter(|entry| in_range(entry.date, start, end))
            .cloned()
            .collect();
        // Stable: ties on date keep stat name order from the key
        entries.sort_by_key(|entry| entry.date);

        debug!("Range query for all stats returned {} entries", entries.len());
        Ok(entries)
    }

    fn entries_for_stat_in_range(
        &self,
        stat_name: &str,
        start: StartDate,
        end: EndDate,
    ) -> DailysResult<Vec<Entry>> {
        Ok(self
            .dated_for_stat(stat_name)?
            .into_iter()
            .filter(|entry| in_range(entry.date, start, end))
            .collect())
    }

    fn upsert_entry(
        &self,
        stat_name: &str,
        date: DailysDate,
        data: DailysData,
        source: &str,
    ) -> DailysResult<Entry> {
        let target = write_target(stat_name, date)?;
        let entry = Entry::new(stat_name, target, source, data);

        let mut documents = self.write()?;
        let replaced = documents
            .insert((stat_name.to_string(), target), entry.clone())
            .is_some();

        debug!(
            "{} {} entry on {}",
            if replaced { "Replaced" } else { "Inserted" },
            stat_name,
            target
        );
        Ok(entry)
    }

    fn latest_entries_for_stat(&self, stat_name: &str, n: usize) -> DailysResult<Vec<DailysData>> {
        Ok(self
            .dated_for_stat(stat_name)?
            .into_iter()
            .rev()
            .take(n)
            .map(|entry| entry.data)
            .collect())
    }

    fn delete_entry(&self, stat_name: &str, date: DailysDate) -> DailysResult<()> {
        let target = write_target(stat_name, date)?;

        let mut documents = self.write()?;
        if documents.remove(&(stat_name.to_string(), target)).is_none() {
            return Err(DailysError::NotFound(format!(
                "no {} entry on {}",
                stat_name, target
            )));
        }

        info!("Deleted {} entry on {}", stat_name, target);
        Ok(())
    }
}
