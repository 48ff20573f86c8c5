use chrono::NaiveDate;
use dailys_schemas::{
    DailysData, DailysDate, DailysError, DailysResult, EndDate, Entry, EntryDate, StartDate,
    DATE_FORMAT,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::{write_target, EntryStore};

const DATED_COLUMNS: &str = "stat_name, stat_date, source, stat_data";

/// Relational entry store backed by SQLite.
///
/// Dated entries live in `dailys_data`, static entries in `dailys_static`,
/// so range scans can never pick up static reference data.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn new<P: AsRef<Path>>(path: P) -> DailysResult<Self> {
        let conn = Connection::open(path).map_err(storage_error)?;

        let store = Self { conn };
        store.init_schema()?;

        info!("Entry store initialized");
        Ok(store)
    }

    /// Private in-memory database, gone when the store is dropped
    pub fn in_memory() -> DailysResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> DailysResult<()> {
        // Dated entries, one per (stat_name, stat_date)
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS dailys_data (
                    stat_name TEXT NOT NULL,
                    stat_date TEXT NOT NULL,
                    source TEXT NOT NULL,
                    stat_data TEXT NOT NULL,
                    PRIMARY KEY (stat_name, stat_date)
                )",
                [],
            )
            .map_err(storage_error)?;

        // Static reference data, one per stat_name
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS dailys_static (
                    stat_name TEXT PRIMARY KEY,
                    source TEXT NOT NULL,
                    stat_data TEXT NOT NULL
                )",
                [],
            )
            .map_err(storage_error)?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_dailys_data_date ON dailys_data(stat_date)",
                [],
            )
            .map_err(storage_error)?;

        Ok(())
    }

    fn static_entries(&self, stat_name: &str) -> DailysResult<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT stat_name, source, stat_data FROM dailys_static WHERE stat_name = ?1")
            .map_err(storage_error)?;

        let entries = stmt
            .query_map(params![stat_name], row_to_static_entry)
            .map_err(storage_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error)?;

        Ok(entries)
    }

    /// Dated entries between optional bounds, optionally for one stat
    fn dated_entries(
        &self,
        stat_name: Option<&str>,
        start: StartDate,
        end: EndDate,
    ) -> DailysResult<Vec<Entry>> {
        let query = format!(
            "SELECT {} FROM dailys_data
             WHERE (?1 IS NULL OR stat_name = ?1)
               AND (?2 IS NULL OR stat_date >= ?2)
               AND (?3 IS NULL OR stat_date <= ?3)
             ORDER BY stat_date ASC, stat_name ASC",
            DATED_COLUMNS
        );
        let mut stmt = self.conn.prepare(&query).map_err(storage_error)?;

        let start = start.day().map(format_day);
        let end = end.day().map(format_day);
        let entries = stmt
            .query_map(params![stat_name, start, end], row_to_entry)
            .map_err(storage_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error)?;

        debug!(
            "Range query for {} returned {} entries",
            stat_name.unwrap_or("all stats"),
            entries.len()
        );
        Ok(entries)
    }

    fn extreme_entry(&self, stat_name: &str, newest: bool) -> DailysResult<Vec<Entry>> {
        let query = format!(
            "SELECT {} FROM dailys_data WHERE stat_name = ?1 ORDER BY stat_date {} LIMIT 1",
            DATED_COLUMNS,
            if newest { "DESC" } else { "ASC" }
        );
        let mut stmt = self.conn.prepare(&query).map_err(storage_error)?;

        let entries = stmt
            .query_map(params![stat_name], row_to_entry)
            .map_err(storage_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error)?;

        Ok(entries)
    }
}

impl EntryStore for SqliteStore {
    fn stat_names(&self) -> DailysResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT stat_name FROM dailys_data
                 UNION
                 SELECT stat_name FROM dailys_static",
            )
            .map_err(storage_error)?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(storage_error)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(storage_error)?;

        Ok(names)
    }

    fn entries_for_stat(&self, stat_name: &str) -> DailysResult<Vec<Entry>> {
        let mut entries = self.dated_entries(Some(stat_name), StartDate::Earliest, EndDate::Latest)?;
        entries.extend(self.static_entries(stat_name)?);
        Ok(entries)
    }

    fn entries_on_date(&self, stat_name: &str, date: DailysDate) -> DailysResult<Vec<Entry>> {
        match date {
            DailysDate::Static => self.static_entries(stat_name),
            DailysDate::Earliest => self.extreme_entry(stat_name, false),
            DailysDate::Latest => self.extreme_entry(stat_name, true),
            DailysDate::Day(day) => {
                self.dated_entries(Some(stat_name), StartDate::Day(day), EndDate::Day(day))
            }
        }
    }

    fn entries_in_range(&self, start: StartDate, end: EndDate) -> DailysResult<Vec<Entry>> {
        self.dated_entries(None, start, end)
    }

    fn entries_for_stat_in_range(
        &self,
        stat_name: &str,
        start: StartDate,
        end: EndDate,
    ) -> DailysResult<Vec<Entry>> {
        self.dated_entries(Some(stat_name), start, end)
    }

    fn upsert_entry(
        &self,
        stat_name: &str,
        date: DailysDate,
        data: DailysData,
        source: &str,
    ) -> DailysResult<Entry> {
        let target = write_target(stat_name, date)?;
        let data_json = serde_json::to_string(&data)?;

        match target {
            EntryDate::Static => {
                self.conn
                    .execute(
                        "INSERT INTO dailys_static (stat_name, source, stat_data)
                         VALUES (?1, ?2, ?3)
                         ON CONFLICT (stat_name)
                         DO UPDATE SET source = excluded.source, stat_data = excluded.stat_data",
                        params![stat_name, source, data_json],
                    )
                    .map_err(storage_error)?;
            }
            EntryDate::Day(day) => {
                self.conn
                    .execute(
                        "INSERT INTO dailys_data (stat_name, stat_date, source, stat_data)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT (stat_name, stat_date)
                         DO UPDATE SET source = excluded.source, stat_data = excluded.stat_data",
                        params![stat_name, format_day(day), source, data_json],
                    )
                    .map_err(storage_error)?;
            }
        }

        debug!("Upserted {} entry on {}", stat_name, target);
        Ok(Entry::new(stat_name, target, source, data))
    }

    fn latest_entries_for_stat(&self, stat_name: &str, n: usize) -> DailysResult<Vec<DailysData>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT stat_data FROM dailys_data
                 WHERE stat_name = ?1
                 ORDER BY stat_date DESC
                 LIMIT ?2",
            )
            .map_err(storage_error)?;

        let payloads = stmt
            .query_map(params![stat_name, n as i64], |row| {
                let raw: String = row.get(0)?;
                serde_json::from_str(&raw).map_err(json_error)
            })
            .map_err(storage_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_error)?;

        Ok(payloads)
    }

    fn delete_entry(&self, stat_name: &str, date: DailysDate) -> DailysResult<()> {
        let target = write_target(stat_name, date)?;

        let deleted = match target {
            EntryDate::Static => self
                .conn
                .execute(
                    "DELETE FROM dailys_static WHERE stat_name = ?1",
                    params![stat_name],
                )
                .map_err(storage_error)?,
            EntryDate::Day(day) => self
                .conn
                .execute(
                    "DELETE FROM dailys_data WHERE stat_name = ?1 AND stat_date = ?2",
                    params![stat_name, format_day(day)],
                )
                .map_err(storage_error)?,
        };

        if deleted == 0 {
            return Err(DailysError::NotFound(format!(
                "no {} entry on {}",
                stat_name, target
            )));
        }

        info!("Deleted {} entry on {}", stat_name, target);
        Ok(())
    }
}

fn format_day(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

fn row_to_entry(row: &Row) -> rusqlite::Result<Entry> {
    let raw_date: String = row.get(1)?;
    let day = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let raw_data: String = row.get(3)?;

    Ok(Entry {
        stat_name: row.get(0)?,
        date: EntryDate::Day(day),
        source: row.get(2)?,
        data: serde_json::from_str(&raw_data).map_err(json_error)?,
    })
}

fn row_to_static_entry(row: &Row) -> rusqlite::Result<Entry> {
    let raw_data: String = row.get(2)?;

    Ok(Entry {
        stat_name: row.get(0)?,
        date: EntryDate::Static,
        source: row.get(1)?,
        data: serde_json::from_str(&raw_data).map_err(json_error)?,
    })
}

fn json_error(err: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
}

fn storage_error(err: rusqlite::Error) -> DailysError {
    DailysError::Storage(err.to_string())
}
