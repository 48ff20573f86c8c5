//! Report entry points: resolve date tokens, fetch from the store, decode,
//! then aggregate.

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use dailys_schemas::{DailysConfig, DailysData, DailysError, DailysResult, EndDate, Entry, StartDate};
use dailys_store::EntryStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::diary::DiaryLayout;
use crate::models::{
    payload, ChoresStatic, DreamNight, DreamsStatic, FuraffinityData, MoodDay, MoodMeasurement,
    MoodStatic, QuestionsDay, QuestionsStatic, SleepData,
};
use crate::resolver::DateAxisResolver;
use crate::stats::chores::{chores_board, ChoresBoard};
use crate::stats::dreams::{
    dreams_report, enrichment_vocabulary, fill_missing_nights, DreamsReport, EnrichmentVocabulary,
};
use crate::stats::enrichment::{enrichment_report, EnrichmentReport};
use crate::stats::furaffinity::{fa_report, FaReport};
use crate::stats::mood::{mood_table, mood_weekly, MoodRow, MoodWeekly};
use crate::stats::questions::{question_history, questions_report, QuestionHistory, QuestionsReport};
use crate::stats::sleep::{sleep_summary, SleepSummary};
use crate::stats::sleep_status::{sleep_status, SleepStatus};
use crate::stats::totals::{stat_totals, StatTotalsReport};

/// Most recent sleep payloads needed to tell whether the user is asleep.
const SLEEP_STATUS_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedDate {
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodTable {
    pub moods: Vec<String>,
    pub times: Vec<String>,
    pub rows: Vec<MoodRow>,
}

/// Ties a store to the resolver built from the loaded configuration.
pub struct Dashboard<'a> {
    store: &'a dyn EntryStore,
    resolver: DateAxisResolver,
    diary_layout: DiaryLayout,
}

impl<'a> Dashboard<'a> {
    pub fn new(store: &'a dyn EntryStore, config: &DailysConfig) -> Self {
        Self {
            store,
            resolver: DateAxisResolver::new(config),
            diary_layout: DiaryLayout::default(),
        }
    }

    pub fn with_diary_layout(mut self, diary_layout: DiaryLayout) -> Self {
        self.diary_layout = diary_layout;
        self
    }

    pub fn resolver(&self) -> &DateAxisResolver {
        &self.resolver
    }

    /// Resolve a `start`/`end` token pair into range bounds
    pub fn range(&self, start: &str, end: &str) -> DailysResult<(StartDate, EndDate)> {
        Ok((self.resolver.resolve_start(start)?, self.resolver.resolve_end(end)?))
    }

    // ========================================================================
    // Raw entries
    // ========================================================================

    pub fn stat_names(&self) -> DailysResult<BTreeSet<String>> {
        self.store.stat_names()
    }

    pub fn entries_for_stat(&self, stat_name: &str) -> DailysResult<Vec<Entry>> {
        self.store.entries_for_stat(stat_name)
    }

    pub fn entries_on_date(&self, stat_name: &str, date: &str) -> DailysResult<Vec<Entry>> {
        let date = self.resolver.resolve_day(date)?;
        self.store.entries_on_date(stat_name, date)
    }

    pub fn entries_in_range(&self, stat_name: &str, start: &str, end: &str) -> DailysResult<Vec<Entry>> {
        let (start, end) = self.range(start, end)?;
        self.store.entries_for_stat_in_range(stat_name, start, end)
    }

    /// Write a whole payload. `earliest` and `latest` are rejected by the
    /// store with `CantUpdate`.
    pub fn put_entry(&self, stat_name: &str, date: &str, data: DailysData, source: &str) -> DailysResult<Entry> {
        let date = self.resolver.resolve(date)?;
        let entry = self.store.upsert_entry(stat_name, date, data, source)?;
        info!("Stored {} entry for {}", stat_name, entry.date);
        Ok(entry)
    }

    pub fn delete_entry(&self, stat_name: &str, date: &str) -> DailysResult<()> {
        let date = self.resolver.resolve(date)?;
        self.store.delete_entry(stat_name, date)
    }

    pub fn named_dates(&self) -> Vec<NamedDate> {
        self.resolver
            .named_dates()
            .iter()
            .map(|(name, date)| NamedDate {
                name: name.clone(),
                date: *date,
            })
            .collect()
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub fn sleep_summary(&self, start: StartDate, end: EndDate) -> DailysResult<SleepSummary> {
        let sleeps = self.decoded("sleep", start, end, SleepData::from_entry)?;
        info!("Computing sleep summary over {} nights", sleeps.len());
        sleep_summary(&sleeps, &self.diary_layout)
    }

    pub fn sleep_status(&self, now: DateTime<FixedOffset>) -> DailysResult<SleepStatus> {
        let latest = self.store.latest_entries_for_stat("sleep", SLEEP_STATUS_DEPTH)?;
        sleep_status(&latest, now)
    }

    /// Resolved mood measurements, in date then declared slot order.
    pub fn mood_measurements(&self, start: StartDate, end: EndDate) -> DailysResult<Vec<MoodMeasurement>> {
        let mood_static = self.mood_static()?;
        let days = self.decoded("mood", start, end, MoodDay::from_entry)?;

        let sleeps: BTreeMap<NaiveDate, SleepData> = if mood_static.needs_sleep_data() {
            // WakeUpTime on the first day needs the night before
            let sleep_start = match start {
                StartDate::Day(day) => StartDate::Day(day.checked_sub_days(Days::new(1)).unwrap_or(day)),
                StartDate::Earliest => StartDate::Earliest,
            };
            self.decoded("sleep", sleep_start, end, SleepData::from_entry)?
                .into_iter()
                .map(|sleep| (sleep.date, sleep))
                .collect()
        } else {
            BTreeMap::new()
        };

        let mut measurements = Vec::new();
        for day in &days {
            measurements.extend(day.resolved_measurements(&mood_static.times, &sleeps)?);
        }
        debug!("Resolved {} mood measurements over {} days", measurements.len(), days.len());
        Ok(measurements)
    }

    pub fn mood_table(&self, start: StartDate, end: EndDate) -> DailysResult<MoodTable> {
        let mood_static = self.mood_static()?;
        let measurements = self.mood_measurements(start, end)?;
        Ok(MoodTable {
            moods: mood_static.moods,
            times: mood_static.times,
            rows: mood_table(&measurements),
        })
    }

    pub fn mood_weekly(&self, start: StartDate, end: EndDate) -> DailysResult<MoodWeekly> {
        let mood_static = self.mood_static()?;
        let measurements = self.mood_measurements(start, end)?;
        Ok(mood_weekly(&measurements, &mood_static.moods))
    }

    pub fn chores_board(&self, today: NaiveDate) -> DailysResult<ChoresBoard> {
        let chores_static: ChoresStatic = self
            .static_data("chores")?
            .ok_or_else(|| DailysError::MissingField("no static chores entry".to_string()))?;
        let entries = self
            .store
            .entries_for_stat_in_range("chores", StartDate::Earliest, EndDate::Latest)?;
        info!("Building chores board from {} entries", entries.len());
        chores_board(&chores_static, &entries, today)
    }

    /// Dream nights in range, with calendar gaps filled in when the static
    /// dreams entry declares `all_nights_start`.
    pub fn dream_nights(&self, start: StartDate, end: EndDate) -> DailysResult<Vec<DreamNight>> {
        let dreams_static: DreamsStatic = self.static_data("dreams")?.unwrap_or_default();
        let nights = self.decoded("dreams", start, end, DreamNight::from_entry)?;
        Ok(fill_missing_nights(nights, dreams_static.all_nights_start()?))
    }

    pub fn dreams_report(&self, start: StartDate, end: EndDate) -> DailysResult<DreamsReport> {
        let nights = self.dream_nights(start, end)?;
        info!("Computing dream stats over {} nights", nights.len());
        dreams_report(&nights)
    }

    pub fn dream_vocabulary(&self) -> DailysResult<EnrichmentVocabulary> {
        let nights = self.decoded("dreams", StartDate::Earliest, EndDate::Latest, DreamNight::from_entry)?;
        Ok(enrichment_vocabulary(&nights))
    }

    /// Apply an enrichment form to one night's dreams and store the result.
    pub fn enrich_dreams(&self, date: &str, form: &BTreeMap<String, String>) -> DailysResult<Entry> {
        let date = self.resolver.resolve_day(date)?;
        let entry = self
            .store
            .entries_on_date("dreams", date)?
            .into_iter()
            .next()
            .ok_or_else(|| DailysError::NotFound(format!("no dreams entry on {}", date)))?;
        let night = DreamNight::from_entry(&entry)?;
        let data = night.enriched_data(form)?;
        self.store.upsert_entry("dreams", entry.date.into(), data, &entry.source)
    }

    pub fn stat_totals(&self, start: StartDate, end: EndDate) -> DailysResult<StatTotalsReport> {
        let entries = self.store.entries_in_range(start, end)?;
        info!("Totalling {} entries", entries.len());
        stat_totals(&entries)
    }

    pub fn fa_report(&self, start: StartDate, end: EndDate) -> DailysResult<FaReport> {
        let notifications = self.decoded("furaffinity", start, end, FuraffinityData::from_entry)?;
        fa_report(&notifications)
    }

    pub fn enrichment_report(&self, start: StartDate, end: EndDate) -> DailysResult<EnrichmentReport> {
        let entries = self.store.entries_in_range(start, end)?;
        let report = enrichment_report(&entries)?;
        info!(
            "Found {} entries with enrichment suggestions",
            report.suggestions.len()
        );
        Ok(report)
    }

    pub fn questions_report(&self, start: StartDate, end: EndDate) -> DailysResult<QuestionsReport> {
        let questions_static: QuestionsStatic = self.static_data("questions")?.unwrap_or_default();
        let days = self.decoded("questions", start, end, QuestionsDay::from_entry)?;
        Ok(questions_report(&questions_static, &days))
    }

    pub fn question_history(
        &self,
        question_id: &str,
        start: StartDate,
        end: EndDate,
    ) -> DailysResult<QuestionHistory> {
        let questions_static: QuestionsStatic = self.static_data("questions")?.unwrap_or_default();
        let days = self.decoded("questions", start, end, QuestionsDay::from_entry)?;
        Ok(question_history(&questions_static, &days, question_id))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn decoded<T, F>(&self, stat_name: &str, start: StartDate, end: EndDate, decoder: F) -> DailysResult<Vec<T>>
    where
        F: Fn(&Entry) -> DailysResult<T>,
    {
        let entries = self.store.entries_for_stat_in_range(stat_name, start, end)?;
        debug!("Decoding {} {} entries from {} to {}", entries.len(), stat_name, start, end);
        entries.iter().map(decoder).collect()
    }

    fn static_data<T: DeserializeOwned>(&self, stat_name: &str) -> DailysResult<Option<T>> {
        self.store
            .static_entry(stat_name)?
            .map(|entry| payload(&entry))
            .transpose()
    }

    fn mood_static(&self) -> DailysResult<MoodStatic> {
        self.static_data("mood")?
            .ok_or_else(|| DailysError::MissingField("no static mood entry".to_string()))
    }
}
