//! Dailys - personal daily stats dashboard
//!
//! Usage:
//!   dailys [--db-path <path>] [--config <path>] <command>
//!
//! Every command prints JSON to stdout. Logs go to stderr and are filtered
//! with RUST_LOG (default: info).

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use dailys_engine::Dashboard;
use dailys_schemas::{DailysConfig, DailysData};
use dailys_store::SqliteStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dailys")]
#[command(about = "Query and summarise daily stat entries")]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, short, global = true)]
    db_path: Option<PathBuf>,

    /// Path to JSON config file (defaults to DAILYS_CONFIG)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Range start: earliest, a named date or YYYY-MM-DD
    #[arg(long, default_value = "earliest")]
    start: String,

    /// Range end: latest, a named date or YYYY-MM-DD
    #[arg(long, default_value = "latest")]
    end: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every stat name in the store
    StatNames,
    /// All entries for a stat, static entry last
    Entries { stat_name: String },
    /// Entry for a stat on one date (latest, static, a named date or YYYY-MM-DD)
    Get { stat_name: String, date: String },
    /// Insert or replace an entry, reading the JSON payload from a file or stdin
    Put {
        stat_name: String,
        date: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete an entry
    Delete { stat_name: String, date: String },
    /// Entries for a stat between two dates
    Range { stat_name: String, start: String, end: String },
    /// Sleep summary with weekday buckets and diaries
    Sleep(RangeArgs),
    /// Per-measurement mood table
    Mood(RangeArgs),
    /// Mood averages by weekday and ISO week
    MoodWeekly(RangeArgs),
    /// Chores board for today
    Chores,
    /// Dream corpus stats
    Dreams(RangeArgs),
    /// Apply an enrichment form (key=value pairs) to one night's dreams
    EnrichDreams {
        date: String,
        #[arg(value_parser = parse_form_field)]
        fields: Vec<(String, String)>,
    },
    /// Known tags and people across all dreams
    DreamVocabulary,
    /// Value counts by date, source and stat
    Totals(RangeArgs),
    /// Furaffinity notifications with day-over-day diffs
    Fa(RangeArgs),
    /// Entries that could be filled in further
    Enrichment(RangeArgs),
    /// Questions and answers, or one question's history
    Questions {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        question: Option<String>,
    },
    /// Whether the user is currently asleep
    SleepStatus,
    /// Configured named dates
    NamedDates,
}

fn parse_form_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("'{}' is not a key=value pair", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_payload(file: Option<PathBuf>) -> Result<DailysData> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading payload from {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    if raw.trim().is_empty() {
        bail!("payload is empty");
    }
    Ok(serde_json::from_str(&raw)?)
}

/// `--db-path`, then `DB_PATH`, then the config file, then `~/.dailys/dailys.db`
fn database_path(cli_path: Option<PathBuf>, config: &DailysConfig) -> Result<PathBuf> {
    if let Some(path) = cli_path {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".dailys").join("dailys.db"))
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("DAILYS_CONFIG").ok().map(PathBuf::from));
    let config = match &config_path {
        Some(path) => DailysConfig::load(path)?,
        None => DailysConfig::default(),
    };

    let db_path = database_path(cli.db_path, &config)?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Database: {}", db_path.display());

    let store = SqliteStore::new(&db_path)?;
    let dashboard = Dashboard::new(&store, &config);
    let now = Local::now().fixed_offset();
    let today = now.date_naive();

    match cli.command {
        Command::StatNames => print_json(&dashboard.stat_names()?),
        Command::Entries { stat_name } => print_json(&dashboard.entries_for_stat(&stat_name)?),
        Command::Get { stat_name, date } => print_json(&dashboard.entries_on_date(&stat_name, &date)?),
        Command::Put {
            stat_name,
            date,
            source,
            file,
        } => {
            let data = read_payload(file)?;
            print_json(&dashboard.put_entry(&stat_name, &date, data, &source)?)
        }
        Command::Delete { stat_name, date } => {
            dashboard.delete_entry(&stat_name, &date)?;
            info!("Deleted {} entry for {}", stat_name, date);
            Ok(())
        }
        Command::Range { stat_name, start, end } => {
            print_json(&dashboard.entries_in_range(&stat_name, &start, &end)?)
        }
        Command::Sleep(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.sleep_summary(start, end)?)
        }
        Command::Mood(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.mood_table(start, end)?)
        }
        Command::MoodWeekly(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.mood_weekly(start, end)?)
        }
        Command::Chores => print_json(&dashboard.chores_board(today)?),
        Command::Dreams(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.dreams_report(start, end)?)
        }
        Command::EnrichDreams { date, fields } => {
            let form: BTreeMap<String, String> = fields.into_iter().collect();
            print_json(&dashboard.enrich_dreams(&date, &form)?)
        }
        Command::DreamVocabulary => print_json(&dashboard.dream_vocabulary()?),
        Command::Totals(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.stat_totals(start, end)?)
        }
        Command::Fa(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.fa_report(start, end)?)
        }
        Command::Enrichment(range) => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            print_json(&dashboard.enrichment_report(start, end)?)
        }
        Command::Questions { range, question } => {
            let (start, end) = dashboard.range(&range.start, &range.end)?;
            match question {
                Some(question) => print_json(&dashboard.question_history(&question, start, end)?),
                None => print_json(&dashboard.questions_report(start, end)?),
            }
        }
        Command::SleepStatus => print_json(&dashboard.sleep_status(now)?),
        Command::NamedDates => print_json(&dashboard.named_dates()),
    }
}
