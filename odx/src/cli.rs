//! Command-line interface.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::domain::{Mode, Transaction};
use crate::feed::{self, FeedError, InvalidWindow, StationMap, TimeWindow};
use crate::output;
use crate::schedule::{Schedule, ScheduleError};
use crate::stages::{BuildError, StageBuilder, StageConfig, group_transactions, total_len};

#[derive(Parser, Debug)]
#[command(name = "odx")]
#[command(about = "Reconstruct trip stages from fare collection taps", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build stages from one or more tap feeds
    Stages {
        #[command(flatten)]
        feed: FeedArgs,

        /// Processed bus stops file (JSON)
        #[arg(long)]
        bus_stops: PathBuf,

        /// Processed metro stops file (JSON)
        #[arg(long)]
        metro_stops: PathBuf,

        /// Processed bus routes file (JSON)
        #[arg(long)]
        routes: PathBuf,

        /// Time of day at which a new service day starts
        #[arg(long, env = "ODX_DAY_CUTOFF", default_value = "04:00:00", value_parser = StageConfig::parse_cutoff)]
        cutoff: NaiveTime,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build card-day groups on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Combine tap feeds into one time-ordered CSV feed
    Combine {
        #[command(flatten)]
        feed: FeedArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by every command that reads feeds.
#[derive(Args, Debug, Clone)]
pub struct FeedArgs {
    /// Tap feed files (CSV with a header row)
    #[arg(required_unless_present_any = ["carris", "metro_raw"])]
    pub afc: Vec<PathBuf>,

    /// Raw Carris bus exports (semicolon-separated)
    #[arg(long)]
    pub carris: Vec<PathBuf>,

    /// Raw metro exports (semicolon-separated, station codes)
    #[arg(long, requires = "metro_stop_mapping")]
    pub metro_raw: Vec<PathBuf>,

    /// Mapping from raw metro station codes to stop codes (JSON)
    #[arg(long)]
    pub metro_stop_mapping: Option<PathBuf>,

    /// Mode of feeds that have no mode column
    #[arg(long, value_enum)]
    pub default_mode: Option<ModeArg>,

    /// First day to keep (YYYY-MM-DD or DD-MM-YYYY)
    #[arg(long, value_parser = parse_date, requires = "end_date")]
    pub start_date: Option<NaiveDate>,

    /// Last day to keep (YYYY-MM-DD or DD-MM-YYYY)
    #[arg(long, value_parser = parse_date, requires = "start_date")]
    pub end_date: Option<NaiveDate>,

    /// Time on the first day from which to keep taps (HH:MM:SS)
    #[arg(long, value_parser = parse_time, requires_all = ["start_date", "end_time"])]
    pub start_time: Option<NaiveTime>,

    /// Time on the last day until which to keep taps (HH:MM:SS)
    #[arg(long, value_parser = parse_time, requires_all = ["end_date", "start_time"])]
    pub end_time: Option<NaiveTime>,

    /// Drop taps repeating an earlier (timestamp, card) pair within a feed
    #[arg(long)]
    pub dedup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Bus,
    Metro,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Bus => Mode::Bus,
            ModeArg::Metro => Mode::Metro,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON keyed by card id and service day
    Json,
    /// One line per stage
    Text,
}

/// Errors surfaced by the command-line tool.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Window(#[from] InvalidWindow),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("raw metro exports need a station mapping (--metro-stop-mapping)")]
    MissingStationMap,
}

impl FeedArgs {
    /// The period to keep, if one was requested.
    pub fn window(&self) -> Result<Option<TimeWindow>, InvalidWindow> {
        let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date) else {
            return Ok(None);
        };
        let window = match (self.start_time, self.end_time) {
            (Some(start_time), Some(end_time)) => {
                TimeWindow::between(start_date, start_time, end_date, end_time)?
            }
            _ => TimeWindow::days(start_date, end_date)?,
        };
        Ok(Some(window))
    }

    /// Read, combine and filter the feeds into one time-ordered feed.
    ///
    /// Duplicates are dropped per feed, before feeds are merged. A single
    /// normalised feed must already be sorted; raw exports are always sorted.
    pub fn load(&self) -> Result<Vec<Transaction>, AppError> {
        let default_mode = self.default_mode.map(Mode::from);
        let mut feeds = self
            .afc
            .iter()
            .map(|path| feed::read_transactions_from_path(path, default_mode))
            .collect::<Result<Vec<_>, _>>()?;

        let mut raw = self
            .carris
            .iter()
            .map(feed::read_carris_from_path)
            .collect::<Result<Vec<_>, _>>()?;
        if !self.metro_raw.is_empty() {
            let mapping = self
                .metro_stop_mapping
                .as_ref()
                .ok_or(AppError::MissingStationMap)?;
            let stations = StationMap::load(mapping)?;
            for path in &self.metro_raw {
                raw.push(feed::read_metro_from_path(path, &stations)?);
            }
        }

        if self.dedup {
            let removed: usize = feeds
                .iter_mut()
                .chain(raw.iter_mut())
                .map(feed::dedup_card_timestamps)
                .sum();
            info!(removed, "Removed duplicate taps");
        }

        let mut transactions = if feeds.len() == 1 && raw.is_empty() {
            let single = feeds.remove(0);
            feed::ensure_sorted(&single)?;
            single
        } else {
            feed::combine(feeds.into_iter().chain(raw))
        };

        if let Some(window) = self.window()? {
            transactions = window.apply(transactions);
            info!(kept = transactions.len(), ?window, "Applied time window");
        }
        Ok(transactions)
    }
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Stages {
            feed: feed_args,
            bus_stops,
            metro_stops,
            routes,
            cutoff,
            format,
            output: output_path,
            parallel,
        } => {
            let schedule = Schedule::load(&bus_stops, &metro_stops, &routes)?;
            let transactions = feed_args.load()?;

            let config = StageConfig::new(cutoff);
            let groups = group_transactions(transactions, &config);
            info!(
                cards = groups.len(),
                transactions = total_len(&groups),
                cutoff = %config.day_cutoff,
                "Grouped transactions"
            );

            let builder = StageBuilder::new(&schedule);
            let built = if parallel {
                builder.build_parallel(&groups)?
            } else {
                builder.build(&groups)?
            };

            let mut writer = open_output(output_path.as_ref())?;
            match format {
                OutputFormat::Json => output::write_json(&mut writer, &built.stages)?,
                OutputFormat::Text => output::write_text(&mut writer, &built.stages)?,
            }
            writer.flush()?;
            Ok(())
        }
        Commands::Combine {
            feed: feed_args,
            output: output_path,
        } => {
            let transactions = feed_args.load()?;
            let writer = open_output(output_path.as_ref())?;
            feed::write_transactions(writer, &transactions)?;
            info!(count = transactions.len(), "Wrote combined feed");
            Ok(())
        }
    }
}

fn open_output(path: Option<&PathBuf>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

/// Parse a date as `YYYY-MM-DD` or `DD-MM-YYYY`.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .map_err(|_| format!("invalid date {s:?}: expected YYYY-MM-DD or DD-MM-YYYY"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .map_err(|_| format!("invalid time {s:?}: expected HH:MM:SS"))
}
