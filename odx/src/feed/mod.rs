//! Fare collection feeds.
//!
//! Reads normalised tap feeds from CSV, or raw operator exports, combines
//! per-mode sources into one time-ordered feed, restricts it to a period,
//! and checks the ordering the stage builder relies on.

mod error;
mod order;
mod raw;
mod reader;
mod record;
mod window;

pub use error::{FeedError, RecordError, StationMapError};
pub use order::{combine, dedup_card_timestamps, ensure_sorted};
pub use raw::{
    StationMap, read_carris, read_carris_from_path, read_metro, read_metro_from_path,
};
pub use reader::{
    FEED_COLUMNS, read_transactions, read_transactions_from_path, write_transactions,
};
pub use record::{FeedRecord, parse_timestamp};
pub use window::{InvalidWindow, TimeWindow};
