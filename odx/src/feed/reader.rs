//! Reading and writing feeds as CSV.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::domain::{Mode, Transaction};

use super::error::FeedError;
use super::record::FeedRecord;

/// Header of a normalised feed, in [`FeedRecord`] field order.
pub const FEED_COLUMNS: [&str; 8] = [
    "timestamp",
    "card_id",
    "mode",
    "stop_id",
    "way",
    "route_id",
    "route_direction",
    "route_variant",
];

/// Read a CSV feed with a header row.
///
/// Rows are numbered from 1 (the first data row) in errors. Any invalid row
/// aborts the read: dropping it silently would skew every stage built from
/// the card's day.
pub fn read_transactions<R: io::Read>(
    reader: R,
    default_mode: Option<Mode>,
) -> Result<Vec<Transaction>, FeedError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut transactions = Vec::new();
    for (idx, result) in rdr.deserialize::<FeedRecord>().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|source| FeedError::Csv { row, source })?;
        let tx = record
            .into_transaction(default_mode)
            .map_err(|source| FeedError::Record { row, source })?;
        transactions.push(tx);
    }
    Ok(transactions)
}

/// Read a CSV feed from a file.
pub fn read_transactions_from_path(
    path: impl AsRef<Path>,
    default_mode: Option<Mode>,
) -> Result<Vec<Transaction>, FeedError> {
    let path = path.as_ref();
    let transactions = read_transactions(open(path)?, default_mode)?;
    info!(path = %path.display(), count = transactions.len(), "Read feed");
    Ok(transactions)
}

pub(super) fn open(path: &Path) -> Result<io::BufReader<File>, FeedError> {
    let file = File::open(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(io::BufReader::new(file))
}

/// Write transactions as a CSV feed with a header row.
///
/// The header is written even when there are no transactions.
pub fn write_transactions<W: io::Write>(
    writer: W,
    transactions: &[Transaction],
) -> Result<(), FeedError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(FEED_COLUMNS)
        .map_err(|source| FeedError::Csv { row: 0, source })?;
    for (idx, tx) in transactions.iter().enumerate() {
        wtr.serialize(FeedRecord::from(tx))
            .map_err(|source| FeedError::Csv {
                row: idx + 1,
                source,
            })?;
    }
    wtr.flush().map_err(|e| FeedError::Csv {
        row: transactions.len(),
        source: e.into(),
    })?;
    Ok(())
}
