//! Combining feeds and checking their order.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{CardId, Mode, Transaction};

use super::error::FeedError;

/// Concatenate several feeds and sort them by timestamp.
///
/// The sort is stable: taps with equal timestamps keep the order of the
/// feeds they came from, and their order within each feed.
pub fn combine<I>(feeds: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Vec<Transaction>>,
{
    let mut combined: Vec<Transaction> = feeds.into_iter().flatten().collect();
    combined.sort_by_key(|tx| tx.timestamp);
    combined
}

/// Check that a feed is sorted by timestamp (non-decreasing).
///
/// Stage building relies on this order and does not check it itself.
/// The error reports the first offending row (1-based).
pub fn ensure_sorted(transactions: &[Transaction]) -> Result<(), FeedError> {
    match transactions
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(idx) => Err(FeedError::Unsorted {
            row: idx + 2,
            previous: transactions[idx].timestamp,
            current: transactions[idx + 1].timestamp,
        }),
        None => Ok(()),
    }
}

/// Drop taps repeating an earlier `(timestamp, card_id)` pair of the same
/// mode.
///
/// Bus validators sometimes log the same tap twice. The first occurrence is
/// kept. A bus boarding and a metro gate tap in the same second are both
/// kept. Returns the number of taps removed.
pub fn dedup_card_timestamps(transactions: &mut Vec<Transaction>) -> usize {
    let before = transactions.len();
    let mut seen: HashSet<(NaiveDateTime, CardId, Mode)> = HashSet::with_capacity(before);
    transactions.retain(|tx| seen.insert((tx.timestamp, tx.card_id.clone(), tx.mode())));
    let removed = before - transactions.len();
    if removed > 0 {
        debug!(removed, "Dropped duplicate taps");
    }
    removed
}
