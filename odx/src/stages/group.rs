//! Grouping of transactions by card and service day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{CardId, Transaction};

use super::config::StageConfig;
use super::day::service_day;

/// Items keyed by card, then by service day, in arrival order.
pub type CardDays<T> = BTreeMap<CardId, BTreeMap<NaiveDate, Vec<T>>>;

/// Transactions grouped by `(card_id, service_day)`.
pub type TransactionGroups = CardDays<Transaction>;

/// Split a time-ordered feed into per-card, per-service-day groups.
///
/// Single pass: each transaction is appended to exactly one group, so the
/// relative order within a group is the order of the feed. The feed must
/// already be sorted by timestamp; see [`crate::feed::ensure_sorted`].
pub fn group_transactions<I>(transactions: I, config: &StageConfig) -> TransactionGroups
where
    I: IntoIterator<Item = Transaction>,
{
    let mut groups = TransactionGroups::new();
    for tx in transactions {
        let day = service_day(tx.timestamp, config.day_cutoff);
        groups
            .entry(tx.card_id.clone())
            .or_default()
            .entry(day)
            .or_default()
            .push(tx);
    }
    groups
}

/// Total number of items across all groups.
pub fn total_len<T>(groups: &CardDays<T>) -> usize {
    groups
        .values()
        .flat_map(|days| days.values())
        .map(Vec::len)
        .sum()
}
