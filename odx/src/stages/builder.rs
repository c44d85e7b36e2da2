//! The stage builder.
//!
//! Walks each `(card, service day)` group once, in feed order, with one
//! step of lookahead:
//!
//! - a bus tap becomes a bus stage on its own
//! - a metro IN immediately followed by a metro OUT becomes one paired
//!   stage, and the OUT is consumed
//! - any other metro IN or OUT becomes an orphan stage
//!
//! Metro stages that enter and exit at the same stop are dropped.

use std::ops::AddAssign;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{CardId, Mode, Tap, Transaction, Way};
use crate::schedule::ScheduleLookup;

use super::group::{CardDays, TransactionGroups};
use super::stage::{BusStage, MetroStage, Stage, StageError};

/// Stages grouped by `(card_id, service_day)`, in feed order within a group.
pub type StageGroups = CardDays<Stage>;

/// Error from building stages, located in the input.
#[derive(Debug, thiserror::Error)]
#[error("card {card_id} on {day}, transaction {index}: {source}")]
pub struct BuildError {
    pub card_id: CardId,
    pub day: NaiveDate,
    /// Position of the offending transaction within its group.
    pub index: usize,
    #[source]
    pub source: StageError,
}

/// Counters describing what a build did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub transactions: usize,
    pub bus_stages: usize,
    pub paired_metro: usize,
    pub orphan_entries: usize,
    pub orphan_exits: usize,
    pub self_loops_discarded: usize,
    /// Bus stages whose boarding stop is not among the route's stops
    pub off_route_boardings: usize,
}

impl BuildStats {
    /// Number of stages emitted.
    pub fn stages(&self) -> usize {
        self.bus_stages + self.paired_metro + self.orphan_entries + self.orphan_exits
    }
}

impl AddAssign for BuildStats {
    fn add_assign(&mut self, rhs: Self) {
        self.transactions += rhs.transactions;
        self.bus_stages += rhs.bus_stages;
        self.paired_metro += rhs.paired_metro;
        self.orphan_entries += rhs.orphan_entries;
        self.orphan_exits += rhs.orphan_exits;
        self.self_loops_discarded += rhs.self_loops_discarded;
        self.off_route_boardings += rhs.off_route_boardings;
    }
}

/// Result of a full build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub stages: StageGroups,
    pub stats: BuildStats,
}

/// Which rule produced a stage.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Bus,
    Paired,
    OrphanEntry,
    OrphanExit,
}

/// Builds stages from grouped transactions.
///
/// The schedule is injected by reference and only read, so one builder can
/// be shared by several worker threads.
pub struct StageBuilder<'a, L: ?Sized> {
    lookup: &'a L,
}

impl<'a, L: ScheduleLookup + ?Sized> StageBuilder<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Build the stages of one `(card, service day)` group.
    ///
    /// `transactions` must be in feed order.
    pub fn build_group(
        &self,
        card: &CardId,
        day: NaiveDate,
        transactions: &[Transaction],
    ) -> Result<Vec<Stage>, BuildError> {
        let mut stats = BuildStats::default();
        self.walk(card, day, transactions, &mut stats)
    }

    /// Build the stages of every group, one after another.
    pub fn build(&self, groups: &TransactionGroups) -> Result<BuildOutput, BuildError> {
        let mut stages = StageGroups::new();
        let mut stats = BuildStats::default();

        for (card, days) in groups {
            for (day, transactions) in days {
                let built = self.walk(card, *day, transactions, &mut stats)?;
                if !built.is_empty() {
                    stages.entry(card.clone()).or_default().insert(*day, built);
                }
            }
        }

        info!(
            cards = stages.len(),
            transactions = stats.transactions,
            stages = stats.stages(),
            self_loops = stats.self_loops_discarded,
            "Built stages"
        );
        Ok(BuildOutput { stages, stats })
    }

    /// Walk one group, emitting stages in feed order.
    fn walk(
        &self,
        card: &CardId,
        day: NaiveDate,
        transactions: &[Transaction],
        stats: &mut BuildStats,
    ) -> Result<Vec<Stage>, BuildError> {
        let mut stages = Vec::with_capacity(transactions.len());
        let mut i = 0;

        while i < transactions.len() {
            let tx = &transactions[i];
            let locate = |index, source| BuildError {
                card_id: card.clone(),
                day,
                index,
                source,
            };

            let (stage, rule, consumed) = match tx.tap {
                Tap::Bus { .. } => {
                    let stage = BusStage::new(tx, self.lookup).map_err(|e| locate(i, e))?;
                    if !stage.route().serves(stage.entry().stop.id()) {
                        debug!(
                            card = %card,
                            %day,
                            index = i,
                            stop = %tx.stop_id,
                            route = %stage.route().key(),
                            "Boarding stop is not on the route"
                        );
                        stats.off_route_boardings += 1;
                    }
                    (Stage::Bus(stage), Rule::Bus, 1)
                }
                Tap::Metro { way: Way::In } => {
                    let exit = transactions
                        .get(i + 1)
                        .filter(|next| next.is_metro(Way::Out));
                    let stage = MetroStage::new(Some(tx), exit, self.lookup).map_err(|e| {
                        // A failed exit lookup is reported at the exit tap.
                        let entry_ok = self.lookup.resolve_stop(Mode::Metro, tx.stop_id).is_ok();
                        let index = if exit.is_some() && entry_ok { i + 1 } else { i };
                        locate(index, e)
                    })?;
                    match exit {
                        Some(_) => (Stage::Metro(stage), Rule::Paired, 2),
                        None => (Stage::Metro(stage), Rule::OrphanEntry, 1),
                    }
                }
                Tap::Metro { way: Way::Out } => {
                    let stage =
                        MetroStage::new(None, Some(tx), self.lookup).map_err(|e| locate(i, e))?;
                    (Stage::Metro(stage), Rule::OrphanExit, 1)
                }
            };
            i += consumed;

            if let Stage::Metro(metro) = &stage {
                if metro.is_self_loop() {
                    debug!(card = %card, %day, index = i - consumed, "Discarding self-loop metro stage");
                    stats.self_loops_discarded += 1;
                    continue;
                }
            }

            match rule {
                Rule::Bus => stats.bus_stages += 1,
                Rule::Paired => stats.paired_metro += 1,
                Rule::OrphanEntry => stats.orphan_entries += 1,
                Rule::OrphanExit => stats.orphan_exits += 1,
            }
            stages.push(stage);
        }

        stats.transactions += transactions.len();
        Ok(stages)
    }
}

impl<'a, L: ScheduleLookup + Sync + ?Sized> StageBuilder<'a, L> {
    /// Build the stages of every group on the rayon thread pool.
    ///
    /// Groups are independent, so the result equals that of [`build`].
    /// If several groups fail, which error is returned is unspecified.
    ///
    /// [`build`]: StageBuilder::build
    pub fn build_parallel(&self, groups: &TransactionGroups) -> Result<BuildOutput, BuildError> {
        let jobs: Vec<(&CardId, NaiveDate, &[Transaction])> = groups
            .iter()
            .flat_map(|(card, days)| {
                days.iter()
                    .map(move |(day, transactions)| (card, *day, transactions.as_slice()))
            })
            .collect();

        let built = jobs
            .into_par_iter()
            .map(|(card, day, transactions)| -> Result<_, BuildError> {
                let mut stats = BuildStats::default();
                let stages = self.walk(card, day, transactions, &mut stats)?;
                Ok((card, day, stages, stats))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut stages = StageGroups::new();
        let mut stats = BuildStats::default();
        for (card, day, group, group_stats) in built {
            stats += group_stats;
            if !group.is_empty() {
                stages.entry(card.clone()).or_default().insert(day, group);
            }
        }

        info!(
            cards = stages.len(),
            transactions = stats.transactions,
            stages = stats.stages(),
            self_loops = stats.self_loops_discarded,
            "Built stages in parallel"
        );
        Ok(BuildOutput { stages, stats })
    }
}
