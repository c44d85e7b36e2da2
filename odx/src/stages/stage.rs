//! Stage variants.
//!
//! A stage is one reconstructed movement: a bus boarding, or a metro trip
//! built from an entry tap and/or an exit tap. Stages are built once from
//! resolved reference data and never modified.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::domain::{Mode, Route, Stop, Tap, Transaction, Way};
use crate::schedule::{ScheduleError, ScheduleLookup};

/// Errors from building a single stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Reference data is missing for a tap
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The taps cannot form a stage of this kind
    #[error("invalid stage: {0}")]
    InvalidStage(&'static str),
}

/// One end of a stage: when and where the card was tapped.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub ts: NaiveDateTime,
    pub stop: Arc<Stop>,
}

/// A bus boarding.
///
/// The feed only records boardings, so a bus stage never has an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct BusStage {
    entry: Endpoint,
    route: Arc<Route>,
}

impl BusStage {
    /// Build a bus stage from a boarding tap.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the tap is not a bus tap, or if its stop or route
    /// is missing from the schedule.
    pub fn new<L: ScheduleLookup + ?Sized>(
        boarding: &Transaction,
        lookup: &L,
    ) -> Result<Self, StageError> {
        let Tap::Bus { route } = &boarding.tap else {
            return Err(StageError::InvalidStage("bus stage needs a bus tap"));
        };
        let stop = lookup.resolve_stop(Mode::Bus, boarding.stop_id)?;
        let route = lookup.resolve_route(route)?;
        Ok(Self {
            entry: Endpoint {
                ts: boarding.timestamp,
                stop,
            },
            route,
        })
    }

    pub fn entry(&self) -> &Endpoint {
        &self.entry
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }
}

/// A metro trip between an entry gate and an exit gate.
///
/// # Invariants
///
/// - At least one of `entry` and `exit` is present
/// - `entry` comes from an IN tap and `exit` from an OUT tap
/// - Both taps belong to the same card
#[derive(Debug, Clone, PartialEq)]
pub struct MetroStage {
    entry: Option<Endpoint>,
    exit: Option<Endpoint>,
}

impl MetroStage {
    /// Build a metro stage from an entry tap, an exit tap, or both.
    ///
    /// A missing half yields an orphan stage.
    ///
    /// # Errors
    ///
    /// Returns `Err` if both halves are missing, if a half has the wrong
    /// direction, if the halves come from different cards, or if a stop is
    /// missing from the schedule.
    pub fn new<L: ScheduleLookup + ?Sized>(
        entry: Option<&Transaction>,
        exit: Option<&Transaction>,
        lookup: &L,
    ) -> Result<Self, StageError> {
        if entry.is_none() && exit.is_none() {
            return Err(StageError::InvalidStage(
                "metro stage needs an entry or an exit",
            ));
        }
        if entry.is_some_and(|tx| !tx.is_metro(Way::In)) {
            return Err(StageError::InvalidStage("metro entry must be an IN tap"));
        }
        if exit.is_some_and(|tx| !tx.is_metro(Way::Out)) {
            return Err(StageError::InvalidStage("metro exit must be an OUT tap"));
        }
        if let (Some(a), Some(b)) = (entry, exit) {
            if a.card_id != b.card_id {
                return Err(StageError::InvalidStage(
                    "entry and exit taps belong to different cards",
                ));
            }
        }

        let endpoint = |tx: &Transaction| -> Result<Endpoint, StageError> {
            Ok(Endpoint {
                ts: tx.timestamp,
                stop: lookup.resolve_stop(Mode::Metro, tx.stop_id)?,
            })
        };

        Ok(Self {
            entry: entry.map(&endpoint).transpose()?,
            exit: exit.map(&endpoint).transpose()?,
        })
    }

    pub fn entry(&self) -> Option<&Endpoint> {
        self.entry.as_ref()
    }

    pub fn exit(&self) -> Option<&Endpoint> {
        self.exit.as_ref()
    }

    /// Returns true if the stage enters and exits at the same stop.
    ///
    /// Such a stage carries no movement and is never emitted.
    pub fn is_self_loop(&self) -> bool {
        self.entry.as_ref().map(|e| e.stop.id()) == self.exit.as_ref().map(|e| e.stop.id())
    }
}

/// A reconstructed stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Bus(BusStage),
    Metro(MetroStage),
}

impl Stage {
    pub fn mode(&self) -> Mode {
        match self {
            Stage::Bus(_) => Mode::Bus,
            Stage::Metro(_) => Mode::Metro,
        }
    }

    pub fn entry_ts(&self) -> Option<NaiveDateTime> {
        self.entry().map(|e| e.ts)
    }

    pub fn entry_stop(&self) -> Option<&Stop> {
        self.entry().map(|e| e.stop.as_ref())
    }

    pub fn exit_ts(&self) -> Option<NaiveDateTime> {
        self.exit().map(|e| e.ts)
    }

    pub fn exit_stop(&self) -> Option<&Stop> {
        self.exit().map(|e| e.stop.as_ref())
    }

    /// The boarded route, for bus stages.
    pub fn route(&self) -> Option<&Route> {
        match self {
            Stage::Bus(bus) => Some(bus.route().as_ref()),
            Stage::Metro(_) => None,
        }
    }

    fn entry(&self) -> Option<&Endpoint> {
        match self {
            Stage::Bus(bus) => Some(bus.entry()),
            Stage::Metro(metro) => metro.entry(),
        }
    }

    fn exit(&self) -> Option<&Endpoint> {
        match self {
            Stage::Bus(_) => None,
            Stage::Metro(metro) => metro.exit(),
        }
    }
}

impl From<BusStage> for Stage {
    fn from(stage: BusStage) -> Self {
        Stage::Bus(stage)
    }
}

impl From<MetroStage> for Stage {
    fn from(stage: MetroStage) -> Self {
        Stage::Metro(stage)
    }
}

/// Flat JSON shape shared by both variants.
#[derive(Serialize)]
struct StageView<'a> {
    mode: Mode,
    entry_ts: Option<NaiveDateTime>,
    entry_stop: Option<&'a Stop>,
    exit_ts: Option<NaiveDateTime>,
    exit_stop: Option<&'a Stop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<&'a Route>,
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StageView {
            mode: self.mode(),
            entry_ts: self.entry_ts(),
            entry_stop: self.entry_stop(),
            exit_ts: self.exit_ts(),
            exit_stop: self.exit_stop(),
            route: self.route(),
        }
        .serialize(serializer)
    }
}

struct OrDash<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrDash<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("-"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] ({}) -> [{}] ({})",
            self.mode().as_str().to_uppercase(),
            OrDash(self.entry_ts()),
            OrDash(self.entry_stop()),
            OrDash(self.exit_ts()),
            OrDash(self.exit_stop()),
        )?;
        if let Some(route) = self.route() {
            write!(f, " [{}]", route.key())?;
        }
        Ok(())
    }
}
