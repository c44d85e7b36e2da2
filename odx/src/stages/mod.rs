//! Stage reconstruction from fare collection transactions.
//!
//! This module turns a time-ordered tap feed into trip stages:
//!
//! 1. each tap is assigned a service day ([`service_day`])
//! 2. taps are grouped by card and service day ([`group_transactions`])
//! 3. each group is walked once by the [`StageBuilder`], pairing metro
//!    entries with the exit that immediately follows them

mod builder;
mod config;
mod day;
mod group;
mod stage;


pub use builder::{BuildError, BuildOutput, BuildStats, StageBuilder, StageGroups};
pub use config::{InvalidCutoff, StageConfig};
pub use day::service_day;
pub use group::{CardDays, TransactionGroups, group_transactions, total_len};
pub use stage::{BusStage, Endpoint, MetroStage, Stage, StageError};
