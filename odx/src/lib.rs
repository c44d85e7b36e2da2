//! Trip stage reconstruction from fare collection data.
//!
//! Turns raw bus and metro card taps into trip stages (one bus boarding,
//! or one metro entry/exit pair) grouped by card and service day, ready
//! for origin-destination analysis.

pub mod cli;
pub mod domain;
pub mod feed;
pub mod output;
pub mod schedule;
pub mod stages;
