//! Schedule lookup error types.

use std::path::PathBuf;

use crate::domain::{InvalidStop, Mode, RouteKey, StopId};

/// Errors from building or querying the reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// No descriptor for a stop id
    #[error("{mode} stop {stop} not found in schedule")]
    StopNotFound { mode: Mode, stop: StopId },

    /// No descriptor for a route key
    #[error("route {0} not found in schedule")]
    RouteNotFound(RouteKey),

    /// The same stop id was added twice for one mode
    #[error("duplicate {mode} stop {stop}")]
    DuplicateStop { mode: Mode, stop: StopId },

    /// The same route key was added twice
    #[error("duplicate route {0}")]
    DuplicateRoute(RouteKey),

    /// A stop record failed validation
    #[error(transparent)]
    InvalidStop(#[from] InvalidStop),

    /// Reading a reference file failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reference file could not be parsed
    #[error("failed to parse {path}: {message}")]
    Json { path: PathBuf, message: String },
}
