//! Feed error types.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::domain::{InvalidCardId, InvalidMode, InvalidStopId, InvalidWay};

/// Why a single feed record could not become a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error(transparent)]
    Card(#[from] InvalidCardId),

    #[error(transparent)]
    Stop(#[from] InvalidStopId),

    #[error(transparent)]
    Mode(#[from] InvalidMode),

    /// No mode column and no default mode for the source
    #[error("missing mode")]
    MissingMode,

    #[error(transparent)]
    Way(#[from] InvalidWay),

    /// Metro tap without an IN/OUT flag
    #[error("metro tap without way")]
    MissingWay,

    /// Bus tap without the boarded route
    #[error("bus tap without route_id")]
    MissingRoute,

    /// Bus tap without the route variant
    #[error("bus tap without route_variant")]
    MissingVariant,

    #[error("invalid route variant {0:?}")]
    Variant(String),

    /// Raw metro station code with no entry in the station mapping
    #[error("metro station {0:?} has no stop mapping")]
    UnmappedStation(String),
}

/// Errors from reading, writing or checking a transaction feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The CSV layer failed (I/O, quoting, column count)
    #[error("CSV error at row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    /// A record was read but is not a valid transaction
    #[error("invalid record at row {row}: {source}")]
    Record {
        row: usize,
        #[source]
        source: RecordError,
    },

    /// The feed is not sorted by timestamp
    #[error("feed not sorted at row {row}: {current} follows {previous}")]
    Unsorted {
        row: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    /// Opening a feed file failed
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raw export lacks one of the columns its layout needs
    #[error("column {0:?} not found in header")]
    MissingColumn(&'static str),

    /// The metro station mapping file could not be used
    #[error("invalid station mapping {path}: {source}")]
    StationMap {
        path: PathBuf,
        #[source]
        source: StationMapError,
    },
}

/// Why a metro station mapping could not be built.
#[derive(Debug, thiserror::Error)]
pub enum StationMapError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Mapped values look like "M46": one letter, then the stop number
    #[error("station {code:?} maps to {value:?}, expected a stop code like \"M46\"")]
    Value { code: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::Record {
            row: 3,
            source: RecordError::MissingWay,
        };
        assert_eq!(err.to_string(), "invalid record at row 3: metro tap without way");

        let previous = NaiveDateTime::parse_from_str("2019-10-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let current = NaiveDateTime::parse_from_str("2019-10-10 07:59:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let err = FeedError::Unsorted {
            row: 2,
            previous,
            current,
        };
        assert_eq!(
            err.to_string(),
            "feed not sorted at row 2: 2019-10-10 07:59:00 follows 2019-10-10 08:00:00"
        );

        let err = RecordError::Variant("x".into());
        assert_eq!(err.to_string(), "invalid route variant \"x\"");

        let err = FeedError::MissingColumn("IDParagem");
        assert_eq!(err.to_string(), "column \"IDParagem\" not found in header");
    }
}
