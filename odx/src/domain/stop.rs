//! Stop identifiers and resolved stop descriptors.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an invalid stop id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop id {input:?}: {reason}")]
pub struct InvalidStopId {
    input: String,
    reason: &'static str,
}

/// A raw stop identifier as it appears in the fare collection feed.
///
/// Bus and metro operators number their stops independently, so a `StopId`
/// is only meaningful together with the [`Mode`](super::Mode) of the tap.
///
/// # Examples
///
/// ```
/// use odx::domain::StopId;
///
/// assert_eq!(StopId::parse("46").unwrap(), StopId(46));
///
/// // Bus validators report "id,suffix"; only the id is kept
/// assert_eq!(StopId::parse("1234,1").unwrap(), StopId(1234));
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("SP").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StopId(pub u32);

impl StopId {
    /// Parse a stop id, keeping only the leading comma-separated component.
    pub fn parse(s: &str) -> Result<Self, InvalidStopId> {
        let head = s.split(',').next().unwrap_or("").trim();
        if head.is_empty() {
            return Err(InvalidStopId {
                input: s.to_string(),
                reason: "must not be empty",
            });
        }
        head.parse::<u32>().map(StopId).map_err(|_| InvalidStopId {
            input: s.to_string(),
            reason: "must be a non-negative integer",
        })
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a stop descriptor has out-of-range coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid stop {id}: {reason}")]
pub struct InvalidStop {
    id: StopId,
    reason: &'static str,
}

/// A resolved stop descriptor from the reference tables.
///
/// Coordinates are WGS84 degrees and are checked at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    id: StopId,
    name: String,
    lat: f64,
    lon: f64,
}

impl Stop {
    /// Create a stop descriptor, validating its coordinates.
    pub fn new(id: StopId, name: impl Into<String>, lat: f64, lon: f64) -> Result<Self, InvalidStop> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidStop {
                id,
                reason: "latitude must be within [-90, 90]",
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidStop {
                id,
                reason: "longitude must be within [-180, 180]",
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            lat,
            lon,
        })
    }

    pub fn id(&self) -> StopId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any u32 rendered as text parses back to itself
        #[test]
        fn numeric_ids_parse(n in any::<u32>()) {
            prop_assert_eq!(StopId::parse(&n.to_string()).unwrap(), StopId(n));
        }

        /// A trailing ",suffix" never changes the parsed id
        #[test]
        fn suffix_is_ignored(n in any::<u32>(), suffix in "[0-9A-Z]{0,4}") {
            let raw = format!("{n},{suffix}");
            prop_assert_eq!(StopId::parse(&raw).unwrap(), StopId(n));
        }
    }
}
