//! Fare collection transactions (individual card taps).

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{CardId, RouteKey, StopId};

/// Error returned when parsing an unknown transport mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mode {0:?}: expected \"bus\" or \"metro\"")]
pub struct InvalidMode(String);

/// Error returned when parsing an unknown metro tap direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid way {0:?}: expected IN/OUT (or E/S)")]
pub struct InvalidWay(String);

/// Transport mode of a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Bus,
    Metro,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Bus => "bus",
            Mode::Metro => "metro",
        }
    }
}

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bus" => Ok(Mode::Bus),
            "metro" => Ok(Mode::Metro),
            _ => Err(InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a metro gate tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Way {
    In,
    Out,
}

impl Way {
    pub fn as_str(&self) -> &'static str {
        match self {
            Way::In => "IN",
            Way::Out => "OUT",
        }
    }
}

impl FromStr for Way {
    type Err = InvalidWay;

    /// Accepts `IN`/`OUT` and the raw gate codes `E` (entry) and `S` (exit).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" | "E" => Ok(Way::In),
            "OUT" | "S" => Ok(Way::Out),
            _ => Err(InvalidWay(s.to_string())),
        }
    }
}

impl fmt::Display for Way {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode-specific part of a tap.
///
/// Bus validators only record boardings, together with the boarded route
/// variant. Metro gates record both entries and exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tap {
    Bus { route: RouteKey },
    Metro { way: Way },
}

/// One tap event from the fare collection feed.
///
/// Because the mode-specific fields live in [`Tap`], a transaction can never
/// carry a metro direction on a bus tap or miss the route of a bus boarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub card_id: CardId,
    pub timestamp: NaiveDateTime,
    pub stop_id: StopId,
    pub tap: Tap,
}

impl Transaction {
    /// Create a bus boarding.
    pub fn bus(card_id: CardId, timestamp: NaiveDateTime, stop_id: StopId, route: RouteKey) -> Self {
        Self {
            card_id,
            timestamp,
            stop_id,
            tap: Tap::Bus { route },
        }
    }

    /// Create a metro gate tap.
    pub fn metro(card_id: CardId, timestamp: NaiveDateTime, stop_id: StopId, way: Way) -> Self {
        Self {
            card_id,
            timestamp,
            stop_id,
            tap: Tap::Metro { way },
        }
    }

    pub fn mode(&self) -> Mode {
        match self.tap {
            Tap::Bus { .. } => Mode::Bus,
            Tap::Metro { .. } => Mode::Metro,
        }
    }

    /// Returns the gate direction for metro taps, `None` for bus.
    pub fn way(&self) -> Option<Way> {
        match self.tap {
            Tap::Metro { way } => Some(way),
            Tap::Bus { .. } => None,
        }
    }

    /// Returns the boarded route for bus taps, `None` for metro.
    pub fn route(&self) -> Option<&RouteKey> {
        match &self.tap {
            Tap::Bus { route } => Some(route),
            Tap::Metro { .. } => None,
        }
    }

    /// Returns true for a metro tap in the given direction.
    pub fn is_metro(&self, way: Way) -> bool {
        self.way() == Some(way)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteDirection;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 10, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn card() -> CardId {
        CardId::parse("A1").unwrap()
    }

    #[test]
    fn parse_modes() {
        assert_eq!("bus".parse::<Mode>().unwrap(), Mode::Bus);
        assert_eq!("METRO".parse::<Mode>().unwrap(), Mode::Metro);
        assert!("tram".parse::<Mode>().is_err());
    }

    #[test]
    fn parse_ways() {
        assert_eq!("IN".parse::<Way>().unwrap(), Way::In);
        assert_eq!("out".parse::<Way>().unwrap(), Way::Out);
        assert_eq!("E".parse::<Way>().unwrap(), Way::In);
        assert_eq!("S".parse::<Way>().unwrap(), Way::Out);
        assert!("".parse::<Way>().is_err());
        assert!("X".parse::<Way>().is_err());
    }

    #[test]
    fn bus_transaction_accessors() {
        let route = RouteKey::new("728", RouteDirection::Asc, 0);
        let tx = Transaction::bus(card(), ts(), StopId(7), route.clone());
        assert_eq!(tx.mode(), Mode::Bus);
        assert_eq!(tx.way(), None);
        assert_eq!(tx.route(), Some(&route));
        assert!(!tx.is_metro(Way::In));
    }

    #[test]
    fn metro_transaction_accessors() {
        let tx = Transaction::metro(card(), ts(), StopId(3), Way::Out);
        assert_eq!(tx.mode(), Mode::Metro);
        assert_eq!(tx.way(), Some(Way::Out));
        assert_eq!(tx.route(), None);
        assert!(tx.is_metro(Way::Out));
        assert!(!tx.is_metro(Way::In));
    }

    #[test]
    fn error_display() {
        let err = "tram".parse::<Mode>().unwrap_err();
        assert_eq!(err.to_string(), "invalid mode \"tram\": expected \"bus\" or \"metro\"");
        let err = "X".parse::<Way>().unwrap_err();
        assert_eq!(err.to_string(), "invalid way \"X\": expected IN/OUT (or E/S)");
    }
}
