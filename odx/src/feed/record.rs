//! The normalised feed record and its conversion to a transaction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{CardId, Mode, RouteDirection, RouteKey, StopId, Tap, Transaction, Way};

use super::error::RecordError;

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

/// Written timestamps keep fractional seconds; whole seconds print without.
const TIMESTAMP_OUTPUT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One row of a normalised fare collection feed.
///
/// Columns that do not apply to a mode are left empty: `way` for bus, the
/// `route_*` columns for metro. `mode` may be omitted entirely for a
/// single-mode source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedRecord {
    pub timestamp: String,
    pub card_id: String,
    #[serde(default)]
    pub mode: Option<String>,
    pub stop_id: String,
    #[serde(default)]
    pub way: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub route_direction: Option<String>,
    #[serde(default)]
    pub route_variant: Option<String>,
}

impl FeedRecord {
    /// Convert to a validated transaction.
    ///
    /// `default_mode` is used when the record has no mode of its own.
    pub fn into_transaction(self, default_mode: Option<Mode>) -> Result<Transaction, RecordError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        let card_id = CardId::parse(&self.card_id)?;
        let stop_id = StopId::parse(&self.stop_id)?;

        let mode = match non_empty(&self.mode) {
            Some(m) => m.parse::<Mode>()?,
            None => default_mode.ok_or(RecordError::MissingMode)?,
        };

        let tap = match mode {
            Mode::Metro => {
                let way = non_empty(&self.way).ok_or(RecordError::MissingWay)?;
                Tap::Metro {
                    way: way.parse::<Way>()?,
                }
            }
            Mode::Bus => {
                let route_id = non_empty(&self.route_id).ok_or(RecordError::MissingRoute)?;
                let direction =
                    RouteDirection::from_code(non_empty(&self.route_direction).unwrap_or(""));
                let variant =
                    parse_variant(non_empty(&self.route_variant).ok_or(RecordError::MissingVariant)?)?;
                Tap::Bus {
                    route: RouteKey::new(route_id, direction, variant),
                }
            }
        };

        Ok(Transaction {
            card_id,
            timestamp,
            stop_id,
            tap,
        })
    }
}

impl From<&Transaction> for FeedRecord {
    fn from(tx: &Transaction) -> Self {
        let mut record = FeedRecord {
            timestamp: tx.timestamp.format(TIMESTAMP_OUTPUT).to_string(),
            card_id: tx.card_id.to_string(),
            mode: Some(tx.mode().to_string()),
            stop_id: tx.stop_id.to_string(),
            ..FeedRecord::default()
        };
        match &tx.tap {
            Tap::Metro { way } => record.way = Some(way.to_string()),
            Tap::Bus { route } => {
                record.route_id = Some(route.route_id.clone());
                record.route_direction = Some(route.direction.to_string());
                record.route_variant = Some(route.variant.to_string());
            }
        }
        record
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a feed timestamp (`YYYY-MM-DD HH:MM:SS`, optional `T` separator
/// and fractional seconds). Raw operator exports write the date day-first
/// (`DD/MM/YYYY` or `DD-MM-YYYY`).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, RecordError> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| RecordError::Timestamp(s.to_string()))
}

/// Variants are integers, but some exports write them as floats ("1.0").
fn parse_variant(s: &str) -> Result<u32, RecordError> {
    let s = s.trim();
    let digits = s.strip_suffix(".0").unwrap_or(s);
    digits
        .parse::<u32>()
        .map_err(|_| RecordError::Variant(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metro_record(way: Option<&str>) -> FeedRecord {
        FeedRecord {
            timestamp: "2019-10-10 08:30:00".into(),
            card_id: "A1".into(),
            mode: Some("metro".into()),
            stop_id: "3".into(),
            way: way.map(String::from),
            ..FeedRecord::default()
        }
    }

    fn bus_record() -> FeedRecord {
        FeedRecord {
            timestamp: "2019-10-10T08:00:00".into(),
            card_id: "A1".into(),
            mode: Some("bus".into()),
            stop_id: "7,2".into(),
            route_id: Some("728".into()),
            route_direction: Some("A".into()),
            route_variant: Some("1".into()),
            ..FeedRecord::default()
        }
    }

    #[test]
    fn metro_record_converts() {
        let tx = metro_record(Some("S")).into_transaction(None).unwrap();
        assert_eq!(tx.mode(), Mode::Metro);
        assert_eq!(tx.way(), Some(Way::Out));
        assert_eq!(tx.stop_id, StopId(3));
    }

    #[test]
    fn bus_record_converts() {
        let tx = bus_record().into_transaction(None).unwrap();
        assert_eq!(tx.stop_id, StopId(7));
        assert_eq!(
            tx.route(),
            Some(&RouteKey::new("728", RouteDirection::Asc, 1))
        );
    }

    #[test]
    fn metro_without_way_is_rejected() {
        let err = metro_record(None).into_transaction(None).unwrap_err();
        assert_eq!(err, RecordError::MissingWay);
        let err = metro_record(Some("  ")).into_transaction(None).unwrap_err();
        assert_eq!(err, RecordError::MissingWay);
    }

    #[test]
    fn bus_without_route_is_rejected() {
        let mut record = bus_record();
        record.route_id = None;
        assert_eq!(
            record.into_transaction(None).unwrap_err(),
            RecordError::MissingRoute
        );
    }

    #[test]
    fn bus_defaults_missing_direction() {
        let mut record = bus_record();
        record.route_direction = Some(String::new());
        let tx = record.into_transaction(None).unwrap();
        assert_eq!(
            tx.route(),
            Some(&RouteKey::new("728", RouteDirection::Undefined, 1))
        );
    }

    #[test]
    fn bus_without_variant_is_rejected() {
        let mut record = bus_record();
        record.route_variant = None;
        assert_eq!(
            record.clone().into_transaction(None).unwrap_err(),
            RecordError::MissingVariant
        );
        record.route_variant = Some(" ".into());
        assert_eq!(
            record.into_transaction(None).unwrap_err(),
            RecordError::MissingVariant
        );
    }

    #[test]
    fn default_mode_fills_missing_column() {
        let mut record = metro_record(Some("E"));
        record.mode = None;
        assert_eq!(
            record.clone().into_transaction(None).unwrap_err(),
            RecordError::MissingMode
        );
        let tx = record.into_transaction(Some(Mode::Metro)).unwrap();
        assert_eq!(tx.way(), Some(Way::In));
    }

    #[test]
    fn explicit_mode_wins_over_default() {
        let tx = metro_record(Some("IN"))
            .into_transaction(Some(Mode::Bus))
            .unwrap();
        assert_eq!(tx.mode(), Mode::Metro);
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2019-10-05 03:59:59").is_ok());
        assert!(parse_timestamp("2019-10-05T03:59:59").is_ok());
        assert!(parse_timestamp("2019-10-05 03:59:59.250").is_ok());
        assert!(parse_timestamp("05-10-2019 03:59").is_err());

        let expected = parse_timestamp("2019-10-05 03:59:59").unwrap();
        assert_eq!(parse_timestamp("05/10/2019 03:59:59").unwrap(), expected);
        assert_eq!(parse_timestamp("05-10-2019 03:59:59").unwrap(), expected);
    }

    #[test]
    fn variant_accepts_float_rendering() {
        assert_eq!(parse_variant("2.0").unwrap(), 2);
        assert_eq!(parse_variant("12").unwrap(), 12);
        assert!(parse_variant("x").is_err());
    }

    #[test]
    fn transaction_renders_back_to_record() {
        let tx = bus_record().into_transaction(None).unwrap();
        let record = FeedRecord::from(&tx);
        assert_eq!(record.timestamp, "2019-10-10 08:00:00");
        assert_eq!(record.stop_id, "7");
        assert_eq!(record.route_direction.as_deref(), Some("ASC"));
        assert_eq!(record.way, None);
        assert_eq!(record.into_transaction(None).unwrap(), tx);
    }

    #[test]
    fn fractional_seconds_survive_rendering() {
        let mut record = metro_record(Some("IN"));
        record.timestamp = "2019-10-10 08:00:00.750".into();
        let tx = record.into_transaction(None).unwrap();

        let rendered = FeedRecord::from(&tx);
        assert_eq!(rendered.timestamp, "2019-10-10 08:00:00.750");
        assert_eq!(rendered.into_transaction(None).unwrap().timestamp, tx.timestamp);
    }
}
