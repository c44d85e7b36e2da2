//! Raw operator exports.
//!
//! The bus (Carris) and metro validators export semicolon-separated files
//! with their own Portuguese column names, usually Latin-1 encoded. These
//! readers map them onto [`FeedRecord`] so they go through the same
//! validation as a normalised feed.
//!
//! Metro exports name stations by a code such as `SP1` rather than by stop
//! number. The first two characters select the station, and a mapping file
//! turns the station into its stop code:
//!
//! ```json
//! {"SP": "M46", "BC": "M12"}
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use tracing::info;

use crate::domain::{Mode, StopId, Transaction};

use super::error::{FeedError, RecordError, StationMapError};
use super::reader::open;
use super::record::FeedRecord;

/// Columns of a Carris export: timestamp, card, stop, route, variant, direction.
const CARRIS_COLUMNS: [&str; 6] = [
    "Data/Hora",
    "NºSerie",
    "IDParagem",
    "Carreira",
    "Variante",
    "Sentido",
];

/// Columns of a metro export: date, time, station, card, entry/exit flag.
const METRO_COLUMNS: [&str; 5] = ["FECHA", "HORA", "ESTACAO", "NUM_SER", "E_S"];

/// Maps raw metro station codes to stop ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationMap {
    stations: HashMap<String, StopId>,
}

impl StationMap {
    /// Parse a mapping from station code to stop code (`"SP": "M46"`).
    pub fn from_json(json: &str) -> Result<Self, StationMapError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        let stations = raw
            .into_iter()
            .map(|(code, value)| -> Result<(String, StopId), StationMapError> {
                let id = stop_number(&value).ok_or_else(|| StationMapError::Value {
                    code: code.clone(),
                    value: value.clone(),
                })?;
                Ok((code, id))
            })
            .collect::<Result<_, StationMapError>>()?;
        Ok(Self { stations })
    }

    /// Load a station mapping file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::from_json(&json).map_err(|source| FeedError::StationMap {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), stations = map.len(), "Loaded station mapping");
        Ok(map)
    }

    /// Resolve a raw station code such as `SP1`.
    pub fn resolve(&self, raw: &str) -> Result<StopId, RecordError> {
        let raw = raw.trim();
        let station: String = raw.chars().take(2).collect();
        self.stations
            .get(&station)
            .copied()
            .ok_or_else(|| RecordError::UnmappedStation(raw.to_string()))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// "M46" -> 46
fn stop_number(value: &str) -> Option<StopId> {
    let mut chars = value.trim().chars();
    chars.next().filter(char::is_ascii_alphabetic)?;
    chars.as_str().parse().ok().map(StopId)
}

/// Read a raw Carris bus export.
///
/// Rows are numbered from 1 in errors, as in a normalised feed. Rows
/// without a route variant are rejected.
pub fn read_carris<R: io::Read>(reader: R) -> Result<Vec<Transaction>, FeedError> {
    let mut rdr = raw_reader(reader);
    let [timestamp, card, stop, route, variant, direction] = columns(&mut rdr, CARRIS_COLUMNS)?;

    let mut transactions = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|source| FeedError::Csv { row, source })?;
        let get = |i| field(&record, i);
        let feed_record = FeedRecord {
            timestamp: get(timestamp),
            card_id: get(card),
            mode: Some(Mode::Bus.as_str().to_string()),
            stop_id: get(stop),
            way: None,
            route_id: Some(get(route)),
            route_direction: Some(get(direction)),
            route_variant: Some(get(variant)),
        };
        let tx = feed_record
            .into_transaction(None)
            .map_err(|source| FeedError::Record { row, source })?;
        transactions.push(tx);
    }
    Ok(transactions)
}

/// Read a raw metro export, resolving station codes through `stations`.
///
/// A station code without a mapping aborts the read.
pub fn read_metro<R: io::Read>(
    reader: R,
    stations: &StationMap,
) -> Result<Vec<Transaction>, FeedError> {
    let mut rdr = raw_reader(reader);
    let [date, time, station, card, way] = columns(&mut rdr, METRO_COLUMNS)?;

    let mut transactions = Vec::new();
    for (idx, result) in rdr.byte_records().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|source| FeedError::Csv { row, source })?;
        let get = |i| field(&record, i);
        let stop_id = stations
            .resolve(&get(station))
            .map_err(|source| FeedError::Record { row, source })?;
        let feed_record = FeedRecord {
            timestamp: format!("{} {}", get(date), get(time)),
            card_id: get(card),
            mode: Some(Mode::Metro.as_str().to_string()),
            stop_id: stop_id.to_string(),
            way: Some(get(way)),
            ..FeedRecord::default()
        };
        let tx = feed_record
            .into_transaction(None)
            .map_err(|source| FeedError::Record { row, source })?;
        transactions.push(tx);
    }
    Ok(transactions)
}

/// Read a raw Carris export from a file.
pub fn read_carris_from_path(path: impl AsRef<Path>) -> Result<Vec<Transaction>, FeedError> {
    let path = path.as_ref();
    let transactions = read_carris(open(path)?)?;
    info!(path = %path.display(), count = transactions.len(), "Read Carris export");
    Ok(transactions)
}

/// Read a raw metro export from a file.
pub fn read_metro_from_path(
    path: impl AsRef<Path>,
    stations: &StationMap,
) -> Result<Vec<Transaction>, FeedError> {
    let path = path.as_ref();
    let transactions = read_metro(open(path)?, stations)?;
    info!(path = %path.display(), count = transactions.len(), "Read metro export");
    Ok(transactions)
}

fn raw_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Positions of `names` in the header row.
fn columns<R: io::Read, const N: usize>(
    rdr: &mut csv::Reader<R>,
    names: [&'static str; N],
) -> Result<[usize; N], FeedError> {
    let headers: Vec<Cow<'_, str>> = rdr
        .byte_headers()
        .map_err(|source| FeedError::Csv { row: 0, source })?
        .iter()
        .map(decode)
        .collect();

    let mut indices = [0; N];
    for (slot, name) in indices.iter_mut().zip(names) {
        *slot = headers
            .iter()
            .position(|header| &**header == name)
            .ok_or(FeedError::MissingColumn(name))?;
    }
    Ok(indices)
}

fn field(record: &ByteRecord, i: usize) -> String {
    record.get(i).map(decode).unwrap_or_default().into_owned()
}

/// Exports are Latin-1; files re-saved by other tools may be UTF-8.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RouteDirection, RouteKey, Way};

    fn stations() -> StationMap {
        StationMap::from_json(r#"{"SP": "M46", "BC": "M12"}"#).unwrap()
    }

    #[test]
    fn station_codes_resolve_by_prefix() {
        let map = stations();
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("SP1").unwrap(), StopId(46));
        assert_eq!(map.resolve("BC").unwrap(), StopId(12));
        assert_eq!(
            map.resolve("XX3").unwrap_err(),
            RecordError::UnmappedStation("XX3".into())
        );
    }

    #[test]
    fn station_map_rejects_bad_stop_codes() {
        let err = StationMap::from_json(r#"{"SP": "46"}"#).unwrap_err();
        assert!(matches!(err, StationMapError::Value { .. }));
        let err = StationMap::from_json(r#"{"SP": "Mx"}"#).unwrap_err();
        assert!(matches!(err, StationMapError::Value { .. }));
        assert!(matches!(
            StationMap::from_json("[]").unwrap_err(),
            StationMapError::Json(_)
        ));
    }

    #[test]
    fn station_map_file_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metro_stop_mapping.json");
        std::fs::write(&path, r#"{"SP": 46}"#).unwrap();
        let err = StationMap::load(&path).unwrap_err();
        assert!(matches!(err, FeedError::StationMap { .. }));
        assert!(err.to_string().contains("metro_stop_mapping.json"));
    }

    const CARRIS: &str = "\
Data/Hora;NºSerie;IDParagem;Designação;Carreira;Variante;Sentido;Paragem
2019-10-10 08:00:00;1001;1234,1;Rossio;728;1;A;3
2019-10-10 08:20:00;1001;77;Alameda;15E;0;;1
";

    #[test]
    fn reads_carris_export() {
        let txs = read_carris(CARRIS.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].mode(), Mode::Bus);
        assert_eq!(txs[0].card_id.as_str(), "1001");
        assert_eq!(txs[0].stop_id, StopId(1234));
        assert_eq!(
            txs[0].route(),
            Some(&RouteKey::new("728", RouteDirection::Asc, 1))
        );
        assert_eq!(
            txs[1].route(),
            Some(&RouteKey::new("15E", RouteDirection::Undefined, 0))
        );
    }

    #[test]
    fn reads_latin1_carris_header() {
        let mut bytes = b"Data/Hora;N".to_vec();
        bytes.push(0xBA);
        bytes.extend_from_slice(b"Serie;IDParagem;Carreira;Variante;Sentido\n");
        bytes.extend_from_slice(b"2019-10-10 08:00:00;1001;7;728;0;D\n");
        let txs = read_carris(bytes.as_slice()).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(
            txs[0].route(),
            Some(&RouteKey::new("728", RouteDirection::Desc, 0))
        );
    }

    #[test]
    fn carris_row_without_variant_is_rejected() {
        let csv = "\
Data/Hora;NºSerie;IDParagem;Carreira;Variante;Sentido
2019-10-10 08:00:00;1001;7;728;0;A
2019-10-10 08:05:00;1001;8;728;;A
";
        let err = read_carris(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            FeedError::Record {
                row: 2,
                source: RecordError::MissingVariant
            }
        ));
    }

    #[test]
    fn carris_missing_column_is_named() {
        let csv = "Data/Hora;NºSerie;IDParagem;Carreira;Sentido\n";
        let err = read_carris(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn("Variante")));
    }

    #[test]
    fn reads_metro_export() {
        let csv = "\
FECHA;HORA;ESTACAO;NUM_SER;E_S;EQUIPAMENTO
10/10/2019;08:30:00;SP1;1001;E;4
10/10/2019;08:45:00;BC2;1001;S;9
";
        let txs = read_metro(csv.as_bytes(), &stations()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].stop_id, StopId(46));
        assert_eq!(txs[0].way(), Some(Way::In));
        assert_eq!(txs[1].stop_id, StopId(12));
        assert_eq!(txs[1].way(), Some(Way::Out));
        assert_eq!(
            txs[1].timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2019-10-10 08:45:00"
        );
    }

    #[test]
    fn unmapped_metro_station_aborts() {
        let csv = "\
FECHA;HORA;ESTACAO;NUM_SER;E_S
10/10/2019;08:30:00;SP1;1001;E
10/10/2019;08:45:00;ZZ1;1001;S
";
        let err = read_metro(csv.as_bytes(), &stations()).unwrap_err();
        assert!(matches!(
            err,
            FeedError::Record {
                row: 2,
                source: RecordError::UnmappedStation(ref code)
            } if code == "ZZ1"
        ));
    }
}
