//! Loading reference tables from processed JSON files.
//!
//! Stops file:
//!
//! ```json
//! [{"stop_id": 1, "stop_name": "Cais do Sodré", "stop_lat": 38.706, "stop_lon": -9.145}]
//! ```
//!
//! Routes file:
//!
//! ```json
//! [{"route_id": "728", "route_direction": "ASC", "route_variant": 0, "route_stop_ids": [1, 2]}]
//! ```

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::domain::{Mode, Route, RouteDirection, RouteKey, Stop, StopId};

use super::error::ScheduleError;
use super::lookup::{Schedule, ScheduleBuilder};

/// Stop record as stored in a processed stops file.
#[derive(Debug, Clone, Deserialize)]
pub struct StopRecord {
    pub stop_id: u32,
    pub stop_name: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

/// Route record as stored in the processed routes file.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRecord {
    pub route_id: String,
    pub route_direction: RouteDirection,
    pub route_variant: u32,
    pub route_stop_ids: Vec<u32>,
}

impl TryFrom<StopRecord> for Stop {
    type Error = ScheduleError;

    fn try_from(record: StopRecord) -> Result<Self, Self::Error> {
        Ok(Stop::new(
            StopId(record.stop_id),
            record.stop_name,
            record.stop_lat,
            record.stop_lon,
        )?)
    }
}

impl From<RouteRecord> for Route {
    fn from(record: RouteRecord) -> Self {
        Route::new(
            RouteKey::new(record.route_id, record.route_direction, record.route_variant),
            record.route_stop_ids.into_iter().map(StopId).collect(),
        )
    }
}

impl Schedule {
    /// Load the bus stops, metro stops and bus routes files.
    pub fn load(
        bus_stops: impl AsRef<Path>,
        metro_stops: impl AsRef<Path>,
        routes: impl AsRef<Path>,
    ) -> Result<Self, ScheduleError> {
        let bus: Vec<StopRecord> = read_json(bus_stops.as_ref())?;
        let metro: Vec<StopRecord> = read_json(metro_stops.as_ref())?;
        let routes: Vec<RouteRecord> = read_json(routes.as_ref())?;

        let schedule = Self::from_records(bus, metro, routes)?;
        info!(
            bus_stops = schedule.stop_count(Mode::Bus),
            metro_stops = schedule.stop_count(Mode::Metro),
            routes = schedule.route_count(),
            "Loaded schedule"
        );
        Ok(schedule)
    }

    /// Build a schedule from already-deserialized records.
    pub fn from_records(
        bus_stops: Vec<StopRecord>,
        metro_stops: Vec<StopRecord>,
        routes: Vec<RouteRecord>,
    ) -> Result<Self, ScheduleError> {
        let mut builder = ScheduleBuilder::new();
        for record in bus_stops {
            builder = builder.stop(Mode::Bus, record.try_into()?)?;
        }
        for record in metro_stops {
            builder = builder.stop(Mode::Metro, record.try_into()?)?;
        }
        for record in routes {
            builder = builder.route(record.into())?;
        }
        Ok(builder.build())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScheduleError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|e| ScheduleError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
