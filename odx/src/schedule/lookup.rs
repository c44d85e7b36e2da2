//! The schedule lookup trait and its in-memory implementation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::domain::{Mode, Route, RouteKey, Stop, StopId};

use super::error::ScheduleError;

/// Resolves raw feed identifiers to reference descriptors.
///
/// This abstraction allows the stage builder to be tested with small
/// hand-built tables. Implementations must be read-only: the builder may
/// call them concurrently from several worker threads.
pub trait ScheduleLookup {
    /// Resolve a stop id within the numbering of `mode`.
    fn resolve_stop(&self, mode: Mode, stop: StopId) -> Result<Arc<Stop>, ScheduleError>;

    /// Resolve a bus route variant.
    fn resolve_route(&self, key: &RouteKey) -> Result<Arc<Route>, ScheduleError>;
}

/// In-memory stop and route tables.
///
/// Descriptors are held in `Arc`s so that resolved stages share them
/// instead of copying names and stop lists.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    bus_stops: HashMap<StopId, Arc<Stop>>,
    metro_stops: HashMap<StopId, Arc<Stop>>,
    routes: HashMap<RouteKey, Arc<Route>>,
}

impl Schedule {
    /// Start building a schedule.
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::default()
    }

    /// Number of stops known for `mode`.
    pub fn stop_count(&self, mode: Mode) -> usize {
        self.stops(mode).len()
    }

    /// Number of route variants.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    fn stops(&self, mode: Mode) -> &HashMap<StopId, Arc<Stop>> {
        match mode {
            Mode::Bus => &self.bus_stops,
            Mode::Metro => &self.metro_stops,
        }
    }
}

impl ScheduleLookup for Schedule {
    fn resolve_stop(&self, mode: Mode, stop: StopId) -> Result<Arc<Stop>, ScheduleError> {
        self.stops(mode)
            .get(&stop)
            .cloned()
            .ok_or(ScheduleError::StopNotFound { mode, stop })
    }

    fn resolve_route(&self, key: &RouteKey) -> Result<Arc<Route>, ScheduleError> {
        self.routes
            .get(key)
            .cloned()
            .ok_or_else(|| ScheduleError::RouteNotFound(key.clone()))
    }
}

/// Builder for [`Schedule`].
///
/// Rejects duplicate stop ids (per mode) and duplicate route keys, so a
/// finished schedule has exactly one descriptor per key.
///
/// # Examples
///
/// ```
/// use odx::domain::{Mode, Stop, StopId};
/// use odx::schedule::{Schedule, ScheduleLookup};
///
/// let schedule = Schedule::builder()
///     .stop(Mode::Metro, Stop::new(StopId(46), "Marquês de Pombal", 38.725, -9.150).unwrap())
///     .unwrap()
///     .build();
///
/// let stop = schedule.resolve_stop(Mode::Metro, StopId(46)).unwrap();
/// assert_eq!(stop.name(), "Marquês de Pombal");
///
/// // Bus stops are numbered separately
/// assert!(schedule.resolve_stop(Mode::Bus, StopId(46)).is_err());
/// ```
#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    inner: Schedule,
}

impl ScheduleBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stop descriptor for `mode`.
    pub fn stop(mut self, mode: Mode, stop: Stop) -> Result<Self, ScheduleError> {
        let table = match mode {
            Mode::Bus => &mut self.inner.bus_stops,
            Mode::Metro => &mut self.inner.metro_stops,
        };
        match table.entry(stop.id()) {
            Entry::Occupied(_) => Err(ScheduleError::DuplicateStop {
                mode,
                stop: stop.id(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(stop));
                Ok(self)
            }
        }
    }

    /// Add a route descriptor.
    pub fn route(mut self, route: Route) -> Result<Self, ScheduleError> {
        match self.inner.routes.entry(route.key().clone()) {
            Entry::Occupied(slot) => Err(ScheduleError::DuplicateRoute(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(route));
                Ok(self)
            }
        }
    }

    /// Build the schedule.
    pub fn build(self) -> Schedule {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteDirection;

    fn stop(id: u32, name: &str) -> Stop {
        Stop::new(StopId(id), name, 38.7, -9.1).unwrap()
    }

    fn key(id: &str) -> RouteKey {
        RouteKey::new(id, RouteDirection::Asc, 0)
    }

    fn sample() -> Schedule {
        Schedule::builder()
            .stop(Mode::Bus, stop(7, "Rossio"))
            .unwrap()
            .stop(Mode::Metro, stop(7, "Baixa-Chiado"))
            .unwrap()
            .route(Route::new(key("728"), vec![StopId(7)]))
            .unwrap()
            .build()
    }

    #[test]
    fn stops_are_namespaced_by_mode() {
        let schedule = sample();
        let bus = schedule.resolve_stop(Mode::Bus, StopId(7)).unwrap();
        let metro = schedule.resolve_stop(Mode::Metro, StopId(7)).unwrap();
        assert_eq!(bus.name(), "Rossio");
        assert_eq!(metro.name(), "Baixa-Chiado");
        assert_eq!(schedule.stop_count(Mode::Bus), 1);
        assert_eq!(schedule.stop_count(Mode::Metro), 1);
    }

    #[test]
    fn missing_stop_is_an_error() {
        let schedule = sample();
        let err = schedule.resolve_stop(Mode::Bus, StopId(8)).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::StopNotFound {
                mode: Mode::Bus,
                stop: StopId(8)
            }
        ));
    }

    #[test]
    fn resolves_routes_by_full_key() {
        let schedule = sample();
        assert_eq!(schedule.route_count(), 1);
        assert!(schedule.resolve_route(&key("728")).is_ok());

        let other_variant = RouteKey::new("728", RouteDirection::Asc, 1);
        let err = schedule.resolve_route(&other_variant).unwrap_err();
        assert!(matches!(err, ScheduleError::RouteNotFound(k) if k == other_variant));
    }

    #[test]
    fn resolved_descriptors_are_shared() {
        let schedule = sample();
        let a = schedule.resolve_stop(Mode::Bus, StopId(7)).unwrap();
        let b = schedule.resolve_stop(Mode::Bus, StopId(7)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn duplicate_stop_rejected() {
        let result = Schedule::builder()
            .stop(Mode::Bus, stop(1, "A"))
            .unwrap()
            .stop(Mode::Bus, stop(1, "B"));
        assert!(matches!(
            result,
            Err(ScheduleError::DuplicateStop { mode: Mode::Bus, .. })
        ));
    }

    #[test]
    fn duplicate_route_rejected() {
        let result = Schedule::builder()
            .route(Route::new(key("1"), vec![]))
            .unwrap()
            .route(Route::new(key("1"), vec![StopId(2)]));
        assert!(matches!(result, Err(ScheduleError::DuplicateRoute(_))));
    }
}
