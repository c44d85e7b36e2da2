//! Reference data lookup for stops and bus routes.
//!
//! The stage builder resolves every tap against these tables. They are
//! loaded once, before any stage is built, and never mutated afterwards,
//! so a single [`Schedule`] can be shared by reference across threads.

mod error;
mod load;
mod lookup;

pub use error::ScheduleError;
pub use load::{RouteRecord, StopRecord};
pub use lookup::{Schedule, ScheduleBuilder, ScheduleLookup};
