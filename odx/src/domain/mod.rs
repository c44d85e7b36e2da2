//! Domain types for fare collection analysis.
//!
//! These types represent validated transit data. All types enforce their
//! invariants at construction time, so code that receives them can trust
//! their validity.

mod card;
mod route;
mod stop;
mod transaction;

pub use card::{CardId, InvalidCardId};
pub use route::{Route, RouteDirection, RouteKey};
pub use stop::{InvalidStop, InvalidStopId, Stop, StopId};
pub use transaction::{InvalidMode, InvalidWay, Mode, Tap, Transaction, Way};
