//! Grid navigation: heading arithmetic and route construction.
//!
//! Everything here is pure. Physical execution lives in [`crate::motion`];
//! the mutable heading is owned by the mission sequencer.

pub mod heading;
pub mod route;

pub use heading::{desired_heading, plan_turn};
pub use route::{Route, RouteEdge, WideArcManeuver};
