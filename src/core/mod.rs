//! Core abstractions for actuation hardware.
//!
//! - [`driver::ActuationInterface`]: Trait to implement for new hardware
//! - [`driver::ActuationGuard`]: Scoped ownership that always stops and releases
//! - [`clock::Clock`]: Blocking time source for open-loop durations
//! - [`types`]: Grid positions, headings and turn plans

pub mod clock;
pub mod driver;
pub mod types;

pub use clock::{Clock, SimClock, SystemClock};
pub use driver::{ActuationGuard, ActuationInterface};
pub use types::{GridPosition, Heading, Side, TurnPlan};
