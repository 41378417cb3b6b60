//! Actuation profiles and the decision dispatcher.
//!
//! A profile is a fixed sequence of servo moves and holds. The dispatcher
//! picks one of two profiles from a classification ratio and runs it.

pub mod dispatcher;
pub mod profile;

pub use dispatcher::{ActuationOutcome, DecisionDispatcher};
pub use profile::{ActuationProfile, ProfileStep, ServoMove, Smoothing};
