//! Mission sequencing over the waypoint route.

pub mod sequencer;
pub mod state;

pub use sequencer::{MissionReport, MissionSequencer, WaypointVisit};
pub use state::NavigationState;
