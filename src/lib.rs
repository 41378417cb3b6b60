//! Waypoint rover - open-loop waypoint traversal and timed actuation
//!
//! Drives a small wheeled robot through a fixed sequence of grid waypoints.
//! At each waypoint a classification ratio is obtained (by default the share
//! of English in a transcribed utterance) and one of two actuation profiles
//! runs: grasp when the ratio reaches the threshold, decline otherwise.
//!
//! Motion is dead reckoning only. Turns and forward moves are timed drives
//! derived from calibration constants; nothing measures the robot's actual
//! position.
//!
//! ## Features
//!
//! - `hardware` (default): PCA9685 backend on Linux I2C via `i2cdev`.
//!   Without it only the mock device is available.

pub mod actuation;
pub mod calibration;
pub mod classification;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod mission;
pub mod motion;
pub mod navigation;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use mission::{MissionReport, MissionSequencer, NavigationState};
