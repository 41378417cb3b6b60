//! Open-loop motion: calibrated, duration-based turns and drives.

pub mod drive;

pub use drive::{DriveKind, TimedDrive};
