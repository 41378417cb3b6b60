//! Decision dispatcher
//!
//! Maps a classification ratio to one of two actuation profiles. The
//! threshold is inclusive: a ratio exactly equal to it selects grasp.

use super::profile::ActuationProfile;
use crate::config::AppConfig;
use crate::core::clock::Clock;
use crate::core::driver::ActuationInterface;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Which profile ran at a waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationOutcome {
    Grasp,
    Decline,
}

impl fmt::Display for ActuationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuationOutcome::Grasp => f.write_str("grasp"),
            ActuationOutcome::Decline => f.write_str("decline"),
        }
    }
}

pub struct DecisionDispatcher {
    threshold: f32,
    grasp: ActuationProfile,
    decline: ActuationProfile,
    clock: Arc<dyn Clock>,
}

impl DecisionDispatcher {
    pub fn new(
        threshold: f32,
        grasp: ActuationProfile,
        decline: ActuationProfile,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            threshold,
            grasp,
            decline,
            clock,
        }
    }

    /// Build both profiles from the configured channels and angles
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let channels = &config.hardware.channels;
        Self::new(
            config.classification.threshold,
            ActuationProfile::grasp(&config.profiles.grasp, channels),
            ActuationProfile::decline(&config.profiles.decline, channels),
            clock,
        )
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Outcome for a ratio without actuating. NaN declines.
    pub fn select(&self, ratio: f32) -> ActuationOutcome {
        if ratio >= self.threshold {
            ActuationOutcome::Grasp
        } else {
            ActuationOutcome::Decline
        }
    }

    pub fn profile(&self, outcome: ActuationOutcome) -> &ActuationProfile {
        match outcome {
            ActuationOutcome::Grasp => &self.grasp,
            ActuationOutcome::Decline => &self.decline,
        }
    }

    /// Select and run the profile for `ratio`
    pub fn dispatch(
        &self,
        ratio: f32,
        device: &mut dyn ActuationInterface,
    ) -> Result<ActuationOutcome> {
        let outcome = self.select(ratio);
        log::info!(
            "Ratio {:.3} {} threshold {:.3}: {}",
            ratio,
            if outcome == ActuationOutcome::Grasp { ">=" } else { "<" },
            self.threshold,
            outcome
        );
        self.profile(outcome).run(device, self.clock.as_ref())?;
        Ok(outcome)
    }
}
