//! Mission sequencer
//!
//! Walks the route as a chain of blocking steps:
//!
//! ```text
//! AtWaypoint(0) -> classify -> dispatch
//!   -> edge 0 (turn + forward, or wide arc) -> AtWaypoint(1) -> classify -> dispatch
//!   -> ...
//!   -> AtWaypoint(n-1) -> classify -> dispatch -> stop + release
//! ```
//!
//! Motion and actuation never overlap. A shutdown request is honoured only
//! between steps; a turn or drive already issued always runs to completion.
//! The actuation interface is held in an [`ActuationGuard`], so it is stopped
//! and released on every exit path.

use super::state::NavigationState;
use crate::actuation::{ActuationOutcome, DecisionDispatcher};
use crate::classification::{ClassificationSource, FailurePolicy};
use crate::config::AppConfig;
use crate::core::clock::Clock;
use crate::core::driver::{ActuationGuard, ActuationInterface};
use crate::core::types::{GridPosition, Heading};
use crate::error::{Error, Result};
use crate::motion::TimedDrive;
use crate::navigation::{Route, RouteEdge, plan_turn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What happened at one waypoint
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointVisit {
    pub index: usize,
    pub position: GridPosition,
    /// Heading on arrival
    pub heading: Heading,
    pub ratio: f32,
    /// Ratio was substituted after a classification failure
    pub fallback: bool,
    pub outcome: ActuationOutcome,
}

/// Result of a completed mission
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub visits: Vec<WaypointVisit>,
    pub final_state: NavigationState,
}

impl MissionReport {
    pub fn outcomes(&self) -> Vec<ActuationOutcome> {
        self.visits.iter().map(|v| v.outcome).collect()
    }
}

pub struct MissionSequencer {
    route: Route,
    drive: TimedDrive,
    dispatcher: DecisionDispatcher,
    policy: FailurePolicy,
    shutdown: Arc<AtomicBool>,
}

impl MissionSequencer {
    pub fn new(
        route: Route,
        drive: TimedDrive,
        dispatcher: DecisionDispatcher,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            route,
            drive,
            dispatcher,
            policy,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build every component from configuration.
    ///
    /// Route validation happens here, before any hardware moves.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let route = Route::from_config(&config.route)?;
        let drive = TimedDrive::from_config(config, Arc::clone(&clock));
        let dispatcher = DecisionDispatcher::from_config(config, clock);
        let policy = FailurePolicy::from_config(&config.classification);
        Ok(Self::new(route, drive, dispatcher, policy))
    }

    /// Share a flag that ends the mission at the next step boundary
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Run the full mission.
    ///
    /// Consumes the guard: the device is released explicitly on success and
    /// by the guard's drop on any error.
    pub fn run(
        &self,
        mut guard: ActuationGuard,
        source: &mut dyn ClassificationSource,
    ) -> Result<MissionReport> {
        log::info!(
            "Mission start: {} waypoints, threshold {:.2}",
            self.route.len(),
            self.dispatcher.threshold()
        );

        let mut state = NavigationState::start();
        let mut visits = Vec::with_capacity(self.route.len());
        loop {
            self.check_shutdown()?;
            visits.push(self.visit(state, guard.device(), source)?);

            let Some(edge) = self.route.edges().get(state.index) else {
                break;
            };
            self.check_shutdown()?;
            state = self.traverse(state, edge, guard.device())?;
        }

        guard.release()?;
        log::info!(
            "Mission complete: {} waypoints, final heading {}",
            visits.len(),
            state.heading
        );
        Ok(MissionReport {
            visits,
            final_state: state,
        })
    }

    /// Classify and dispatch at the current waypoint
    fn visit(
        &self,
        state: NavigationState,
        device: &mut dyn ActuationInterface,
        source: &mut dyn ClassificationSource,
    ) -> Result<WaypointVisit> {
        let position = self
            .route
            .position(state.index)
            .ok_or_else(|| Error::InvalidRoute(format!("no waypoint {}", state.index)))?;
        log::info!(
            "Waypoint {}/{} at {} facing {}",
            state.index + 1,
            self.route.len(),
            position,
            state.heading
        );

        let classification = self.policy.classify(source)?;
        let outcome = self.dispatcher.dispatch(classification.ratio, device)?;
        Ok(WaypointVisit {
            index: state.index,
            position,
            heading: state.heading,
            ratio: classification.ratio,
            fallback: classification.fallback,
            outcome,
        })
    }

    /// Move along one edge and return the state at the next waypoint
    fn traverse(
        &self,
        state: NavigationState,
        edge: &RouteEdge,
        device: &mut dyn ActuationInterface,
    ) -> Result<NavigationState> {
        match edge {
            RouteEdge::WideArc(maneuver) => {
                self.drive.wide_arc(device, maneuver)?;
                log::info!("Heading set to {} after wide arc", maneuver.heading_after);
                Ok(state.advance(maneuver.heading_after))
            }
            RouteEdge::NormalStep { target } => {
                let plan = plan_turn(state.heading, *target);
                log::debug!("{} -> {}: {:?}", state.heading, target, plan);
                self.drive.execute_turn(device, plan)?;
                self.drive.drive_forward(device, 1)?;
                Ok(state.advance(plan.apply(state.heading)))
            }
        }
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.shutdown.load(Ordering::SeqCst) {
            log::warn!("Shutdown requested, stopping mission");
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}
