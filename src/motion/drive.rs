//! Timed-drive actuator
//!
//! Converts turn plans and cell counts into servo and throttle commands held
//! for calibrated durations. This is dead reckoning: nothing measures the
//! resulting displacement, so accuracy depends entirely on the
//! [`CalibrationConstants`] matching the motors, battery and floor. Drift
//! accumulates over the route and is an accepted limitation.
//!
//! Every operation blocks for its full duration and cannot be cancelled once
//! issued.

use crate::config::{AppConfig, CalibrationConstants, secs};
use crate::core::clock::Clock;
use crate::core::driver::ActuationInterface;
use crate::core::types::{Side, TurnPlan};
use crate::error::Result;
use crate::navigation::WideArcManeuver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How the chassis turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveKind {
    /// Steering servo at full lock while every motor drives forward
    #[default]
    Steered,
    /// Left and right motor groups driven in opposite directions
    Skid,
}

/// Timed-drive actuator
pub struct TimedDrive {
    calibration: CalibrationConstants,
    steering_channel: u8,
    /// Chassis side of each drive motor, by motor index
    motor_sides: Vec<Side>,
    clock: Arc<dyn Clock>,
}

impl TimedDrive {
    pub fn new(
        calibration: CalibrationConstants,
        steering_channel: u8,
        motor_sides: Vec<Side>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        log::debug!(
            "TimedDrive: {:?} chassis, {} motors, speed {:.1}%, {:.2}s/cell",
            calibration.drive_kind,
            motor_sides.len(),
            calibration.drive_speed,
            calibration.seconds_per_cell
        );
        Self {
            calibration,
            steering_channel,
            motor_sides,
            clock,
        }
    }

    /// Drive for the configured chassis and wiring
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.calibration.clone(),
            config.hardware.channels.steering,
            config.hardware.motors.iter().map(|m| m.side).collect(),
            clock,
        )
    }

    pub fn calibration(&self) -> &CalibrationConstants {
        &self.calibration
    }

    /// Execute a turn plan; a half turn is two 90° left turns
    pub fn execute_turn(&self, device: &mut dyn ActuationInterface, plan: TurnPlan) -> Result<()> {
        match plan {
            TurnPlan::NoTurn => Ok(()),
            TurnPlan::TurnLeft90 => self.turn_left_90(device),
            TurnPlan::TurnRight90 => self.turn_right_90(device),
            TurnPlan::Turn180AsTwoLefts => {
                self.turn_left_90(device)?;
                self.turn_left_90(device)
            }
        }
    }

    /// 90° left turn
    pub fn turn_left_90(&self, device: &mut dyn ActuationInterface) -> Result<()> {
        let duration = secs(self.calibration.turn_left_secs);
        log::info!("TimedDrive: Turn left 90° ({:.2}s)", duration.as_secs_f32());
        self.turn(device, Side::Left, duration)
    }

    /// 90° right turn
    pub fn turn_right_90(&self, device: &mut dyn ActuationInterface) -> Result<()> {
        let duration = secs(self.calibration.turn_right_secs);
        log::info!("TimedDrive: Turn right 90° ({:.2}s)", duration.as_secs_f32());
        self.turn(device, Side::Right, duration)
    }

    /// Drive straight forward for `cells` grid cells
    pub fn drive_forward(&self, device: &mut dyn ActuationInterface, cells: u32) -> Result<()> {
        let duration = self.calibration.forward_duration(cells);
        log::info!(
            "TimedDrive: Forward {} cell(s) ({:.2}s)",
            cells,
            duration.as_secs_f32()
        );
        if self.calibration.drive_kind == DriveKind::Steered {
            self.steer_to(device, self.calibration.steer_center)?;
        }
        self.drive_all(device, self.calibration.throttle(), duration)
    }

    /// Wide U-turn: full lock arc, stop, re-center, reverse to correct the
    /// overshoot.
    ///
    /// Always uses the steering servo, whatever the drive kind.
    pub fn wide_arc(
        &self,
        device: &mut dyn ActuationInterface,
        maneuver: &WideArcManeuver,
    ) -> Result<()> {
        let arc = &self.calibration.wide_arc;
        let settle = secs(arc.settle_secs);
        let throttle = self.calibration.throttle();
        log::info!(
            "TimedDrive: Wide arc to the {:?} ({:.2}s arc, {:.2}s reverse)",
            maneuver.side,
            arc.arc_secs,
            arc.reverse_secs
        );

        device.set_servo_angle(self.steering_channel, self.lock_angle(maneuver.side))?;
        self.clock.sleep(settle);
        self.drive_all(device, throttle, secs(arc.arc_secs))?;

        self.clock.sleep(settle);
        device.set_servo_angle(self.steering_channel, arc.steer_center)?;
        self.clock.sleep(settle);
        self.drive_all(device, -throttle, secs(arc.reverse_secs))?;

        log::debug!("TimedDrive: Wide arc complete");
        Ok(())
    }

    /// Drive every motor at `throttle` for `duration`, then stop.
    ///
    /// Exposed for calibration runs.
    pub fn drive_all(
        &self,
        device: &mut dyn ActuationInterface,
        throttle: f32,
        duration: Duration,
    ) -> Result<()> {
        for motor in 0..device.motor_count() {
            device.set_motor_throttle(motor, throttle)?;
        }
        self.hold_then_stop(device, duration)
    }

    /// Move the steering servo and wait for it to settle
    pub fn steer_to(&self, device: &mut dyn ActuationInterface, angle: f32) -> Result<()> {
        device.set_servo_angle(self.steering_channel, angle)?;
        self.clock.sleep(secs(self.calibration.steer_settle_secs));
        Ok(())
    }

    fn turn(&self, device: &mut dyn ActuationInterface, side: Side, duration: Duration) -> Result<()> {
        let throttle = self.calibration.throttle();
        match self.calibration.drive_kind {
            DriveKind::Steered => {
                self.steer_to(device, self.lock_angle(side))?;
                self.drive_all(device, throttle, duration)?;
                self.steer_to(device, self.calibration.steer_center)
            }
            DriveKind::Skid => {
                for motor in 0..device.motor_count() {
                    let sign = match (side, self.motor_side(motor)) {
                        // Inside wheels run backwards
                        (Side::Left, Side::Left) | (Side::Right, Side::Right) => -1.0,
                        _ => 1.0,
                    };
                    device.set_motor_throttle(motor, sign * throttle)?;
                }
                self.hold_then_stop(device, duration)
            }
        }
    }

    fn hold_then_stop(&self, device: &mut dyn ActuationInterface, duration: Duration) -> Result<()> {
        self.clock.sleep(duration);
        device.stop_all()?;
        self.clock.sleep(secs(self.calibration.stop_pause_secs));
        Ok(())
    }

    fn lock_angle(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.calibration.steer_left,
            Side::Right => self.calibration.steer_right,
        }
    }

    fn motor_side(&self, motor: usize) -> Side {
        self.motor_sides.get(motor).copied().unwrap_or(Side::Left)
    }
}
