//! Calibration runs
//!
//! Single motions used to measure the constants in `[calibration]` on the
//! real floor: drive N cells and measure the distance, turn once and measure
//! the angle, or sweep the steering servo to find center and full lock.

use crate::core::clock::Clock;
use crate::core::driver::ActuationInterface;
use crate::core::types::Side;
use crate::error::{Error, Result};
use crate::motion::TimedDrive;
use std::time::Duration;

/// Drive forward `cells` cells; returns the commanded drive time
pub fn forward(drive: &TimedDrive, device: &mut dyn ActuationInterface, cells: u32) -> Result<Duration> {
    let duration = drive.calibration().forward_duration(cells);
    log::info!(
        "Calibration: forward {} cell(s) at {:.1}% for {:.2}s; measure the distance travelled",
        cells,
        drive.calibration().drive_speed,
        duration.as_secs_f32()
    );
    drive.drive_forward(device, cells)?;
    Ok(duration)
}

/// One 90° turn; measure the resulting angle
pub fn turn(drive: &TimedDrive, device: &mut dyn ActuationInterface, side: Side) -> Result<()> {
    log::info!("Calibration: 90° {:?} turn; measure the angle turned", side);
    match side {
        Side::Left => drive.turn_left_90(device),
        Side::Right => drive.turn_right_90(device),
    }
}

/// Angles from `start` to `end` inclusive in `step` increments, either
/// direction
pub fn sweep_angles(start: f32, end: f32, step: f32) -> Result<Vec<f32>> {
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "sweep step must be positive, got {}",
            step
        )));
    }
    let direction = if end >= start { 1.0 } else { -1.0 };
    let count = ((end - start).abs() / step).floor() as usize;
    let mut angles: Vec<f32> = (0..=count)
        .map(|i| start + direction * step * i as f32)
        .collect();
    if angles.last().is_some_and(|a| (a - end).abs() > f32::EPSILON) {
        angles.push(end);
    }
    Ok(angles)
}

/// Hold the steering servo at each angle, then return to center
pub fn steer_sweep(
    drive: &TimedDrive,
    device: &mut dyn ActuationInterface,
    clock: &dyn Clock,
    angles: &[f32],
    hold: Duration,
) -> Result<()> {
    for angle in angles {
        log::info!("Calibration: steering at {:.1}°", angle);
        drive.steer_to(device, *angle)?;
        clock.sleep(hold);
    }
    drive.steer_to(device, drive.calibration().steer_center)
}
