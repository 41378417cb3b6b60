//! Actuation profiles
//!
//! Two profiles exist on the robot:
//!
//! - **grasp**: arms to home, extend both joints, open the gripper, hold,
//!   close, return home
//! - **decline**: swing the head yaw servo between two bounds a fixed number
//!   of times and return to center
//!
//! Both are deterministic, time-bounded and never mutated after
//! construction. A step may carry [`Smoothing`], which splits a large angle
//! change into fixed increments separated by a short delay.

use crate::config::{ChannelConfig, DeclineProfileConfig, GraspProfileConfig, secs};
use crate::core::clock::Clock;
use crate::core::driver::ActuationInterface;
use crate::error::Result;
use std::collections::HashMap;
use std::time::Duration;

/// Target angle for one servo channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoMove {
    pub channel: u8,
    pub angle: f32,
}

impl ServoMove {
    pub fn new(channel: u8, angle: f32) -> Self {
        Self { channel, angle }
    }
}

/// Stepwise interpolation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    /// Increment per tick; zero or negative jumps directly
    pub step_degrees: f32,
    pub step_delay: Duration,
}

/// Servo moves issued together, then held
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStep {
    pub moves: Vec<ServoMove>,
    pub hold: Duration,
    pub smoothing: Option<Smoothing>,
}

impl ProfileStep {
    fn jump(moves: Vec<ServoMove>, hold: Duration) -> Self {
        Self {
            moves,
            hold,
            smoothing: None,
        }
    }
}

/// Named, immutable sequence of servo steps
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationProfile {
    name: String,
    steps: Vec<ProfileStep>,
}

impl ActuationProfile {
    pub fn new(name: &str, steps: Vec<ProfileStep>) -> Self {
        Self {
            name: name.to_string(),
            steps,
        }
    }

    /// Arm extend and gripper cycle
    pub fn grasp(config: &GraspProfileConfig, channels: &ChannelConfig) -> Self {
        let arms = |a1: f32, a2: f32| {
            vec![
                ServoMove::new(channels.arm_joint1, a1),
                ServoMove::new(channels.arm_joint2, a2),
            ]
        };
        let smoothing = config.smoothing.map(|s| Smoothing {
            step_degrees: s.step_degrees,
            step_delay: secs(s.step_delay_secs),
        });

        Self::new(
            "grasp",
            vec![
                ProfileStep::jump(
                    arms(config.arm1_home, config.arm2_home),
                    secs(config.home_settle_secs),
                ),
                ProfileStep {
                    moves: arms(config.arm1_extend, config.arm2_extend),
                    hold: secs(config.extend_hold_secs),
                    smoothing,
                },
                ProfileStep::jump(
                    vec![ServoMove::new(channels.gripper, config.gripper_open)],
                    secs(config.open_hold_secs),
                ),
                ProfileStep::jump(
                    vec![ServoMove::new(channels.gripper, config.gripper_close)],
                    secs(config.close_hold_secs),
                ),
                ProfileStep::jump(
                    arms(config.arm1_home, config.arm2_home),
                    secs(config.return_hold_secs),
                ),
            ],
        )
    }

    /// Head yaw oscillation
    pub fn decline(config: &DeclineProfileConfig, channels: &ChannelConfig) -> Self {
        let yaw = |angle: f32, hold: f32| {
            ProfileStep::jump(vec![ServoMove::new(channels.head_yaw, angle)], secs(hold))
        };

        let mut steps = vec![yaw(config.center, config.center_hold_secs)];
        for _ in 0..config.swings {
            steps.push(yaw(config.left, config.swing_hold_secs));
            steps.push(yaw(config.right, config.swing_hold_secs));
        }
        steps.push(yaw(config.center, config.center_hold_secs));
        Self::new("decline", steps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[ProfileStep] {
        &self.steps
    }

    /// Run every step in order, blocking for each hold
    pub fn run(&self, device: &mut dyn ActuationInterface, clock: &dyn Clock) -> Result<()> {
        log::debug!("Profile {}: {} steps", self.name, self.steps.len());
        // Last commanded angle per channel; smoothing starts from here
        let mut commanded: HashMap<u8, f32> = HashMap::new();

        for step in &self.steps {
            match step.smoothing {
                Some(smoothing) if smoothing.step_degrees > 0.0 => {
                    run_smoothed(device, clock, &step.moves, &smoothing, &mut commanded)?;
                }
                _ => {
                    for m in &step.moves {
                        device.set_servo_angle(m.channel, m.angle)?;
                        commanded.insert(m.channel, m.angle);
                    }
                }
            }
            clock.sleep(step.hold);
        }
        Ok(())
    }
}

/// Advance every channel of a step together by `step_degrees` per tick.
///
/// Channels with no known starting angle jump on the first tick.
fn run_smoothed(
    device: &mut dyn ActuationInterface,
    clock: &dyn Clock,
    moves: &[ServoMove],
    smoothing: &Smoothing,
    commanded: &mut HashMap<u8, f32>,
) -> Result<()> {
    let starts: Vec<f32> = moves
        .iter()
        .map(|m| commanded.get(&m.channel).copied().unwrap_or(m.angle))
        .collect();
    let span = moves
        .iter()
        .zip(&starts)
        .map(|(m, start)| (m.angle - start).abs())
        .fold(0.0_f32, f32::max);
    let ticks = (span / smoothing.step_degrees).ceil() as u32;

    for tick in 1..=ticks.max(1) {
        let travel = tick as f32 * smoothing.step_degrees;
        for (m, start) in moves.iter().zip(&starts) {
            let distance = m.angle - start;
            let angle = start + distance.signum() * travel.min(distance.abs());
            device.set_servo_angle(m.channel, angle)?;
        }
        clock.sleep(smoothing.step_delay);
    }

    for m in moves {
        commanded.insert(m.channel, m.angle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmoothingConfig;
    use crate::core::clock::SimClock;
    use crate::devices::mock::{ActuationEvent, MockDevice};

    fn servo_angles(device: &MockDevice, channel: u8) -> Vec<f32> {
        device
            .events()
            .into_iter()
            .filter_map(|e| match e.kind {
                ActuationEvent::Servo { channel: c, angle } if c == channel => Some(angle),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_decline_swings_and_returns_to_center() {
        let channels = ChannelConfig::default();
        let profile = ActuationProfile::decline(&DeclineProfileConfig::default(), &channels);
        let clock = SimClock::instant();
        let mut device = MockDevice::new(2, clock.clone());
        profile.run(&mut device, &clock).unwrap();

        assert_eq!(
            servo_angles(&device, channels.head_yaw),
            vec![115.0, 95.0, 135.0, 95.0, 135.0, 115.0]
        );
        // 0.3 + 4 * 0.5 + 0.3
        assert!((clock.elapsed().as_secs_f32() - 2.6).abs() < 1e-4);
    }

    #[test]
    fn test_grasp_without_smoothing_jumps() {
        let channels = ChannelConfig::default();
        let config = GraspProfileConfig {
            smoothing: None,
            ..Default::default()
        };
        let profile = ActuationProfile::grasp(&config, &channels);
        let clock = SimClock::instant();
        let mut device = MockDevice::new(2, clock.clone());
        profile.run(&mut device, &clock).unwrap();

        assert_eq!(servo_angles(&device, channels.arm_joint1), vec![40.0, 145.0, 40.0]);
        assert_eq!(servo_angles(&device, channels.gripper), vec![85.0, 10.0]);
        assert_eq!(device.servo_angle(channels.arm_joint2), Some(90.0));
    }

    #[test]
    fn test_smoothed_extend_steps_both_joints_together() {
        let channels = ChannelConfig::default();
        let config = GraspProfileConfig {
            arm1_home: 40.0,
            arm2_home: 90.0,
            arm1_extend: 50.0,
            arm2_extend: 85.0,
            smoothing: Some(SmoothingConfig {
                step_degrees: 4.0,
                step_delay_secs: 0.03,
            }),
            ..Default::default()
        };
        let profile = ActuationProfile::grasp(&config, &channels);
        let clock = SimClock::instant();
        let mut device = MockDevice::new(2, clock.clone());
        profile.run(&mut device, &clock).unwrap();

        // 10° span at 4° per tick: 3 ticks, each joint clamped at its target
        let arm1 = servo_angles(&device, channels.arm_joint1);
        let arm2 = servo_angles(&device, channels.arm_joint2);
        assert_eq!(&arm1[..4], &[40.0, 44.0, 48.0, 50.0]);
        assert_eq!(&arm2[..4], &[90.0, 86.0, 85.0, 85.0]);
    }

    #[test]
    fn test_zero_step_smoothing_jumps_directly() {
        let channels = ChannelConfig::default();
        let config = GraspProfileConfig {
            smoothing: Some(SmoothingConfig {
                step_degrees: 0.0,
                step_delay_secs: 0.03,
            }),
            ..Default::default()
        };
        let profile = ActuationProfile::grasp(&config, &channels);
        let clock = SimClock::instant();
        let mut device = MockDevice::new(2, clock.clone());
        profile.run(&mut device, &clock).unwrap();
        assert_eq!(servo_angles(&device, channels.arm_joint1), vec![40.0, 145.0, 40.0]);
    }
}
