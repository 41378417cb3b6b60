//! Mock actuation device for hardware-free runs
//!
//! Records every servo and throttle command together with the simulated time
//! at which it was issued. The mission, the calibration commands and the
//! tests all run against this device unchanged; only the clock differs.
//!
//! Example configuration (`mock.toml`):
//!
//! ```toml
//! [device]
//! type = "mock"
//! name = "Mock PiCar"
//! speed_factor = 10.0   # 10x faster than hardware, 0 = never block
//! ```
//!
//! Clones share state, so a test can keep a handle while the mission owns
//! the device.

use crate::core::clock::{Clock, SimClock};
use crate::core::driver::ActuationInterface;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One recorded actuation call
#[derive(Debug, Clone, PartialEq)]
pub enum ActuationEvent {
    Servo { channel: u8, angle: f32 },
    Throttle { motor: usize, value: f32 },
    StopAll,
    Release,
}

/// Actuation call stamped with simulated time
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub at: Duration,
    pub kind: ActuationEvent,
}

struct MockState {
    events: Vec<TimedEvent>,
    servos: HashMap<u8, f32>,
    throttles: Vec<f32>,
    released: bool,
    /// Reject servo and throttle commands (bus failure injection)
    failing: bool,
}

/// Mock actuation device
#[derive(Clone)]
pub struct MockDevice {
    name: String,
    clock: SimClock,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    /// Create a mock with `motor_count` drive motors sharing `clock`
    pub fn new(motor_count: usize, clock: SimClock) -> Self {
        Self::with_name("mock", motor_count, clock)
    }

    pub fn with_name(name: &str, motor_count: usize, clock: SimClock) -> Self {
        Self {
            name: name.to_string(),
            clock,
            state: Arc::new(Mutex::new(MockState {
                events: Vec::new(),
                servos: HashMap::new(),
                throttles: vec![0.0; motor_count],
                released: false,
                failing: false,
            })),
        }
    }

    /// All recorded calls, oldest first
    pub fn events(&self) -> Vec<TimedEvent> {
        self.state.lock().events.clone()
    }

    /// Last commanded angle of a servo channel
    pub fn servo_angle(&self, channel: u8) -> Option<f32> {
        self.state.lock().servos.get(&channel).copied()
    }

    /// Current throttle of every motor
    pub fn throttles(&self) -> Vec<f32> {
        self.state.lock().throttles.clone()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }

    /// Make servo and throttle commands fail from now on
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    fn record(&self, state: &mut MockState, kind: ActuationEvent) {
        log::trace!("Mock {}: {:?}", self.name, kind);
        state.events.push(TimedEvent {
            at: self.clock.elapsed(),
            kind,
        });
    }
}

impl ActuationInterface for MockDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_servo_angle(&mut self, channel: u8, angle_degrees: f32) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(Error::Bus(format!("mock servo channel {} rejected", channel)));
        }
        state.servos.insert(channel, angle_degrees);
        self.record(
            &mut state,
            ActuationEvent::Servo {
                channel,
                angle: angle_degrees,
            },
        );
        Ok(())
    }

    fn set_motor_throttle(&mut self, motor: usize, throttle: f32) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(Error::Bus(format!("mock motor {} rejected", motor)));
        }
        let value = throttle.clamp(-1.0, 1.0);
        match state.throttles.get_mut(motor) {
            Some(slot) => *slot = value,
            None => {
                return Err(Error::InvalidParameter(format!(
                    "motor {} out of range",
                    motor
                )));
            }
        }
        self.record(&mut state, ActuationEvent::Throttle { motor, value });
        Ok(())
    }

    fn motor_count(&self) -> usize {
        self.state.lock().throttles.len()
    }

    fn stop_all(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.throttles.iter_mut().for_each(|t| *t = 0.0);
        self.record(&mut state, ActuationEvent::StopAll);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.released = true;
        self.record(&mut state, ActuationEvent::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::driver::ActuationGuard;

    #[test]
    fn test_events_are_stamped_with_sim_time() {
        let clock = SimClock::instant();
        let mut device = MockDevice::new(2, clock.clone());
        device.set_servo_angle(3, 90.0).unwrap();
        clock.sleep(Duration::from_secs(2));
        device.set_motor_throttle(1, 0.4).unwrap();

        let events = device.events();
        assert_eq!(events[0].at, Duration::ZERO);
        assert_eq!(events[1].at, Duration::from_secs(2));
        assert_eq!(device.servo_angle(3), Some(90.0));
        assert_eq!(device.throttles(), vec![0.0, 0.4]);
    }

    #[test]
    fn test_throttle_out_of_range_motor() {
        let mut device = MockDevice::new(1, SimClock::instant());
        assert!(matches!(
            device.set_motor_throttle(4, 0.5),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let device = MockDevice::new(2, SimClock::instant());
        let handle = device.clone();
        {
            let mut guard = ActuationGuard::new(Box::new(device));
            guard.device().set_motor_throttle(0, 1.0).unwrap();
        }
        assert!(handle.is_released());
        assert_eq!(handle.throttles(), vec![0.0, 0.0]);
        let kinds: Vec<_> = handle.events().into_iter().map(|e| e.kind).collect();
        assert_eq!(&kinds[1..], &[ActuationEvent::StopAll, ActuationEvent::Release]);
    }

    #[test]
    fn test_guard_releases_once() {
        let device = MockDevice::new(1, SimClock::instant());
        let handle = device.clone();
        let guard = ActuationGuard::new(Box::new(device));
        guard.release().unwrap();

        let releases = handle
            .events()
            .iter()
            .filter(|e| e.kind == ActuationEvent::Release)
            .count();
        assert_eq!(releases, 1);
    }
}
