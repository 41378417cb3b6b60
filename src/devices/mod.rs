//! Device implementations

pub mod mock;
pub mod pca9685;

use crate::config::AppConfig;
use crate::core::clock::{Clock, SimClock, SystemClock};
use crate::core::driver::ActuationInterface;
use crate::error::{Error, Result};
use mock::MockDevice;
use pca9685::Pca9685Device;
use std::sync::Arc;

/// Create the actuation device named by configuration, together with the
/// clock its timed steps run on.
///
/// Hardware runs on the wall clock; the mock runs on a [`SimClock`] scaled by
/// `device.speed_factor`.
pub fn create_device(config: &AppConfig) -> Result<(Box<dyn ActuationInterface>, Arc<dyn Clock>)> {
    match config.device.device_type.as_str() {
        "pca9685" => {
            let device = Pca9685Device::open(&config.device.name, &config.hardware)?;
            Ok((Box::new(device), Arc::new(SystemClock::new())))
        }
        "mock" => {
            let clock = SimClock::new(config.device.speed_factor);
            let device = MockDevice::with_name(
                &config.device.name,
                config.hardware.motors.len(),
                clock.clone(),
            );
            Ok((Box::new(device), Arc::new(clock)))
        }
        other => Err(Error::Config(format!("Unknown device type: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_device() {
        let mut config = AppConfig::default();
        config.device.device_type = "mock".to_string();
        let (device, clock) = create_device(&config).unwrap();
        assert_eq!(device.motor_count(), 2);
        assert_eq!(device.name(), "PiCar steered");
        assert_eq!(clock.elapsed(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_unknown_device_type() {
        let mut config = AppConfig::default();
        config.device.device_type = "servo-hat-9000".to_string();
        assert!(matches!(create_device(&config), Err(Error::Config(_))));
    }
}
