//! PCA9685 16-channel PWM controller
//!
//! Drives the steering and arm servos directly and the DC drive motors
//! through H-bridge channel pairs. The controller answers on one of several
//! bus addresses depending on the HAT revision, so [`probe`] tries each
//! configured candidate in order and keeps the first one that initializes.
//!
//! Example configuration:
//!
//! ```toml
//! [device]
//! type = "pca9685"
//!
//! [hardware]
//! i2c_bus = "/dev/i2c-1"
//! candidate_addresses = [0x5F, 0x40, 0x41, 0x60]
//! pwm_frequency_hz = 50.0
//! ```

pub mod bus;
pub mod registers;

use crate::config::{HardwareConfig, MotorConfig};
use crate::core::driver::ActuationInterface;
use crate::error::{Error, Result};
use bus::RegisterBus;
use registers::{PwmOutput, ServoTiming};
use std::time::Duration;

/// Oscillator restart delay after leaving sleep
const OSCILLATOR_WAKE: Duration = Duration::from_millis(5);

/// Register-level controller
pub struct Pca9685<B: RegisterBus> {
    bus: B,
}

impl<B: RegisterBus> Pca9685<B> {
    /// Reset the controller and program the PWM frequency.
    ///
    /// Fails when the device does not acknowledge or the prescale readback
    /// does not match, which is how an empty address is detected.
    pub fn init(mut bus: B, frequency_hz: f32) -> Result<Self> {
        let prescale = registers::prescale_for(frequency_hz);

        bus.write_register(registers::MODE1, 0x00)?;
        bus.write_register(registers::MODE2, registers::MODE2_OUTDRV)?;

        // Prescale is only writable while sleeping
        let mode = bus.read_register(registers::MODE1)?;
        bus.write_register(
            registers::MODE1,
            (mode & !registers::MODE1_RESTART) | registers::MODE1_SLEEP,
        )?;
        bus.write_register(registers::PRESCALE, prescale)?;
        bus.write_register(registers::MODE1, mode)?;
        std::thread::sleep(OSCILLATOR_WAKE);
        bus.write_register(
            registers::MODE1,
            mode | registers::MODE1_RESTART | registers::MODE1_AUTO_INCREMENT,
        )?;

        let readback = bus.read_register(registers::PRESCALE)?;
        if readback != prescale {
            return Err(Error::Bus(format!(
                "prescale readback {} != {}",
                readback, prescale
            )));
        }
        log::debug!(
            "PCA9685: {:.1} Hz (prescale {})",
            frequency_hz,
            prescale
        );
        Ok(Self { bus })
    }

    pub fn set_output(&mut self, channel: u8, output: PwmOutput) -> Result<()> {
        if channel >= registers::CHANNEL_COUNT {
            return Err(Error::InvalidParameter(format!(
                "PWM channel {} outside 0..={}",
                channel,
                registers::CHANNEL_COUNT - 1
            )));
        }
        self.bus
            .write_block(registers::channel_base(channel), &output.registers())
    }

    /// Force every channel fully off
    pub fn all_off(&mut self) -> Result<()> {
        self.bus
            .write_block(registers::ALL_LED_ON_L, &PwmOutput::FullOff.registers())
    }

    /// Stop the oscillator
    pub fn sleep(&mut self) -> Result<()> {
        let mode = self.bus.read_register(registers::MODE1)?;
        self.bus.write_register(
            registers::MODE1,
            (mode & !registers::MODE1_RESTART) | registers::MODE1_SLEEP,
        )
    }
}

/// Try each candidate address in order, returning the first that opens.
///
/// Fails with [`Error::HardwareInit`] listing every attempted address when
/// none succeeds.
pub fn probe<T, F>(candidates: &[u16], mut open: F) -> Result<(u16, T)>
where
    F: FnMut(u16) -> Result<T>,
{
    let mut attempted = Vec::with_capacity(candidates.len());
    let mut last_error = String::from("no candidate addresses");
    for &address in candidates {
        attempted.push(address);
        match open(address) {
            Ok(value) => {
                log::info!("PCA9685 found at {:#04x}", address);
                return Ok((address, value));
            }
            Err(e) => {
                log::debug!("PCA9685 not at {:#04x}: {}", address, e);
                last_error = e.to_string();
            }
        }
    }
    Err(Error::HardwareInit {
        attempted,
        last_error,
    })
}

/// [`ActuationInterface`] over a PCA9685 motor/servo HAT
pub struct Pca9685Device {
    name: String,
    address: u16,
    controller: Pca9685<Box<dyn RegisterBus>>,
    servo: ServoTiming,
    motors: Vec<MotorConfig>,
}

impl Pca9685Device {
    /// Wrap an initialized controller
    pub fn new(
        name: &str,
        address: u16,
        controller: Pca9685<Box<dyn RegisterBus>>,
        config: &HardwareConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            address,
            controller,
            servo: ServoTiming {
                frequency_hz: config.pwm_frequency_hz,
                min_pulse_us: config.servo_min_pulse_us,
                max_pulse_us: config.servo_max_pulse_us,
                range_degrees: config.servo_range_degrees,
            },
            motors: config.motors.clone(),
        }
    }

    /// Probe the configured bus and open the first responding controller
    #[cfg(feature = "hardware")]
    pub fn open(name: &str, config: &HardwareConfig) -> Result<Self> {
        log::info!(
            "Probing PCA9685 on {} at {:02X?}",
            config.i2c_bus,
            config.candidate_addresses
        );
        let (address, controller) = probe(&config.candidate_addresses, |address| {
            let bus: Box<dyn RegisterBus> =
                Box::new(bus::LinuxI2cBus::open(&config.i2c_bus, address)?);
            Pca9685::init(bus, config.pwm_frequency_hz)
        })?;
        std::thread::sleep(crate::config::secs(config.init_settle_secs));
        Ok(Self::new(name, address, controller, config))
    }

    #[cfg(not(feature = "hardware"))]
    pub fn open(_name: &str, config: &HardwareConfig) -> Result<Self> {
        Err(Error::HardwareInit {
            attempted: Vec::new(),
            last_error: format!(
                "{} unavailable: built without the `hardware` feature",
                config.i2c_bus
            ),
        })
    }

    /// Bus address the controller answered on
    pub fn address(&self) -> u16 {
        self.address
    }

    fn motor(&self, motor: usize) -> Result<MotorConfig> {
        self.motors.get(motor).copied().ok_or_else(|| {
            Error::InvalidParameter(format!(
                "motor {} out of range ({} configured)",
                motor,
                self.motors.len()
            ))
        })
    }
}

impl ActuationInterface for Pca9685Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_servo_angle(&mut self, channel: u8, angle_degrees: f32) -> Result<()> {
        let counts = self.servo.counts(angle_degrees);
        log::trace!(
            "PCA9685: servo {} -> {:.1}° ({} counts)",
            channel,
            angle_degrees,
            counts
        );
        self.controller
            .set_output(channel, PwmOutput::from_counts(counts))
    }

    fn set_motor_throttle(&mut self, motor: usize, throttle: f32) -> Result<()> {
        let wiring = self.motor(motor)?;
        let (in1, in2) = registers::motor_outputs(throttle);
        log::trace!("PCA9685: motor {} -> {:.2}", motor, throttle);
        self.controller.set_output(wiring.in1, in1)?;
        self.controller.set_output(wiring.in2, in2)
    }

    fn motor_count(&self) -> usize {
        self.motors.len()
    }

    fn stop_all(&mut self) -> Result<()> {
        for motor in 0..self.motors.len() {
            self.set_motor_throttle(motor, 0.0)?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.controller.all_off()?;
        self.controller.sleep()?;
        log::info!("PCA9685 at {:#04x} released", self.address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::bus::fake::FakeBus;
    use super::*;

    fn device_on(bus: &FakeBus) -> Pca9685Device {
        let config = HardwareConfig::default();
        let boxed: Box<dyn RegisterBus> = Box::new(bus.clone());
        let controller = Pca9685::init(boxed, config.pwm_frequency_hz).unwrap();
        Pca9685Device::new("test", 0x40, controller, &config)
    }

    #[test]
    fn test_init_programs_prescale() {
        let bus = FakeBus::new();
        let _device = device_on(&bus);
        assert_eq!(bus.register(registers::PRESCALE), 121);
        let mode = bus.register(registers::MODE1);
        assert_eq!(mode & registers::MODE1_SLEEP, 0);
        assert_ne!(mode & registers::MODE1_AUTO_INCREMENT, 0);
    }

    #[test]
    fn test_servo_angle_writes_channel_registers() {
        let bus = FakeBus::new();
        let mut device = device_on(&bus);
        device.set_servo_angle(11, 90.0).unwrap();

        // 307 counts = 0x133
        let base = registers::channel_base(11);
        assert_eq!(bus.register(base + 2), 0x33);
        assert_eq!(bus.register(base + 3), 0x01);
    }

    #[test]
    fn test_motor_uses_both_bridge_channels() {
        let bus = FakeBus::new();
        let mut device = device_on(&bus);
        device.set_motor_throttle(0, 1.0).unwrap();

        // Default motor 0 is IN1 = 15, IN2 = 14
        assert_eq!(bus.register(registers::channel_base(15) + 1), registers::FULL_BIT);
        assert_eq!(bus.register(registers::channel_base(14) + 3), registers::FULL_BIT);
        assert!(matches!(
            device.set_motor_throttle(5, 0.5),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_release_turns_everything_off() {
        let bus = FakeBus::new();
        let mut device = device_on(&bus);
        device.release().unwrap();
        assert_eq!(bus.register(registers::ALL_LED_ON_L + 3), registers::FULL_BIT);
        assert_ne!(bus.register(registers::MODE1) & registers::MODE1_SLEEP, 0);
    }

    #[test]
    fn test_probe_skips_absent_addresses() {
        let (address, _controller) = probe(&[0x5F, 0x40, 0x41], |address| {
            let bus = if address == 0x40 {
                FakeBus::new()
            } else {
                FakeBus::absent()
            };
            Pca9685::init(bus, 50.0)
        })
        .unwrap();
        assert_eq!(address, 0x40);
    }

    #[test]
    fn test_probe_reports_every_attempt() {
        let err = probe(&[0x5F, 0x40], |_| Pca9685::init(FakeBus::absent(), 50.0))
            .err()
            .unwrap();
        match err {
            Error::HardwareInit {
                attempted,
                last_error,
            } => {
                assert_eq!(attempted, vec![0x5F, 0x40]);
                assert!(last_error.contains("no ACK"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
