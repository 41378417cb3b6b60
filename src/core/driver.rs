//! ActuationInterface trait definition

use crate::error::Result;

/// Servo and motor actuation surface for hardware abstraction.
///
/// Calls are fire-and-forget: nothing on the robot confirms that a servo
/// reached its angle or that a wheel turned. An `Err` only means the command
/// could not be delivered to the controller.
pub trait ActuationInterface: Send {
    /// Human readable device name for logs
    fn name(&self) -> &str;

    /// Set a servo channel to an angle in degrees (0..=180)
    fn set_servo_angle(&mut self, channel: u8, angle_degrees: f32) -> Result<()>;

    /// Set a drive motor throttle as a signed fraction in [-1, 1]
    fn set_motor_throttle(&mut self, motor: usize, throttle: f32) -> Result<()>;

    /// Number of drive motors
    fn motor_count(&self) -> usize;

    /// Command zero throttle on every drive motor
    fn stop_all(&mut self) -> Result<()>;

    /// Release the underlying controller (PWM outputs off, bus closed)
    fn release(&mut self) -> Result<()>;
}

/// Scoped ownership of an [`ActuationInterface`].
///
/// Stops every motor and releases the device exactly once: explicitly through
/// [`ActuationGuard::release`] on normal completion, or on drop for every
/// other exit path (errors, interruption, panics unwinding through the
/// mission).
pub struct ActuationGuard {
    device: Box<dyn ActuationInterface>,
    released: bool,
}

impl ActuationGuard {
    pub fn new(device: Box<dyn ActuationInterface>) -> Self {
        log::debug!("Acquired actuation interface: {}", device.name());
        Self {
            device,
            released: false,
        }
    }

    /// Mutable access to the guarded device
    pub fn device(&mut self) -> &mut dyn ActuationInterface {
        self.device.as_mut()
    }

    /// Stop all motors and release the device, reporting any failure
    pub fn release(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // Release even when the stop command could not be delivered
        let stopped = self.device.stop_all();
        let released = self.device.release();
        log::info!("Released actuation interface: {}", self.device.name());
        stopped.and(released)
    }
}

impl Drop for ActuationGuard {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("Best-effort release of {} failed: {}", self.device.name(), e);
        }
    }
}
