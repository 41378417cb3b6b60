//! PCA9685 register map and PWM arithmetic

// Registers
pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const LED0_ON_L: u8 = 0x06; // 4 registers per channel: ON_L, ON_H, OFF_L, OFF_H
pub const ALL_LED_ON_L: u8 = 0xFA;
pub const PRESCALE: u8 = 0xFE;

// MODE1 bits
pub const MODE1_RESTART: u8 = 0x80;
pub const MODE1_AUTO_INCREMENT: u8 = 0x20;
pub const MODE1_SLEEP: u8 = 0x10;

// MODE2 bits
pub const MODE2_OUTDRV: u8 = 0x04; // Totem pole outputs

/// Bit 4 of ON_H / OFF_H forces the output fully on / off
pub const FULL_BIT: u8 = 0x10;

pub const CHANNEL_COUNT: u8 = 16;
pub const OSCILLATOR_HZ: f32 = 25_000_000.0;
/// Counts per PWM period (12-bit)
pub const RESOLUTION: u16 = 4096;

// Prescale limits from the datasheet (1526 Hz .. 24 Hz)
const PRESCALE_MIN: f32 = 3.0;
const PRESCALE_MAX: f32 = 255.0;

/// PRESCALE register value for an output frequency
pub fn prescale_for(frequency_hz: f32) -> u8 {
    let value = (OSCILLATOR_HZ / (RESOLUTION as f32 * frequency_hz)).round() - 1.0;
    value.clamp(PRESCALE_MIN, PRESCALE_MAX) as u8
}

/// First register of a channel
pub fn channel_base(channel: u8) -> u8 {
    LED0_ON_L + 4 * channel
}

/// Output level of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmOutput {
    FullOn,
    FullOff,
    /// High for this many counts out of [`RESOLUTION`], starting at 0
    Duty(u16),
}

impl PwmOutput {
    /// Output for `counts` high counts; saturates to full on/off at the ends
    pub fn from_counts(counts: u16) -> Self {
        match counts {
            0 => PwmOutput::FullOff,
            c if c >= RESOLUTION => PwmOutput::FullOn,
            c => PwmOutput::Duty(c),
        }
    }

    /// ON_L, ON_H, OFF_L, OFF_H
    pub fn registers(self) -> [u8; 4] {
        match self {
            PwmOutput::FullOn => [0, FULL_BIT, 0, 0],
            PwmOutput::FullOff => [0, 0, 0, FULL_BIT],
            PwmOutput::Duty(counts) => [0, 0, (counts & 0xFF) as u8, (counts >> 8) as u8 & 0x0F],
        }
    }
}

/// Hobby servo pulse mapping
#[derive(Debug, Clone, Copy)]
pub struct ServoTiming {
    pub frequency_hz: f32,
    pub min_pulse_us: f32,
    pub max_pulse_us: f32,
    pub range_degrees: f32,
}

impl ServoTiming {
    /// High counts for an angle, clamped to the actuation range
    pub fn counts(&self, angle_degrees: f32) -> u16 {
        let fraction = (angle_degrees / self.range_degrees).clamp(0.0, 1.0);
        let pulse_us = self.min_pulse_us + fraction * (self.max_pulse_us - self.min_pulse_us);
        let period_us = 1_000_000.0 / self.frequency_hz;
        (pulse_us / period_us * RESOLUTION as f32).round() as u16
    }
}

/// H-bridge inputs (IN1, IN2) for a signed throttle in slow decay mode.
///
/// Zero throttle brakes (both inputs high); releasing the motor is done by
/// switching every output off.
pub fn motor_outputs(throttle: f32) -> (PwmOutput, PwmOutput) {
    let throttle = throttle.clamp(-1.0, 1.0);
    if throttle == 0.0 {
        return (PwmOutput::FullOn, PwmOutput::FullOn);
    }
    let duty = (throttle.abs() * RESOLUTION as f32).round() as u16;
    let low = PwmOutput::from_counts(RESOLUTION - duty.min(RESOLUTION));
    if throttle > 0.0 {
        (PwmOutput::FullOn, low)
    } else {
        (low, PwmOutput::FullOn)
    }
}
