//! Configuration for the waypoint rover
//!
//! Loads the route, calibration constants, hardware wiring, classification
//! settings and actuation profiles from a single TOML file. Every field has a
//! default matching the steered PiCar chassis, so a partial file only needs to
//! override what differs on a given robot.

use crate::classification::{FailurePolicyKind, RatioMetric, SourceKind};
use crate::core::types::{GridPosition, Heading, Side};
use crate::error::{Error, Result};
use crate::motion::DriveKind;
use crate::navigation::Route;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub calibration: CalibrationConstants,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Device type: "pca9685" or "mock"
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Device name for logs
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Mock only: real-time speedup (2.0 = twice as fast, 0 = never block)
    #[serde(default)]
    pub speed_factor: f32,
}

/// PWM controller wiring
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// Linux I2C character device
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: String,

    /// Bus addresses probed in order; the first that initializes wins
    #[serde(default = "default_candidate_addresses")]
    pub candidate_addresses: Vec<u16>,

    /// PWM frame frequency (50 Hz for hobby servos)
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency_hz: f32,

    /// Servo pulse width at 0° (microseconds)
    #[serde(default = "default_min_pulse")]
    pub servo_min_pulse_us: f32,

    /// Servo pulse width at full range (microseconds)
    #[serde(default = "default_max_pulse")]
    pub servo_max_pulse_us: f32,

    /// Servo actuation range in degrees
    #[serde(default = "default_servo_range")]
    pub servo_range_degrees: f32,

    /// Pause after configuring the controller before first use
    #[serde(default = "default_init_settle")]
    pub init_settle_secs: f32,

    #[serde(default)]
    pub channels: ChannelConfig,

    /// Drive motors as H-bridge channel pairs
    #[serde(default = "default_motors")]
    pub motors: Vec<MotorConfig>,
}

/// Servo channel assignment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelConfig {
    #[serde(default = "default_steering_channel")]
    pub steering: u8,
    #[serde(default = "default_head_yaw_channel")]
    pub head_yaw: u8,
    #[serde(default = "default_arm_joint1_channel")]
    pub arm_joint1: u8,
    #[serde(default = "default_arm_joint2_channel")]
    pub arm_joint2: u8,
    #[serde(default = "default_gripper_channel")]
    pub gripper: u8,
}

/// One DC drive motor wired to two PWM channels
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MotorConfig {
    pub in1: u8,
    pub in2: u8,
    /// Chassis side, used by skid-steer turns
    #[serde(default = "default_motor_side")]
    pub side: Side,
}

/// Dead-reckoning calibration.
///
/// Read-only for the whole mission. Physical displacement depends entirely on
/// these values matching the motors and the floor; there is no feedback to
/// correct drift.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CalibrationConstants {
    #[serde(default)]
    pub drive_kind: DriveKind,

    /// Steering servo angle for straight travel
    #[serde(default = "default_steer_center")]
    pub steer_center: f32,

    /// Steering servo angle at full left lock
    #[serde(default = "default_steer_left")]
    pub steer_left: f32,

    /// Steering servo angle at full right lock
    #[serde(default = "default_steer_right")]
    pub steer_right: f32,

    /// Drive time for a 90° left turn
    #[serde(default = "default_turn_left_secs")]
    pub turn_left_secs: f32,

    /// Drive time for a 90° right turn
    #[serde(default = "default_turn_right_secs")]
    pub turn_right_secs: f32,

    /// Drive time for one grid cell
    #[serde(default = "default_seconds_per_cell")]
    pub seconds_per_cell: f32,

    /// Drive speed in percent (0-100)
    #[serde(default = "default_drive_speed")]
    pub drive_speed: f32,

    /// Wait after moving the steering servo
    #[serde(default = "default_steer_settle_secs")]
    pub steer_settle_secs: f32,

    /// Wait after every motor stop
    #[serde(default)]
    pub stop_pause_secs: f32,

    #[serde(default)]
    pub wide_arc: WideArcCalibration,
}

/// Timing for the steered half-circle maneuver
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WideArcCalibration {
    /// Steering center used after the arc (may differ from normal driving)
    #[serde(default = "default_steer_center")]
    pub steer_center: f32,

    /// Forward drive time at full lock
    #[serde(default = "default_arc_secs")]
    pub arc_secs: f32,

    /// Reverse drive time correcting the overshoot
    #[serde(default = "default_reverse_secs")]
    pub reverse_secs: f32,

    /// Pause around steering changes
    #[serde(default = "default_arc_settle_secs")]
    pub settle_secs: f32,
}

/// Waypoint route
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default = "default_waypoints")]
    pub waypoints: Vec<GridPosition>,

    /// Transitions executed as a wide steered arc instead of turn + drive.
    ///
    /// When omitted, the built-in U-turn applies only to the built-in route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wide_arc: Option<Vec<WideArcEdgeConfig>>,
}

impl RouteConfig {
    /// Wide arc edges in effect for this route
    pub fn wide_arcs(&self) -> Vec<WideArcEdgeConfig> {
        match &self.wide_arc {
            Some(arcs) => arcs.clone(),
            None if self.waypoints == default_waypoints() => default_wide_arcs(),
            None => Vec::new(),
        }
    }
}

/// A route transition handled by the wide arc maneuver
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct WideArcEdgeConfig {
    pub from: GridPosition,
    pub to: GridPosition,
    /// Steering lock direction during the arc
    #[serde(default = "default_arc_side")]
    pub side: Side,
    /// Heading force-set after the maneuver
    pub heading_after: Heading,
}

/// Classification source and decision threshold
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassificationConfig {
    #[serde(default)]
    pub source: SourceKind,

    /// Ratios at or above this value select the grasp profile
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    #[serde(default)]
    pub metric: RatioMetric,

    /// What to do when capture or transcription fails
    #[serde(default)]
    pub on_error: FailurePolicyKind,

    /// Attempts per waypoint when `on_error = "retry"`
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Ratio substituted once all attempts failed
    #[serde(default)]
    pub fallback_ratio: f32,

    /// Ratios replayed by the scripted source, one per waypoint
    #[serde(default)]
    pub scripted_ratios: Vec<f32>,

    #[serde(default)]
    pub recorder: RecorderConfig,

    #[serde(default)]
    pub transcriber: TranscriberConfig,
}

/// Audio capture through `arecord`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default = "default_recorder_program")]
    pub program: String,
    /// ALSA capture device
    #[serde(default = "default_recorder_device")]
    pub device: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_audio_channels")]
    pub channels: u8,
    #[serde(default = "default_record_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_audio_path")]
    pub audio_path: PathBuf,
    /// Print elapsed seconds while recording
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

/// External speech-to-text command
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TranscriberConfig {
    /// Program and leading arguments; the audio path is appended
    #[serde(default)]
    pub command: Vec<String>,
}

/// Actuation profiles selected by the decision dispatcher
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub grasp: GraspProfileConfig,
    #[serde(default)]
    pub decline: DeclineProfileConfig,
}

/// Arm extend, gripper open/close, arm return
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraspProfileConfig {
    #[serde(default = "default_arm1_home")]
    pub arm1_home: f32,
    #[serde(default = "default_arm2_home")]
    pub arm2_home: f32,
    #[serde(default = "default_arm1_extend")]
    pub arm1_extend: f32,
    #[serde(default = "default_arm2_extend")]
    pub arm2_extend: f32,
    #[serde(default = "default_gripper_open")]
    pub gripper_open: f32,
    #[serde(default = "default_gripper_close")]
    pub gripper_close: f32,
    #[serde(default = "default_home_settle_secs")]
    pub home_settle_secs: f32,
    #[serde(default = "default_extend_hold_secs")]
    pub extend_hold_secs: f32,
    #[serde(default = "default_open_hold_secs")]
    pub open_hold_secs: f32,
    #[serde(default = "default_close_hold_secs")]
    pub close_hold_secs: f32,
    #[serde(default = "default_return_hold_secs")]
    pub return_hold_secs: f32,
    /// Stepwise arm extension; `step_degrees = 0` jumps directly
    #[serde(default = "default_smoothing")]
    pub smoothing: Option<SmoothingConfig>,
}

/// Stepwise interpolation of a large angle change
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SmoothingConfig {
    pub step_degrees: f32,
    pub step_delay_secs: f32,
}

/// Head yaw oscillation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeclineProfileConfig {
    #[serde(default = "default_yaw_center")]
    pub center: f32,
    #[serde(default = "default_yaw_left")]
    pub left: f32,
    #[serde(default = "default_yaw_right")]
    pub right: f32,
    /// Number of left/right swings
    #[serde(default = "default_swings")]
    pub swings: u32,
    #[serde(default = "default_center_hold_secs")]
    pub center_hold_secs: f32,
    #[serde(default = "default_swing_hold_secs")]
    pub swing_hold_secs: f32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_device_type() -> String {
    "pca9685".to_string()
}
fn default_device_name() -> String {
    "PiCar steered".to_string()
}
fn default_i2c_bus() -> String {
    "/dev/i2c-1".to_string()
}
fn default_candidate_addresses() -> Vec<u16> {
    vec![0x5F, 0x40, 0x41, 0x60]
}
fn default_pwm_frequency() -> f32 {
    50.0
}
fn default_min_pulse() -> f32 {
    500.0
}
fn default_max_pulse() -> f32 {
    2500.0
}
fn default_servo_range() -> f32 {
    180.0
}
fn default_init_settle() -> f32 {
    0.2
}
fn default_steering_channel() -> u8 {
    11
}
fn default_head_yaw_channel() -> u8 {
    10
}
fn default_arm_joint1_channel() -> u8 {
    9
}
fn default_arm_joint2_channel() -> u8 {
    8
}
fn default_gripper_channel() -> u8 {
    7
}
fn default_motor_side() -> Side {
    Side::Left
}
fn default_motors() -> Vec<MotorConfig> {
    vec![
        MotorConfig {
            in1: 15,
            in2: 14,
            side: Side::Left,
        },
        MotorConfig {
            in1: 12,
            in2: 13,
            side: Side::Right,
        },
    ]
}

// Calibration defaults (steered chassis, measured on a classroom floor)
fn default_steer_center() -> f32 {
    112.0
}
fn default_steer_left() -> f32 {
    80.0
}
fn default_steer_right() -> f32 {
    167.0
}
fn default_turn_left_secs() -> f32 {
    5.0
}
fn default_turn_right_secs() -> f32 {
    0.8
}
fn default_seconds_per_cell() -> f32 {
    3.6
}
fn default_drive_speed() -> f32 {
    23.6
}
fn default_steer_settle_secs() -> f32 {
    0.15
}
fn default_arc_secs() -> f32 {
    7.1
}
fn default_reverse_secs() -> f32 {
    1.0
}
fn default_arc_settle_secs() -> f32 {
    0.2
}

// Route defaults
fn default_waypoints() -> Vec<GridPosition> {
    [(0, 0), (1, 0), (2, 0), (2, 1), (1, 1), (0, 1)]
        .into_iter()
        .map(|(x, y)| GridPosition::new(x, y))
        .collect()
}
fn default_arc_side() -> Side {
    Side::Left
}
fn default_wide_arcs() -> Vec<WideArcEdgeConfig> {
    vec![WideArcEdgeConfig {
        from: GridPosition::new(2, 0),
        to: GridPosition::new(2, 1),
        side: Side::Left,
        heading_after: Heading::West,
    }]
}

// Classification defaults
fn default_threshold() -> f32 {
    0.60
}
fn default_max_attempts() -> u32 {
    3
}
fn default_recorder_program() -> String {
    "arecord".to_string()
}
fn default_recorder_device() -> String {
    "plughw:2,0".to_string()
}
fn default_sample_rate() -> u32 {
    44100
}
fn default_audio_channels() -> u8 {
    1
}
fn default_record_secs() -> u64 {
    20
}
fn default_audio_path() -> PathBuf {
    PathBuf::from("/home/pi/group.wav")
}
fn default_true() -> bool {
    true
}

// Profile defaults
fn default_arm1_home() -> f32 {
    40.0
}
fn default_arm2_home() -> f32 {
    90.0
}
fn default_arm1_extend() -> f32 {
    145.0
}
fn default_arm2_extend() -> f32 {
    180.0
}
fn default_gripper_open() -> f32 {
    85.0
}
fn default_gripper_close() -> f32 {
    10.0
}
fn default_home_settle_secs() -> f32 {
    0.2
}
fn default_extend_hold_secs() -> f32 {
    0.5
}
fn default_open_hold_secs() -> f32 {
    5.0
}
fn default_close_hold_secs() -> f32 {
    0.3
}
fn default_return_hold_secs() -> f32 {
    0.5
}
fn default_smoothing() -> Option<SmoothingConfig> {
    Some(SmoothingConfig {
        step_degrees: 2.0,
        step_delay_secs: 0.03,
    })
}
fn default_yaw_center() -> f32 {
    115.0
}
fn default_yaw_left() -> f32 {
    95.0
}
fn default_yaw_right() -> f32 {
    135.0
}
fn default_swings() -> u32 {
    2
}
fn default_center_hold_secs() -> f32 {
    0.3
}
fn default_swing_hold_secs() -> f32 {
    0.5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            speed_factor: 0.0,
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            candidate_addresses: default_candidate_addresses(),
            pwm_frequency_hz: default_pwm_frequency(),
            servo_min_pulse_us: default_min_pulse(),
            servo_max_pulse_us: default_max_pulse(),
            servo_range_degrees: default_servo_range(),
            init_settle_secs: default_init_settle(),
            channels: ChannelConfig::default(),
            motors: default_motors(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            steering: default_steering_channel(),
            head_yaw: default_head_yaw_channel(),
            arm_joint1: default_arm_joint1_channel(),
            arm_joint2: default_arm_joint2_channel(),
            gripper: default_gripper_channel(),
        }
    }
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            drive_kind: DriveKind::default(),
            steer_center: default_steer_center(),
            steer_left: default_steer_left(),
            steer_right: default_steer_right(),
            turn_left_secs: default_turn_left_secs(),
            turn_right_secs: default_turn_right_secs(),
            seconds_per_cell: default_seconds_per_cell(),
            drive_speed: default_drive_speed(),
            steer_settle_secs: default_steer_settle_secs(),
            stop_pause_secs: 0.0,
            wide_arc: WideArcCalibration::default(),
        }
    }
}

impl Default for WideArcCalibration {
    fn default() -> Self {
        Self {
            steer_center: default_steer_center(),
            arc_secs: default_arc_secs(),
            reverse_secs: default_reverse_secs(),
            settle_secs: default_arc_settle_secs(),
        }
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            waypoints: default_waypoints(),
            wide_arc: None,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            threshold: default_threshold(),
            metric: RatioMetric::default(),
            on_error: FailurePolicyKind::default(),
            max_attempts: default_max_attempts(),
            fallback_ratio: 0.0,
            scripted_ratios: Vec::new(),
            recorder: RecorderConfig::default(),
            transcriber: TranscriberConfig::default(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            program: default_recorder_program(),
            device: default_recorder_device(),
            sample_rate: default_sample_rate(),
            channels: default_audio_channels(),
            duration_secs: default_record_secs(),
            audio_path: default_audio_path(),
            show_progress: true,
        }
    }
}

impl Default for GraspProfileConfig {
    fn default() -> Self {
        Self {
            arm1_home: default_arm1_home(),
            arm2_home: default_arm2_home(),
            arm1_extend: default_arm1_extend(),
            arm2_extend: default_arm2_extend(),
            gripper_open: default_gripper_open(),
            gripper_close: default_gripper_close(),
            home_settle_secs: default_home_settle_secs(),
            extend_hold_secs: default_extend_hold_secs(),
            open_hold_secs: default_open_hold_secs(),
            close_hold_secs: default_close_hold_secs(),
            return_hold_secs: default_return_hold_secs(),
            smoothing: default_smoothing(),
        }
    }
}

impl Default for DeclineProfileConfig {
    fn default() -> Self {
        Self {
            center: default_yaw_center(),
            left: default_yaw_left(),
            right: default_yaw_right(),
            swings: default_swings(),
            center_hold_secs: default_center_hold_secs(),
            swing_hold_secs: default_swing_hold_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CalibrationConstants {
    /// Drive speed as a motor throttle fraction in [0, 1]
    pub fn throttle(&self) -> f32 {
        self.drive_speed.clamp(0.0, 100.0) / 100.0
    }

    /// Forward drive time for `cells` grid cells
    pub fn forward_duration(&self, cells: u32) -> Duration {
        secs(self.seconds_per_cell).saturating_mul(cells)
    }
}

/// Longest single timed step accepted from configuration
pub const MAX_STEP_SECS: f32 = 3600.0;

/// Seconds from configuration as a `Duration`.
///
/// Negatives and NaN become zero; values too large for `Duration` saturate.
pub fn secs(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use waypoint_rover::config::AppConfig;
    ///
    /// let config = AppConfig::load("rover.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            Self::load(path)
        } else {
            log::info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let cal = &self.calibration;
        for (name, angle) in [
            ("calibration.steer_center", cal.steer_center),
            ("calibration.steer_left", cal.steer_left),
            ("calibration.steer_right", cal.steer_right),
            ("calibration.wide_arc.steer_center", cal.wide_arc.steer_center),
        ] {
            check_angle(name, angle, self.hardware.servo_range_degrees)?;
        }
        for (name, value) in [
            ("calibration.turn_left_secs", cal.turn_left_secs),
            ("calibration.turn_right_secs", cal.turn_right_secs),
            ("calibration.steer_settle_secs", cal.steer_settle_secs),
            ("calibration.stop_pause_secs", cal.stop_pause_secs),
            ("calibration.wide_arc.arc_secs", cal.wide_arc.arc_secs),
            ("calibration.wide_arc.reverse_secs", cal.wide_arc.reverse_secs),
            ("calibration.wide_arc.settle_secs", cal.wide_arc.settle_secs),
            ("hardware.init_settle_secs", self.hardware.init_settle_secs),
        ] {
            check_duration(name, value)?;
        }
        check_duration("calibration.seconds_per_cell", cal.seconds_per_cell)?;
        if cal.seconds_per_cell == 0.0 {
            return Err(Error::Config(
                "calibration.seconds_per_cell must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&cal.drive_speed) {
            return Err(Error::Config(format!(
                "calibration.drive_speed {} outside 0..=100",
                cal.drive_speed
            )));
        }

        let hw = &self.hardware;
        if hw.candidate_addresses.is_empty() {
            return Err(Error::Config(
                "hardware.candidate_addresses is empty".to_string(),
            ));
        }
        if hw.motors.is_empty() {
            return Err(Error::Config("hardware.motors is empty".to_string()));
        }
        if !(hw.pwm_frequency_hz > 0.0) || hw.servo_min_pulse_us >= hw.servo_max_pulse_us {
            return Err(Error::Config(
                "hardware PWM frequency or servo pulse range is invalid".to_string(),
            ));
        }
        let ch = &hw.channels;
        let servo_channels = [ch.steering, ch.head_yaw, ch.arm_joint1, ch.arm_joint2, ch.gripper];
        let motor_channels = hw.motors.iter().flat_map(|m| [m.in1, m.in2]);
        if let Some(bad) = servo_channels.into_iter().chain(motor_channels).find(|c| *c > 15) {
            return Err(Error::Config(format!("PWM channel {} outside 0..=15", bad)));
        }

        let cls = &self.classification;
        if !(0.0..=1.0).contains(&cls.threshold) {
            return Err(Error::Config(format!(
                "classification.threshold {} outside [0, 1]",
                cls.threshold
            )));
        }
        if !(0.0..=1.0).contains(&cls.fallback_ratio) {
            return Err(Error::Config(format!(
                "classification.fallback_ratio {} outside [0, 1]",
                cls.fallback_ratio
            )));
        }

        let grasp = &self.profiles.grasp;
        let decline = &self.profiles.decline;
        let mut holds = vec![
            ("profiles.grasp.home_settle_secs", grasp.home_settle_secs),
            ("profiles.grasp.extend_hold_secs", grasp.extend_hold_secs),
            ("profiles.grasp.open_hold_secs", grasp.open_hold_secs),
            ("profiles.grasp.close_hold_secs", grasp.close_hold_secs),
            ("profiles.grasp.return_hold_secs", grasp.return_hold_secs),
            ("profiles.decline.center_hold_secs", decline.center_hold_secs),
            ("profiles.decline.swing_hold_secs", decline.swing_hold_secs),
        ];
        if let Some(smoothing) = &grasp.smoothing {
            holds.push(("profiles.grasp.smoothing.step_delay_secs", smoothing.step_delay_secs));
        }
        for (name, value) in holds {
            check_duration(name, value)?;
        }

        for (name, angle) in [
            ("profiles.grasp.arm1_home", grasp.arm1_home),
            ("profiles.grasp.arm2_home", grasp.arm2_home),
            ("profiles.grasp.arm1_extend", grasp.arm1_extend),
            ("profiles.grasp.arm2_extend", grasp.arm2_extend),
            ("profiles.grasp.gripper_open", grasp.gripper_open),
            ("profiles.grasp.gripper_close", grasp.gripper_close),
            ("profiles.decline.center", self.profiles.decline.center),
            ("profiles.decline.left", self.profiles.decline.left),
            ("profiles.decline.right", self.profiles.decline.right),
        ] {
            check_angle(name, angle, hw.servo_range_degrees)?;
        }

        if self.route.waypoints.is_empty() {
            return Err(Error::Config("route.waypoints is empty".to_string()));
        }
        // Malformed steps surface as InvalidMove / InvalidRoute
        Route::from_config(&self.route)?;
        Ok(())
    }
}

fn check_angle(name: &str, angle: f32, range: f32) -> Result<()> {
    if (0.0..=range).contains(&angle) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} = {} outside 0..={}",
            name, angle, range
        )))
    }
}

fn check_duration(name: &str, value: f32) -> Result<()> {
    if (0.0..=MAX_STEP_SECS).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} = {} outside 0..={}s",
            name, value, MAX_STEP_SECS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.device.device_type, "pca9685");
        assert_eq!(config.hardware.candidate_addresses, vec![0x5F, 0x40, 0x41, 0x60]);
        assert_eq!(config.calibration.steer_center, 112.0);
        assert_eq!(config.calibration.seconds_per_cell, 3.6);
        assert_eq!(config.classification.threshold, 0.60);
        assert_eq!(config.route.waypoints.len(), 6);
        assert_eq!(config.route.wide_arcs()[0].heading_after, Heading::West);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[device]"));
        assert!(toml_string.contains("[calibration]"));
        assert!(toml_string.contains("[route]"));
        assert!(toml_string.contains("[profiles.grasp]"));
        assert!(toml_string.contains("seconds_per_cell = "));
        assert!(toml_string.contains("type = \"pca9685\""));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_content = r#"
[device]
type = "mock"

[calibration]
seconds_per_cell = 1.0
drive_speed = 65.0

[route]
waypoints = [[0, 0], [1, 0]]
wide_arc = []

[classification]
threshold = 0.8
on_error = "retry"
max_attempts = 2
"#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.device_type, "mock");
        assert_eq!(config.calibration.seconds_per_cell, 1.0);
        assert_eq!(config.calibration.steer_left, 80.0);
        assert_eq!(config.route.waypoints[1], GridPosition::new(1, 0));
        assert!(config.route.wide_arcs().is_empty());
        assert_eq!(config.classification.on_error, FailurePolicyKind::Retry);
        assert_eq!(config.classification.max_attempts, 2);
        assert!((config.calibration.throttle() - 0.65).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_wide_arc_only_with_default_route() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.route.wide_arcs().len(), 1);

        // (2,0) -> (2,1) is an ordinary step on a custom route
        let config: AppConfig =
            toml::from_str("[route]\nwaypoints = [[2, 0], [2, 1], [2, 2]]\n").unwrap();
        assert!(config.route.wide_arc.is_none());
        assert!(config.route.wide_arcs().is_empty());

        let config: AppConfig = toml::from_str(
            r#"
[route]
waypoints = [[2, 0], [2, 1]]

[[route.wide_arc]]
from = [2, 0]
to = [2, 1]
heading_after = "west"
"#,
        )
        .unwrap();
        assert_eq!(config.route.wide_arcs().len(), 1);
    }

    #[test]
    fn test_validate_rejects_malformed_route() {
        let mut config = AppConfig::default();
        config.route.waypoints = vec![GridPosition::new(0, 0), GridPosition::new(1, 1)];
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidMove { dx: 1, dy: 1 })
        ));
    }

    #[test]
    fn test_hex_addresses_parse() {
        let config: AppConfig =
            toml::from_str("[hardware]\ncandidate_addresses = [0x40, 0x70]\n").unwrap();
        assert_eq!(config.hardware.candidate_addresses, vec![0x40, 0x70]);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = AppConfig::default();
        config.classification.threshold = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.calibration.steer_left = 200.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.hardware.motors.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.hardware.channels.gripper = 16;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_forward_duration_scales_with_cells() {
        let cal = CalibrationConstants {
            seconds_per_cell: 1.5,
            ..Default::default()
        };
        assert_eq!(cal.forward_duration(2), Duration::from_secs(3));
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f32::NAN), Duration::ZERO);
    }

    #[test]
    fn test_huge_durations_saturate_instead_of_panicking() {
        assert_eq!(secs(1e30), Duration::MAX);
        assert_eq!(secs(f32::INFINITY), Duration::MAX);

        let cal = CalibrationConstants {
            seconds_per_cell: 3600.0,
            ..Default::default()
        };
        // Cells multiply the Duration, never an f32 that could overflow
        assert!(cal.forward_duration(u32::MAX) > Duration::from_secs(3600));
    }

    #[test]
    fn test_validate_rejects_unbounded_durations() {
        let mut config = AppConfig::default();
        config.calibration.turn_left_secs = 1e30;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.calibration.seconds_per_cell = f32::INFINITY;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.profiles.grasp.open_hold_secs = 1e9;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.calibration.turn_left_secs = MAX_STEP_SECS;
        assert!(config.validate().is_ok());
    }
}
