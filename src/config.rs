//! Configuration management for the pan/tilt tracker

use crate::{
    actuator::OutOfRangePolicy,
    axis_controller::{AngleRange, ErrorSign},
    constants::{
        DEFAULT_CASCADE_PATH, DEFAULT_CONTROLLER_INTERVAL_MS, DEFAULT_DETECTOR_IDLE_MS, DEFAULT_DRIVER_INTERVAL_MS,
        DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_MAX_ANGLE, DEFAULT_MAX_PULSE_US, DEFAULT_MIN_ANGLE,
        DEFAULT_MIN_FACE_SIZE, DEFAULT_MIN_NEIGHBORS, DEFAULT_MIN_PULSE_US, DEFAULT_NEUTRAL_ANGLE, DEFAULT_PAN_GAINS,
        DEFAULT_SCALE_FACTOR, DEFAULT_SERVO_BAUD, DEFAULT_SERVO_PORT, DEFAULT_SHUTDOWN_POLL_MS, DEFAULT_TILT_GAINS,
        MAESTRO_MAX_PULSE_US, MAX_SHUTDOWN_POLL_MS,
    },
    pid::PidGains,
    servo::ServoBackend,
    Error, Result,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Face detection configuration
    pub detection: DetectionConfig,

    /// Pan loop configuration; omitted keys keep the pan defaults
    #[serde(deserialize_with = "deserialize_pan")]
    pub pan: AxisConfig,

    /// Tilt loop configuration; omitted keys keep the tilt defaults
    #[serde(deserialize_with = "deserialize_tilt")]
    pub tilt: AxisConfig,

    /// Servo output configuration
    pub servo: ServoConfig,

    /// Worker cadences
    pub timing: TimingConfig,
}

/// Camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index
    pub index: i32,

    /// Requested frame width
    pub width: u32,

    /// Requested frame height
    pub height: u32,

    /// Flip frames vertically (camera mounted upside down)
    pub flip_vertical: bool,
}

/// Haar cascade parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Path to the cascade XML
    pub cascade: PathBuf,

    /// Image pyramid scale step
    pub scale_factor: f64,

    /// Neighbor rectangles needed to keep a candidate
    pub min_neighbors: i32,

    /// Smallest face side in pixels
    pub min_size: i32,
}

/// One axis control loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// PID gains
    pub gains: PidGains,

    /// Lower mechanical bound in degrees
    pub min_angle: f64,

    /// Upper mechanical bound in degrees
    pub max_angle: f64,

    /// Start and shutdown angle
    pub neutral_angle: f64,

    /// Error sign convention for this mounting
    #[serde(default)]
    pub error_sign: ErrorSign,

    /// Optional windup guard on the integral accumulator
    #[serde(default)]
    pub integral_limit: Option<f64>,
}

/// Axis section as written in a file, every key optional
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AxisOverrides {
    gains: Option<PidGains>,
    min_angle: Option<f64>,
    max_angle: Option<f64>,
    neutral_angle: Option<f64>,
    error_sign: Option<ErrorSign>,
    integral_limit: Option<f64>,
}

impl AxisOverrides {
    fn apply(self, base: AxisConfig) -> AxisConfig {
        AxisConfig {
            gains: self.gains.unwrap_or(base.gains),
            min_angle: self.min_angle.unwrap_or(base.min_angle),
            max_angle: self.max_angle.unwrap_or(base.max_angle),
            neutral_angle: self.neutral_angle.unwrap_or(base.neutral_angle),
            error_sign: self.error_sign.unwrap_or(base.error_sign),
            integral_limit: self.integral_limit.or(base.integral_limit),
        }
    }
}

fn deserialize_pan<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<AxisConfig, D::Error> {
    Ok(AxisOverrides::deserialize(deserializer)?.apply(AxisConfig::pan()))
}

fn deserialize_tilt<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<AxisConfig, D::Error> {
    Ok(AxisOverrides::deserialize(deserializer)?.apply(AxisConfig::tilt()))
}

/// Servo output parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Output backend
    pub backend: ServoBackend,

    /// Serial device for the servo controller
    pub port: String,

    /// Serial baud rate
    pub baud_rate: u32,

    /// Controller channel of the pan servo
    pub pan_channel: u8,

    /// Controller channel of the tilt servo
    pub tilt_channel: u8,

    /// Pulse width at the lower angle bound
    pub min_pulse_us: u16,

    /// Pulse width at the upper angle bound
    pub max_pulse_us: u16,

    /// What the driver does with commands outside the mechanical range
    pub out_of_range: OutOfRangePolicy,
}

/// Worker cadences in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Axis controller loop delay
    pub controller_interval_ms: u64,

    /// Actuator driver poll delay
    pub driver_interval_ms: u64,

    /// Pause between detection cycles
    pub detector_idle_ms: u64,

    /// Longest uninterrupted sleep of any worker
    pub shutdown_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            detection: DetectionConfig::default(),
            pan: AxisConfig::pan(),
            tilt: AxisConfig::tilt(),
            servo: ServoConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            flip_vertical: true,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cascade: PathBuf::from(DEFAULT_CASCADE_PATH),
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

impl AxisConfig {
    fn with_gains(gains: (f64, f64, f64)) -> Self {
        Self {
            gains: gains.into(),
            min_angle: DEFAULT_MIN_ANGLE,
            max_angle: DEFAULT_MAX_ANGLE,
            neutral_angle: DEFAULT_NEUTRAL_ANGLE,
            error_sign: ErrorSign::default(),
            integral_limit: None,
        }
    }

    /// Default pan loop
    #[must_use]
    pub fn pan() -> Self {
        Self::with_gains(DEFAULT_PAN_GAINS)
    }

    /// Default tilt loop
    #[must_use]
    pub fn tilt() -> Self {
        Self::with_gains(DEFAULT_TILT_GAINS)
    }

    /// Mechanical range of this axis
    #[must_use]
    pub const fn range(&self) -> AngleRange {
        AngleRange::new(self.min_angle, self.max_angle)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.gains.is_finite() {
            return Err(Error::ConfigError(format!("{name}: gains must be finite numbers")));
        }
        if !self.min_angle.is_finite() || !self.max_angle.is_finite() {
            return Err(Error::ConfigError(format!("{name}: angle range must be finite")));
        }
        if self.min_angle >= self.max_angle {
            return Err(Error::ConfigError(format!(
                "{name}: min_angle ({}) must be below max_angle ({})",
                self.min_angle, self.max_angle
            )));
        }
        if !self.range().contains(self.neutral_angle) {
            return Err(Error::ConfigError(format!(
                "{name}: neutral_angle {} outside [{}, {}]",
                self.neutral_angle, self.min_angle, self.max_angle
            )));
        }
        if let Some(limit) = self.integral_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(Error::ConfigError(format!("{name}: integral_limit must be positive")));
            }
        }
        Ok(())
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            backend: ServoBackend::default(),
            port: DEFAULT_SERVO_PORT.to_string(),
            baud_rate: DEFAULT_SERVO_BAUD,
            pan_channel: 0,
            tilt_channel: 1,
            min_pulse_us: DEFAULT_MIN_PULSE_US,
            max_pulse_us: DEFAULT_MAX_PULSE_US,
            out_of_range: OutOfRangePolicy::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            controller_interval_ms: DEFAULT_CONTROLLER_INTERVAL_MS,
            driver_interval_ms: DEFAULT_DRIVER_INTERVAL_MS,
            detector_idle_ms: DEFAULT_DETECTOR_IDLE_MS,
            shutdown_poll_ms: DEFAULT_SHUTDOWN_POLL_MS,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn controller_interval(&self) -> Duration {
        Duration::from_millis(self.controller_interval_ms)
    }

    #[must_use]
    pub const fn driver_interval(&self) -> Duration {
        Duration::from_millis(self.driver_interval_ms)
    }

    #[must_use]
    pub const fn detector_idle(&self) -> Duration {
        Duration::from_millis(self.detector_idle_ms)
    }

    #[must_use]
    pub const fn shutdown_poll(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::ConfigError("Frame size must be non-zero".to_string()));
        }

        if !(self.detection.scale_factor > 1.0) {
            return Err(Error::ConfigError("Cascade scale_factor must be greater than 1.0".to_string()));
        }
        if self.detection.min_neighbors < 0 || self.detection.min_size < 0 {
            return Err(Error::ConfigError(
                "Cascade min_neighbors and min_size must be non-negative".to_string(),
            ));
        }

        self.pan.validate("pan")?;
        self.tilt.validate("tilt")?;

        if self.servo.min_pulse_us >= self.servo.max_pulse_us {
            return Err(Error::ConfigError("min_pulse_us must be below max_pulse_us".to_string()));
        }
        if self.servo.max_pulse_us > MAESTRO_MAX_PULSE_US {
            return Err(Error::ConfigError(format!(
                "max_pulse_us ({}) must not exceed {MAESTRO_MAX_PULSE_US}",
                self.servo.max_pulse_us
            )));
        }
        if self.servo.pan_channel == self.servo.tilt_channel {
            return Err(Error::ConfigError("Pan and tilt must use different servo channels".to_string()));
        }
        if self.servo.backend == ServoBackend::Maestro && self.servo.baud_rate == 0 {
            return Err(Error::ConfigError("Serial baud rate must be greater than 0".to_string()));
        }

        let timing = &self.timing;
        if timing.controller_interval_ms == 0 || timing.driver_interval_ms == 0 || timing.shutdown_poll_ms == 0 {
            return Err(Error::ConfigError("Worker intervals must be greater than 0".to_string()));
        }
        if timing.shutdown_poll_ms >= MAX_SHUTDOWN_POLL_MS {
            return Err(Error::ConfigError(format!(
                "shutdown_poll_ms must be below {MAX_SHUTDOWN_POLL_MS}"
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Pan/Tilt Tracker Configuration

# Camera
camera:
  index: 0
  width: 640
  height: 480
  flip_vertical: true

# Haar cascade face detection
detection:
  cascade: "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml"
  scale_factor: 1.05
  min_neighbors: 9
  min_size: 30

# Pan loop (error_sign: object_minus_center | center_minus_object).
# Every key is optional; omitted keys keep the values shown here.
pan:
  gains: { p: 0.0225, i: 0.0005, d: 0.001 }
  min_angle: 0.0
  max_angle: 180.0
  neutral_angle: 90.0
  error_sign: object_minus_center

# Tilt loop; integral_limit is an optional windup guard
tilt:
  gains: { p: 0.005, i: 0.001, d: 0.001 }
  min_angle: 0.0
  max_angle: 180.0
  neutral_angle: 90.0
  error_sign: object_minus_center
  integral_limit: null

# Servo output (backend: dry_run | maestro, out_of_range: drop | clamp)
servo:
  backend: dry_run
  port: "/dev/ttyACM0"
  baud_rate: 9600
  pan_channel: 0
  tilt_channel: 1
  min_pulse_us: 600
  max_pulse_us: 2300
  out_of_range: drop

# Worker cadences (milliseconds)
timing:
  controller_interval_ms: 50
  driver_interval_ms: 20
  detector_idle_ms: 10
  shutdown_poll_ms: 100
"#;
