//! Constants used throughout the application

/// Default capture resolution
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Default Haar cascade shipped with OpenCV
pub const DEFAULT_CASCADE_PATH: &str = "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml";

/// Haar cascade `detectMultiScale` parameters
pub const DEFAULT_SCALE_FACTOR: f64 = 1.05;
pub const DEFAULT_MIN_NEIGHBORS: i32 = 9;
pub const DEFAULT_MIN_FACE_SIZE: i32 = 30;

/// Mechanical servo range in degrees
pub const DEFAULT_MIN_ANGLE: f64 = 0.0;
pub const DEFAULT_MAX_ANGLE: f64 = 180.0;

/// Safe neutral angle the servos start at and return to on shutdown
pub const DEFAULT_NEUTRAL_ANGLE: f64 = 90.0;

/// Pan loop gains (p, i, d)
pub const DEFAULT_PAN_GAINS: (f64, f64, f64) = (0.0225, 0.0005, 0.001);

/// Tilt loop gains (p, i, d)
pub const DEFAULT_TILT_GAINS: (f64, f64, f64) = (0.005, 0.001, 0.001);

/// Servo pulse width range in microseconds
pub const DEFAULT_MIN_PULSE_US: u16 = 600;
pub const DEFAULT_MAX_PULSE_US: u16 = 2300;

/// Serial defaults for a Pololu Maestro
pub const DEFAULT_SERVO_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_SERVO_BAUD: u32 = 9600;

/// Pause after a failed detection cycle so a lost camera cannot spin the loop
pub const DETECTOR_FAILURE_BACKOFF_MS: u64 = 200;

/// Worker cadences in milliseconds
pub const DEFAULT_CONTROLLER_INTERVAL_MS: u64 = 50;
pub const DEFAULT_DRIVER_INTERVAL_MS: u64 = 20;
pub const DEFAULT_DETECTOR_IDLE_MS: u64 = 10;
pub const DEFAULT_SHUTDOWN_POLL_MS: u64 = 100;

/// Shutdown must be observed within a second
pub const MAX_SHUTDOWN_POLL_MS: u64 = 1000;

/// Maestro compact protocol "set target" command byte
pub const MAESTRO_SET_TARGET: u8 = 0x84;

/// Largest pulse a 14-bit quarter-microsecond target can carry
pub const MAESTRO_MAX_PULSE_US: u16 = 4095;

/// Serial write timeout for servo commands
pub const SERVO_WRITE_TIMEOUT_MS: u64 = 50;
