//! Pan/tilt face tracking for a camera on two hobby servos.
//!
//! The control core is four cooperating workers that share nothing but a
//! set of last-value-wins atomic cells:
//!
//! 1. The detector captures frames and publishes the frame center and the
//!    detected face center, or its absence
//! 2. Two axis controllers (pan and tilt) each run an independent PID loop
//!    at a fixed cadence and publish a clamped target angle
//! 3. The actuator driver re-checks both angles against the mechanical
//!    range and writes them to the servos
//!
//! A supervisor builds the shared state, starts the workers and, on
//! shutdown, waits for them and parks the servos at their neutral angle.
//!
//! # Examples
//!
//! ## PID law
//!
//! ```
//! use pan_tilt_tracker::pid::{PidController, PidGains};
//! use std::time::{Duration, Instant};
//!
//! let mut pid = PidController::new(PidGains::new(0.0, 1.0, 0.0));
//! let start = Instant::now();
//!
//! // The first call seeds the memory and returns only the proportional term
//! assert_eq!(pid.update_at(2.0, start), 0.0);
//! assert_eq!(pid.update_at(2.0, start + Duration::from_secs(1)), 2.0);
//! assert_eq!(pid.update_at(2.0, start + Duration::from_secs(2)), 4.0);
//! ```
//!
//! ## Running the tracker headless
//!
//! ```no_run
//! use pan_tilt_tracker::{
//!     config::Config,
//!     detection::synthetic::{SyntheticSource, SyntheticTarget},
//!     servo::DryRunServo,
//!     supervisor::Tracker,
//! };
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let source = SyntheticSource::new(640, 480, Duration::from_millis(33));
//! let target = SyntheticTarget::new(Duration::from_secs(8), 0.5, 0.2);
//!
//! let handle = Tracker::new(config, source, target, DryRunServo::new())?.start()?;
//! std::thread::sleep(Duration::from_secs(5));
//! handle.shutdown()?;
//! # Ok(())
//! # }
//! ```

/// Actuator driver applying target angles to the servos
pub mod actuator;

/// Per-axis PID control loop
pub mod axis_controller;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Frame capture and object detection
pub mod detection;

/// Error types and result handling
pub mod error;

/// Discrete PID controller
pub mod pid;

/// Servo output backends
pub mod servo;

/// Atomic state shared between workers
pub mod shared_state;

/// Worker startup and shutdown
pub mod supervisor;

/// Numeric conversion helpers
pub mod utils;

pub use error::{Error, Result};
