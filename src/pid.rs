//! Discrete PID law for one servo axis.
//!
//! The controller is a plain running accumulator. The first update only
//! seeds the memory and returns the proportional term, so there is no
//! derivative kick from an undefined previous error. Later updates measure
//! the real elapsed time, since workers sleep on best-effort timers.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Proportional, integral and derivative gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub p: f64,
    /// Integral gain
    pub i: f64,
    /// Derivative gain
    pub d: f64,
}

impl PidGains {
    /// Create a gain triple
    #[must_use]
    pub const fn new(p: f64, i: f64, d: f64) -> Self {
        Self { p, i, d }
    }

    /// Whether every gain is a finite number
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.p.is_finite() && self.i.is_finite() && self.d.is_finite()
    }
}

impl From<(f64, f64, f64)> for PidGains {
    fn from((p, i, d): (f64, f64, f64)) -> Self {
        Self::new(p, i, d)
    }
}

/// Snapshot of the controller memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState {
    /// Gains in use
    pub gains: PidGains,
    /// Integral accumulator
    pub accumulated_integral: f64,
    /// Error seen on the last update, `None` before the first one
    pub previous_error: Option<f64>,
    /// Time of the last update, `None` before the first one
    pub previous_timestamp: Option<Instant>,
}

/// PID controller owned by a single axis worker
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral_limit: Option<f64>,
    accumulated_integral: f64,
    previous_error: Option<f64>,
    previous_timestamp: Option<Instant>,
}

impl PidController {
    /// Create a controller with no windup guard
    #[must_use]
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral_limit: None,
            accumulated_integral: 0.0,
            previous_error: None,
            previous_timestamp: None,
        }
    }

    /// Clamp the integral accumulator to `[-limit, limit]`
    ///
    /// # Panics
    ///
    /// Panics if the limit is not a positive finite number
    #[must_use]
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        assert!(limit.is_finite() && limit > 0.0, "Integral limit must be positive");
        self.integral_limit = Some(limit);
        self
    }

    /// Feed one error sample, measuring elapsed time from the monotonic clock
    pub fn update(&mut self, error: f64) -> f64 {
        self.update_at(error, Instant::now())
    }

    /// Feed one error sample observed at `now`
    pub fn update_at(&mut self, error: f64, now: Instant) -> f64 {
        let (Some(previous_error), Some(previous_timestamp)) = (self.previous_error, self.previous_timestamp) else {
            self.accumulated_integral = 0.0;
            self.previous_error = Some(error);
            self.previous_timestamp = Some(now);
            return self.gains.p * error;
        };

        let dt = now.saturating_duration_since(previous_timestamp).as_secs_f64();

        // Two samples at the same instant carry no rate information
        let derivative = if dt > 0.0 {
            self.accumulated_integral += error * dt;
            if let Some(limit) = self.integral_limit {
                self.accumulated_integral = self.accumulated_integral.clamp(-limit, limit);
            }
            (error - previous_error) / dt
        } else {
            0.0
        };

        self.previous_error = Some(error);
        self.previous_timestamp = Some(now);

        self.gains.p * error + self.gains.i * self.accumulated_integral + self.gains.d * derivative
    }

    /// Current gains
    #[must_use]
    pub const fn gains(&self) -> PidGains {
        self.gains
    }

    /// Configured windup guard, if any
    #[must_use]
    pub const fn integral_limit(&self) -> Option<f64> {
        self.integral_limit
    }

    /// Snapshot of the controller memory
    #[must_use]
    pub const fn state(&self) -> PidState {
        PidState {
            gains: self.gains,
            accumulated_integral: self.accumulated_integral,
            previous_error: self.previous_error,
            previous_timestamp: self.previous_timestamp,
        }
    }
}
