//! Per-axis control loop turning detections into target angles.

use crate::{
    config::AxisConfig,
    pid::{PidController, PidState},
    shared_state::SharedState,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Rotational degree of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal rotation, driven by the x coordinate
    Pan,
    /// Vertical rotation, driven by the y coordinate
    Tilt,
}

impl Axis {
    /// Both axes, pan first
    pub const ALL: [Self; 2] = [Self::Pan, Self::Tilt];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Tilt => "tilt",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which way round the error is computed.
///
/// Must match the physical mounting; flipping it without flipping the gain
/// signs drives the servo away from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSign {
    /// `error = center - object`
    CenterMinusObject,
    /// `error = object - center`
    #[default]
    ObjectMinusCenter,
}

impl ErrorSign {
    #[must_use]
    pub fn error(self, center: f64, object: f64) -> f64 {
        match self {
            Self::CenterMinusObject => center - object,
            Self::ObjectMinusCenter => object - center,
        }
    }
}

/// Closed interval of valid servo angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        (self.min..=self.max).contains(&angle)
    }

    /// Clamp into the range; NaN maps to the lower bound
    #[must_use]
    pub fn clamp(&self, angle: f64) -> f64 {
        if angle.is_nan() {
            self.min
        } else {
            angle.clamp(self.min, self.max)
        }
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Result of one controller cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// No object in view, PID state and command left untouched
    Skipped,
    /// New target angle published
    Commanded(f64),
}

/// Independent PID loop for one axis
#[derive(Debug)]
pub struct AxisController {
    axis: Axis,
    pid: PidController,
    range: AngleRange,
    error_sign: ErrorSign,
    current_angle: f64,
}

impl AxisController {
    /// Build from validated axis configuration, starting at the neutral angle
    #[must_use]
    pub fn new(axis: Axis, config: &AxisConfig) -> Self {
        let mut pid = PidController::new(config.gains);
        if let Some(limit) = config.integral_limit {
            pid = pid.with_integral_limit(limit);
        }
        Self {
            axis,
            pid,
            range: config.range(),
            error_sign: config.error_sign,
            current_angle: config.range().clamp(config.neutral_angle),
        }
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Last angle this controller published
    #[must_use]
    pub const fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// PID memory snapshot
    #[must_use]
    pub const fn pid_state(&self) -> PidState {
        self.pid.state()
    }

    /// Run one cycle against the latest shared observation
    pub fn step(&mut self, shared: &SharedState) -> StepOutcome {
        self.step_at(shared, Instant::now())
    }

    /// Run one cycle as if observed at `now`
    pub fn step_at(&mut self, shared: &SharedState, now: Instant) -> StepOutcome {
        let (center, object) = shared.observation(self.axis);
        let Some(object) = object else {
            return StepOutcome::Skipped;
        };

        let error = self.error_sign.error(center, object);
        let correction = self.pid.update_at(error, now);
        let angle = self.range.clamp(self.current_angle + correction);

        if angle != self.current_angle {
            debug!(
                "{}: error {:.1} correction {:.3} angle {:.2} -> {:.2}",
                self.axis, error, correction, self.current_angle, angle
            );
        }

        self.current_angle = angle;
        shared.set_command(self.axis, angle);
        StepOutcome::Commanded(angle)
    }

    /// Loop until shutdown, one cycle per `interval`
    pub fn run(&mut self, shared: &SharedState, interval: Duration, poll: Duration) {
        info!("{} controller started", self.axis);
        while shared.is_running() {
            self.step(shared);
            shared.sleep_while_running(interval, poll);
        }
        info!("{} controller stopped at {:.2}", self.axis, self.current_angle);
    }
}
