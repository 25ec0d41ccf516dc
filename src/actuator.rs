//! Actuator driver applying published target angles to the servos.
//!
//! The driver re-checks every command against the mechanical range on its
//! own, independent of the controllers' clamp. A failed write only costs
//! that cycle; the same command is retried on the next poll.

use crate::{
    axis_controller::{AngleRange, Axis},
    servo::ServoSink,
    shared_state::SharedState,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    ShuttingDown,
}

/// Handling of commands outside the mechanical range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Ignore the command and hold the previous position
    #[default]
    Drop,
    /// Write the nearest range bound instead
    Clamp,
}

/// Result of applying one axis command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    /// Angle written to hardware
    Written(f64),
    /// Command outside the range, nothing written
    Dropped(f64),
    /// Hardware write failed, will retry next poll
    Failed,
}

/// Per-axis driver parameters
#[derive(Debug, Clone, Copy)]
pub struct AxisOutput {
    pub range: AngleRange,
    pub neutral_angle: f64,
}

/// Applies commands from [`SharedState`] to a [`ServoSink`]
pub struct ActuatorDriver<S: ServoSink> {
    sink: S,
    pan: AxisOutput,
    tilt: AxisOutput,
    policy: OutOfRangePolicy,
    state: DriverState,
    applied: [Option<f64>; 2],
}

impl<S: ServoSink> ActuatorDriver<S> {
    #[must_use]
    pub const fn new(sink: S, pan: AxisOutput, tilt: AxisOutput, policy: OutOfRangePolicy) -> Self {
        Self {
            sink,
            pan,
            tilt,
            policy,
            state: DriverState::Running,
            applied: [None, None],
        }
    }

    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Last angle successfully written to an axis
    #[must_use]
    pub const fn applied(&self, axis: Axis) -> Option<f64> {
        self.applied[Self::slot(axis)]
    }

    /// Underlying sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Give back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    const fn slot(axis: Axis) -> usize {
        match axis {
            Axis::Pan => 0,
            Axis::Tilt => 1,
        }
    }

    const fn output(&self, axis: Axis) -> AxisOutput {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }

    /// Apply one command to one axis
    pub fn apply(&mut self, axis: Axis, angle: f64) -> ApplyOutcome {
        let range = self.output(axis).range;
        let target = if range.contains(angle) {
            angle
        } else {
            match self.policy {
                OutOfRangePolicy::Drop => return ApplyOutcome::Dropped(angle),
                OutOfRangePolicy::Clamp if angle.is_nan() => return ApplyOutcome::Dropped(angle),
                OutOfRangePolicy::Clamp => range.clamp(angle),
            }
        };

        match self.sink.write_angle(axis, target) {
            Ok(()) => {
                let slot = &mut self.applied[Self::slot(axis)];
                if *slot != Some(target) {
                    debug!("{axis} servo at {target:.2}");
                }
                *slot = Some(target);
                ApplyOutcome::Written(target)
            }
            Err(e) => {
                warn!("{} servo write failed: {}", axis, e);
                ApplyOutcome::Failed
            }
        }
    }

    /// Read both commands and apply them once
    pub fn poll_once(&mut self, shared: &SharedState) -> [ApplyOutcome; 2] {
        let (pan, tilt) = shared.commands();
        [self.apply(Axis::Pan, pan), self.apply(Axis::Tilt, tilt)]
    }

    /// Move both axes to their neutral angle and stop accepting commands
    pub fn shutdown(&mut self) {
        self.state = DriverState::ShuttingDown;
        for axis in Axis::ALL {
            let neutral = self.output(axis).neutral_angle;
            match self.sink.write_angle(axis, neutral) {
                Ok(()) => {
                    self.applied[Self::slot(axis)] = Some(neutral);
                    info!("{axis} servo parked at {neutral:.1}");
                }
                Err(e) => warn!("Failed to park {} servo: {}", axis, e),
            }
        }
    }

    /// Poll until shutdown is requested, then park the servos
    pub fn run(&mut self, shared: &SharedState, interval: Duration, poll: Duration) {
        info!("Actuator driver started with {} output", self.sink.name());
        while shared.is_running() && self.state == DriverState::Running {
            self.poll_once(shared);
            shared.sleep_while_running(interval, poll);
        }
        self.shutdown();
        info!("Actuator driver stopped");
    }
}
