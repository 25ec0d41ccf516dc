//! Last-value-wins coordination surface shared by all workers.
//!
//! Every field is an independent atomic scalar with exactly one writer:
//! the detector writes frame centers and object positions, each axis
//! controller writes its own command, and the actuator driver only reads.
//! Readers always see the most recent value; nothing is queued.

use crate::axis_controller::Axis;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// `f64` stored as its bit pattern in an `AtomicU64`
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Optional `f64` cell; NaN encodes absence
#[derive(Debug)]
pub struct AtomicOptionF64(AtomicU64);

impl AtomicOptionF64 {
    #[must_use]
    pub fn new(value: Option<f64>) -> Self {
        Self(AtomicU64::new(Self::encode(value)))
    }

    pub fn load(&self) -> Option<f64> {
        let value = f64::from_bits(self.0.load(Ordering::Acquire));
        (!value.is_nan()).then_some(value)
    }

    /// Store a value; a NaN input is stored as absent
    pub fn store(&self, value: Option<f64>) {
        self.0.store(Self::encode(value), Ordering::Release);
    }

    fn encode(value: Option<f64>) -> u64 {
        value.unwrap_or(f64::NAN).to_bits()
    }
}

/// Per-axis cells
#[derive(Debug)]
pub struct AxisCell {
    /// Frame center on this axis, written by the detector
    pub center: AtomicF64,
    /// Detected object coordinate on this axis, written by the detector
    pub object: AtomicOptionF64,
    /// Target angle, written by this axis's controller
    pub command: AtomicF64,
}

impl AxisCell {
    fn new(neutral_angle: f64) -> Self {
        Self {
            center: AtomicF64::new(0.0),
            object: AtomicOptionF64::new(None),
            command: AtomicF64::new(neutral_angle),
        }
    }
}

/// Cross-worker state, created once at startup and shared behind an `Arc`
#[derive(Debug)]
pub struct SharedState {
    pan: AxisCell,
    tilt: AxisCell,
    running: AtomicBool,
}

impl SharedState {
    /// Neutral commands, no object, running
    #[must_use]
    pub fn new(pan_neutral: f64, tilt_neutral: f64) -> Self {
        Self {
            pan: AxisCell::new(pan_neutral),
            tilt: AxisCell::new(tilt_neutral),
            running: AtomicBool::new(true),
        }
    }

    /// Cells for one axis
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> &AxisCell {
        match axis {
            Axis::Pan => &self.pan,
            Axis::Tilt => &self.tilt,
        }
    }

    /// Publish one detection cycle: frame center plus the object center or absence
    pub fn publish_frame(&self, center: (f64, f64), object: Option<(f64, f64)>) {
        self.pan.center.store(center.0);
        self.tilt.center.store(center.1);
        self.pan.object.store(object.map(|(x, _)| x));
        self.tilt.object.store(object.map(|(_, y)| y));
    }

    /// Mark the object as lost without touching the frame center
    pub fn publish_absent(&self) {
        self.pan.object.store(None);
        self.tilt.object.store(None);
    }

    /// Latest frame center and object coordinate for an axis
    #[must_use]
    pub fn observation(&self, axis: Axis) -> (f64, Option<f64>) {
        let cell = self.axis(axis);
        (cell.center.load(), cell.object.load())
    }

    /// Publish a target angle for an axis
    pub fn set_command(&self, axis: Axis, angle: f64) {
        self.axis(axis).command.store(angle);
    }

    /// Latest target angle for an axis
    #[must_use]
    pub fn command(&self, axis: Axis) -> f64 {
        self.axis(axis).command.load()
    }

    /// Latest (pan, tilt) target angles
    #[must_use]
    pub fn commands(&self) -> (f64, f64) {
        (self.command(Axis::Pan), self.command(Axis::Tilt))
    }

    /// Whether workers should keep looping
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every worker to leave its loop
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Sleep for `interval` in slices of at most `poll`, returning early on shutdown.
    ///
    /// Returns `true` if the system is still running afterwards.
    pub fn sleep_while_running(&self, interval: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let slice = if poll.is_zero() { interval } else { poll };
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(slice.min(deadline - now));
        }
        self.is_running()
    }
}
