//! Helper types shared by the integration tests

#![allow(dead_code)]

use pan_tilt_tracker::{
    axis_controller::Axis,
    config::AxisConfig,
    detection::{BoundingBox, Detection, Frame, FrameSource, ObjectDetector},
    error::{Error, Result},
    pid::PidGains,
    servo::ServoSink,
};
use std::sync::{Arc, Mutex};

/// Servo sink that records every write and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingServo {
    writes: Arc<Mutex<Vec<(Axis, f64)>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all successful writes so far
    pub fn writes(&self) -> Vec<(Axis, f64)> {
        self.writes.lock().unwrap().clone()
    }

    /// Writes for one axis, in order
    pub fn writes_for(&self, axis: Axis) -> Vec<f64> {
        self.writes()
            .into_iter()
            .filter(|(a, _)| *a == axis)
            .map(|(_, angle)| angle)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl ServoSink for RecordingServo {
    fn write_angle(&mut self, axis: Axis, angle: f64) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(Error::Servo("simulated bus error".to_string()));
        }
        self.writes.lock().unwrap().push((axis, angle));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Frame of a fixed size
#[derive(Debug, Clone, Copy)]
pub struct TestFrame {
    pub width: u32,
    pub height: u32,
}

impl Frame for TestFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Source producing identical frames
pub struct FixedSource(pub TestFrame);

impl FrameSource for FixedSource {
    type Frame = TestFrame;

    fn capture(&mut self) -> Result<TestFrame> {
        std::thread::sleep(std::time::Duration::from_millis(2));
        Ok(self.0)
    }
}

/// Detector reporting a face centered on a fixed point, or nothing
pub struct FixedTarget(pub Option<(f64, f64)>);

impl ObjectDetector<TestFrame> for FixedTarget {
    fn detect(&mut self, _frame: &TestFrame) -> Result<Vec<Detection>> {
        Ok(self
            .0
            .map(|(x, y)| Detection::new(BoundingBox::new(x - 20.0, y - 20.0, 40.0, 40.0)))
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Axis configuration over [0, 180] starting at 90
pub fn axis_config(p: f64, i: f64, d: f64) -> AxisConfig {
    AxisConfig {
        gains: PidGains::new(p, i, d),
        min_angle: 0.0,
        max_angle: 180.0,
        neutral_angle: 90.0,
        ..AxisConfig::pan()
    }
}
