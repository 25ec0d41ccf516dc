use super::{BoundingBox, Detection, Frame, FrameSource, ObjectDetector};
use crate::Result;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

/// Blank frame stamped with its capture time
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFrame {
    pub width: u32,
    pub height: u32,
    /// Time since the source started
    pub elapsed: Duration,
}

impl Frame for SyntheticFrame {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Frame source paced like a camera
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_interval: Duration,
    started: Instant,
}

impl SyntheticSource {
    #[must_use]
    pub fn new(width: u32, height: u32, frame_interval: Duration) -> Self {
        Self {
            width,
            height,
            frame_interval,
            started: Instant::now(),
        }
    }
}

impl FrameSource for SyntheticSource {
    type Frame = SyntheticFrame;

    fn capture(&mut self) -> Result<SyntheticFrame> {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        Ok(SyntheticFrame {
            width: self.width,
            height: self.height,
            elapsed: self.started.elapsed(),
        })
    }
}

/// Face wandering along a Lissajous path, out of view for part of each period
#[derive(Debug, Clone)]
pub struct SyntheticTarget {
    period: Duration,
    amplitude: f64,
    hidden_fraction: f64,
    face_size: f64,
}

impl SyntheticTarget {
    /// `amplitude` is a fraction of half the frame size, `hidden_fraction`
    /// the share of each period without a detection
    ///
    /// # Panics
    ///
    /// Panics if the period is zero or a fraction is outside [0, 1]
    #[must_use]
    pub fn new(period: Duration, amplitude: f64, hidden_fraction: f64) -> Self {
        assert!(!period.is_zero(), "Period must be non-zero");
        assert!((0.0..=1.0).contains(&amplitude), "Amplitude must be in [0, 1]");
        assert!((0.0..=1.0).contains(&hidden_fraction), "Hidden fraction must be in [0, 1]");
        Self {
            period,
            amplitude,
            hidden_fraction,
            face_size: 80.0,
        }
    }

    /// Face center at `elapsed`, or `None` while hidden
    #[must_use]
    pub fn position_at(&self, elapsed: Duration, width: u32, height: u32) -> Option<(f64, f64)> {
        let phase = (elapsed.as_secs_f64() / self.period.as_secs_f64()).fract();
        if phase < self.hidden_fraction {
            return None;
        }
        let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        let angle = phase * TAU;
        Some((
            self.amplitude.mul_add(cx * angle.sin(), cx),
            self.amplitude.mul_add(cy * (2.0 * angle).sin(), cy),
        ))
    }
}

impl ObjectDetector<SyntheticFrame> for SyntheticTarget {
    fn detect(&mut self, frame: &SyntheticFrame) -> Result<Vec<Detection>> {
        let half = self.face_size / 2.0;
        Ok(self
            .position_at(frame.elapsed, frame.width, frame.height)
            .map(|(x, y)| Detection::new(BoundingBox::new(x - half, y - half, self.face_size, self.face_size)))
            .into_iter()
            .collect())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
