//! Detection stage: frame capture, object detection and publication.
//!
//! The detector is the only writer of frame centers and object positions.
//! Each cycle publishes either the selected object's center or absence, so
//! a lost face never leaves a stale position behind.

/// Synthetic frames and targets for running without a camera
pub mod synthetic;

/// `OpenCV` camera capture
#[cfg(feature = "opencv")]
pub mod camera;

/// `OpenCV` Haar cascade face detection
#[cfg(feature = "opencv")]
pub mod haar;

use crate::{constants::DETECTOR_FAILURE_BACKOFF_MS, shared_state::SharedState, Result};
use log::{info, warn};
use std::time::Duration;

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Pixel center of the box
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One detector hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    /// Backend score, if the backend produces one
    pub confidence: Option<f32>,
}

impl Detection {
    #[must_use]
    pub const fn new(bbox: BoundingBox) -> Self {
        Self { bbox, confidence: None }
    }

    #[must_use]
    pub const fn with_confidence(bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            bbox,
            confidence: Some(confidence),
        }
    }
}

/// Anything with a pixel size
pub trait Frame {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Geometric center of the frame
    fn center(&self) -> (f64, f64) {
        (f64::from(self.width()) / 2.0, f64::from(self.height()) / 2.0)
    }
}

/// Produces frames on demand; sizes may change between calls
pub trait FrameSource: Send {
    type Frame: Frame;

    fn capture(&mut self) -> Result<Self::Frame>;
}

/// Finds objects in a frame
pub trait ObjectDetector<F: Frame>: Send {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Pick the tracking target: highest confidence if scored, else the first box
#[must_use]
pub fn select_target(detections: &[Detection]) -> Option<&Detection> {
    if detections.iter().all(|d| d.confidence.is_none()) {
        return detections.first();
    }
    detections.iter().fold(None, |best: Option<&Detection>, candidate| match best {
        Some(b) if b.confidence.unwrap_or(f32::MIN) >= candidate.confidence.unwrap_or(f32::MIN) => Some(b),
        _ => Some(candidate),
    })
}

/// What one detection cycle published
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Object found at this pixel center
    Found { center: (f64, f64), object: (f64, f64) },
    /// Frame analysed, nothing found
    NotFound { center: (f64, f64) },
    /// Capture or detection failed; absence published
    Failed,
}

/// Capture-and-detect worker
pub struct Detector<S, D> {
    source: S,
    detector: D,
}

impl<S, D> Detector<S, D>
where
    S: FrameSource,
    D: ObjectDetector<S::Frame>,
{
    #[must_use]
    pub const fn new(source: S, detector: D) -> Self {
        Self { source, detector }
    }

    /// Capture one frame, detect, publish
    pub fn run_cycle(&mut self, shared: &SharedState) -> CycleOutcome {
        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed: {}", e);
                shared.publish_absent();
                return CycleOutcome::Failed;
            }
        };

        let center = frame.center();
        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("{} detection failed: {}", self.detector.name(), e);
                shared.publish_frame(center, None);
                return CycleOutcome::Failed;
            }
        };

        match select_target(&detections) {
            Some(target) => {
                let object = target.bbox.center();
                shared.publish_frame(center, Some(object));
                CycleOutcome::Found { center, object }
            }
            None => {
                shared.publish_frame(center, None);
                CycleOutcome::NotFound { center }
            }
        }
    }

    /// Detect continuously until shutdown, pausing `idle` between cycles
    /// and at least [`DETECTOR_FAILURE_BACKOFF_MS`] after a failed one
    pub fn run(&mut self, shared: &SharedState, idle: Duration, poll: Duration) {
        info!("Detector started with {} backend", self.detector.name());
        let backoff = idle.max(Duration::from_millis(DETECTOR_FAILURE_BACKOFF_MS));
        let mut cycles: u64 = 0;
        let mut hits: u64 = 0;
        while shared.is_running() {
            cycles += 1;
            let pause = match self.run_cycle(shared) {
                CycleOutcome::Found { .. } => {
                    hits += 1;
                    idle
                }
                CycleOutcome::NotFound { .. } => idle,
                CycleOutcome::Failed => backoff,
            };
            if !pause.is_zero() {
                shared.sleep_while_running(pause, poll);
            }
        }
        shared.publish_absent();
        info!("Detector stopped after {} cycles ({} with a target)", cycles, hits);
    }
}
