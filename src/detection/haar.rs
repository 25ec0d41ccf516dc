use super::{BoundingBox, Detection, ObjectDetector};
use crate::{config::DetectionConfig, error::Error, Result};
use log::info;
use opencv::{
    core::{Mat, Rect, Size, Vector},
    imgproc,
    objdetect::{self, CascadeClassifier},
    prelude::*,
};

/// Haar cascade face detector
pub struct HaarCascadeDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: i32,
}

impl HaarCascadeDetector {
    /// Load a cascade XML
    pub fn new(config: &DetectionConfig) -> Result<Self> {
        if !config.cascade.exists() {
            return Err(Error::ConfigError(format!(
                "Cascade file not found: {}",
                config.cascade.display()
            )));
        }
        let path = config
            .cascade
            .to_str()
            .ok_or_else(|| Error::ConfigError("Cascade path is not valid UTF-8".to_string()))?;

        let classifier = CascadeClassifier::new(path)?;
        if classifier.empty()? {
            return Err(Error::ConfigError(format!("Cascade {path} could not be loaded")));
        }
        info!("Loaded Haar cascade from {}", path);

        Ok(Self {
            classifier,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: config.min_size,
        })
    }
}

impl ObjectDetector<Mat> for HaarCascadeDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        let gray = if frame.channels() == 1 {
            frame.try_clone()?
        } else {
            let code = if frame.channels() == 4 {
                imgproc::COLOR_BGRA2GRAY
            } else {
                imgproc::COLOR_BGR2GRAY
            };
            let mut gray = Mat::default();
            imgproc::cvt_color(frame, &mut gray, code, 0)?;
            gray
        };

        let mut faces = Vector::<Rect>::new();
        self.classifier.detect_multi_scale(
            &gray,
            &mut faces,
            self.scale_factor,
            self.min_neighbors,
            objdetect::CASCADE_SCALE_IMAGE,
            Size::new(self.min_size, self.min_size),
            Size::new(0, 0),
        )?;

        Ok(faces
            .iter()
            .map(|r| {
                Detection::new(BoundingBox::new(
                    f64::from(r.x),
                    f64::from(r.y),
                    f64::from(r.width),
                    f64::from(r.height),
                ))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "haar"
    }
}
