use super::{Frame, FrameSource};
use crate::{config::CameraConfig, error::Error, utils::safe_cast::i32_to_u32, Result};
use log::info;
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

impl Frame for Mat {
    fn width(&self) -> u32 {
        i32_to_u32(self.cols()).unwrap_or(0)
    }

    fn height(&self) -> u32 {
        i32_to_u32(self.rows()).unwrap_or(0)
    }
}

/// Webcam frame source
pub struct CameraSource {
    capture: VideoCapture,
    flip_vertical: bool,
}

impl CameraSource {
    /// Open a camera by index with the configured resolution
    pub fn open(config: &CameraConfig) -> Result<Self> {
        info!("Opening camera {}", config.index);
        let mut capture = VideoCapture::new(config.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::Capture(format!("Camera {} could not be opened", config.index)));
        }

        capture.set(CAP_PROP_FRAME_WIDTH, f64::from(config.width))?;
        capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(config.height))?;

        // Reduce buffer size so every capture is the latest frame
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;
        info!(
            "Camera configured for {}x{}, buffer size 1{}",
            config.width,
            config.height,
            if config.flip_vertical { ", flipped vertically" } else { "" }
        );

        Ok(Self {
            capture,
            flip_vertical: config.flip_vertical,
        })
    }
}

impl FrameSource for CameraSource {
    type Frame = Mat;

    fn capture(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            return Err(Error::Capture("Camera returned an empty frame".to_string()));
        }

        if self.flip_vertical {
            let mut flipped = Mat::default();
            core::flip(&frame, &mut flipped, 0)?;
            return Ok(flipped);
        }

        Ok(frame)
    }
}
