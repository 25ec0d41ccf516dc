//! Error types for the pan/tilt tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial link to the servo controller failed
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Frame acquisition failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// Object detection failed
    #[error("Detection error: {0}")]
    Detection(String),

    /// Servo write failed
    #[error("Servo error: {0}")]
    Servo(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A worker thread could not be started or panicked
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
