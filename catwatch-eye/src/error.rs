//! Error types for catwatch-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// Frame acquisition failed; the tick is skipped
    #[error("Capture error: {0}")]
    Capture(String),

    /// Detector invocation failed; the tick is skipped
    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VisionError {
    pub fn is_capture(&self) -> bool {
        matches!(self, VisionError::Capture(_))
    }

    pub fn is_classification(&self) -> bool {
        matches!(self, VisionError::Classification(_))
    }
}
