//! Frame classification

pub mod ssd;

use crate::error::VisionError;
use crate::frame::Frame;
use async_trait::async_trait;
use catwatch_core::config::ClassifierConfig;
use catwatch_core::{Detection, Label};

pub use ssd::{RemoteDetector, SsdOutput};

/// Opaque object detector: one frame in, normalized detections out
///
/// Confidences are in [0, 1]; boxes are in model-input pixel space and only
/// present for cats.
#[async_trait]
pub trait FrameClassifier: Send + Sync {
    async fn classify(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError>;
}

/// Maps detector class ids onto [`Label`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMap {
    pub person_class_id: u32,
    pub cat_class_id: u32,
}

impl LabelMap {
    pub fn label_for(&self, class_id: u32) -> Label {
        if class_id == self.person_class_id {
            Label::Person
        } else if class_id == self.cat_class_id {
            Label::Cat
        } else {
            Label::Other
        }
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for LabelMap {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            person_class_id: config.person_class_id,
            cat_class_id: config.cat_class_id,
        }
    }
}
