//! Object detection pipeline

use crate::error::VisionError;
use crate::frame::Frame;
use crate::models::FrameClassifier;
use catwatch_core::{reduce, DetectionConfig, Label, TickResult};
use std::sync::Arc;
use tracing::debug;

/// Classifies a frame and reduces the result to one [`TickResult`]
pub struct DetectionPipeline {
    classifier: Arc<dyn FrameClassifier>,
    config: DetectionConfig,
}

impl DetectionPipeline {
    /// Create a new detection pipeline
    pub fn new(classifier: Arc<dyn FrameClassifier>, config: DetectionConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Process frame and reduce its detections
    pub async fn detect(&self, frame: &Frame) -> Result<TickResult, VisionError> {
        let detections = self.classifier.classify(frame).await?;

        for detection in &detections {
            match detection.label {
                Label::Person if detection.confidence > self.config.person_confidence_threshold => {
                    debug!("Person detected with confidence {:.2}", detection.confidence);
                }
                Label::Cat if detection.confidence > self.config.cat_confidence_threshold => {
                    debug!(
                        "Cat detected with confidence {:.2} box {:?}",
                        detection.confidence, detection.bbox
                    );
                }
                _ => {}
            }
        }

        Ok(reduce(&detections, &self.config))
    }
}
