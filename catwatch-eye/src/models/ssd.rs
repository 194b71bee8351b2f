//! Remote SSD-style object detector
//!
//! The detector service receives the resized frame as a JPEG and answers with
//! the four output tensors of an SSD MobileNet postprocess op: normalized
//! `[ymin, xmin, ymax, xmax]` boxes, class ids, scores and a detection count.

use super::{FrameClassifier, LabelMap};
use crate::error::VisionError;
use crate::frame::{encode_jpeg, resize_for_model, Frame};
use async_trait::async_trait;
use catwatch_core::config::ClassifierConfig;
use catwatch_core::{Detection, Label, Rect};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Raw detector output for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SsdOutput {
    #[serde(default)]
    pub boxes: Vec<[f32; 4]>,
    #[serde(default)]
    pub classes: Vec<f32>,
    #[serde(default)]
    pub scores: Vec<f32>,
    /// Reported as a float by the postprocess op
    #[serde(default)]
    pub num_detections: f32,
}

impl SsdOutput {
    /// Convert raw tensors into detections in `input_size` pixel space
    pub fn normalize(&self, labels: &LabelMap, input_size: (u32, u32)) -> Vec<Detection> {
        let reported = if self.num_detections.is_finite() && self.num_detections > 0.0 {
            self.num_detections as usize
        } else {
            0
        };
        let count = reported.min(self.classes.len()).min(self.scores.len());
        if count < reported {
            warn!(
                "Detector reported {} detections but sent {} classes and {} scores",
                reported,
                self.classes.len(),
                self.scores.len()
            );
        }

        (0..count)
            .map(|i| {
                let class = self.classes[i];
                let label = if class.is_finite() && class >= 0.0 {
                    labels.label_for(class as u32)
                } else {
                    Label::Other
                };
                let confidence = if self.scores[i].is_nan() { 0.0 } else { self.scores[i].clamp(0.0, 1.0) };
                let bbox = match label {
                    Label::Cat => self.boxes.get(i).map(|b| to_pixel_rect(b, input_size)),
                    _ => None,
                };
                Detection { label, confidence, bbox }
            })
            .collect()
    }
}

fn to_pixel_rect(normalized: &[f32; 4], (width, height): (u32, u32)) -> Rect {
    let [ymin, xmin, ymax, xmax] = normalized.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
    Rect::new(
        (xmin * width as f32).round() as i32,
        (ymin * height as f32).round() as i32,
        (xmax * width as f32).round() as i32,
        (ymax * height as f32).round() as i32,
    )
}

/// HTTP client for a detector service exposing `POST /v1/detect`
pub struct RemoteDetector {
    client: reqwest::Client,
    endpoint: String,
    labels: LabelMap,
    input_size: (u32, u32),
}

impl RemoteDetector {
    pub fn new(config: &ClassifierConfig, input_size: (u32, u32)) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| VisionError::Config(format!("Failed to build detector client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            labels: LabelMap::from(config),
            input_size,
        })
    }

    async fn request(&self, jpeg: Vec<u8>) -> Result<SsdOutput, VisionError> {
        let url = format!("{}/v1/detect", self.endpoint);
        let part = Part::bytes(jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| VisionError::Classification(format!("Invalid mime type: {}", e)))?;
        let form = Form::new()
            .part("image", part)
            .text("width", self.input_size.0.to_string())
            .text("height", self.input_size.1.to_string());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VisionError::Classification(format!("Detector request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Classification(format!(
                "Detector returned {}: {}",
                status, body
            )));
        }

        response
            .json::<SsdOutput>()
            .await
            .map_err(|e| VisionError::Classification(format!("Invalid detector response: {}", e)))
    }
}

#[async_trait]
impl FrameClassifier for RemoteDetector {
    async fn classify(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        let resized = resize_for_model(frame, self.input_size)?;
        let jpeg = encode_jpeg(&resized)?;
        let output = self.request(jpeg).await?;
        let detections = output.normalize(&self.labels, self.input_size);
        debug!("Detector returned {} objects", detections.len());
        Ok(detections)
    }
}
