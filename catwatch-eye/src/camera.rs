//! Camera frame acquisition

use crate::error::VisionError;
use crate::frame::Frame;
use async_trait::async_trait;
use catwatch_core::config::CameraConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Source of camera frames
///
/// Shared between the tick loop and burst tasks, so captures may overlap.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture_frame(&self) -> Result<Frame, VisionError>;
}

/// Camera exposing a JPEG snapshot endpoint (IP cameras, go2rtc, mjpg-streamer)
pub struct HttpSnapshotCamera {
    client: reqwest::Client,
    snapshot_url: String,
}

impl HttpSnapshotCamera {
    pub fn new(config: &CameraConfig) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| VisionError::Config(format!("Failed to build camera client: {}", e)))?;

        Ok(Self {
            client,
            snapshot_url: config.snapshot_url.clone(),
        })
    }

    pub fn snapshot_url(&self) -> &str {
        &self.snapshot_url
    }
}

#[async_trait]
impl FrameSource for HttpSnapshotCamera {
    async fn capture_frame(&self) -> Result<Frame, VisionError> {
        let response = self
            .client
            .get(&self.snapshot_url)
            .send()
            .await
            .map_err(|e| VisionError::Capture(format!("Snapshot request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Capture(format!("Snapshot endpoint returned {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VisionError::Capture(format!("Failed to read snapshot body: {}", e)))?;

        let frame = image::load_from_memory(&bytes)
            .map_err(|e| VisionError::Capture(format!("Failed to decode snapshot: {}", e)))?;

        debug!("Captured {}x{} frame", frame.width(), frame.height());
        Ok(frame)
    }
}

/// Frame source that always returns the same image
pub struct StaticFrameSource {
    frame: Frame,
    captures: AtomicU64,
}

impl StaticFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            captures: AtomicU64::new(0),
        }
    }

    /// Number of frames handed out so far
    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn capture_frame(&self) -> Result<Frame, VisionError> {
        self.captures.fetch_add(1, Ordering::Relaxed);
        Ok(self.frame.clone())
    }
}
