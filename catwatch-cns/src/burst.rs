//! Photo bursts
//!
//! A burst runs as its own task and owns a snapshot of the triggering
//! sighting. It reports only through logs and its [`BurstReport`].

use crate::notifier::Notifier;
use catwatch_core::config::RuntimeConfig;
use catwatch_core::Detection;
use catwatch_eye::frame::{annotate, encode_jpeg};
use catwatch_eye::FrameSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Burst size and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstSettings {
    pub photo_count: u32,
    pub interval: Duration,
    pub annotate: bool,
}

impl From<&RuntimeConfig> for BurstSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            photo_count: config.burst_photo_count,
            interval: config.burst_interval(),
            annotate: config.annotate_bursts,
        }
    }
}

/// Outcome of one burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BurstReport {
    pub captured: u32,
    pub sent: u32,
    pub failed: u32,
}

pub struct BurstTask {
    camera: Arc<dyn FrameSource>,
    notifier: Arc<dyn Notifier>,
    settings: BurstSettings,
    sighting: Detection,
}

impl BurstTask {
    pub fn new(
        camera: Arc<dyn FrameSource>,
        notifier: Arc<dyn Notifier>,
        settings: BurstSettings,
        sighting: Detection,
    ) -> Self {
        Self { camera, notifier, settings, sighting }
    }

    /// Run the burst detached from the caller
    pub fn spawn(self) -> JoinHandle<BurstReport> {
        tokio::spawn(self.run())
    }

    /// Capture, encode and send each photo in turn
    pub async fn run(self) -> BurstReport {
        let mut report = BurstReport::default();

        for index in 0..self.settings.photo_count {
            if index > 0 {
                tokio::time::sleep(self.settings.interval).await;
            }

            let frame = match self.camera.capture_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Burst photo {} capture failed: {}", index + 1, e);
                    report.failed += 1;
                    continue;
                }
            };
            report.captured += 1;

            let frame = match (self.settings.annotate, self.sighting.bbox.as_ref()) {
                (true, Some(bbox)) => annotate(&frame, bbox),
                _ => frame,
            };

            let jpeg = match encode_jpeg(&frame) {
                Ok(jpeg) => jpeg,
                Err(e) => {
                    warn!("Error encoding burst photo {}: {}", index + 1, e);
                    report.failed += 1;
                    continue;
                }
            };

            match self.notifier.send_photo(jpeg).await {
                Ok(()) => {
                    info!("Photo {}/{} sent", index + 1, self.settings.photo_count);
                    report.sent += 1;
                }
                Err(e) => {
                    warn!("Error sending photo {}: {}", index + 1, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Burst finished: {} captured, {} sent, {} failed",
            report.captured, report.sent, report.failed
        );
        report
    }
}
