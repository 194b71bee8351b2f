//! Action dispatch
//!
//! Text notifications and actuator signals are awaited inline; bursts are
//! spawned. Failures are logged and counted, never propagated: the arbiter
//! has already committed its transition.

use crate::actuator::Actuator;
use crate::burst::{BurstReport, BurstSettings, BurstTask};
use crate::notifier::Notifier;
use catwatch_core::{Action, Detection};
use catwatch_eye::FrameSource;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of dispatching one tick's actions
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Number of inline dispatches that failed
    pub failures: usize,
    /// Bursts spawned this tick; dropping a handle detaches the task
    pub bursts: Vec<JoinHandle<BurstReport>>,
}

/// Notification text for a confirmed sighting
pub fn format_notification(detection: &Detection, at: DateTime<Local>) -> String {
    format!(
        "Cat detected! Date and time: {} with confidence {:.2}",
        at.format("%Y-%m-%d %H:%M:%S"),
        detection.confidence
    )
}

pub struct ActionDispatcher {
    actuator: Arc<dyn Actuator>,
    notifier: Arc<dyn Notifier>,
    camera: Arc<dyn FrameSource>,
    burst: BurstSettings,
}

impl ActionDispatcher {
    pub fn new(
        actuator: Arc<dyn Actuator>,
        notifier: Arc<dyn Notifier>,
        camera: Arc<dyn FrameSource>,
        burst: BurstSettings,
    ) -> Self {
        Self { actuator, notifier, camera, burst }
    }

    /// Dispatch actions in order
    pub async fn dispatch(&self, actions: Vec<Action>) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for action in actions {
            match action {
                Action::Notify(detection) => {
                    let text = format_notification(&detection, Local::now());
                    match self.notifier.send_text(&text).await {
                        Ok(()) => info!("Sighting message sent"),
                        Err(e) => {
                            warn!("Error sending message: {}", e);
                            outcome.failures += 1;
                        }
                    }
                }
                Action::ActivateActuator => {
                    if let Err(e) = self.actuator.start().await {
                        warn!("Error sending /start to actuator: {}", e);
                        outcome.failures += 1;
                    }
                }
                Action::DeactivateActuator => {
                    if let Err(e) = self.actuator.stop().await {
                        warn!("Error sending /stop to actuator: {}", e);
                        outcome.failures += 1;
                    }
                }
                Action::CaptureBurst(detection) => {
                    if self.burst.photo_count == 0 {
                        debug!("Photo bursts disabled");
                        continue;
                    }
                    let task = BurstTask::new(
                        self.camera.clone(),
                        self.notifier.clone(),
                        self.burst,
                        detection,
                    );
                    outcome.bursts.push(task.spawn());
                }
            }
        }

        outcome
    }
}
