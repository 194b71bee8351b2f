//! The tick loop: capture, classify, arbitrate, dispatch, sleep

use catwatch_cns::{ActionDispatcher, DispatchOutcome};
use catwatch_core::{Action, PresenceArbiter};
use catwatch_eye::{DetectionPipeline, FrameSource, VisionError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Single writer of all presence state
pub struct TickLoop {
    camera: Arc<dyn FrameSource>,
    pipeline: DetectionPipeline,
    arbiter: PresenceArbiter,
    dispatcher: ActionDispatcher,
    interval: Duration,
}

impl TickLoop {
    pub fn new(
        camera: Arc<dyn FrameSource>,
        pipeline: DetectionPipeline,
        arbiter: PresenceArbiter,
        dispatcher: ActionDispatcher,
        interval: Duration,
    ) -> Self {
        Self { camera, pipeline, arbiter, dispatcher, interval }
    }

    pub fn arbiter(&self) -> &PresenceArbiter {
        &self.arbiter
    }

    /// Capture and classify one frame, then advance the arbiter
    pub async fn tick(&mut self, now: Instant) -> Result<Vec<Action>, VisionError> {
        let frame = self.camera.capture_frame().await?;
        let result = self.pipeline.detect(&frame).await?;
        debug!(
            "Tick: cat={} person={}",
            result.cat_present_raw(),
            result.person_present_raw()
        );
        Ok(self.arbiter.update(result, now))
    }

    /// One full iteration minus the sleep. Tick errors skip the iteration.
    pub async fn step(&mut self, now: Instant) -> Option<DispatchOutcome> {
        match self.tick(now).await {
            Ok(actions) if actions.is_empty() => None,
            Ok(actions) => Some(self.dispatcher.dispatch(actions).await),
            Err(e) if e.is_capture() => {
                warn!("Skipping tick, frame capture failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Skipping tick, classification failed: {}", e);
                None
            }
        }
    }

    /// Run until the process is terminated
    pub async fn run(mut self) {
        let presence = self.arbiter.config();
        let detection = self.pipeline.config();
        info!(
            "Presence policy {:?}, hold {}s, thresholds person>{:.2} cat>{:.2}, size filter {:?}",
            presence.policy,
            presence.min_hold_secs,
            detection.person_confidence_threshold,
            detection.cat_confidence_threshold,
            detection.size_filter
        );

        loop {
            // Bursts keep running after their handles are dropped
            self.step(Instant::now()).await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catwatch_cns::{Actuator, BurstSettings, CnsError, Notifier};
    use catwatch_core::{DetectionConfig, Detection, PresenceConfig, Rect};
    use catwatch_eye::{Frame, FrameClassifier, StaticFrameSource};
    use image::{DynamicImage, RgbImage};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Scripted {
        Cat(f32),
        Nothing,
        Fail,
    }

    struct ScriptedClassifier {
        script: Mutex<VecDeque<Scripted>>,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<Scripted>) -> Self {
            Self { script: Mutex::new(script.into()) }
        }
    }

    #[async_trait]
    impl FrameClassifier for ScriptedClassifier {
        async fn classify(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
            match self.script.lock().unwrap().pop_front() {
                Some(Scripted::Cat(confidence)) => {
                    Ok(vec![Detection::cat(confidence, Rect::new(10, 10, 80, 80))])
                }
                Some(Scripted::Fail) => Err(VisionError::Classification("detector down".into())),
                Some(Scripted::Nothing) | None => Ok(Vec::new()),
            }
        }
    }

    #[derive(Default)]
    struct CountingActuator {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl Actuator for CountingActuator {
        async fn start(&self) -> Result<(), CnsError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), CnsError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        texts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send_text(&self, _text: &str) -> Result<(), CnsError> {
            self.texts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_photo(&self, _jpeg: Vec<u8>) -> Result<(), CnsError> {
            Ok(())
        }
    }

    struct Harness {
        tick_loop: TickLoop,
        actuator: Arc<CountingActuator>,
        notifier: Arc<CountingNotifier>,
    }

    fn harness(script: Vec<Scripted>, camera: Arc<dyn FrameSource>) -> Harness {
        let actuator = Arc::new(CountingActuator::default());
        let notifier = Arc::new(CountingNotifier::default());
        let no_bursts = BurstSettings {
            photo_count: 0,
            interval: Duration::from_millis(1),
            annotate: false,
        };
        let dispatcher =
            ActionDispatcher::new(actuator.clone(), notifier.clone(), camera.clone(), no_bursts);
        let pipeline = DetectionPipeline::new(
            Arc::new(ScriptedClassifier::new(script)),
            DetectionConfig::default(),
        );
        let tick_loop = TickLoop::new(
            camera,
            pipeline,
            PresenceArbiter::new(PresenceConfig::simple()),
            dispatcher,
            Duration::from_millis(100),
        );
        Harness { tick_loop, actuator, notifier }
    }

    fn camera() -> Arc<dyn FrameSource> {
        Arc::new(StaticFrameSource::new(DynamicImage::ImageRgb8(RgbImage::new(64, 48))))
    }

    struct BrokenCamera;

    #[async_trait]
    impl FrameSource for BrokenCamera {
        async fn capture_frame(&self) -> Result<Frame, VisionError> {
            Err(VisionError::Capture("no signal".into()))
        }
    }

    #[tokio::test]
    async fn test_sighting_activates_then_hold_expires() {
        let mut h = harness(vec![Scripted::Cat(0.9), Scripted::Nothing, Scripted::Nothing], camera());
        let t0 = Instant::now();

        let outcome = h.tick_loop.step(t0).await.unwrap();
        assert_eq!(outcome.failures, 0);
        assert!(h.tick_loop.arbiter().is_active());
        assert_eq!(h.actuator.starts.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.texts.load(Ordering::SeqCst), 1);

        // Still inside the 4 s hold
        assert!(h.tick_loop.step(t0 + Duration::from_secs(2)).await.is_none());
        assert!(h.tick_loop.arbiter().is_active());

        h.tick_loop.step(t0 + Duration::from_secs(5)).await.unwrap();
        assert!(!h.tick_loop.arbiter().is_active());
        assert_eq!(h.actuator.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_low_confidence_cat_is_ignored() {
        let mut h = harness(vec![Scripted::Cat(0.5)], camera());
        assert!(h.tick_loop.step(Instant::now()).await.is_none());
        assert!(!h.tick_loop.arbiter().is_active());
        assert_eq!(h.actuator.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classification_failure_skips_tick() {
        let mut h = harness(vec![Scripted::Fail, Scripted::Cat(0.9)], camera());
        let t0 = Instant::now();

        let err = h.tick_loop.tick(t0).await.unwrap_err();
        assert!(err.is_classification());
        assert!(!h.tick_loop.arbiter().is_active());

        // The loop recovers on the next frame
        assert!(h.tick_loop.step(t0 + Duration::from_millis(100)).await.is_some());
        assert!(h.tick_loop.arbiter().is_active());
    }

    #[tokio::test]
    async fn test_capture_failure_leaves_state_untouched() {
        let mut h = harness(vec![Scripted::Cat(0.9)], Arc::new(BrokenCamera));

        let err = h.tick_loop.tick(Instant::now()).await.unwrap_err();
        assert!(err.is_capture());
        assert!(h.tick_loop.step(Instant::now()).await.is_none());
        assert!(!h.tick_loop.arbiter().is_active());
        assert_eq!(h.notifier.texts.load(Ordering::SeqCst), 0);
    }
}
