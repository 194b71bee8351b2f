//! Configuration for catwatch
//!
//! All values are static: read once at startup from a JSON, TOML or YAML
//! file, overridden by a handful of environment variables, then validated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Accepted cat box size, applied to both width and height (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeFilter {
    pub min: i32,
    pub max: i32,
}

impl SizeFilter {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

/// Per-tick reduction knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A person counts when confidence is strictly above this
    pub person_confidence_threshold: f32,
    /// A cat counts when confidence is strictly above this
    pub cat_confidence_threshold: f32,
    /// Box size bounds for cats; `None` accepts any size
    pub size_filter: Option<SizeFilter>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            person_confidence_threshold: 0.4,
            cat_confidence_threshold: 0.6,
            size_filter: None,
        }
    }
}

impl DetectionConfig {
    /// Stricter thresholds plus a 50-100 px box filter; pairs with
    /// [`PresenceConfig::size_filtered`]
    pub fn size_filtered() -> Self {
        Self {
            person_confidence_threshold: 0.5,
            cat_confidence_threshold: 0.7,
            size_filter: Some(SizeFilter::new(50, 100)),
        }
    }
}

/// How a recently seen person suppresses cat presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuppressionPolicy {
    /// Ignore cats while a person was seen within the window
    RecencyWindow { ignore_person_window_secs: u64 },
    /// Majority vote over the last `window` ticks, vetoed by any person
    HistoryMajority { window: usize, majority: usize },
}

impl SuppressionPolicy {
    /// Number of ticks retained in the arbiter history
    pub fn history_capacity(&self) -> usize {
        match self {
            SuppressionPolicy::RecencyWindow { .. } => 0,
            SuppressionPolicy::HistoryMajority { window, .. } => *window,
        }
    }
}

/// Presence state machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub policy: SuppressionPolicy,
    /// Time the signal must stay absent after the last sighting before the
    /// actuator is stopped
    pub min_hold_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self::simple()
    }
}

impl PresenceConfig {
    /// Recency-window suppression with a short hold
    pub fn simple() -> Self {
        Self {
            policy: SuppressionPolicy::RecencyWindow { ignore_person_window_secs: 15 },
            min_hold_secs: 4,
        }
    }

    /// Majority vote over five ticks with a long hold. Box filtering lives in
    /// [`DetectionConfig::size_filtered`]; [`CatwatchConfig::size_filtered`]
    /// sets both.
    pub fn size_filtered() -> Self {
        Self {
            policy: SuppressionPolicy::HistoryMajority { window: 5, majority: 3 },
            min_hold_secs: 10,
        }
    }

    pub fn min_hold(&self) -> Duration {
        Duration::from_secs(self.min_hold_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if let SuppressionPolicy::HistoryMajority { window, majority } = self.policy {
            if window == 0 {
                return Err(Error::Config("History window must be at least 1".to_string()));
            }
            if majority == 0 || majority > window {
                return Err(Error::Config(format!(
                    "Majority must be between 1 and the window size ({}), got {}",
                    window, majority
                )));
            }
        }
        Ok(())
    }
}

/// Tick loop and burst pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_interval_ms: u64,
    /// Frames are resized to this (width, height) before classification
    pub input_size: (u32, u32),
    pub burst_photo_count: u32,
    pub burst_interval_ms: u64,
    /// Draw the triggering box on burst photos
    pub annotate_bursts: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            input_size: crate::types::MODEL_INPUT_SIZE,
            burst_photo_count: 3,
            burst_interval_ms: 1000,
            annotate_bursts: false,
        }
    }
}

impl RuntimeConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }
}

/// Camera collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// URL returning one JPEG frame per GET
    pub snapshot_url: String,
    pub request_timeout_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            snapshot_url: "http://127.0.0.1:8080/snapshot.jpg".to_string(),
            request_timeout_ms: 2000,
        }
    }
}

/// Remote object detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    /// Detector class id reported for people
    pub person_class_id: u32,
    /// Detector class id reported for cats
    pub cat_class_id: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        // COCO label map as shipped with SSD MobileNet v1
        Self {
            endpoint: "http://127.0.0.1:9000".to_string(),
            request_timeout_ms: 5000,
            person_class_id: 0,
            cat_class_id: 16,
        }
    }
}

/// Actuator collaborator (`/start` and `/stop` endpoints)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            request_timeout_ms: 3000,
        }
    }
}

/// Telegram bot used for notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
    pub request_timeout_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Complete catwatch configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatwatchConfig {
    pub detection: DetectionConfig,
    pub presence: PresenceConfig,
    pub runtime: RuntimeConfig,
    pub camera: CameraConfig,
    pub classifier: ClassifierConfig,
    pub actuator: ActuatorConfig,
    pub notifier: NotifierConfig,
}

impl CatwatchConfig {
    /// Majority-vote presence with size-filtered detection
    pub fn size_filtered() -> Self {
        Self {
            detection: DetectionConfig::size_filtered(),
            presence: PresenceConfig::size_filtered(),
            ..Self::default()
        }
    }

    /// Load configuration from file, picking the format from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e))),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e))),
            _ => Self::from_str(&content),
        }
    }

    /// Load configuration from a string of unknown format
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = serde_json::from_str::<CatwatchConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<CatwatchConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<CatwatchConfig>(content) {
            return Ok(config);
        }

        Err(Error::Parse("Unknown configuration format".to_string()))
    }

    /// Apply `CATWATCH_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("CATWATCH_BOT_TOKEN") {
            self.notifier.bot_token = token;
        }
        if let Some(chat_id) = lookup("CATWATCH_CHAT_ID") {
            self.notifier.chat_id = chat_id;
        }
        if let Some(url) = lookup("CATWATCH_ACTUATOR_URL") {
            self.actuator.base_url = url;
        }
        if let Some(url) = lookup("CATWATCH_SNAPSHOT_URL") {
            self.camera.snapshot_url = url;
        }
        if let Some(url) = lookup("CATWATCH_CLASSIFIER_URL") {
            self.classifier.endpoint = url;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        for (name, value) in [
            ("person_confidence_threshold", detection.person_confidence_threshold),
            ("cat_confidence_threshold", detection.cat_confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }

        if let Some(filter) = detection.size_filter {
            if filter.min <= 0 || filter.max <= 0 {
                return Err(Error::Config("Cat size bounds must be positive".to_string()));
            }
            if filter.min > filter.max {
                return Err(Error::Config(format!(
                    "Cat size minimum ({}) exceeds maximum ({})",
                    filter.min, filter.max
                )));
            }
        }

        self.presence.validate()?;

        let runtime = &self.runtime;
        if runtime.tick_interval_ms == 0 {
            return Err(Error::Config("Tick interval must be greater than 0".to_string()));
        }
        if runtime.input_size.0 == 0 || runtime.input_size.1 == 0 {
            return Err(Error::Config("Input size must be non-zero".to_string()));
        }
        if runtime.burst_photo_count > 0 && runtime.burst_interval_ms == 0 {
            return Err(Error::Config("Burst interval must be greater than 0".to_string()));
        }

        for (name, url) in [
            ("camera.snapshot_url", &self.camera.snapshot_url),
            ("classifier.endpoint", &self.classifier.endpoint),
            ("actuator.base_url", &self.actuator.base_url),
            ("notifier.api_base", &self.notifier.api_base),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!("{} must be an http(s) URL, got '{}'", name, url)));
            }
        }

        if self.classifier.person_class_id == self.classifier.cat_class_id {
            return Err(Error::Config("Person and cat class ids must differ".to_string()));
        }

        Ok(())
    }
}
