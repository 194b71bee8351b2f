//! Detection types shared by the classifier adapter and the arbiter

use serde::{Deserialize, Serialize};

/// Pixel space every detection box is expressed in (width, height)
pub const MODEL_INPUT_SIZE: (u32, u32) = (300, 300);

/// Class of a detected object, as far as presence arbitration cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Person,
    Cat,
    Other,
}

/// Axis-aligned box in [`MODEL_INPUT_SIZE`] pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl Rect {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    /// Map this box from the `from` pixel space onto a `to` pixel space.
    ///
    /// Used to draw model-space boxes onto full-resolution camera frames.
    pub fn rescale(&self, from: (u32, u32), to: (u32, u32)) -> Rect {
        if from.0 == 0 || from.1 == 0 {
            return *self;
        }
        let sx = to.0 as f64 / from.0 as f64;
        let sy = to.1 as f64 / from.1 as f64;
        Rect {
            xmin: (self.xmin as f64 * sx).round() as i32,
            ymin: (self.ymin as f64 * sy).round() as i32,
            xmax: (self.xmax as f64 * sx).round() as i32,
            ymax: (self.ymax as f64 * sy).round() as i32,
        }
    }
}

/// One object reported by the classifier for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: Label,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Only present for labels that carry localization
    pub bbox: Option<Rect>,
}

impl Detection {
    pub fn person(confidence: f32) -> Self {
        Self { label: Label::Person, confidence, bbox: None }
    }

    pub fn cat(confidence: f32, bbox: Rect) -> Self {
        Self { label: Label::Cat, confidence, bbox: Some(bbox) }
    }

    pub fn other(confidence: f32) -> Self {
        Self { label: Label::Other, confidence, bbox: None }
    }
}

/// Reduction of one frame's detections.
///
/// A cat is raw-present exactly when an accepted cat detection exists, so the
/// flag is derived from `best_cat` rather than stored next to it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickResult {
    person_present_raw: bool,
    best_cat: Option<Detection>,
}

impl TickResult {
    pub fn new(person_present_raw: bool, best_cat: Option<Detection>) -> Self {
        Self { person_present_raw, best_cat }
    }

    /// Tick with nothing accepted
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cat_present_raw(&self) -> bool {
        self.best_cat.is_some()
    }

    pub fn person_present_raw(&self) -> bool {
        self.person_present_raw
    }

    pub fn best_cat(&self) -> Option<&Detection> {
        self.best_cat.as_ref()
    }

    pub fn into_best_cat(self) -> Option<Detection> {
        self.best_cat
    }
}
