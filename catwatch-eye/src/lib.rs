//! catwatch-eye: the camera and classifier side of catwatch
//!
//! Captures frames from a snapshot camera and turns each one into a list of
//! normalized [`Detection`](catwatch_core::Detection)s by asking a remote
//! SSD-style object detector.

pub mod camera;
pub mod error;
pub mod frame;
pub mod models;
pub mod processing;

pub use camera::{FrameSource, HttpSnapshotCamera, StaticFrameSource};
pub use error::VisionError;
pub use frame::Frame;
pub use models::{FrameClassifier, LabelMap, RemoteDetector};
pub use processing::DetectionPipeline;
