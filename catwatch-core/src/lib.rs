//! catwatch-core: presence arbitration for a single camera
//!
//! Turns noisy per-frame detections into a stable "cat present" signal and
//! decides when the actuator and the notification channel should be told.
//! Everything in this crate is pure: I/O happens at the boundary by
//! dispatching the emitted [`Action`]s.

pub mod arbiter;
pub mod config;
pub mod error;
pub mod reduction;
pub mod types;

pub use arbiter::{Action, ArbiterState, PresenceArbiter};
pub use config::{
    CatwatchConfig, DetectionConfig, PresenceConfig, SizeFilter, SuppressionPolicy,
};
pub use error::{Error, Result};
pub use reduction::reduce;
pub use types::{Detection, Label, Rect, TickResult, MODEL_INPUT_SIZE};
