//! catwatch-cns: outbound side of catwatch
//!
//! Provides:
//! - Actuator control over HTTP (`/start`, `/stop`)
//! - Telegram notifications (text and photos)
//! - Photo bursts as detached tasks
//! - Dispatch of arbiter actions with best-effort, non-fatal failures

pub mod actuator;
pub mod burst;
pub mod dispatcher;
pub mod error;
pub mod notifier;

pub use actuator::{Actuator, HttpActuator};
pub use burst::{BurstReport, BurstSettings, BurstTask};
pub use dispatcher::{format_notification, ActionDispatcher, DispatchOutcome};
pub use error::CnsError;
pub use notifier::{Notifier, TelegramNotifier};
