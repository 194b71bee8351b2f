//! Error types for catwatch-cns
//!
//! Every variant is a network-class failure: logged by the caller, never
//! retried, never fatal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CnsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<catwatch_eye::VisionError> for CnsError {
    fn from(err: catwatch_eye::VisionError) -> Self {
        CnsError::Encode(err.to_string())
    }
}
