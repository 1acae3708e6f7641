//! Error types for loadlens-core.
//!
//! Nothing here is fatal to the pipeline: every variant is recovered by
//! substituting rule output or retaining the last known reading. The
//! variants exist so substitutions can be journaled with a reason.

use thiserror::Error;

use crate::normalize::NormalizeError;

/// Why one remote inference (or provider fetch) produced no usable output.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Network-level failure: connect, timeout, decode.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("remote endpoint returned status {0}")]
    Status(u16),

    /// Structurally present response that normalization rejected.
    #[error("unusable payload: {0}")]
    Payload(String),

    /// The call's cancellation token fired before completion.
    #[error("inference cancelled before completion")]
    Cancelled,
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        // Keep the rendered message; callers never need the transport type.
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<NormalizeError> for InferenceError {
    fn from(err: NormalizeError) -> Self {
        Self::Payload(err.to_string())
    }
}
