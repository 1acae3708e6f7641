//! Suggestion data model.
//!
//! Suggestions reach the pipeline from exactly one strategy per inference
//! cycle: the remote model or the local rule fallback. [`Advice`] bundles
//! the active set with its provenance and timestamp.

use serde::{Deserialize, Serialize};

/// Urgency of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parse a priority label, defaulting to `Medium` when the label is
    /// absent or unrecognized. Remote payloads rely on this leniency.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("Low") => Self::Low,
            Some("High") => Self::High,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// One actionable recommendation. Title and detail are non-empty; the
/// normalizer discards candidates that cannot satisfy this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub detail: String,
    pub priority: Priority,
}

impl Suggestion {
    pub fn new(title: impl Into<String>, detail: impl Into<String>, priority: Priority) -> Self {
        Self { title: title.into(), detail: detail.into(), priority }
    }
}

/// Which strategy produced the active suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// The remote model's normalized output.
    Remote,
    /// The deterministic local rules.
    #[default]
    Fallback,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// The active suggestion set with its provenance.
///
/// `suggestions` is never empty: the rule fallback guarantees at least one
/// entry whenever it is the producer, and the normalizer rejects empty
/// remote output before it gets here.
#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub suggestions: Vec<Suggestion>,
    pub source: ModelSource,
    /// When the producing inference cycle (or fallback evaluation) completed.
    pub last_inference_unix_ms: u64,
}
