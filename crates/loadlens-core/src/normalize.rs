//! Remote payload normalization.
//!
//! The remote model's response shape is not under our control. This module
//! is the single gateway that turns an arbitrary JSON payload into the
//! canonical suggestion shape or declares it unusable. The scheduler
//! treats an unusable payload exactly like a transport failure.

use serde_json::Value;
use thiserror::Error;

use crate::suggest::{Priority, Suggestion};

/// Why a remote payload could not be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Neither a top-level array nor an object with a `suggestions` array.
    #[error("payload is not a suggestion sequence")]
    NotASequence,
    /// The sequence was present but empty.
    #[error("payload contains no suggestions")]
    Empty,
    /// Every element was dropped for missing title or detail.
    #[error("no usable suggestions after filtering")]
    AllFiltered,
}

/// Normalize a remote payload into the canonical suggestion shape.
///
/// Accepts either a bare array of suggestion-like objects or an object
/// carrying a `suggestions` array. Per element: title falls back to
/// `action`, detail falls back to `description` (empty strings fall
/// through too), priority defaults to `Medium` when absent or
/// unrecognized. Elements with no resolvable title or detail are dropped;
/// order is preserved.
pub fn normalize(payload: &Value) -> Result<Vec<Suggestion>, NormalizeError> {
    let items = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("suggestions") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Err(NormalizeError::NotASequence),
        },
        _ => return Err(NormalizeError::NotASequence),
    };
    if items.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let title = text_field(item, "title").or_else(|| text_field(item, "action"));
        let detail = text_field(item, "detail").or_else(|| text_field(item, "description"));
        let (Some(title), Some(detail)) = (title, detail) else {
            continue;
        };
        let priority = Priority::from_label(item.get("priority").and_then(Value::as_str));
        out.push(Suggestion::new(title, detail, priority));
    }

    if out.is_empty() {
        return Err(NormalizeError::AllFiltered);
    }
    Ok(out)
}

/// Non-empty string field, if present.
fn text_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
