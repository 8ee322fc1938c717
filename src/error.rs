//! Errors returned at the snapshot and configuration boundaries.
//!
//! Geometry never fails: degenerate input resolves to identity or clamped
//! values, and rejected operations report an empty change set instead.

use crate::element::ElementId;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid element model {id}: {reason}")]
    InvalidModel { id: ElementId, reason: String },
    #[error("duplicate element id: {0}")]
    DuplicateId(ElementId),
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error("element {id} references missing element {missing}")]
    DanglingReference { id: ElementId, missing: ElementId },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Parse { var: &'static str, value: String },
}
