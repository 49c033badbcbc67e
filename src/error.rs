//! Structured error types for the report renderer.
//!
//! Only structural failures surface here: unreadable or unparsable input,
//! an unusable template, or a failure while materializing/serializing the
//! output document. Per-item, per-field, and per-asset problems are absorbed
//! locally with fallbacks and never reach this type.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The inspection-record JSON failed to parse.
    #[error("failed to parse inspection record: {0}")]
    Input(#[from] serde_json::Error),

    /// The template PDF could not be loaded or is structurally unusable.
    #[error("template error: {0}")]
    Template(String),

    /// PDF object construction or serialization failed.
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
