//! Error types for the pngx-upload library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`UploadError`] — **Fatal**: the run cannot proceed at all (API
//!   unreachable, dataset cannot be opened, bad configuration). Returned as
//!   `Err(UploadError)` from [`crate::upload::upload_dataset`].
//!
//! * [`SampleError`] — **Non-fatal**: a single sample failed (unreadable
//!   record, corrupt image, rejected upload) but the run continues with the
//!   next one. Counted in [`crate::output::RunSummary`] and reported through
//!   [`crate::progress::UploadProgressCallback::on_sample_error`].

use thiserror::Error;

/// All fatal errors returned by the pngx-upload library.
///
/// Sample-level failures use [`SampleError`] and never abort a run.
#[derive(Debug, Error)]
pub enum UploadError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// The connectivity check against the document API failed.
    #[error("Cannot reach Paperless-NGX at '{url}': {detail}\nCheck the URL and API token, or run with --dry-run to diagnose.")]
    ApiUnreachable { url: String, detail: String },

    /// The dataset could not be opened at all.
    #[error("Failed to load dataset '{source_name}': {reason}")]
    DatasetLoad { source_name: String, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single sample.
///
/// `index` is always the 0-based dataset index of the sample.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum SampleError {
    /// The record could not be read from the dataset source.
    #[error("Sample {index}: could not be read from the dataset: {detail}")]
    Fetch { index: usize, detail: String },

    /// The image could not be decoded or re-encoded as JPEG.
    #[error("Sample {index}: image conversion failed: {detail}")]
    Conversion { index: usize, detail: String },

    /// The document API rejected the upload or the request never completed.
    #[error("Sample {index}: upload failed: {detail}")]
    Upload { index: usize, detail: String },
}

impl SampleError {
    /// Dataset index of the sample that failed.
    pub fn index(&self) -> usize {
        match self {
            SampleError::Fetch { index, .. }
            | SampleError::Conversion { index, .. }
            | SampleError::Upload { index, .. } => *index,
        }
    }
}

/// Why a consumption task could not be looked up.
///
/// Task lookups happen after the run and only feed a report, so this is
/// neither fatal nor counted against a sample.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskLookupError {
    /// The request never completed.
    #[error("task lookup failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("task lookup failed: HTTP {0}")]
    Status(u16),

    /// The response was not a task list or task record.
    #[error("unexpected task response: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_unreachable_display() {
        let e = UploadError::ApiUnreachable {
            url: "http://localhost:8000".into(),
            detail: "HTTP 401 Unauthorized".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("localhost:8000"), "got: {msg}");
        assert!(msg.contains("401"), "got: {msg}");
    }

    #[test]
    fn dataset_load_display() {
        let e = UploadError::DatasetLoad {
            source_name: "fhswf/german_handwriting".into(),
            reason: "HTTP 404".into(),
        };
        assert!(e.to_string().contains("fhswf/german_handwriting"));
    }

    #[test]
    fn sample_error_reports_index() {
        let e = SampleError::Conversion {
            index: 7,
            detail: "bad header".into(),
        };
        assert_eq!(e.index(), 7);
        assert!(e.to_string().contains("Sample 7"));
    }

    #[test]
    fn task_lookup_status_display() {
        let e = TaskLookupError::Status(503);
        assert_eq!(e.to_string(), "task lookup failed: HTTP 503");
    }
}
