//! Data types flowing through an upload run.
//!
//! Everything here is run-scoped: created while a run is in progress and
//! dropped afterwards. The remote API owns document persistence; this crate
//! writes nothing to disk.

use crate::error::SampleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One (image, transcription) pair read from a dataset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// 0-based position in the dataset.
    pub index: usize,
    /// Encoded image bytes in whatever format the source stores (PNG, JPEG, …).
    pub image: Vec<u8>,
    /// Transcription text. May be empty.
    pub text: String,
}

/// A single document-creation request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// JPEG bytes sent as the `document` file part.
    pub document: Vec<u8>,
    pub filename: String,
    pub title: String,
    pub created: NaiveDate,
    pub document_type: Option<u32>,
    pub correspondent: Option<u32>,
    pub tags: Vec<u32>,
}

/// Outcome of one upload call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadResult {
    /// The API accepted the document and queued an ingestion task.
    Uploaded { task_id: String },
    /// Non-2xx response or transport failure.
    Failed { detail: String },
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Uploaded { .. })
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            UploadResult::Uploaded { task_id } => Some(task_id),
            UploadResult::Failed { .. } => None,
        }
    }
}

/// What happened to one attempted sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub index: usize,
    /// Derived title, absent when the sample failed before a title existed.
    pub title: Option<String>,
    pub result: Result<String, SampleError>,
}

/// Run counters, accumulated in memory and reported once at the end.
///
/// `succeeded + failed == attempted` holds after every [`RunSummary::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Number of batches processed.
    pub batches: usize,
    /// Task ids of successful uploads, in upload order.
    pub task_ids: Vec<String>,
}

impl RunSummary {
    /// Count one attempted sample.
    pub fn record(&mut self, outcome: &SampleOutcome) {
        self.attempted += 1;
        match &outcome.result {
            Ok(task_id) => {
                self.succeeded += 1;
                self.task_ids.push(task_id.clone());
            }
            Err(_) => self.failed += 1,
        }
    }

    /// Success rate in percent. Zero when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64 * 100.0
        }
    }
}

/// Result of the connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub reachable: bool,
    /// Human-readable diagnostic, e.g. `HTTP 200 OK` or a transport error.
    pub detail: String,
}

/// How a non-fatal run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Dry run: only the connectivity check was performed.
    DryRun(ConnectionStatus),
    /// All batches were processed.
    Completed(RunSummary),
}

/// A Paperless-NGX consumption task record, as returned by `/api/tasks/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Option<String>,
    /// Document id once consumption finished; older servers send a number,
    /// newer ones a string.
    #[serde(default)]
    pub related_document: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, ok: bool) -> SampleOutcome {
        SampleOutcome {
            index,
            title: Some(format!("t{index}")),
            result: if ok {
                Ok(format!("task-{index}"))
            } else {
                Err(SampleError::Upload {
                    index,
                    detail: "HTTP 500".into(),
                })
            },
        }
    }

    #[test]
    fn summary_counts_always_add_up() {
        let mut summary = RunSummary::default();
        for i in 0..17 {
            summary.record(&outcome(i, i % 3 != 0));
            assert_eq!(summary.succeeded + summary.failed, summary.attempted);
        }
        assert_eq!(summary.attempted, 17);
        assert_eq!(summary.failed, 6);
        assert_eq!(summary.task_ids.len(), 11);
    }

    #[test]
    fn success_rate_zero_when_nothing_attempted() {
        assert_eq!(RunSummary::default().success_rate(), 0.0);
    }

    #[test]
    fn success_rate_percent() {
        let mut summary = RunSummary::default();
        summary.record(&outcome(0, true));
        summary.record(&outcome(1, true));
        summary.record(&outcome(2, true));
        summary.record(&outcome(3, false));
        assert!((summary.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn task_status_tolerates_missing_fields() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"task_id":"abc","status":"SUCCESS"}"#).expect("valid json");
        assert_eq!(status.status, "SUCCESS");
        assert!(status.related_document.is_none());
    }
}
