//! Progress-callback trait for per-sample and per-batch upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::UploadConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the dataset window. The CLI uses
//! this to drive its terminal progress bar; tests use it to observe batch
//! boundaries.
//!
//! # Example
//!
//! ```rust
//! use pngx_upload::{UploadConfig, UploadProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl UploadProgressCallback for CountingCallback {
//!     fn on_sample_complete(&self, index: usize, _title: &str, _task_id: &str) {
//!         self.uploaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("sample {} uploaded", index + 1);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { uploaded: AtomicUsize::new(0) });
//!
//! let config = UploadConfig::builder("http://localhost:8000", "token")
//!     .progress_callback(counter as Arc<dyn UploadProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunSummary;
use std::ops::Range;
use std::sync::Arc;

/// Called by the orchestrator as it processes each batch and sample.
///
/// Events arrive strictly in order from a single logical thread; the
/// `Send + Sync` bound only lets the callback live inside a shared config.
/// All methods default to no-ops.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once after the dataset is opened, before the first batch.
    ///
    /// # Arguments
    /// * `total` — number of samples that will be attempted
    fn on_run_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before the first sample of a batch.
    ///
    /// # Arguments
    /// * `batch_num` — 1-based batch number within this run
    /// * `range`     — 0-based dataset indices covered by the batch
    fn on_batch_start(&self, batch_num: usize, range: &Range<usize>) {
        let _ = (batch_num, range);
    }

    /// Called when a sample was accepted by the document API.
    fn on_sample_complete(&self, index: usize, title: &str, task_id: &str) {
        let _ = (index, title, task_id);
    }

    /// Called when a sample failed at any stage.
    fn on_sample_error(&self, index: usize, error: &str) {
        let _ = (index, error);
    }

    /// Called after the last sample of a batch, with the running totals.
    fn on_batch_complete(&self, batch_num: usize, range: &Range<usize>, so_far: &RunSummary) {
        let _ = (batch_num, range, so_far);
    }

    /// Called once after every batch has been processed.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::UploadConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct BatchRecorder {
        batches: Mutex<Vec<(usize, Range<usize>)>>,
        errors: Mutex<Vec<usize>>,
    }

    impl UploadProgressCallback for BatchRecorder {
        fn on_batch_start(&self, batch_num: usize, range: &Range<usize>) {
            if let Ok(mut b) = self.batches.lock() {
                b.push((batch_num, range.clone()));
            }
        }

        fn on_sample_error(&self, index: usize, _error: &str) {
            if let Ok(mut e) = self.errors.lock() {
                e.push(index);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_batch_start(1, &(0..5));
        cb.on_sample_complete(0, "German Handwriting: a", "task");
        cb.on_sample_error(1, "boom");
        cb.on_batch_complete(1, &(0..5), &RunSummary::default());
        cb.on_run_complete(&RunSummary::default());
    }

    #[test]
    fn recorder_receives_events() {
        let rec = BatchRecorder::default();
        rec.on_batch_start(1, &(0..10));
        rec.on_batch_start(2, &(10..12));
        rec.on_sample_error(11, "HTTP 500");

        assert_eq!(
            *rec.batches.lock().unwrap(),
            vec![(1, 0..10), (2, 10..12)]
        );
        assert_eq!(*rec.errors.lock().unwrap(), vec![11]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn UploadProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_run_start(10);
        cb.on_sample_complete(3, "t", "id");
    }
}
