//! # pngx-upload
//!
//! Upload image/transcription dataset samples to a Paperless-NGX instance.
//!
//! Each sample of a dataset (by default the `fhswf/german_handwriting`
//! handwriting set on the Hugging Face hub) is converted to JPEG, titled from
//! the first words of its transcription, and posted as a new document.
//!
//! ## Run Overview
//!
//! ```text
//! config
//!  │
//!  ├─ 1. Check    GET /api/ with the token (dry run stops here)
//!  ├─ 2. Load     open the hub dataset or a local directory
//!  ├─ 3. Batch    split [start, start+max) into batches of batch_size
//!  ├─ 4. Sample   fetch → JPEG → title → POST /api/documents/post_document/
//!  └─ 5. Summary  attempted / succeeded / failed + success rate
//! ```
//!
//! A failed sample is logged and counted, never fatal. Only an unreachable
//! API (outside dry-run mode) or a dataset that cannot be opened aborts a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pngx_upload::{upload_dataset, RunOutcome, UploadConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder("http://localhost:8000", "my-api-token")
//!         .max_count(25)
//!         .build()?;
//!     if let RunOutcome::Completed(summary) = upload_dataset(&config).await? {
//!         eprintln!("{}/{} uploaded", summary.succeeded, summary.attempted);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pngx-upload` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::PaperlessClient;
pub use config::{mask_token, DatasetLocation, UploadConfig, UploadConfigBuilder};
pub use error::{SampleError, TaskLookupError, UploadError};
pub use output::{
    ConnectionStatus, RunOutcome, RunSummary, Sample, SampleOutcome, TaskStatus, UploadRequest,
    UploadResult,
};
pub use pipeline::dataset::{DatasetSource, HubDataset, LocalDataset};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use upload::{batch_ranges, process_samples, upload_dataset};
