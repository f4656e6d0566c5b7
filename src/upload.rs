//! Run orchestration: connection check → dataset → batches → summary.
//!
//! [`upload_dataset`] drives a whole run from an [`UploadConfig`].
//! [`process_samples`] is the batch loop on its own, for callers that
//! already hold a client and a [`DatasetSource`].
//!
//! Everything runs on one logical thread of control: each sample is fetched,
//! converted and uploaded before the next one starts. Batches only group
//! samples for progress reporting.

use crate::client::PaperlessClient;
use crate::config::UploadConfig;
use crate::error::{SampleError, UploadError};
use crate::output::{RunOutcome, RunSummary, Sample, SampleOutcome, UploadRequest, UploadResult};
use crate::pipeline::dataset::{self, DatasetSource};
use crate::pipeline::normalize;
use crate::pipeline::title::{derive_title, upload_filename};
use chrono::Local;
use std::ops::Range;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Run a complete upload as described by `config`.
///
/// # Returns
/// * `Ok(RunOutcome::DryRun)` — dry run; the connectivity check ran and
///   nothing else, whether or not the API was reachable.
/// * `Ok(RunOutcome::Completed)` — every batch was processed, even if some
///   (or all) samples failed. Check `summary.failed`.
///
/// # Errors
/// Only fatal preconditions:
/// - the API is unreachable (not in dry-run mode)
/// - the dataset cannot be opened
pub async fn upload_dataset(config: &UploadConfig) -> Result<RunOutcome, UploadError> {
    let client = PaperlessClient::new(&config.base_url, &config.token, config.request_timeout_secs)?;

    // ── Step 1: Connectivity ─────────────────────────────────────────────
    let status = client.check_connection().await;
    if status.reachable {
        info!("Connected to Paperless-NGX at {} ({})", client.base_url(), status.detail);
    } else {
        warn!("Paperless-NGX at {} is not reachable: {}", client.base_url(), status.detail);
    }

    if config.dry_run {
        info!("Dry run: skipping dataset load and uploads");
        return Ok(RunOutcome::DryRun(status));
    }

    if !status.reachable {
        error!("Cannot proceed without a valid connection to Paperless-NGX");
        return Err(UploadError::ApiUnreachable {
            url: client.base_url().to_string(),
            detail: status.detail,
        });
    }

    // ── Step 2: Dataset ──────────────────────────────────────────────────
    let source = dataset::open(&config.dataset, config.request_timeout_secs).await?;

    // ── Step 3: Batches ──────────────────────────────────────────────────
    let summary = process_samples(&client, source.as_ref(), config).await;
    Ok(RunOutcome::Completed(summary))
}

/// Upload the samples in `[start_index, start_index + max_count)` of `source`.
///
/// The window is clamped to the source length. Per-sample failures are
/// logged, reported to the progress callback and counted; they never stop
/// the loop.
pub async fn process_samples(
    client: &PaperlessClient,
    source: &dyn DatasetSource,
    config: &UploadConfig,
) -> RunSummary {
    let start = config.start_index;
    let end = start.saturating_add(config.max_count).min(source.len());
    let total = end.saturating_sub(start);
    info!(
        "Will process {} samples of {} starting from index {}",
        total,
        source.name(),
        start
    );
    if total == 0 && start >= source.len() {
        warn!(
            "Start index {} is past the end of the dataset ({} samples)",
            start,
            source.len()
        );
    }

    let batches = batch_ranges(start, total, config.batch_size);
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut summary = RunSummary::default();
    for (i, range) in batches.iter().enumerate() {
        let batch_num = i + 1;
        info!(
            "Processing batch {}: samples {} to {}",
            batch_num,
            range.start + 1,
            range.end
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_start(batch_num, range);
        }

        for index in range.clone() {
            let outcome = process_sample(client, source, index, config).await;
            match &outcome.result {
                Ok(task_id) => {
                    let title = outcome.title.as_deref().unwrap_or_default();
                    info!("Uploaded sample {}: {:?} (task {})", index + 1, title, task_id);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_sample_complete(index, title, task_id);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_sample_error(index, &e.to_string());
                    }
                }
            }
            summary.record(&outcome);

            if config.item_delay_ms > 0 {
                sleep(Duration::from_millis(config.item_delay_ms)).await;
            }
        }

        summary.batches += 1;
        info!(
            "Batch {} completed. Progress: {}/{} (success: {}, failed: {})",
            batch_num, summary.attempted, total, summary.succeeded, summary.failed
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(batch_num, range, &summary);
        }

        if batch_num < batches.len() && config.batch_pause_ms > 0 {
            sleep(Duration::from_millis(config.batch_pause_ms)).await;
        }
    }

    info!(
        "Upload completed: {} attempted, {} succeeded, {} failed ({:.1}% success)",
        summary.attempted,
        summary.succeeded,
        summary.failed,
        summary.success_rate()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(&summary);
    }

    summary
}

/// Split `[start, start + count)` into consecutive ranges of `batch_size`.
///
/// The last range may be shorter. A `batch_size` of 0 is treated as 1.
pub fn batch_ranges(start: usize, count: usize, batch_size: usize) -> Vec<Range<usize>> {
    let size = batch_size.max(1);
    let end = start.saturating_add(count);
    (start..end)
        .step_by(size)
        .map(|s| s..s.saturating_add(size).min(end))
        .collect()
}

/// Fetch, convert and upload one sample. Never fails; errors land in the outcome.
async fn process_sample(
    client: &PaperlessClient,
    source: &dyn DatasetSource,
    index: usize,
    config: &UploadConfig,
) -> SampleOutcome {
    let sample = match source.fetch(index).await {
        Ok(sample) => sample,
        Err(e) => {
            return SampleOutcome {
                index,
                title: None,
                result: Err(e),
            }
        }
    };

    let title = derive_title(&sample.text);
    let result = upload_sample(client, &sample, &title, config).await;
    SampleOutcome {
        index,
        title: Some(title),
        result,
    }
}

async fn upload_sample(
    client: &PaperlessClient,
    sample: &Sample,
    title: &str,
    config: &UploadConfig,
) -> Result<String, SampleError> {
    let document = normalize::to_jpeg(&sample.image).map_err(|e| SampleError::Conversion {
        index: sample.index,
        detail: e.to_string(),
    })?;

    let now = Local::now().naive_local();
    let request = UploadRequest {
        document,
        filename: upload_filename(sample.index, now),
        title: title.to_string(),
        created: now.date(),
        document_type: config.document_type,
        correspondent: config.correspondent,
        tags: config.tags.clone(),
    };

    match client.upload(&request).await {
        UploadResult::Uploaded { task_id } => Ok(task_id),
        UploadResult::Failed { detail } => Err(SampleError::Upload {
            index: sample.index,
            detail,
        }),
    }
}
