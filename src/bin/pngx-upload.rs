//! CLI binary for pngx-upload.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `UploadConfig`, prints progress and the final summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pngx_upload::{
    mask_token, upload_dataset, DatasetLocation, PaperlessClient, ProgressCallback, RunOutcome,
    RunSummary, UploadConfig, UploadProgressCallback,
};
use std::io;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Cut `s` to `max` characters, marking the cut with an ellipsis.
fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per sample and
/// per finished batch.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_run_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking connection and loading dataset…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Clear the bar when the run stops before `on_run_complete`.
    fn abort(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} samples  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Uploading");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Uploading {total} samples…"))
        ));
    }

    fn on_batch_start(&self, batch_num: usize, range: &Range<usize>) {
        self.bar.println(format!(
            "{} Batch {}: samples {} to {}",
            cyan("▸"),
            batch_num,
            range.start + 1,
            range.end
        ));
    }

    fn on_sample_complete(&self, index: usize, title: &str, task_id: &str) {
        self.bar.println(format!(
            "  {} #{:<6} {}  {}",
            green("✓"),
            index + 1,
            shorten(title, 50),
            dim(&format!("task {task_id}")),
        ));
        self.bar.inc(1);
    }

    fn on_sample_error(&self, index: usize, error: &str) {
        self.bar.println(format!(
            "  {} #{:<6} {}",
            red("✗"),
            index + 1,
            red(&shorten(error, 80)),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, batch_num: usize, _range: &Range<usize>, so_far: &RunSummary) {
        self.bar.println(dim(&format!(
            "  batch {} done: {} uploaded, {} failed so far",
            batch_num, so_far.succeeded, so_far.failed
        )));
    }

    fn on_run_complete(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload the first 50 samples of fhswf/german_handwriting
  pngx-upload --url http://localhost:8000 --token your_token_here

  # Only 25 samples
  pngx-upload --url https://paperless.example.com --token abc123 --max 25

  # Resume later in the dataset
  pngx-upload --url http://localhost:8000 --token abc123 --start 100 --max 50

  # Assign document type, correspondent and tags
  pngx-upload --url http://localhost:8000 --token abc123 --document-type 2 --correspondent 5 --tag 1 --tag 4

  # Test the connection only
  pngx-upload --url http://localhost:8000 --token abc123 --dry-run

  # Upload a local directory of images with .txt transcriptions
  pngx-upload --url http://localhost:8000 --token abc123 --dataset-dir ./scans

SUGGESTED TAGS (create them in Paperless-NGX and pass their ids with --tag):
  German Handwriting, FHSWF Dataset, Machine Learning, Training Data,
  Handwriting Recognition

ENVIRONMENT VARIABLES:
  PNGX_URL        Paperless-NGX base URL
  PNGX_TOKEN      Paperless-NGX API token
  RUST_LOG        Override log filter (e.g. pngx_upload=debug)
"#;

/// Upload a handwriting dataset to Paperless-NGX.
#[derive(Parser, Debug)]
#[command(
    name = "pngx-upload",
    version,
    about = "Upload image/transcription dataset samples to Paperless-NGX",
    long_about = "Download samples of a Hugging Face image/text dataset (default: \
fhswf/german_handwriting) or read them from a local directory, convert each image to JPEG \
and upload it as a document to a running Paperless-NGX instance, titled after its \
transcription.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Paperless-NGX base URL (e.g. http://localhost:8000).
    #[arg(long, env = "PNGX_URL")]
    url: String,

    /// Paperless-NGX API token.
    #[arg(long, env = "PNGX_TOKEN", hide_env_values = true)]
    token: String,

    /// Maximum number of samples to upload.
    #[arg(long, env = "PNGX_MAX", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    max: u64,

    /// Starting index in the dataset.
    #[arg(long, env = "PNGX_START", default_value_t = 0)]
    start: usize,

    /// Samples per logged batch.
    #[arg(long, env = "PNGX_BATCH_SIZE", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Document type id to assign to uploaded documents.
    #[arg(long, env = "PNGX_DOCUMENT_TYPE")]
    document_type: Option<u32>,

    /// Correspondent id to assign to uploaded documents.
    #[arg(long, env = "PNGX_CORRESPONDENT")]
    correspondent: Option<u32>,

    /// Tag id to assign to uploaded documents (repeatable).
    #[arg(long = "tag", env = "PNGX_TAGS", value_delimiter = ',')]
    tags: Vec<u32>,

    /// Test the connection only; skip dataset download and uploads.
    #[arg(long, env = "PNGX_DRY_RUN")]
    dry_run: bool,

    /// Hugging Face dataset id.
    #[arg(long, env = "PNGX_DATASET", default_value = pngx_upload::config::DEFAULT_DATASET)]
    dataset: String,

    /// Dataset split.
    #[arg(long, env = "PNGX_SPLIT", default_value = "train")]
    split: String,

    /// Dataset config name.
    #[arg(long, env = "PNGX_DATASET_CONFIG", default_value = "default")]
    dataset_config: String,

    /// Read samples from this directory instead of the hub.
    #[arg(long, env = "PNGX_DATASET_DIR", conflicts_with = "dataset")]
    dataset_dir: Option<PathBuf>,

    /// Datasets-server rows API root.
    #[arg(long, env = "PNGX_HUB_ENDPOINT", default_value = pngx_upload::config::DEFAULT_HUB_ENDPOINT)]
    hub_endpoint: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PNGX_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Pause after each sample, in milliseconds.
    #[arg(long, default_value_t = 100)]
    item_delay_ms: u64,

    /// Pause between batches, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    batch_pause_ms: u64,

    /// After the summary, query the consumption status of every uploaded task.
    #[arg(long)]
    check_tasks: bool,

    /// Disable progress bar.
    #[arg(long, env = "PNGX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PNGX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PNGX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs; errors still show.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !cli.quiet {
        print_banner(&cli);
    }

    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn UploadProgressCallback>);

    let abort_progress = || {
        if let Some(cb) = &cli_progress {
            cb.abort();
        }
    };

    let config = build_config(&cli, progress_cb).inspect_err(|_| abort_progress())?;

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = upload_dataset(&config)
        .await
        .inspect_err(|_| abort_progress())
        .context("Upload aborted")?;

    match outcome {
        RunOutcome::DryRun(status) => {
            if status.reachable {
                eprintln!("{} Connection test successful ({})", green("✓"), status.detail);
                eprintln!("{} Ready to upload documents (remove --dry-run to proceed)", green("✓"));
            } else {
                eprintln!("{} Connection test failed: {}", red("✗"), status.detail);
            }
        }
        RunOutcome::Completed(summary) => {
            if !cli.quiet {
                print_summary(&summary);
            }
            if cli.check_tasks && !summary.task_ids.is_empty() {
                report_tasks(&config, &summary).await?;
            }
        }
    }

    Ok(())
}

/// Map CLI args to `UploadConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<UploadConfig> {
    let dataset = match cli.dataset_dir {
        Some(ref dir) => DatasetLocation::Local(dir.clone()),
        None => DatasetLocation::Hub {
            dataset: cli.dataset.clone(),
            config: cli.dataset_config.clone(),
            split: cli.split.clone(),
            endpoint: cli.hub_endpoint.clone(),
            image_column: "image".to_string(),
            text_column: "text".to_string(),
        },
    };

    let mut builder = UploadConfig::builder(&cli.url, &cli.token)
        .max_count(usize::try_from(cli.max).context("--max is too large")?)
        .start_index(cli.start)
        .batch_size(usize::try_from(cli.batch_size).context("--batch-size is too large")?)
        .document_type(cli.document_type)
        .correspondent(cli.correspondent)
        .tags(cli.tags.clone())
        .dry_run(cli.dry_run)
        .dataset(dataset)
        .request_timeout_secs(cli.timeout)
        .item_delay_ms(cli.item_delay_ms)
        .batch_pause_ms(cli.batch_pause_ms);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_banner(cli: &Cli) {
    eprintln!("{}", bold("Dataset → Paperless-NGX Uploader"));
    eprintln!("{}", "=".repeat(60));
    eprintln!("Paperless-NGX URL:    {}", cli.url);
    eprintln!("API token:            {}", mask_token(&cli.token));
    match cli.dataset_dir {
        Some(ref dir) => eprintln!("Dataset:              {}", dir.display()),
        None => eprintln!("Dataset:              {} ({})", cli.dataset, cli.split),
    }
    eprintln!("Samples to process:   {}", cli.max);
    eprintln!("Starting index:       {}", cli.start);
    eprintln!("Batch size:           {}", cli.batch_size);
    if let Some(id) = cli.document_type {
        eprintln!("Document type id:     {id}");
    }
    if let Some(id) = cli.correspondent {
        eprintln!("Correspondent id:     {id}");
    }
    if !cli.tags.is_empty() {
        let tags: Vec<String> = cli.tags.iter().map(|t| t.to_string()).collect();
        eprintln!("Tag ids:              {}", tags.join(", "));
    }
    eprintln!("Dry run:              {}", if cli.dry_run { "yes" } else { "no" });
    eprintln!();
}

fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!("{}", "=".repeat(60));
    eprintln!("{}", bold("UPLOAD COMPLETED"));
    eprintln!("{}", "=".repeat(60));
    eprintln!("Samples processed:    {}", summary.attempted);
    eprintln!("Successful uploads:   {}", green(&summary.succeeded.to_string()));
    eprintln!(
        "Failed uploads:       {}",
        if summary.failed > 0 {
            red(&summary.failed.to_string())
        } else {
            summary.failed.to_string()
        }
    );
    eprintln!("Success rate:         {:.1}%", summary.success_rate());

    if summary.succeeded > 0 {
        eprintln!();
        eprintln!("Documents should appear in your Paperless-NGX instance shortly.");
        eprintln!("Check the Tasks page in Paperless-NGX for consumption status.");
    }
}

/// Look up each uploaded task once and print its status.
async fn report_tasks(config: &UploadConfig, summary: &RunSummary) -> Result<()> {
    let client = PaperlessClient::new(&config.base_url, &config.token, config.request_timeout_secs)
        .context("Failed to create HTTP client")?;

    eprintln!();
    eprintln!("{}", bold("Task status"));
    for task_id in &summary.task_ids {
        match client.task_status(task_id).await {
            Ok(Some(task)) => eprintln!(
                "  {}  {:<8} {}",
                dim(task_id),
                task.status,
                task.result.as_deref().unwrap_or("")
            ),
            Ok(None) => eprintln!("  {}  {}", dim(task_id), cyan("unknown")),
            Err(e) => eprintln!("  {}  {}", dim(task_id), red(&e.to_string())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["pngx-upload", "--url", "http://localhost:8000/", "--token", "abc123"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn defaults_map_to_hub_config() {
        let config = build_config(&parse(&[]), None).expect("valid config");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.max_count, 50);
        assert_eq!(config.batch_size, 10);
        assert!(!config.dry_run);
        assert_eq!(config.dataset.name(), "fhswf/german_handwriting (train)");
    }

    #[test]
    fn flags_map_to_config() {
        let cli = parse(&[
            "--max", "25", "--start", "100", "--batch-size", "5", "--document-type", "2",
            "--correspondent", "7", "--tag", "1,4", "--tag", "9", "--dataset-dir", "./scans",
            "--dry-run",
        ]);
        let config = build_config(&cli, None).expect("valid config");
        assert_eq!(config.max_count, 25);
        assert_eq!(config.start_index, 100);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.document_type, Some(2));
        assert_eq!(config.correspondent, Some(7));
        assert_eq!(config.tags, vec![1, 4, 9]);
        assert!(config.dry_run);
        assert_eq!(config.dataset, DatasetLocation::Local(PathBuf::from("./scans")));
    }

    #[test]
    fn zero_max_and_zero_batch_are_rejected() {
        let base = ["pngx-upload", "--url", "http://x", "--token", "t"];
        for extra in [["--max", "0"], ["--batch-size", "0"]] {
            let argv: Vec<&str> = base.iter().chain(extra.iter()).copied().collect();
            assert!(Cli::try_parse_from(argv).is_err(), "accepted {extra:?}");
        }
    }

    #[test]
    fn dataset_dir_conflicts_with_dataset() {
        let argv = [
            "pngx-upload", "--url", "http://x", "--token", "t", "--dataset", "a/b",
            "--dataset-dir", "./scans",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn non_http_url_fails_config() {
        let argv = ["pngx-upload", "--url", "localhost:8000", "--token", "t"];
        let cli = Cli::try_parse_from(argv).expect("clap accepts any string");
        assert!(build_config(&cli, None).is_err());
    }

    #[test]
    fn abort_clears_unfinished_bar() {
        let cb = CliProgressCallback::new_dynamic();
        assert!(!cb.bar.is_finished());
        cb.abort();
        assert!(cb.bar.is_finished());
        // A second call after completion is a no-op.
        cb.abort();
    }
}
