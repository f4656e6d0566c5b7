//! Configuration types for an upload run.
//!
//! All run behaviour is controlled through [`UploadConfig`], built via its
//! [`UploadConfigBuilder`]. One value is created at startup and threaded by
//! reference through every step; there is no process-wide mutable state.

use crate::error::UploadError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Hugging Face dataset uploaded when no other source is configured.
pub const DEFAULT_DATASET: &str = "fhswf/german_handwriting";

/// Public rows API of the Hugging Face datasets server.
pub const DEFAULT_HUB_ENDPOINT: &str = "https://datasets-server.huggingface.co";

/// Configuration for one upload run.
///
/// Built via [`UploadConfig::builder()`].
///
/// # Example
/// ```rust
/// use pngx_upload::UploadConfig;
///
/// let config = UploadConfig::builder("http://localhost:8000", "0123456789abcdef")
///     .max_count(25)
///     .batch_size(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_count, 25);
/// ```
#[derive(Clone)]
pub struct UploadConfig {
    /// Paperless-NGX base URL, without trailing slash.
    pub base_url: String,

    /// API token sent as `Authorization: Token <token>`.
    pub token: String,

    /// Number of dataset samples to attempt. Default: 50.
    pub max_count: usize,

    /// First dataset index to process. Default: 0.
    ///
    /// Re-running with a later start index is the only way to resume an
    /// interrupted upload; nothing is checkpointed.
    pub start_index: usize,

    /// Samples per logged batch. Default: 10.
    pub batch_size: usize,

    /// Document type id attached to every upload.
    pub document_type: Option<u32>,

    /// Correspondent id attached to every upload.
    pub correspondent: Option<u32>,

    /// Tag ids attached to every upload.
    pub tags: Vec<u32>,

    /// Only check connectivity; skip dataset load and uploads.
    pub dry_run: bool,

    /// Where samples come from. Default: the `fhswf/german_handwriting` hub dataset.
    pub dataset: DatasetLocation,

    /// Per-request timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Pause after each sample in milliseconds. Default: 100.
    pub item_delay_ms: u64,

    /// Pause between batches in milliseconds. Default: 1000.
    pub batch_pause_ms: u64,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("base_url", &self.base_url)
            .field("token", &mask_token(&self.token))
            .field("max_count", &self.max_count)
            .field("start_index", &self.start_index)
            .field("batch_size", &self.batch_size)
            .field("document_type", &self.document_type)
            .field("correspondent", &self.correspondent)
            .field("tags", &self.tags)
            .field("dry_run", &self.dry_run)
            .field("dataset", &self.dataset)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("item_delay_ms", &self.item_delay_ms)
            .field("batch_pause_ms", &self.batch_pause_ms)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl UploadConfig {
    /// Create a new builder. URL and token are the only required settings.
    pub fn builder(base_url: impl Into<String>, token: impl Into<String>) -> UploadConfigBuilder {
        let base_url: String = base_url.into();
        UploadConfigBuilder {
            config: UploadConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: token.into(),
                max_count: 50,
                start_index: 0,
                batch_size: 10,
                document_type: None,
                correspondent: None,
                tags: Vec::new(),
                dry_run: false,
                dataset: DatasetLocation::default(),
                request_timeout_secs: 30,
                item_delay_ms: 100,
                batch_pause_ms: 1000,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn max_count(mut self, n: usize) -> Self {
        self.config.max_count = n;
        self
    }

    pub fn start_index(mut self, index: usize) -> Self {
        self.config.start_index = index;
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    pub fn document_type(mut self, id: Option<u32>) -> Self {
        self.config.document_type = id;
        self
    }

    pub fn correspondent(mut self, id: Option<u32>) -> Self {
        self.config.correspondent = id;
        self
    }

    pub fn tags(mut self, tags: Vec<u32>) -> Self {
        self.config.tags = tags;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    pub fn dataset(mut self, location: DatasetLocation) -> Self {
        self.config.dataset = location;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn item_delay_ms(mut self, ms: u64) -> Self {
        self.config.item_delay_ms = ms;
        self
    }

    pub fn batch_pause_ms(mut self, ms: u64) -> Self {
        self.config.batch_pause_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, UploadError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(UploadError::InvalidConfig(format!(
                "URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.token.trim().is_empty() {
            return Err(UploadError::InvalidConfig("API token must not be empty".into()));
        }
        if c.max_count == 0 {
            return Err(UploadError::InvalidConfig(
                "Max count must be a positive number".into(),
            ));
        }
        if c.batch_size == 0 {
            return Err(UploadError::InvalidConfig("Batch size must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Dataset location ─────────────────────────────────────────────────────

/// Where the samples of a run are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    /// A dataset served by the Hugging Face datasets-server rows API.
    Hub {
        /// Repository id, e.g. `fhswf/german_handwriting`.
        dataset: String,
        /// Dataset config name, usually `default`.
        config: String,
        split: String,
        /// Rows API root; overridable for mirrors and tests.
        endpoint: String,
        image_column: String,
        text_column: String,
    },
    /// A directory of image files with optional sibling `.txt` transcriptions.
    Local(PathBuf),
}

impl Default for DatasetLocation {
    fn default() -> Self {
        DatasetLocation::hub(DEFAULT_DATASET, "train")
    }
}

impl DatasetLocation {
    /// A hub dataset with the public endpoint and the default column names.
    pub fn hub(dataset: impl Into<String>, split: impl Into<String>) -> Self {
        DatasetLocation::Hub {
            dataset: dataset.into(),
            config: "default".to_string(),
            split: split.into(),
            endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            image_column: "image".to_string(),
            text_column: "text".to_string(),
        }
    }

    /// Short human-readable name for log lines and errors.
    pub fn name(&self) -> String {
        match self {
            DatasetLocation::Hub { dataset, split, .. } => format!("{dataset} ({split})"),
            DatasetLocation::Local(path) => path.display().to_string(),
        }
    }
}

/// Mask all but the last 8 characters of a token; short tokens are masked fully.
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len > 8 {
        let tail: String = token.chars().skip(len - 8).collect();
        format!("{}{}", "*".repeat(len - 8), tail)
    } else {
        "*".repeat(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let c = UploadConfig::builder("http://localhost:8000/", "secret-token")
            .build()
            .expect("valid config");
        assert_eq!(c.base_url, "http://localhost:8000");
        assert_eq!(c.max_count, 50);
        assert_eq!(c.start_index, 0);
        assert_eq!(c.batch_size, 10);
        assert!(!c.dry_run);
        assert_eq!(c.dataset, DatasetLocation::hub(DEFAULT_DATASET, "train"));
    }

    #[test]
    fn rejects_non_http_url() {
        let err = UploadConfig::builder("localhost:8000", "t").build().unwrap_err();
        assert!(err.to_string().contains("http://"), "got: {err}");
    }

    #[test]
    fn rejects_zero_max_and_zero_batch() {
        assert!(UploadConfig::builder("http://x", "t").max_count(0).build().is_err());
        assert!(UploadConfig::builder("http://x", "t").batch_size(0).build().is_err());
    }

    #[test]
    fn rejects_blank_token() {
        assert!(UploadConfig::builder("http://x", "  ").build().is_err());
    }

    #[test]
    fn mask_token_keeps_last_eight() {
        assert_eq!(mask_token("abcdefghijkl"), "****efghijkl");
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn debug_output_hides_token() {
        let c = UploadConfig::builder("http://x", "supersecretvalue123")
            .build()
            .expect("valid config");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("supersecret"), "got: {dbg}");
        assert!(dbg.contains("value123"), "got: {dbg}");
    }

    #[test]
    fn debug_output_includes_delays() {
        let c = UploadConfig::builder("http://x", "token")
            .item_delay_ms(250)
            .batch_pause_ms(4000)
            .build()
            .expect("valid config");
        let dbg = format!("{c:?}");
        assert!(dbg.contains("item_delay_ms: 250"), "got: {dbg}");
        assert!(dbg.contains("batch_pause_ms: 4000"), "got: {dbg}");
    }
}
