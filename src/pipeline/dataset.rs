//! Dataset sources: ordered, random-access (image, transcription) records.
//!
//! A run reads samples strictly by index, so a source only has to report its
//! length and fetch one record at a time. Three sources ship with the crate:
//!
//! * [`HubDataset`] — a Hugging Face dataset through the datasets-server
//!   rows API. Rows are fetched a page at a time and image bytes are
//!   downloaded from the `src` URL the server hands out.
//! * [`LocalDataset`] — a directory of `*.png` / `*.jpg` files, each with an
//!   optional sibling `<stem>.txt` transcription.
//! * `Vec<Sample>` — an in-memory source for library callers and tests.
//!
//! Opening a source is the only fatal step ([`UploadError::DatasetLoad`]);
//! failing to read a single record is a [`SampleError::Fetch`].

use crate::config::DatasetLocation;
use crate::error::{SampleError, UploadError};
use crate::output::Sample;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Rows requested per datasets-server call (the server's maximum).
pub const HUB_PAGE_SIZE: usize = 100;

/// File extensions picked up by [`LocalDataset`].
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// An indexable, read-only sequence of samples.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Human-readable name for log lines.
    fn name(&self) -> String;

    /// Number of records in the source.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the record at 0-based `index`.
    async fn fetch(&self, index: usize) -> Result<Sample, SampleError>;
}

/// Open the source described by `location`.
pub async fn open(
    location: &DatasetLocation,
    timeout_secs: u64,
) -> Result<Box<dyn DatasetSource>, UploadError> {
    match location {
        DatasetLocation::Hub { .. } => Ok(Box::new(HubDataset::open(location, timeout_secs).await?)),
        DatasetLocation::Local(dir) => Ok(Box::new(LocalDataset::open(dir)?)),
    }
}

// ── In-memory ────────────────────────────────────────────────────────────

#[async_trait]
impl DatasetSource for Vec<Sample> {
    fn name(&self) -> String {
        "in-memory".to_string()
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    async fn fetch(&self, index: usize) -> Result<Sample, SampleError> {
        self.as_slice()
            .get(index)
            .cloned()
            .ok_or_else(|| SampleError::Fetch {
                index,
                detail: format!("index out of range (len {})", self.as_slice().len()),
            })
    }
}

// ── Local directory ──────────────────────────────────────────────────────

/// Image files in one directory, ordered by file name.
#[derive(Debug)]
pub struct LocalDataset {
    root: PathBuf,
    images: Vec<PathBuf>,
}

impl LocalDataset {
    /// List the image files under `dir`. Subdirectories are ignored.
    pub fn open(dir: &Path) -> Result<Self, UploadError> {
        let load_err = |reason: String| UploadError::DatasetLoad {
            source_name: dir.display().to_string(),
            reason,
        };

        let entries = std::fs::read_dir(dir).map_err(|e| load_err(e.to_string()))?;
        let mut images = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| load_err(e.to_string()))?.path();
            if path.is_file() && is_image(&path) {
                images.push(path);
            }
        }
        images.sort();

        info!("Found {} images in {}", images.len(), dir.display());
        Ok(Self {
            root: dir.to_path_buf(),
            images,
        })
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl DatasetSource for LocalDataset {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    fn len(&self) -> usize {
        self.images.len()
    }

    async fn fetch(&self, index: usize) -> Result<Sample, SampleError> {
        let fetch_err = |detail: String| SampleError::Fetch { index, detail };

        let path = self
            .images
            .get(index)
            .ok_or_else(|| fetch_err(format!("index out of range (len {})", self.images.len())))?;

        let image = tokio::fs::read(path)
            .await
            .map_err(|e| fetch_err(format!("{}: {e}", path.display())))?;

        let text_path = path.with_extension("txt");
        let text = match tokio::fs::read_to_string(&text_path).await {
            Ok(t) => t.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(fetch_err(format!("{}: {e}", text_path.display()))),
        };

        Ok(Sample { index, image, text })
    }
}

// ── Hugging Face datasets-server ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RowsResponse {
    rows: Vec<HubRow>,
    num_rows_total: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct HubRow {
    row_idx: usize,
    row: Map<String, Value>,
}

/// A hub dataset read through the datasets-server `/rows` endpoint.
pub struct HubDataset {
    client: reqwest::Client,
    endpoint: String,
    dataset: String,
    config: String,
    split: String,
    image_column: String,
    text_column: String,
    total: usize,
    /// Most recently fetched page: (offset, rows).
    page: Mutex<Option<(usize, Vec<HubRow>)>>,
}

impl HubDataset {
    /// Connect to the rows API and learn the split's length.
    ///
    /// `location` must be [`DatasetLocation::Hub`].
    pub async fn open(location: &DatasetLocation, timeout_secs: u64) -> Result<Self, UploadError> {
        let DatasetLocation::Hub {
            dataset,
            config,
            split,
            endpoint,
            image_column,
            text_column,
        } = location
        else {
            return Err(UploadError::Internal(format!(
                "HubDataset::open called with non-hub location {}",
                location.name()
            )));
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| UploadError::Http(e.to_string()))?;

        let mut source = Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            dataset: dataset.clone(),
            config: config.clone(),
            split: split.clone(),
            image_column: image_column.clone(),
            text_column: text_column.clone(),
            total: 0,
            page: Mutex::new(None),
        };

        info!("Loading dataset {} from {}", location.name(), source.endpoint);
        let probe = source
            .rows(0, 1)
            .await
            .map_err(|reason| UploadError::DatasetLoad {
                source_name: location.name(),
                reason,
            })?;
        source.total = probe.num_rows_total;
        info!("Dataset loaded: {} samples", source.total);

        Ok(source)
    }

    async fn rows(&self, offset: usize, length: usize) -> Result<RowsResponse, String> {
        let url = format!("{}/rows", self.endpoint);
        let offset = offset.to_string();
        let length = length.to_string();
        debug!("GET {} offset={} length={}", url, offset, length);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("dataset", self.dataset.as_str()),
                ("config", self.config.as_str()),
                ("split", self.split.as_str()),
                ("offset", offset.as_str()),
                ("length", length.as_str()),
            ])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {status}: {}", body.trim()));
        }

        response
            .json::<RowsResponse>()
            .await
            .map_err(|e| format!("unexpected rows response: {e}"))
    }

    /// Row at `index`, served from the cached page when possible.
    async fn row(&self, index: usize) -> Result<HubRow, String> {
        let page_offset = index / HUB_PAGE_SIZE * HUB_PAGE_SIZE;

        if let Ok(cached) = self.page.lock() {
            if let Some((offset, rows)) = cached.as_ref() {
                if *offset == page_offset {
                    if let Some(row) = rows.iter().find(|r| r.row_idx == index) {
                        return Ok(row.clone());
                    }
                }
            }
        }

        let page = self.rows(page_offset, HUB_PAGE_SIZE).await?;
        let row = page
            .rows
            .iter()
            .find(|r| r.row_idx == index)
            .cloned()
            .ok_or_else(|| format!("row {index} missing from page at offset {page_offset}"))?;

        if let Ok(mut cached) = self.page.lock() {
            *cached = Some((page_offset, page.rows));
        }
        Ok(row)
    }

    async fn download_image(&self, src: &str) -> Result<Vec<u8>, String> {
        let response = self.client.get(src).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("image download failed: HTTP {status}"));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(bytes.to_vec())
    }
}

/// Extract the image URL from a datasets-server image cell.
///
/// Image cells are objects `{"src": "...", "height": .., "width": ..}`; a
/// bare string is accepted as a URL too.
fn image_src(cell: &Value) -> Option<&str> {
    match cell {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj.get("src").and_then(Value::as_str),
        _ => None,
    }
}

#[async_trait]
impl DatasetSource for HubDataset {
    fn name(&self) -> String {
        format!("{} ({})", self.dataset, self.split)
    }

    fn len(&self) -> usize {
        self.total
    }

    async fn fetch(&self, index: usize) -> Result<Sample, SampleError> {
        let fetch_err = |detail: String| SampleError::Fetch { index, detail };

        let row = self.row(index).await.map_err(fetch_err)?;
        let src = row
            .row
            .get(&self.image_column)
            .and_then(image_src)
            .ok_or_else(|| fetch_err(format!("column '{}' has no image URL", self.image_column)))?;
        let image = self.download_image(src).await.map_err(fetch_err)?;

        let text = row
            .row
            .get(&self.text_column)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Sample { index, image, text })
    }
}
