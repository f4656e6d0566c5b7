//! Per-sample pipeline stages.
//!
//! Each submodule implements exactly one step of turning a dataset record
//! into an upload request, so each is independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! dataset ──▶ normalize ──▶ title ──▶ client::upload
//! (record)    (JPEG)        (title,   (multipart POST)
//!                            filename)
//! ```
//!
//! 1. [`dataset`]   — random access to (image, text) records; hub or local
//! 2. [`normalize`] — decode any supported image and re-encode as RGB JPEG
//! 3. [`title`]     — document title from the transcription, plus file name

pub mod dataset;
pub mod normalize;
pub mod title;
