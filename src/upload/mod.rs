//! Getting a recording to the analysis backend.
//!
//! This module provides:
//! * [`FileValidator`]: size and MIME-type checks matching the backend's limits.
//! * [`prepare_upload`]: compress-if-needed with fallback to the original.
//! * [`AnalysisUploader`] / [`HttpUploader`]: multipart POST to the endpoint.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use meeting_audio::audio::RawAudio;
//! use meeting_audio::compress::{CompressionOptions, Compressor};
//! use meeting_audio::config::AppConfig;
//! use meeting_audio::upload::{
//!     prepare_upload_async, AnalysisUploader, FileValidator, HttpUploader,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let audio = RawAudio::from_path("standup.wav")?;
//!
//!     FileValidator::from_config(&config.upload)
//!         .validate("standup.wav", audio.size_bytes, &audio.mime_type)?;
//!
//!     let options = CompressionOptions::from(&config.compression);
//!     let prepared =
//!         prepare_upload_async(&Compressor::new(), audio, "standup.wav", options).await;
//!
//!     let analysis = HttpUploader::from_config(&config.upload)
//!         .upload(&prepared, None)
//!         .await?;
//!     println!("{analysis}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod prepare;
pub mod validate;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{AnalysisUploader, HttpUploader, UploadError};
pub use prepare::{
    prepare_upload, prepare_upload_async, replace_extension, CompressionOutcome, PreparedUpload,
};
pub use validate::{FileDetails, FileValidator, ValidationError, ALLOWED_MIME_TYPES};
