//! Audio compression pipeline for meeting uploads.
//!
//! * [`should_compress`] / [`ClassifierPolicy`]: skip blobs that are already compact.
//! * [`CompressionOptions`]: target bitrate, rate, channels, quality.
//! * [`Compressor`]: decode → downmix → resample → MP3 encode → package.
//! * [`CompressionResult`]: encoded blob plus size statistics.
//! * [`CompressError`]: configuration, decode, and encode failures.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use meeting_audio::audio::RawAudio;
//! use meeting_audio::compress::{CompressionOptions, Compressor};
//!
//! let audio = RawAudio::from_path("all-hands.wav").unwrap();
//! let compressor = Compressor::new();
//!
//! match compressor.compress(&audio, &CompressionOptions::default()) {
//!     Ok(result) => println!("compressed: {result}"),
//!     Err(e) => eprintln!("compression failed, upload the original: {e}"),
//! }
//! ```

pub mod classify;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod result;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use classify::{should_compress, ClassifierPolicy, DEFAULT_MAX_SIZE_BYTES};
pub use error::CompressError;
pub use options::{CompressionOptions, ConfigurationError};
pub use pipeline::Compressor;
pub use result::{format_file_size, package, AudioBlob, CompressionResult, CompressionStats};
