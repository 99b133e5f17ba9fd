//! Meeting-recording compression and upload.
//!
//! Raw recordings (WAV, FLAC, PCM, ...) are decoded, downmixed, downsampled
//! and re-encoded as constant-bitrate MP3 before being sent to the analysis
//! backend.  Already-compact formats pass through untouched, and any
//! compression failure falls back to uploading the original.

pub mod audio;
pub mod compress;
pub mod config;
pub mod upload;
