//! Packaging encoded bytes into a [`CompressionResult`].

use bytes::Bytes;
use serde::Serialize;

use crate::audio::RawAudio;

/// Encoded bytes plus the MIME type they should be uploaded with.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlob {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// Outcome of one `compress` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub compressed_blob: AudioBlob,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    /// `original / compressed`; `1.0` when either size is zero.
    pub compression_ratio: f64,
}

/// Size statistics of a [`CompressionResult`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionStats {
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    pub compression_ratio: f64,
}

impl CompressionResult {
    /// Result for a blob the classifier skipped: same bytes (shared, not
    /// copied), ratio 1.0.
    pub fn passthrough(audio: &RawAudio) -> Self {
        Self {
            compressed_blob: AudioBlob {
                bytes: audio.bytes.clone(),
                mime_type: audio.mime_type.clone(),
            },
            original_size_bytes: audio.size_bytes,
            compressed_size_bytes: audio.size_bytes,
            compression_ratio: 1.0,
        }
    }

    pub fn stats(&self) -> CompressionStats {
        CompressionStats {
            original_size_bytes: self.original_size_bytes,
            compressed_size_bytes: self.compressed_size_bytes,
            compression_ratio: self.compression_ratio,
        }
    }
}

impl std::fmt::Display for CompressionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({:.2}x, {})",
            format_file_size(self.original_size_bytes),
            format_file_size(self.compressed_size_bytes),
            self.compression_ratio,
            self.compressed_blob.mime_type
        )
    }
}

/// Wrap encoded bytes and compute size statistics.
///
/// ```
/// use meeting_audio::compress::package;
///
/// let result = package(vec![0u8; 250], "audio/mpeg", 1_000);
/// assert_eq!(result.compressed_size_bytes, 250);
/// assert!((result.compression_ratio - 4.0).abs() < 1e-9);
/// ```
pub fn package(encoded: Vec<u8>, mime_type: &str, original_size: u64) -> CompressionResult {
    let compressed_size = encoded.len() as u64;
    let compression_ratio = if compressed_size == 0 || original_size == 0 {
        1.0
    } else {
        original_size as f64 / compressed_size as f64
    };

    CompressionResult {
        compressed_blob: AudioBlob {
            bytes: Bytes::from(encoded),
            mime_type: mime_type.to_string(),
        },
        original_size_bytes: original_size,
        compressed_size_bytes: compressed_size,
        compression_ratio,
    }
}

/// Human-readable size in base-1024 units: `"0 Bytes"`, `"1.5 KB"`, `"2 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
