//! Decide whether a blob is worth re-encoding.

use crate::audio::{MediaKind, RawAudio};
use crate::config::ClassifierConfig;

/// Default size threshold: 50 MiB.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Skip rules for the classifier.
///
/// Oversized blobs and lossless containers are always compressed; lossy
/// containers under the threshold are always skipped.  Only well-formed but
/// unrecognised MIME types are governed by `compress_unknown_types`.  Empty
/// or malformed types always compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierPolicy {
    pub max_size_bytes: u64,
    pub compress_unknown_types: bool,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            compress_unknown_types: true,
        }
    }
}

impl From<&ClassifierConfig> for ClassifierPolicy {
    fn from(cfg: &ClassifierConfig) -> Self {
        Self {
            max_size_bytes: cfg.max_size_bytes,
            compress_unknown_types: cfg.compress_unknown_types,
        }
    }
}

impl ClassifierPolicy {
    /// `true` when `audio` should go through the compression pipeline.
    pub fn should_compress(&self, audio: &RawAudio) -> bool {
        if audio.size_bytes > self.max_size_bytes {
            return true;
        }
        match audio.kind() {
            MediaKind::Lossless => true,
            MediaKind::Lossy => false,
            MediaKind::Malformed => true,
            MediaKind::Unknown => self.compress_unknown_types,
        }
    }
}

/// Classifier with the default policy and an explicit size threshold.
///
/// ```
/// use meeting_audio::audio::RawAudio;
/// use meeting_audio::compress::should_compress;
///
/// let small_mp3 = RawAudio::new(vec![0_u8; 1024], "audio/mpeg");
/// assert!(!should_compress(&small_mp3, 50 * 1024 * 1024));
///
/// let wav = RawAudio::new(vec![0_u8; 1024], "audio/wav");
/// assert!(should_compress(&wav, 50 * 1024 * 1024));
/// ```
pub fn should_compress(audio: &RawAudio, max_size_bytes: u64) -> bool {
    ClassifierPolicy {
        max_size_bytes,
        ..Default::default()
    }
    .should_compress(audio)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
