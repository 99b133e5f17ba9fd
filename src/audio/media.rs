//! Raw audio blobs and media-type classification.
//!
//! [`RawAudio`] is the opaque input to the compression pipeline: the bytes a
//! recording or upload produced, the declared MIME type, and the declared
//! size.  [`MediaKind::of`] sorts a MIME type into lossless, lossy, or
//! unknown so the classifier can decide whether re-encoding is worthwhile.
//!
//! | Kind      | Examples                                                  |
//! |-----------|-----------------------------------------------------------|
//! | Lossless  | `audio/wav`, `audio/x-wav`, `audio/flac`, `audio/pcm`     |
//! | Lossy     | `audio/mpeg`, `audio/webm;codecs=opus`, `application/ogg` |
//! | Unknown   | `application/octet-stream`, `audio/x-custom`              |
//! | Malformed | `""`, `"garbage"`, `"audio/"`                             |

use std::path::Path;

use bytes::Bytes;

/// MIME type written on every MP3 produced by the pipeline.
pub const MP3_MIME_TYPE: &str = "audio/mpeg";

/// Fallback MIME type when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Substrings that mark an uncompressed or lossless container.
const LOSSLESS_MARKERS: &[&str] = &["wav", "wave", "flac", "pcm", "aiff", "l16"];

/// Subtypes of lossy containers that must not be re-encoded.
const LOSSY_SUBTYPES: &[&str] = &[
    "mp3", "mpeg", "mpeg3", "x-mp3", "mpga", "aac", "x-aac", "m4a", "x-m4a", "mp4", "opus",
    "x-opus", "ogg", "x-ogg", "webm", "x-webm",
];

// ---------------------------------------------------------------------------
// RawAudio
// ---------------------------------------------------------------------------

/// An encoded audio blob as captured or uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAudio {
    /// Container bytes, untouched.  Cloning is cheap.
    pub bytes: Bytes,
    /// Declared MIME type, possibly with parameters (`audio/webm;codecs=opus`).
    pub mime_type: String,
    /// Declared size in bytes.  Normally `bytes.len()`.
    pub size_bytes: u64,
}

impl RawAudio {
    /// Wrap `bytes` with a declared MIME type; the size is taken from the bytes.
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        let size_bytes = bytes.len() as u64;
        Self {
            bytes,
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Read a file from disk and derive its MIME type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(mime_from_extension)
            .unwrap_or(OCTET_STREAM);
        Ok(Self::new(bytes, mime))
    }

    /// Classification of the declared MIME type.
    pub fn kind(&self) -> MediaKind {
        MediaKind::of(&self.mime_type)
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Coarse compression class of a declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Uncompressed or lossless audio; re-encoding to MP3 saves space.
    Lossless,
    /// Already lossy and compact; re-encoding wastes CPU and quality.
    Lossy,
    /// Well-formed `type/subtype` that is not recognised.
    Unknown,
    /// Empty or not of the form `type/subtype`.
    Malformed,
}

impl MediaKind {
    /// Classify a MIME type string.
    ///
    /// ```
    /// use meeting_audio::audio::MediaKind;
    ///
    /// assert_eq!(MediaKind::of("audio/x-wav"), MediaKind::Lossless);
    /// assert_eq!(MediaKind::of("audio/webm;codecs=opus"), MediaKind::Lossy);
    /// assert_eq!(MediaKind::of(""), MediaKind::Malformed);
    /// ```
    pub fn of(mime_type: &str) -> Self {
        let Some(base) = base_mime_type(mime_type) else {
            return MediaKind::Malformed;
        };
        let Some((top, sub)) = base.split_once('/') else {
            return MediaKind::Malformed;
        };

        if top.is_empty() || sub.is_empty() {
            return MediaKind::Malformed;
        }

        if LOSSLESS_MARKERS.iter().any(|m| sub.contains(m)) {
            return MediaKind::Lossless;
        }

        let lossy_container = top == "audio" || top == "video" || base == "application/ogg";
        if lossy_container && LOSSY_SUBTYPES.contains(&sub) {
            return MediaKind::Lossy;
        }

        MediaKind::Unknown
    }
}

/// Strip parameters and normalise case: `" Audio/WebM; codecs=opus"` →
/// `"audio/webm"`.  Returns `None` when nothing is left.
pub fn base_mime_type(mime_type: &str) -> Option<String> {
    let base = mime_type.split(';').next().unwrap_or("").trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_ascii_lowercase())
    }
}

/// Best-guess MIME type for a file extension (case-insensitive).
pub fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "wav" | "wave" => "audio/wav",
        "flac" => "audio/flac",
        "pcm" => "audio/pcm",
        "aif" | "aiff" => "audio/aiff",
        "mp3" => MP3_MIME_TYPE,
        "m4a" => "audio/m4a",
        "aac" => "audio/aac",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        _ => OCTET_STREAM,
    }
}

/// Short extension hint for container probing, derived from a MIME type.
pub(crate) fn extension_hint(mime_type: &str) -> Option<&'static str> {
    let base = base_mime_type(mime_type)?;
    let (_, sub) = base.split_once('/')?;
    let hint = match sub {
        s if s.contains("wav") || s.contains("wave") => "wav",
        s if s.contains("flac") => "flac",
        s if s.contains("aiff") => "aiff",
        "mpeg" | "mp3" | "mpeg3" | "x-mp3" | "mpga" => "mp3",
        "m4a" | "x-m4a" | "mp4" => "m4a",
        "aac" | "x-aac" => "aac",
        "ogg" | "x-ogg" => "ogg",
        "webm" | "x-webm" => "webm",
        _ => return None,
    };
    Some(hint)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
