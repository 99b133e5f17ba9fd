//! Pre-upload checks on the recording handed to the analysis backend.
//!
//! The backend caps uploads at 200 MiB and only accepts audio (and audio-
//! bearing video) containers.  Anything that would be rejected server-side
//! is caught here first so the user gets a readable message without waiting
//! for a 15-minute request to fail.

use serde::Serialize;
use thiserror::Error;

use crate::audio::base_mime_type;
use crate::config::UploadConfig;

const MIB: u64 = 1024 * 1024;

/// MIME types the analysis backend accepts.  Parameters such as
/// `;codecs=opus` are ignored when matching.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/x-aac",
    "audio/aac",
    "audio/flac",
    "audio/x-flac",
    "audio/mp3",
    "audio/mpeg3",
    "audio/x-mp3",
    "audio/m4a",
    "audio/x-m4a",
    "audio/mpeg",
    "audio/mpga",
    "audio/mp4",
    "audio/opus",
    "audio/x-opus",
    "audio/pcm",
    "audio/x-pcm",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/x-wave",
    "audio/webm",
    "audio/x-webm",
    "audio/ogg",
    "audio/x-ogg",
    "video/mp4",
    "video/webm",
    "video/ogg",
];

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("audio file is empty (0 bytes)")]
    Empty,

    #[error("audio file is too small ({size} bytes, minimum {min}); not a valid recording")]
    TooSmall { size: u64, min: u64 },

    #[error("file size exceeds {max_mb}MB limit (current file: {size_mb}MB)")]
    TooLarge { size_mb: u64, max_mb: u64 },

    #[error(
        "unsupported audio format: {mime_type} (base: {base}); supported formats: \
         AAC, FLAC, MP3, M4A, MPEG, MPGA, MP4, OPUS, PCM, WAV, WebM, OGG"
    )]
    UnsupportedType { mime_type: String, base: String },
}

// ---------------------------------------------------------------------------
// FileDetails
// ---------------------------------------------------------------------------

/// Summary of a file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDetails {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Size in whole MiB, rounded to nearest.
    pub size_mb: u64,
}

// ---------------------------------------------------------------------------
// FileValidator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileValidator {
    max_size_bytes: u64,
    min_size_bytes: u64,
    allowed_mime_types: Vec<String>,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl FileValidator {
    /// Build a validator with the configured size limits and the standard
    /// allowed-type list.
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
            min_size_bytes: config.min_size_bytes,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the allowed-type list.
    pub fn with_allowed_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_mime_types(&self) -> &[String] {
        &self.allowed_mime_types
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Check a file before upload.  Checks run in order: empty, too small,
    /// too large, type.
    pub fn validate(
        &self,
        name: &str,
        size: u64,
        mime_type: &str,
    ) -> Result<FileDetails, ValidationError> {
        let details = FileDetails {
            name: name.to_string(),
            size,
            mime_type: mime_type.to_string(),
            size_mb: round_mib(size),
        };
        log::debug!("validate: {:?}", details);

        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size < self.min_size_bytes {
            return Err(ValidationError::TooSmall {
                size,
                min: self.min_size_bytes,
            });
        }
        if size > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size_mb: details.size_mb,
                max_mb: round_mib(self.max_size_bytes),
            });
        }

        let base = base_mime_type(mime_type).unwrap_or_default();
        if !self.is_allowed(mime_type) && !self.is_allowed(&base) {
            return Err(ValidationError::UnsupportedType {
                mime_type: mime_type.to_string(),
                base,
            });
        }

        log::debug!("validate: {} passed", name);
        Ok(details)
    }

    fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

fn round_mib(bytes: u64) -> u64 {
    (bytes + MIB / 2) / MIB
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> FileValidator {
        FileValidator::default()
    }

    #[test]
    fn accepts_typical_recording() {
        let details = validator()
            .validate("standup.wav", 3 * MIB, "audio/wav")
            .unwrap();
        assert_eq!(details.name, "standup.wav");
        assert_eq!(details.size, 3 * MIB);
        assert_eq!(details.mime_type, "audio/wav");
        assert_eq!(details.size_mb, 3);
    }

    #[test]
    fn accepts_codec_parameters() {
        assert!(validator()
            .validate("call.webm", 10_000, "audio/webm;codecs=opus")
            .is_ok());
        assert!(validator()
            .validate("call.webm", 10_000, "Audio/WebM; codecs=opus")
            .is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            validator().validate("a.wav", 0, "audio/wav"),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn rejects_below_one_kib() {
        assert_eq!(
            validator().validate("a.wav", 1023, "audio/wav"),
            Err(ValidationError::TooSmall {
                size: 1023,
                min: 1024
            })
        );
        assert!(validator().validate("a.wav", 1024, "audio/wav").is_ok());
    }

    #[test]
    fn rejects_above_limit() {
        let max = 200 * MIB;
        assert!(validator().validate("a.wav", max, "audio/wav").is_ok());
        let err = validator().validate("a.wav", max + 1, "audio/wav").unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size_mb: 200,
                max_mb: 200
            }
        );
    }

    #[test]
    fn size_checked_before_type() {
        assert_eq!(
            validator().validate("a.txt", 0, "text/plain"),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn rejects_unsupported_type() {
        let err = validator()
            .validate("notes.txt", 4096, "text/plain; charset=utf-8")
            .unwrap_err();
        match err {
            ValidationError::UnsupportedType { mime_type, base } => {
                assert_eq!(mime_type, "text/plain; charset=utf-8");
                assert_eq!(base, "text/plain");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accepts_video_containers() {
        assert!(validator().validate("m.mp4", 4096, "video/mp4").is_ok());
    }

    #[test]
    fn custom_limits_and_types() {
        let cfg = UploadConfig {
            max_size_bytes: 10_000,
            min_size_bytes: 10,
            ..UploadConfig::default()
        };
        let v = FileValidator::from_config(&cfg).with_allowed_mime_types(["audio/flac"]);
        assert!(v.validate("a.flac", 50, "audio/flac").is_ok());
        assert!(v.validate("a.wav", 50, "audio/wav").is_err());
        assert!(v.validate("a.flac", 10_001, "audio/flac").is_err());
        assert_eq!(v.allowed_mime_types(), ["audio/flac".to_string()]);
        assert_eq!(v.max_size_bytes(), 10_000);
    }

    #[test]
    fn error_messages_are_readable() {
        let msg = ValidationError::TooLarge {
            size_mb: 250,
            max_mb: 200,
        }
        .to_string();
        assert!(msg.contains("200MB"));
        assert!(msg.contains("250MB"));
    }
}
