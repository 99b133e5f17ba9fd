//! Compression options and their validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::MAX_BIT_RATE_KBPS;
use crate::config::CompressionConfig;

/// Invalid [`CompressionOptions`], caught before any decoding starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// `channels` outside `{1, 2}`.
    #[error("channels must be 1 or 2, got {0}")]
    InvalidChannels(u16),

    /// A numeric field that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    /// `bit_rate_kbps` above what MP3 can carry.
    #[error("bit rate must be at most 320 kbps, got {0}")]
    BitRateTooHigh(u32),

    /// `quality_level` outside `1..=9`.
    #[error("quality level must be between 1 and 9, got {0}")]
    QualityOutOfRange(u8),
}

/// Target parameters for the MP3 re-encode.
///
/// Every field is optional when deserialised; missing fields take the
/// defaults below.
///
/// | Field           | Default | Meaning                                   |
/// |-----------------|---------|-------------------------------------------|
/// | `bit_rate_kbps` | 128     | CBR bitrate                               |
/// | `sample_rate_hz`| 44 100  | Output rate cap (never upsampled)         |
/// | `channels`      | 1       | 1 = downmix to mono, 2 = keep stereo      |
/// | `quality_level` | 3       | 1 best … 9 fastest                        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    pub bit_rate_kbps: u32,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub quality_level: u8,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            bit_rate_kbps: 128,
            sample_rate_hz: 44_100,
            channels: 1,
            quality_level: 3,
        }
    }
}

impl CompressionOptions {
    /// Check every field; returns the first problem found.
    ///
    /// ```
    /// use meeting_audio::compress::{CompressionOptions, ConfigurationError};
    ///
    /// assert!(CompressionOptions::default().validate().is_ok());
    ///
    /// let bad = CompressionOptions { channels: 3, ..Default::default() };
    /// assert_eq!(bad.validate(), Err(ConfigurationError::InvalidChannels(3)));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.bit_rate_kbps == 0 {
            return Err(ConfigurationError::Zero {
                field: "bit_rate_kbps",
            });
        }
        if self.bit_rate_kbps > MAX_BIT_RATE_KBPS {
            return Err(ConfigurationError::BitRateTooHigh(self.bit_rate_kbps));
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigurationError::Zero {
                field: "sample_rate_hz",
            });
        }
        if !matches!(self.channels, 1 | 2) {
            return Err(ConfigurationError::InvalidChannels(self.channels));
        }
        if !(1..=9).contains(&self.quality_level) {
            return Err(ConfigurationError::QualityOutOfRange(self.quality_level));
        }
        Ok(())
    }
}

impl From<&CompressionConfig> for CompressionOptions {
    fn from(cfg: &CompressionConfig) -> Self {
        Self {
            bit_rate_kbps: cfg.bit_rate_kbps,
            sample_rate_hz: cfg.sample_rate_hz,
            channels: cfg.channels,
            quality_level: cfg.quality_level,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = CompressionOptions::default();
        assert_eq!(opts.bit_rate_kbps, 128);
        assert_eq!(opts.sample_rate_hz, 44_100);
        assert_eq!(opts.channels, 1);
        assert_eq!(opts.quality_level, 3);
    }

    #[test]
    fn zero_fields_rejected() {
        let opts = CompressionOptions {
            bit_rate_kbps: 0,
            ..Default::default()
        };
        assert_eq!(
            opts.validate(),
            Err(ConfigurationError::Zero {
                field: "bit_rate_kbps"
            })
        );

        let opts = CompressionOptions {
            sample_rate_hz: 0,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(ConfigurationError::Zero { .. })));

        let opts = CompressionOptions {
            quality_level: 0,
            ..Default::default()
        };
        assert_eq!(opts.validate(), Err(ConfigurationError::QualityOutOfRange(0)));
    }

    #[test]
    fn bit_rate_above_mp3_ceiling_rejected() {
        let opts = CompressionOptions {
            bit_rate_kbps: 321,
            ..Default::default()
        };
        assert_eq!(opts.validate(), Err(ConfigurationError::BitRateTooHigh(321)));
        assert_eq!(
            opts.validate().unwrap_err().to_string(),
            "bit rate must be at most 320 kbps, got 321"
        );

        let top = CompressionOptions {
            bit_rate_kbps: MAX_BIT_RATE_KBPS,
            ..Default::default()
        };
        assert!(top.validate().is_ok());
    }

    #[test]
    fn channels_must_be_one_or_two() {
        for ch in [0u16, 3, 6] {
            let opts = CompressionOptions {
                channels: ch,
                ..Default::default()
            };
            assert_eq!(opts.validate(), Err(ConfigurationError::InvalidChannels(ch)));
        }
        let stereo = CompressionOptions {
            channels: 2,
            ..Default::default()
        };
        assert!(stereo.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let opts: CompressionOptions =
            serde_json::from_str(r#"{ "bit_rate_kbps": 64 }"#).expect("parse");
        assert_eq!(opts.bit_rate_kbps, 64);
        assert_eq!(opts.sample_rate_hz, 44_100);
        assert_eq!(opts.channels, 1);
        assert_eq!(opts.quality_level, 3);
    }
}
