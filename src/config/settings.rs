//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Sections missing from a
//! settings file fall back to their defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CompressionConfig
// ---------------------------------------------------------------------------

/// Target parameters for the MP3 re-encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Constant bitrate in kbps.
    pub bit_rate_kbps: u32,
    /// Output sample-rate cap in Hz.  Sources below it keep their rate.
    pub sample_rate_hz: u32,
    /// `1` downmixes to mono, `2` keeps stereo.
    pub channels: u16,
    /// Encoder quality, 1 (best) – 9 (fastest).
    pub quality_level: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            bit_rate_kbps: 128,
            sample_rate_hz: 44_100,
            channels: 1,
            quality_level: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

/// When to skip compression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Files above this size are always compressed, whatever their type.
    pub max_size_bytes: u64,
    /// Compress well-formed MIME types that are neither known-lossless nor
    /// known-lossy (e.g. `application/octet-stream`).
    pub compress_unknown_types: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 50 * 1024 * 1024,
            compress_unknown_types: true,
        }
    }
}

// ---------------------------------------------------------------------------
// UploadConfig
// ---------------------------------------------------------------------------

/// Where and how recordings are sent for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Full URL of the analysis endpoint.
    pub endpoint: String,
    /// Seconds to wait for upload plus analysis.
    pub timeout_secs: u64,
    /// Largest accepted upload.
    pub max_size_bytes: u64,
    /// Smallest accepted upload; anything below is assumed not to be a
    /// real recording.
    pub min_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/process-meeting".into(),
            timeout_secs: 900,
            max_size_bytes: 200 * 1024 * 1024,
            min_size_bytes: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use meeting_audio::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// MP3 encode settings.
    pub compression: CompressionConfig,
    /// Skip rules.
    pub classifier: ClassifierConfig,
    /// Analysis backend settings.
    pub upload: UploadConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
