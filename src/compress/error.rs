use thiserror::Error;

use crate::audio::{DecodeError, EncodeError};

use super::options::ConfigurationError;

/// Any failure of the compression pipeline.
///
/// None of these are fatal to an upload: callers fall back to the original
/// blob (see [`crate::upload::prepare_upload`]).
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("invalid compression options: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("audio decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("mp3 encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// The blocking compression task panicked or was cancelled.
    #[error("compression task failed: {0}")]
    Internal(String),
}
