//! Client for the meeting-analysis endpoint.
//!
//! The backend takes a `multipart/form-data` POST with the recording in an
//! `audio` part and an optional `duration` field (seconds), runs
//! transcription and analysis, and answers with JSON.  Analysis of an hour
//! of audio can take many minutes, so the request timeout is long.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::UploadConfig;

use super::prepare::PreparedUpload;

// ---------------------------------------------------------------------------
// UploadError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum UploadError {
    /// Connection or transport failure.
    #[error("network error: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    /// Non-2xx response.  `message` is the server's `error` field when the
    /// body carries one.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisUploader trait
// ---------------------------------------------------------------------------

/// Sends a prepared recording for analysis and returns the backend's JSON.
#[async_trait]
pub trait AnalysisUploader: Send + Sync {
    async fn upload(
        &self,
        upload: &PreparedUpload,
        duration_secs: Option<f64>,
    ) -> Result<serde_json::Value, UploadError>;
}

// ---------------------------------------------------------------------------
// HttpUploader
// ---------------------------------------------------------------------------

pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn from_config(config: &UploadConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisUploader for HttpUploader {
    async fn upload(
        &self,
        upload: &PreparedUpload,
        duration_secs: Option<f64>,
    ) -> Result<serde_json::Value, UploadError> {
        // `Bytes` clones share the buffer, so the recording is not copied.
        let audio_part =
            reqwest::multipart::Part::stream_with_length(upload.bytes.clone(), upload.size_bytes())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| UploadError::Request(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().part("audio", audio_part);
        if let Some(duration) = duration_secs {
            form = form.text("duration", duration.to_string());
        }

        log::info!(
            "upload: sending {} ({} bytes, {}) to {}",
            upload.file_name,
            upload.bytes.len(),
            upload.mime_type,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = server_error_message(status, &body);
            log::warn!("upload: server returned {}: {}", status.as_u16(), message);
            return Err(UploadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| UploadError::Parse(e.to_string()))
    }
}

/// The body's `error` string if it is JSON carrying one, else a status line.
fn server_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            format!(
                "failed to analyze meeting: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
