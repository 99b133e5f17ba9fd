//! Compress-if-needed before upload, with fallback to the original recording.
//!
//! A failed compression must never block an upload: [`prepare_upload`]
//! always returns something sendable.  Unlike a silent fallback, the outcome
//! is reported as a typed [`CompressionOutcome`] so callers can log or
//! display what happened.

use bytes::Bytes;

use crate::audio::RawAudio;
use crate::compress::{CompressionOptions, CompressionStats, Compressor};

// ---------------------------------------------------------------------------
// CompressionOutcome
// ---------------------------------------------------------------------------

/// What [`prepare_upload`] did with the recording.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionOutcome {
    /// The classifier judged the input already compact.
    Skipped,
    /// Re-encoded to MP3.
    Compressed(CompressionStats),
    /// Compression was attempted and failed; the original is uploaded.
    Fallback { reason: String },
}

impl CompressionOutcome {
    pub fn is_compressed(&self) -> bool {
        matches!(self, CompressionOutcome::Compressed(_))
    }
}

// ---------------------------------------------------------------------------
// PreparedUpload
// ---------------------------------------------------------------------------

/// Bytes ready for the analysis endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub outcome: CompressionOutcome,
}

impl PreparedUpload {
    fn original(audio: RawAudio, file_name: &str, outcome: CompressionOutcome) -> Self {
        Self {
            bytes: audio.bytes,
            mime_type: audio.mime_type,
            file_name: file_name.to_string(),
            outcome,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// ---------------------------------------------------------------------------
// prepare_upload
// ---------------------------------------------------------------------------

/// Compress `audio` when the compressor's classifier asks for it.
///
/// On success the payload is the MP3 and `file_name`'s extension becomes
/// `.mp3`.  On skip or any [`CompressError`] the original bytes, MIME type
/// and file name are returned untouched.
pub fn prepare_upload(
    compressor: &Compressor,
    audio: RawAudio,
    file_name: &str,
    options: &CompressionOptions,
) -> PreparedUpload {
    if !compressor.should_compress(&audio) {
        log::debug!("prepare: {} does not need compression", file_name);
        return PreparedUpload::original(audio, file_name, CompressionOutcome::Skipped);
    }

    match compressor.compress_unconditionally(&audio, options) {
        Ok(result) => {
            let stats = result.stats();
            PreparedUpload {
                bytes: result.compressed_blob.bytes,
                mime_type: result.compressed_blob.mime_type,
                file_name: replace_extension(file_name, "mp3"),
                outcome: CompressionOutcome::Compressed(stats),
            }
        }
        Err(e) => {
            log::warn!("prepare: compression failed, uploading original: {}", e);
            PreparedUpload::original(
                audio,
                file_name,
                CompressionOutcome::Fallback {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// [`prepare_upload`] on the blocking thread pool.
///
/// Never fails: if the blocking task panics, the original recording is
/// returned with a [`CompressionOutcome::Fallback`].
pub async fn prepare_upload_async(
    compressor: &Compressor,
    audio: RawAudio,
    file_name: &str,
    options: CompressionOptions,
) -> PreparedUpload {
    // Shares the buffer with `audio`; no copy.
    let original = audio.clone();
    let compressor = compressor.clone();
    let name = file_name.to_string();

    match tokio::task::spawn_blocking(move || prepare_upload(&compressor, audio, &name, &options))
        .await
    {
        Ok(prepared) => prepared,
        Err(e) => {
            log::warn!("prepare: compression task failed, uploading original: {}", e);
            PreparedUpload::original(
                original,
                file_name,
                CompressionOutcome::Fallback {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Swap the last extension of `file_name` for `ext`, or append one.
///
/// Path separators are respected: `"dir.v2/take"` gains `.mp3` rather than
/// losing `.v2/take`.
pub fn replace_extension(file_name: &str, ext: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if !file_name[dot + 1..].is_empty() && !file_name[dot + 1..].contains('/') => {
            &file_name[..dot]
        }
        _ => file_name,
    };
    format!("{stem}.{ext}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;
    use crate::audio::{AudioDecoder, DecodeError, LameEncoderFactory, PcmBuffer, MP3_MIME_TYPE};

    /// Stands in for a demuxer that crashes on a hostile container.
    struct PanickingDecoder;

    impl AudioDecoder for PanickingDecoder {
        fn decode(&self, _audio: &RawAudio) -> Result<PcmBuffer, DecodeError> {
            panic!("decoder bug on hostile input");
        }
    }

    fn wav_bytes(seconds: f32, rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let n = (seconds * rate as f32) as usize;
            for i in 0..n {
                let t = i as f32 / rate as f32;
                let s = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn replaces_last_extension() {
        assert_eq!(replace_extension("meeting.wav", "mp3"), "meeting.mp3");
        assert_eq!(replace_extension("a.b.flac", "mp3"), "a.b.mp3");
        assert_eq!(replace_extension("recording", "mp3"), "recording.mp3");
        assert_eq!(replace_extension("dir.v2/take", "mp3"), "dir.v2/take.mp3");
        assert_eq!(replace_extension("trailing.", "mp3"), "trailing..mp3");
    }

    #[test]
    fn compact_input_is_skipped() {
        let compressor = Compressor::new();
        let audio = RawAudio::new(vec![0xFF_u8; 4096], "audio/mpeg");
        let prepared =
            prepare_upload(&compressor, audio, "call.mp3", &CompressionOptions::default());

        assert_eq!(prepared.outcome, CompressionOutcome::Skipped);
        assert_eq!(prepared.bytes, vec![0xFF_u8; 4096]);
        assert_eq!(prepared.mime_type, "audio/mpeg");
        assert_eq!(prepared.file_name, "call.mp3");
    }

    #[test]
    fn undecodable_input_falls_back_to_original() {
        let compressor = Compressor::new();
        let junk: Vec<u8> = (0..8192u32).map(|i| (i * 31 % 251) as u8).collect();
        let audio = RawAudio::new(junk.clone(), "audio/wav");
        let prepared =
            prepare_upload(&compressor, audio, "broken.wav", &CompressionOptions::default());

        assert!(matches!(prepared.outcome, CompressionOutcome::Fallback { .. }));
        assert_eq!(prepared.bytes, junk);
        assert_eq!(prepared.mime_type, "audio/wav");
        assert_eq!(prepared.file_name, "broken.wav");
    }

    #[test]
    fn invalid_options_fall_back() {
        let compressor = Compressor::new();
        let bytes = wav_bytes(0.5, 16_000);
        let audio = RawAudio::new(bytes.clone(), "audio/wav");
        let options = CompressionOptions {
            channels: 3,
            ..CompressionOptions::default()
        };
        let prepared = prepare_upload(&compressor, audio, "a.wav", &options);

        match prepared.outcome {
            CompressionOutcome::Fallback { reason } => assert!(reason.contains("channels")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(prepared.bytes, bytes);
    }

    #[test]
    fn wav_is_compressed_and_renamed() {
        let compressor = Compressor::new();
        let bytes = wav_bytes(2.0, 44_100);
        let original_len = bytes.len() as u64;
        let audio = RawAudio::new(bytes, "audio/wav");
        let prepared = prepare_upload(
            &compressor,
            audio,
            "standup.wav",
            &CompressionOptions::default(),
        );

        assert!(prepared.outcome.is_compressed());
        assert_eq!(prepared.mime_type, MP3_MIME_TYPE);
        assert_eq!(prepared.file_name, "standup.mp3");
        assert!(prepared.size_bytes() < original_len);
        match prepared.outcome {
            CompressionOutcome::Compressed(stats) => {
                assert_eq!(stats.original_size_bytes, original_len);
                assert_eq!(stats.compressed_size_bytes, prepared.bytes.len() as u64);
                assert!(stats.compression_ratio > 1.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn async_variant_matches_sync() {
        let compressor = Compressor::new();
        let bytes = wav_bytes(1.0, 22_050);
        let options = CompressionOptions::default();

        let sync = prepare_upload(
            &compressor,
            RawAudio::new(bytes.clone(), "audio/wav"),
            "x.wav",
            &options,
        );
        let async_ = prepare_upload_async(
            &compressor,
            RawAudio::new(bytes, "audio/wav"),
            "x.wav",
            options,
        )
        .await;

        assert_eq!(sync, async_);
    }

    #[tokio::test]
    async fn panicking_compression_task_falls_back_to_original() {
        let compressor = Compressor::with_codecs(
            Arc::new(PanickingDecoder),
            Arc::new(LameEncoderFactory::new()),
        );
        let audio = RawAudio::new(vec![1_u8; 4096], "audio/wav");

        let prepared = prepare_upload_async(
            &compressor,
            audio,
            "hostile.wav",
            CompressionOptions::default(),
        )
        .await;

        match &prepared.outcome {
            CompressionOutcome::Fallback { reason } => assert!(reason.contains("panic"), "{reason}"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(prepared.bytes, vec![1_u8; 4096]);
        assert_eq!(prepared.mime_type, "audio/wav");
        assert_eq!(prepared.file_name, "hostile.wav");
    }
}
