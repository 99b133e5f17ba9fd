//! Compression orchestrator: classify → decode → reduce → resample → encode → package.
//!
//! ```text
//! RawAudio ──should_compress?──no──▶ CompressionResult::passthrough
//!     │ yes
//!     ▼
//! validate options ──▶ decode ──▶ to_mono / keep stereo ──▶ resample
//!                                                      │
//!                                                      ▼
//!                              package ◀── encode_mp3 (fresh encoder)
//! ```
//!
//! Every stage consumes the full output of the previous one.  Errors are
//! returned to the caller untouched; the pipeline never retries and never
//! falls back on its own.

use std::sync::Arc;

use crate::audio::{
    encode_mp3, resample, to_mono, AudioDecoder, EncoderFactory, LameEncoderFactory, PcmBuffer,
    RawAudio, SymphoniaDecoder, MP3_MIME_TYPE,
};

use super::classify::ClassifierPolicy;
use super::error::CompressError;
use super::options::CompressionOptions;
use super::result::{package, CompressionResult};

/// Runs the compression pipeline with pluggable codec collaborators.
///
/// Cheap to clone (`Arc` clones); holds no per-call state.
///
/// ```rust,no_run
/// use meeting_audio::audio::RawAudio;
/// use meeting_audio::compress::{CompressionOptions, Compressor};
///
/// let audio = RawAudio::from_path("standup.wav").unwrap();
/// let result = Compressor::new()
///     .compress(&audio, &CompressionOptions::default())
///     .unwrap();
/// println!("{result}");
/// ```
#[derive(Clone)]
pub struct Compressor {
    decoder: Arc<dyn AudioDecoder>,
    encoders: Arc<dyn EncoderFactory>,
    policy: ClassifierPolicy,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor {
    /// symphonia decoder, LAME encoder, default classifier policy.
    pub fn new() -> Self {
        Self::with_codecs(
            Arc::new(SymphoniaDecoder::new()),
            Arc::new(LameEncoderFactory::new()),
        )
    }

    pub fn with_codecs(decoder: Arc<dyn AudioDecoder>, encoders: Arc<dyn EncoderFactory>) -> Self {
        Self {
            decoder,
            encoders,
            policy: ClassifierPolicy::default(),
        }
    }

    /// Replace the classifier policy.
    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// Whether `audio` would be re-encoded by [`compress`](Self::compress).
    pub fn should_compress(&self, audio: &RawAudio) -> bool {
        self.policy.should_compress(audio)
    }

    /// Compress `audio`, or pass it through when the classifier says so.
    pub fn compress(
        &self,
        audio: &RawAudio,
        options: &CompressionOptions,
    ) -> Result<CompressionResult, CompressError> {
        if !self.should_compress(audio) {
            log::debug!(
                "compress: skipping {} ({} bytes), already compact",
                audio.mime_type,
                audio.size_bytes
            );
            return Ok(CompressionResult::passthrough(audio));
        }
        self.compress_unconditionally(audio, options)
    }

    /// Run decode → encode regardless of the classifier.
    pub fn compress_unconditionally(
        &self,
        audio: &RawAudio,
        options: &CompressionOptions,
    ) -> Result<CompressionResult, CompressError> {
        options.validate()?;

        log::info!(
            "compress: starting ({} bytes, {})",
            audio.size_bytes,
            audio.mime_type
        );

        let decoded = self.decoder.decode(audio)?;
        let shaped = shape(&decoded, options);
        let encoded = encode_mp3(
            self.encoders.as_ref(),
            &shaped,
            options.bit_rate_kbps,
            options.quality_level,
        )?;
        let result = package(encoded, MP3_MIME_TYPE, audio.size_bytes);

        log::info!(
            "compress: done, {} -> {} bytes (ratio {:.2})",
            result.original_size_bytes,
            result.compressed_size_bytes,
            result.compression_ratio
        );
        Ok(result)
    }

    /// [`compress`](Self::compress) on the blocking thread pool.
    ///
    /// `audio` is borrowed so the caller keeps the recording whatever
    /// happens; a panic in a codec surfaces as [`CompressError::Internal`].
    pub async fn compress_async(
        &self,
        audio: &RawAudio,
        options: CompressionOptions,
    ) -> Result<CompressionResult, CompressError> {
        let this = self.clone();
        let audio = audio.clone();
        tokio::task::spawn_blocking(move || this.compress(&audio, &options))
            .await
            .map_err(|e| CompressError::Internal(e.to_string()))?
    }
}

/// Channel reduction followed by rate reduction.
fn shape(pcm: &PcmBuffer, options: &CompressionOptions) -> PcmBuffer {
    let reduced = if options.channels == 1 {
        to_mono(pcm)
    } else {
        pcm.truncate_channels(options.channels as usize)
    };
    let target = options.sample_rate_hz.min(reduced.sample_rate());
    let out = resample(&reduced, target);
    log::debug!(
        "compress: shaped {} ch @ {} Hz -> {} ch @ {} Hz ({} frames)",
        pcm.channel_count(),
        pcm.sample_rate(),
        out.channel_count(),
        out.sample_rate(),
        out.frames()
    );
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::audio::{DecodeError, EncodeError, EncoderSpec, FrameEncoder};
    use crate::compress::ConfigurationError;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Returns a fixed buffer and counts calls.
    struct FixedDecoder {
        pcm: PcmBuffer,
        calls: AtomicUsize,
    }

    impl AudioDecoder for FixedDecoder {
        fn decode(&self, _audio: &RawAudio) -> Result<PcmBuffer, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pcm.clone())
        }
    }

    /// Crashes the way a demuxer bug on a hostile file would.
    struct PanickingDecoder;

    impl AudioDecoder for PanickingDecoder {
        fn decode(&self, _audio: &RawAudio) -> Result<PcmBuffer, DecodeError> {
            panic!("decoder bug on hostile input");
        }
    }

    /// Emits two bytes per frame and records the parameters it was built with.
    struct CountingFactory {
        specs: Mutex<Vec<EncoderSpec>>,
    }

    struct CountingEncoder;

    impl FrameEncoder for CountingEncoder {
        fn encode_frame(&mut self, _samples: &[i16]) -> Result<Vec<u8>, EncodeError> {
            Ok(vec![0xaa, 0xbb])
        }

        fn flush(&mut self) -> Result<Vec<u8>, EncodeError> {
            Ok(Vec::new())
        }
    }

    impl EncoderFactory for CountingFactory {
        fn create(&self, spec: EncoderSpec) -> Result<Box<dyn FrameEncoder>, EncodeError> {
            self.specs.lock().unwrap().push(spec);
            Ok(Box::new(CountingEncoder))
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Stereo 16-bit WAV sine, `secs` long.
    fn sine_wav(secs: f32, rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
            let frames = (secs * rate as f32) as usize;
            for i in 0..frames {
                let t = i as f32 / rate as f32;
                let s = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
                let v = (s * i16::MAX as f32) as i16;
                writer.write_sample(v).expect("left");
                writer.write_sample(v).expect("right");
            }
            writer.finalize().expect("finalize");
        }
        cursor.into_inner()
    }

    fn mocked(pcm: PcmBuffer) -> (Compressor, Arc<FixedDecoder>, Arc<CountingFactory>) {
        let decoder = Arc::new(FixedDecoder {
            pcm,
            calls: AtomicUsize::new(0),
        });
        let factory = Arc::new(CountingFactory {
            specs: Mutex::new(Vec::new()),
        });
        let compressor = Compressor::with_codecs(decoder.clone(), factory.clone());
        (compressor, decoder, factory)
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    fn small_mp3_is_passed_through_without_decoding() {
        let (compressor, decoder, factory) = mocked(PcmBuffer::mono(vec![0.0; 10], 44_100).unwrap());
        let audio = RawAudio::new(vec![7u8; 2 * 1024 * 1024], "audio/mp3");

        let result = compressor
            .compress(&audio, &CompressionOptions::default())
            .expect("passthrough");

        assert_eq!(result.compressed_size_bytes, result.original_size_bytes);
        assert_eq!(result.compression_ratio, 1.0);
        assert_eq!(result.compressed_blob.bytes, audio.bytes);
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
        assert!(factory.specs.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_options_fail_before_decoding() {
        let (compressor, decoder, _) = mocked(PcmBuffer::mono(vec![0.0; 10], 44_100).unwrap());
        let audio = RawAudio::new(vec![0u8; 64], "audio/wav");
        let options = CompressionOptions {
            channels: 3,
            ..Default::default()
        };

        let err = compressor.compress(&audio, &options).unwrap_err();
        assert!(matches!(
            err,
            CompressError::Configuration(ConfigurationError::InvalidChannels(3))
        ));
        assert_eq!(decoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stereo_source_is_downmixed_and_rate_capped() {
        let pcm = PcmBuffer::new(vec![vec![0.2; 4_800], vec![0.4; 4_800]], 48_000).unwrap();
        let (compressor, _, factory) = mocked(pcm);
        let audio = RawAudio::new(vec![0u8; 64], "audio/wav");

        let result = compressor
            .compress(&audio, &CompressionOptions::default())
            .expect("compress");

        let spec = factory.specs.lock().unwrap()[0];
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bit_rate_kbps, 128);
        assert_eq!(spec.quality, 3);
        // 4800 @ 48k → 4410 @ 44.1k → 4 frames of 1152 → 8 bytes
        assert_eq!(result.compressed_size_bytes, 8);
        assert_eq!(result.compressed_blob.mime_type, MP3_MIME_TYPE);
    }

    #[test]
    fn low_rate_source_is_not_upsampled() {
        let pcm = PcmBuffer::mono(vec![0.1; 1_600], 16_000).unwrap();
        let (compressor, _, factory) = mocked(pcm);
        let audio = RawAudio::new(vec![0u8; 64], "audio/wav");

        compressor
            .compress(&audio, &CompressionOptions::default())
            .expect("compress");

        assert_eq!(factory.specs.lock().unwrap()[0].sample_rate, 16_000);
    }

    #[test]
    fn stereo_option_keeps_two_channels() {
        let pcm = PcmBuffer::new(vec![vec![0.0; 100]; 3], 44_100).unwrap();
        let (compressor, _, factory) = mocked(pcm);
        let audio = RawAudio::new(vec![0u8; 64], "audio/flac");
        let options = CompressionOptions {
            channels: 2,
            ..Default::default()
        };

        compressor.compress(&audio, &options).expect("compress");
        assert_eq!(factory.specs.lock().unwrap()[0].channels, 2);
    }

    #[test]
    fn truncated_wav_is_decode_error() {
        let audio = RawAudio::new(b"RIFF\x10\x00\x00\x00WAVE".to_vec(), "audio/wav");
        let err = Compressor::new()
            .compress(&audio, &CompressionOptions::default())
            .unwrap_err();
        assert!(matches!(err, CompressError::Decode(_)), "{err}");
    }

    #[test]
    fn ten_second_stereo_wav_shrinks_to_mp3() {
        let wav = sine_wav(10.0, 44_100);
        let audio = RawAudio::new(wav, "audio/wav");
        assert!(Compressor::new().should_compress(&audio));

        let result = Compressor::new()
            .compress(&audio, &CompressionOptions::default())
            .expect("compress");

        assert_eq!(result.original_size_bytes, audio.size_bytes);
        assert!(result.compressed_size_bytes > 0);
        assert!(result.compressed_size_bytes < result.original_size_bytes);
        assert!(result.compression_ratio > 1.0);
        assert_eq!(result.compressed_blob.mime_type, MP3_MIME_TYPE);
        let expected =
            result.original_size_bytes as f64 / result.compressed_size_bytes as f64;
        assert!((result.compression_ratio - expected).abs() < 1e-9);
    }

    #[test]
    fn repeated_compression_is_deterministic() {
        let audio = RawAudio::new(sine_wav(1.0, 44_100), "audio/wav");
        let compressor = Compressor::new();
        let a = compressor
            .compress(&audio, &CompressionOptions::default())
            .expect("first");
        let b = compressor
            .compress(&audio, &CompressionOptions::default())
            .expect("second");
        assert_eq!(a.compressed_size_bytes, b.compressed_size_bytes);
    }

    #[tokio::test]
    async fn async_wrapper_matches_sync() {
        let audio = RawAudio::new(sine_wav(1.0, 48_000), "audio/x-wav");
        let compressor = Compressor::new();

        let result = compressor
            .compress_async(&audio, CompressionOptions::default())
            .await
            .expect("compress");

        assert_eq!(result.compressed_blob.mime_type, MP3_MIME_TYPE);
        assert!(result.compressed_size_bytes < audio.size_bytes);
    }

    #[tokio::test]
    async fn codec_panic_is_internal_error_and_caller_keeps_audio() {
        let compressor = Compressor::with_codecs(
            Arc::new(PanickingDecoder),
            Arc::new(LameEncoderFactory::new()),
        );
        let audio = RawAudio::new(vec![3_u8; 4096], "audio/wav");

        let err = compressor
            .compress_async(&audio, CompressionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CompressError::Internal(_)), "{err}");
        assert_eq!(audio.bytes, vec![3_u8; 4096]);
        assert_eq!(audio.mime_type, "audio/wav");
    }
}
