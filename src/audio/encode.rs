//! Streaming MP3 encoding.
//!
//! The pipeline converts float PCM to 16-bit integers and feeds the encoder
//! one MP3 frame (1152 samples per channel) at a time:
//!
//! ```text
//! PcmBuffer ──f32_to_i16──▶ interleaved i16 ──1152-frame chunks──▶ FrameEncoder
//!                                                 │                    │
//!                                                 ▼                    ▼
//!                                        encode_frame() bytes ... flush() bytes
//! ```
//!
//! [`FrameEncoder`] and [`EncoderFactory`] are the seam; [`LameEncoderFactory`]
//! builds a fresh LAME encoder for every compression call.

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use thiserror::Error;

use super::pcm::PcmBuffer;

/// Samples per channel in one MPEG-1 Layer III frame.
pub const MP3_FRAME_SAMPLES: usize = 1152;

/// Highest CBR bitrate an MPEG-1 Layer III stream can carry.
pub const MAX_BIT_RATE_KBPS: u32 = 320;

/// Bitrates LAME accepts for CBR encoding, ascending.
const SUPPORTED_KBPS: &[u32] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

// ---------------------------------------------------------------------------
// EncodeError
// ---------------------------------------------------------------------------

/// The MP3 encoder could not be set up or rejected input.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Building the encoder failed (unsupported rate/channel combination …).
    #[error("encoder initialisation failed: {0}")]
    Init(String),

    /// A frame was rejected.
    #[error("encoding frame {index} failed: {reason}")]
    Frame { index: usize, reason: String },

    /// Draining the encoder at end of stream failed.
    #[error("encoder flush failed: {0}")]
    Flush(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Stream parameters a [`FrameEncoder`] is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSpec {
    /// 1 or 2.
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_rate_kbps: u32,
    /// 1 (best) … 9 (fastest).
    pub quality: u8,
}

/// A stateful MP3 encoder.  Input frames are interleaved when stereo.
pub trait FrameEncoder {
    /// Encode one chunk; may return zero bytes while LAME buffers internally.
    fn encode_frame(&mut self, samples: &[i16]) -> Result<Vec<u8>, EncodeError>;

    /// Drain everything still buffered.  Called exactly once, last.
    fn flush(&mut self) -> Result<Vec<u8>, EncodeError>;
}

/// Builds one [`FrameEncoder`] per compression call.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, spec: EncoderSpec) -> Result<Box<dyn FrameEncoder>, EncodeError>;
}

// ---------------------------------------------------------------------------
// Sample conversion
// ---------------------------------------------------------------------------

/// Convert a float sample to 16-bit PCM.
///
/// Negative values scale by 32768 and positive by 32767, so the full `i16`
/// range is reachable at both ends.
///
/// ```
/// use meeting_audio::audio::f32_to_i16;
///
/// assert_eq!(f32_to_i16(1.0), 32_767);
/// assert_eq!(f32_to_i16(-1.0), -32_768);
/// assert_eq!(f32_to_i16(0.0), 0);
/// assert_eq!(f32_to_i16(7.5), 32_767);
/// ```
pub fn f32_to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(-1.0, 1.0)
    };
    let scale = if s < 0.0 { 32_768.0 } else { 32_767.0 };
    (s * scale).round() as i16
}

// ---------------------------------------------------------------------------
// encode_mp3
// ---------------------------------------------------------------------------

/// Encode `pcm` to an MP3 byte stream.
///
/// A fresh encoder is created through `factory`, fed [`MP3_FRAME_SAMPLES`]
/// frames in order, then flushed.  Output bytes keep input order.
pub fn encode_mp3(
    factory: &dyn EncoderFactory,
    pcm: &PcmBuffer,
    bit_rate_kbps: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let channels = pcm.channel_count();
    if channels > 2 {
        return Err(EncodeError::Init(format!(
            "MP3 supports 1 or 2 channels, got {channels}"
        )));
    }

    let spec = EncoderSpec {
        channels: channels as u16,
        sample_rate: pcm.sample_rate(),
        bit_rate_kbps,
        quality,
    };
    let mut encoder = factory.create(spec)?;

    let samples: Vec<i16> = pcm.to_interleaved().into_iter().map(f32_to_i16).collect();
    let mut output = Vec::with_capacity(estimated_size(pcm.frames(), bit_rate_kbps, pcm.sample_rate()));

    for chunk in samples.chunks(MP3_FRAME_SAMPLES * channels) {
        let bytes = encoder.encode_frame(chunk)?;
        output.extend_from_slice(&bytes);
    }
    output.extend_from_slice(&encoder.flush()?);

    log::debug!(
        "encode: {} frames @ {} Hz, {} ch -> {} bytes",
        pcm.frames(),
        pcm.sample_rate(),
        channels,
        output.len()
    );
    Ok(output)
}

/// Rough CBR output size, used only to pre-size the output buffer.
fn estimated_size(frames: usize, kbps: u32, rate: u32) -> usize {
    let secs = frames as f64 / rate.max(1) as f64;
    (secs * kbps as f64 * 1000.0 / 8.0) as usize + 7200
}

// ---------------------------------------------------------------------------
// LAME
// ---------------------------------------------------------------------------

/// Factory for LAME-backed encoders.
#[derive(Debug, Default, Clone, Copy)]
pub struct LameEncoderFactory;

impl LameEncoderFactory {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderFactory for LameEncoderFactory {
    fn create(&self, spec: EncoderSpec) -> Result<Box<dyn FrameEncoder>, EncodeError> {
        Ok(Box::new(LameFrameEncoder::new(spec)?))
    }
}

/// One LAME encoder instance, never reused across calls.
pub struct LameFrameEncoder {
    inner: mp3lame_encoder::Encoder,
    channels: u16,
    frames_encoded: usize,
}

impl LameFrameEncoder {
    pub fn new(spec: EncoderSpec) -> Result<Self, EncodeError> {
        let init = |what: &str, e: mp3lame_encoder::BuildError| {
            EncodeError::Init(format!("{what}: {e:?}"))
        };

        let mut builder = Builder::new()
            .ok_or_else(|| EncodeError::Init("LAME returned no encoder context".into()))?;
        builder
            .set_num_channels(spec.channels as u8)
            .map_err(|e| init("channels", e))?;
        builder
            .set_sample_rate(spec.sample_rate)
            .map_err(|e| init("sample rate", e))?;
        let kbps = nearest_supported_kbps(spec.bit_rate_kbps);
        if kbps != spec.bit_rate_kbps {
            log::warn!(
                "encode: LAME has no {} kbps mode, using {} kbps",
                spec.bit_rate_kbps,
                kbps
            );
        }
        builder
            .set_brate(lame_bitrate(kbps))
            .map_err(|e| init("bitrate", e))?;
        builder
            .set_quality(lame_quality(spec.quality))
            .map_err(|e| init("quality", e))?;
        let inner = builder.build().map_err(|e| init("build", e))?;

        Ok(Self {
            inner,
            channels: spec.channels,
            frames_encoded: 0,
        })
    }
}

impl FrameEncoder for LameFrameEncoder {
    fn encode_frame(&mut self, samples: &[i16]) -> Result<Vec<u8>, EncodeError> {
        let per_channel = samples.len() / self.channels.max(1) as usize;
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(per_channel));

        let result = if self.channels == 1 {
            self.inner.encode_to_vec(MonoPcm(samples), &mut out)
        } else {
            self.inner.encode_to_vec(InterleavedPcm(samples), &mut out)
        };
        result.map_err(|e| EncodeError::Frame {
            index: self.frames_encoded,
            reason: format!("{e:?}"),
        })?;

        self.frames_encoded += 1;
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, EncodeError> {
        // LAME needs at most 7200 bytes to drain its internal buffers.
        let mut out = Vec::with_capacity(7200);
        self.inner
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| EncodeError::Flush(format!("{e:?}")))?;
        Ok(out)
    }
}

/// Largest supported bitrate not above `kbps` (8 kbps floor).
fn nearest_supported_kbps(kbps: u32) -> u32 {
    SUPPORTED_KBPS
        .iter()
        .copied()
        .filter(|&b| b <= kbps)
        .last()
        .unwrap_or(SUPPORTED_KBPS[0])
}

fn lame_bitrate(kbps: u32) -> Bitrate {
    match nearest_supported_kbps(kbps) {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn lame_quality(level: u8) -> Quality {
    match level {
        0 | 1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
