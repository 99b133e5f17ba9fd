//! Container decoding into planar PCM.
//!
//! [`AudioDecoder`] is the seam the compression pipeline decodes through.
//! [`SymphoniaDecoder`] is the production implementation: it probes the
//! container (WAV, FLAC, MP3, AAC/M4A, OGG/Vorbis, WebM/MKV), decodes the
//! first audio track, and returns samples at the source's native rate and
//! channel count.

use std::io::{Cursor, ErrorKind};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use thiserror::Error;

use super::media::{extension_hint, RawAudio};
use super::pcm::{PcmBuffer, PcmError};

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// The input bytes could not be turned into PCM.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No container format recognised the bytes.
    #[error("unrecognised or corrupt container: {0}")]
    Probe(String),

    /// The container holds no decodable audio track.
    #[error("no audio track found")]
    NoTrack,

    /// The track's codec is not supported.
    #[error("unsupported codec: {0}")]
    Codec(String),

    /// Reading or decoding the packet stream failed part-way.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// The stream decoded to zero frames.
    #[error("audio stream contained no samples")]
    Empty,

    /// Decoded samples did not form a consistent buffer.
    #[error(transparent)]
    InvalidPcm(#[from] PcmError),
}

// ---------------------------------------------------------------------------
// AudioDecoder trait
// ---------------------------------------------------------------------------

/// Turns an encoded blob into linear PCM.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// every compression call.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, audio: &RawAudio) -> Result<PcmBuffer, DecodeError>;
}

// ---------------------------------------------------------------------------
// SymphoniaDecoder
// ---------------------------------------------------------------------------

/// Production decoder backed by symphonia's default codec registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, audio: &RawAudio) -> Result<PcmBuffer, DecodeError> {
        let cursor = Cursor::new(audio.bytes.clone());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension_hint(&audio.mime_type) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Probe(e.to_string()))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channel_count = track.codec_params.channels.map(|c| c.count());

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Codec(e.to_string()))?;

        let mut interleaved: Vec<f32> = Vec::new();
        let mut skipped_packets = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(DecodeError::Stream(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("decode: skipping corrupt packet: {e}");
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(DecodeError::Stream(e.to_string())),
            };

            let spec = *decoded.spec();
            let packet_channels = spec.channels.count();
            match channel_count {
                Some(n) if n != packet_channels && !interleaved.is_empty() => {
                    return Err(DecodeError::Stream(format!(
                        "channel count changed mid-stream ({n} -> {packet_channels})"
                    )));
                }
                _ => channel_count = Some(packet_channels),
            }
            sample_rate = Some(spec.rate);

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }

        let channels = channel_count.ok_or(DecodeError::Empty)?;
        let rate = sample_rate.ok_or(DecodeError::Empty)?;
        if interleaved.is_empty() {
            return Err(DecodeError::Empty);
        }

        log::debug!(
            "decode: {} frames, {channels} ch @ {rate} Hz ({skipped_packets} packets skipped)",
            interleaved.len() / channels.max(1)
        );

        Ok(PcmBuffer::from_interleaved(&interleaved, channels, rate)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
