//! Audio primitives: raw blobs → PCM → mono/resampled PCM → MP3 bytes.
//!
//! # Pipeline
//!
//! ```text
//! RawAudio ──AudioDecoder──▶ PcmBuffer ──to_mono──▶ resample ──encode_mp3──▶ Vec<u8>
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meeting_audio::audio::{
//!     encode_mp3, resample, to_mono, AudioDecoder, LameEncoderFactory, RawAudio,
//!     SymphoniaDecoder,
//! };
//!
//! let audio = RawAudio::from_path("interview.flac").unwrap();
//! let pcm = SymphoniaDecoder::new().decode(&audio).unwrap();
//! let mono = resample(&to_mono(&pcm), 22_050);
//! let mp3 = encode_mp3(&LameEncoderFactory::new(), &mono, 96, 5).unwrap();
//! println!("{} bytes of mp3", mp3.len());
//! ```

pub mod decode;
pub mod encode;
pub mod media;
pub mod pcm;
pub mod resample;

pub use decode::{AudioDecoder, DecodeError, SymphoniaDecoder};
pub use encode::{
    encode_mp3, f32_to_i16, EncodeError, EncoderFactory, EncoderSpec, FrameEncoder,
    LameEncoderFactory, LameFrameEncoder, MAX_BIT_RATE_KBPS, MP3_FRAME_SAMPLES,
};
pub use media::{
    base_mime_type, mime_from_extension, MediaKind, RawAudio, MP3_MIME_TYPE, OCTET_STREAM,
};
pub use pcm::{PcmBuffer, PcmError};
pub use resample::{resample, resample_linear, to_mono};
