//! Planar floating-point PCM.
//!
//! [`PcmBuffer`] holds one `Vec<f32>` per channel, all of the same length.
//! The constructors enforce that invariant, so every pipeline stage can index
//! channels in lock-step without re-checking.

use thiserror::Error;

// ---------------------------------------------------------------------------
// PcmError
// ---------------------------------------------------------------------------

/// A [`PcmBuffer`] could not be built from the given samples.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PcmError {
    /// No channels were supplied.
    #[error("pcm buffer needs at least one channel")]
    NoChannels,

    /// The sample rate was zero.
    #[error("pcm sample rate must be non-zero")]
    ZeroSampleRate,

    /// Channels disagree on their frame count.
    #[error("channel {channel} has {got} frames, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        got: usize,
    },

    /// Interleaved input length is not a multiple of the channel count.
    #[error("{len} interleaved samples do not divide into {channels} channels")]
    PartialFrame { len: usize, channels: usize },
}

// ---------------------------------------------------------------------------
// PcmBuffer
// ---------------------------------------------------------------------------

/// Linear PCM samples in `[-1.0, 1.0]`, stored per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Build from planar channel data.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, PcmError> {
        if sample_rate == 0 {
            return Err(PcmError::ZeroSampleRate);
        }
        let expected = channels.first().ok_or(PcmError::NoChannels)?.len();
        if let Some((channel, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != expected)
        {
            return Err(PcmError::RaggedChannels {
                channel,
                expected,
                got: ch.len(),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, PcmError> {
        Self::new(vec![samples], sample_rate)
    }

    /// Split interleaved `L R L R …` samples into planar channels.
    ///
    /// ```
    /// use meeting_audio::audio::PcmBuffer;
    ///
    /// let pcm = PcmBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2], 2, 48_000).unwrap();
    /// assert_eq!(pcm.channel(0), &[0.1, 0.2]);
    /// assert_eq!(pcm.channel(1), &[-0.1, -0.2]);
    /// ```
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, PcmError> {
        if channel_count == 0 {
            return Err(PcmError::NoChannels);
        }
        if samples.len() % channel_count != 0 {
            return Err(PcmError::PartialFrame {
                len: samples.len(),
                channels: channel_count,
            });
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Number of channels (always ≥ 1).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics when `index >= channel_count()`.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// All channels, planar.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Interleave back into `L R L R …` order.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let n = self.channel_count();
        let mut out = Vec::with_capacity(self.frames() * n);
        for i in 0..self.frames() {
            out.extend(self.channels.iter().map(|ch| ch[i]));
        }
        out
    }

    /// Keep only the first `count` channels (no-op when already narrower).
    pub fn truncate_channels(&self, count: usize) -> PcmBuffer {
        let keep = count.clamp(1, self.channel_count());
        PcmBuffer {
            channels: self.channels[..keep].to_vec(),
            sample_rate: self.sample_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
