//! Channel reduction and sample-rate conversion.
//!
//! Two pure stages sit between the decoder and the MP3 encoder:
//!
//! 1. [`to_mono`]: average all channels into one.
//! 2. [`resample`]: linearly interpolate down to a target rate.
//!
//! Both return a new [`PcmBuffer`] and leave their input untouched.
//!
//! ## Note
//!
//! The resampler is linear interpolation without a low-pass filter, so some
//! aliasing above the new Nyquist frequency is possible.  The material is
//! speech headed for transcription, which tolerates it.

use super::pcm::PcmBuffer;

// ---------------------------------------------------------------------------
// to_mono
// ---------------------------------------------------------------------------

/// Collapse a multi-channel buffer to one channel by averaging.
///
/// Output sample `i` is the mean of every channel's sample `i`.  A mono input
/// is returned as an identical copy.
///
/// # Example
///
/// ```rust
/// use meeting_audio::audio::{to_mono, PcmBuffer};
///
/// let stereo = PcmBuffer::new(vec![vec![0.5, 0.2], vec![-0.5, 0.4]], 44_100).unwrap();
/// let mono = to_mono(&stereo);
/// assert_eq!(mono.channel_count(), 1);
/// assert!((mono.channel(0)[0] - 0.0).abs() < 1e-6);
/// assert!((mono.channel(0)[1] - 0.3).abs() < 1e-6);
/// ```
pub fn to_mono(pcm: &PcmBuffer) -> PcmBuffer {
    if pcm.channel_count() == 1 {
        return pcm.clone();
    }

    let mixed = downmix(pcm.channels());
    // Lengths are consistent by construction, so this cannot fail.
    PcmBuffer::mono(mixed, pcm.sample_rate()).unwrap_or_else(|_| pcm.clone())
}

/// Average planar channels sample by sample.
fn downmix(channels: &[Vec<f32>]) -> Vec<f32> {
    let n = channels.len() as f32;
    let frames = channels.first().map_or(0, Vec::len);
    (0..frames)
        .map(|i| channels.iter().map(|ch| ch[i]).sum::<f32>() / n)
        .collect()
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample every channel of `pcm` to `target_rate` Hz.
///
/// * Equal rates: identity copy.
/// * `target_rate` above the source rate (or zero): identity copy.  The
///   resampler never upsamples.
/// * Otherwise output length is `round(frames * target / source)`.
///
/// # Example
///
/// ```rust
/// use meeting_audio::audio::{resample, PcmBuffer};
///
/// let hi = PcmBuffer::mono(vec![0.5; 480], 48_000).unwrap();
/// let lo = resample(&hi, 16_000);
/// assert_eq!(lo.frames(), 160);
/// assert_eq!(lo.sample_rate(), 16_000);
///
/// // Never upsampled.
/// let same = resample(&hi, 96_000);
/// assert_eq!(same.frames(), 480);
/// ```
pub fn resample(pcm: &PcmBuffer, target_rate: u32) -> PcmBuffer {
    let source_rate = pcm.sample_rate();
    if target_rate == 0 || target_rate >= source_rate {
        if target_rate > source_rate {
            log::debug!(
                "resample: target {target_rate} Hz above source {source_rate} Hz, keeping source rate"
            );
        }
        return pcm.clone();
    }

    let channels: Vec<Vec<f32>> = pcm
        .channels()
        .iter()
        .map(|ch| resample_linear(ch, source_rate, target_rate))
        .collect();

    PcmBuffer::new(channels, target_rate).unwrap_or_else(|_| pcm.clone())
}

/// Linear-interpolation downsampling of one channel.
///
/// Output sample `i` reads the input at fractional position `i * ratio`
/// (`ratio = source / target`) and blends the floor and ceil neighbours.
/// When the ceil neighbour is past the end, the floor sample is used as-is.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate || target_rate == 0 || target_rate > source_rate {
        return samples.to_vec();
    }

    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples[samples.len() - 1];
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = match (samples.get(idx), samples.get(idx + 1)) {
            (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
            (Some(&a), None) => a,
            (None, _) => last,
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
