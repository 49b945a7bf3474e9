//! Decoded Audio Buffers
//!
//! The playable result of a decode. Buffers are immutable once decoded and
//! shared by reference between the buffer table and every source playing
//! them.

use std::rc::Rc;

/// Shared handle to a decoded buffer
pub type BufferHandle = Rc<DecodedBuffer>;

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// De-interleaved 32-bit float samples at a fixed sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    sample_rate: u32,
    /// One vector per channel, all of equal length
    samples: Vec<Vec<f32>>,
}

impl DecodedBuffer {
    /// Create a buffer from per-channel sample vectors
    ///
    /// Channels shorter than the longest one are zero-padded.
    pub fn new(sample_rate: u32, mut samples: Vec<Vec<f32>>) -> Self {
        let frames = samples.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut samples {
            channel.resize(frames, 0.0);
        }
        Self {
            sample_rate,
            samples,
        }
    }

    /// Create a buffer from interleaved samples
    pub fn from_interleaved(sample_rate: u32, channels: usize, interleaved: &[f32]) -> Self {
        let channels = channels.max(1);
        let frames = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(frames); channels];

        for (i, sample) in interleaved.iter().take(frames * channels).enumerate() {
            samples[i % channels].push(*sample);
        }

        Self {
            sample_rate,
            samples,
        }
    }

    /// Interleave the channels back into a single vector
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_channels() * self.num_frames());
        for frame in 0..self.num_frames() {
            for channel in &self.samples {
                out.push(channel[frame]);
            }
        }
        out
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of sample frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Peak level across all channels in dB
    pub fn peak_db(&self) -> f32 {
        let peak = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|s| s.abs())
            .fold(0.0_f32, f32::max);

        linear_to_db(peak)
    }
}
