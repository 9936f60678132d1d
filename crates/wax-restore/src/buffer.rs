//! Interleaved audio buffer

use serde::{Deserialize, Serialize};

use crate::error::{RestoreError, RestoreResult};

/// Interleaved floating-point audio in [-1, 1].
///
/// Invariants enforced at construction: at least one channel, a positive
/// sample rate, a non-empty sample vector whose length is a whole number of
/// frames. The pipeline never mutates an input buffer; it clones into a
/// working copy first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    /// Interleaved samples
    samples: Vec<f32>,
    /// Number of channels
    channels: usize,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a buffer, validating the interleaving invariants.
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> RestoreResult<Self> {
        if channels == 0 {
            return Err(RestoreError::InvalidInput(
                "channel count must be at least 1".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(RestoreError::InvalidSampleRate(sample_rate));
        }
        if samples.is_empty() {
            return Err(RestoreError::InvalidInput("empty sample buffer".to_string()));
        }
        if samples.len() % channels != 0 {
            return Err(RestoreError::InvalidInput(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (multi-channel sample instants)
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Copy one channel out as a contiguous vector.
    pub fn channel(&self, channel: usize) -> Vec<f32> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Mix all channels down to mono (arithmetic mean per frame).
    pub fn mix_mono(&self) -> Vec<f64> {
        let frames = self.frame_count();
        let mut mono = Vec::with_capacity(frames);

        for frame in 0..frames {
            let mut sum = 0.0f64;
            for ch in 0..self.channels {
                sum += self.samples[frame * self.channels + ch] as f64;
            }
            mono.push(sum / self.channels as f64);
        }

        mono
    }

    /// Build a buffer with the same layout from raw samples, skipping
    /// validation. Only for internal use where layout is already proven.
    pub(crate) fn from_processed(&self, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len(), self.samples.len());
        Self {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }
}
