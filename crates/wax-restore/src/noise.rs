//! Segment-RMS noise profiling and time-domain floor estimation
//!
//! The buffer is cut into non-overlapping two-second spans; each span's RMS
//! over all channels becomes one profile entry. The scalar floor is the mean
//! of the quietest 20% of spans and seeds the auto-mode thresholds.

use serde::{Deserialize, Serialize};
use wax_dsp::analysis::rms;

use crate::buffer::AudioBuffer;

/// Fraction of quietest segments averaged into the floor.
const QUIET_FRACTION: f64 = 0.2;

/// Per-segment RMS profile of a buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseProfile {
    /// RMS of each segment, in buffer order
    pub segment_rms: Vec<f32>,
    /// Segment span in frames
    pub segment_frames: usize,
    /// Sample rate the profile was measured at
    pub sample_rate: u32,
}

impl NoiseProfile {
    /// Measure the profile of a buffer. Segments span
    /// `max(sample_rate * 2, 1)` frames; the trailing partial segment is
    /// measured like any other.
    pub fn measure(buffer: &AudioBuffer) -> Self {
        let segment_frames = (buffer.sample_rate() as usize * 2).max(1);
        let span = segment_frames * buffer.channels();

        let segment_rms: Vec<f32> = buffer
            .samples()
            .chunks(span)
            .map(rms)
            .collect();

        Self {
            segment_rms,
            segment_frames,
            sample_rate: buffer.sample_rate(),
        }
    }

    /// Time-domain noise floor: mean of the quietest 20% of segments
    /// (at least one). Silence measures 0.
    pub fn noise_floor(&self) -> f32 {
        if self.segment_rms.is_empty() {
            return 0.0;
        }

        let mut sorted = self.segment_rms.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let quiet = ((sorted.len() as f64 * QUIET_FRACTION) as usize).max(1);
        let sum: f64 = sorted[..quiet].iter().map(|&v| v as f64).sum();
        (sum / quiet as f64) as f32
    }
}
