//! Difference rendering and numeric diagnostics

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wax_dsp::analysis::rms;

use crate::declick::is_impulse_like;

/// Epsilon guard for the gain ratio.
const GAIN_EPSILON: f64 = 1e-10;

/// Relaxed residual-detector parameters.
const RESIDUAL_WINDOW: usize = 2;
const RESIDUAL_ENERGY_RATIO: f64 = 2.1;
const RESIDUAL_HF_RATIO: f64 = 1.2;

/// Numeric summary of one processing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingDiagnostics {
    /// Wall-clock processing time (monotonic)
    pub elapsed: Duration,
    /// Click-tier detections
    pub clicks_detected: usize,
    /// Pop-tier detections
    pub pops_detected: usize,
    /// Decrackle-tier detections
    pub decrackles_detected: usize,
    /// Samples in the processed buffer that still trip the relaxed detector
    pub residual_clicks: usize,
    /// Time-domain noise floor measured on the input
    pub estimated_noise_floor: f32,
    /// 20*log10(rms_in / rms_difference); 0 when nothing was removed
    pub processing_gain_db: f32,
    /// RMS(processed) - RMS(original)
    pub delta_rms: f32,
    /// Per-band transient threshold summary; empty when detection is off
    pub transient_threshold_summary: String,
}

/// Sample-wise `original - processed`.
pub fn difference(original: &[f32], processed: &[f32]) -> Vec<f32> {
    original
        .iter()
        .zip(processed)
        .map(|(a, b)| a - b)
        .collect()
}

/// RMS(processed) - RMS(original).
pub fn delta_rms(original: &[f32], processed: &[f32]) -> f32 {
    rms(processed) - rms(original)
}

/// Removed-signal gain in dB. A silent difference reports exactly 0.
pub fn processing_gain_db(original: &[f32], diff: &[f32]) -> f32 {
    let diff_rms = rms(diff) as f64;
    if diff_rms == 0.0 {
        return 0.0;
    }
    let input_rms = rms(original) as f64;
    (20.0 * ((input_rms + GAIN_EPSILON) / (diff_rms + GAIN_EPSILON)).log10()) as f32
}

/// Count samples of the processed buffer that still look like clicks under
/// relaxed detector parameters. Counting only, no repair.
pub fn residual_clicks(samples: &[f32], channels: usize, click_threshold: f32) -> usize {
    let frames = samples.len() / channels;
    let mut count = 0usize;

    for frame in 0..frames {
        for channel in 0..channels {
            let magnitude = samples[frame * channels + channel].abs();
            if magnitude >= click_threshold
                && is_impulse_like(
                    samples,
                    channels,
                    frames,
                    frame,
                    channel,
                    RESIDUAL_WINDOW,
                    RESIDUAL_ENERGY_RATIO,
                    RESIDUAL_HF_RATIO,
                )
            {
                count += 1;
            }
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_is_elementwise() {
        let original = vec![0.5, -0.25, 0.0];
        let processed = vec![0.25, -0.25, 0.1];
        let diff = difference(&original, &processed);
        assert_eq!(diff, vec![0.25, 0.0, -0.1]);
    }

    #[test]
    fn test_gain_zero_for_identity() {
        let original = vec![0.5f32; 100];
        let diff = vec![0.0f32; 100];
        assert_eq!(processing_gain_db(&original, &diff), 0.0);
    }

    #[test]
    fn test_gain_positive_for_small_difference() {
        let original = vec![0.5f32; 100];
        let diff = vec![0.005f32; 100];
        let gain = processing_gain_db(&original, &diff);
        assert!((gain - 40.0).abs() < 0.1, "gain {}", gain);
    }

    #[test]
    fn test_residual_counts_remaining_spikes() {
        let mut samples = vec![0.01f32; 1_000];
        samples[500] = 0.8;
        assert_eq!(residual_clicks(&samples, 1, 0.2), 1);
        assert_eq!(residual_clicks(&samples, 1, 0.9), 0);
    }
}
