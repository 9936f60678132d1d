//! Spectral hiss reduction
//!
//! Per channel the signal is cut into bounded segments, framed with a Hann
//! window and transformed. The noise spectrum is learned from the quietest
//! fifth of the frames in each segment, subtracted from every frame's
//! magnitudes down to a floor, and the per-bin gains are smoothed over time
//! before overlap-add resynthesis. Gain memory survives segment boundaries
//! within a channel so long recordings do not pump at the seams.

use num_complex::Complex64;
use wax_dsp::analysis::rms_f64;
use wax_dsp::window::{
    adaptive_frame_size, frame_count, hann, hop_size, DENOISE_FRAME_RANGE, SEGMENT_MAX_SAMPLES,
};
use wax_dsp::FftKernel;

use crate::error::RestoreResult;
use crate::settings::DerivedParams;

/// One-pole smoothing coefficient for per-bin gains.
const GAIN_SMOOTHING: f64 = 0.85;

/// Reduction multiplier in gentle flooring mode.
const GENTLE_SCALE: f64 = 0.6;

/// Fraction of quietest frames feeding the noise spectrum.
const QUIET_FRACTION: f64 = 0.2;

/// Overlap-add weight guard.
const WEIGHT_EPSILON: f64 = 1e-8;

/// STFT magnitude-subtraction denoiser.
pub struct SpectralDenoiser {
    frame_size: usize,
    hop: usize,
    window: Vec<f64>,
    kernel: FftKernel,
    /// Effective reduction after the gentle-mode scale
    reduction: f64,
    /// Gain floor: 1 - flooring_strength * reduction
    min_gain: f64,
    /// FFT workspace, reused across frames
    scratch: Vec<Complex64>,
}

impl SpectralDenoiser {
    /// Build a denoiser for the sample rate and resolved parameters.
    pub fn new(sample_rate: u32, params: &DerivedParams) -> RestoreResult<Self> {
        let frame_size = adaptive_frame_size(sample_rate, DENOISE_FRAME_RANGE);
        let kernel = FftKernel::new(frame_size)?;

        let mut reduction = params.noise_reduction as f64;
        if params.use_spectral_noise_reduction {
            reduction *= GENTLE_SCALE;
        }
        let min_gain = 1.0 - params.spectral_masking as f64 * reduction;

        Ok(Self {
            frame_size,
            hop: hop_size(frame_size),
            window: hann(frame_size),
            kernel,
            reduction,
            min_gain,
            scratch: vec![Complex64::new(0.0, 0.0); frame_size],
        })
    }

    /// Analysis frame size in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Denoise every channel of an interleaved buffer in place.
    pub fn process(&mut self, samples: &mut [f32], channels: usize) -> RestoreResult<()> {
        for ch in 0..channels {
            let mut channel: Vec<f64> = samples
                .iter()
                .skip(ch)
                .step_by(channels)
                .map(|&s| s as f64)
                .collect();

            // Per-bin gain memory lives for the whole channel.
            let mut gains = vec![1.0f64; self.frame_size];

            let mut start = 0;
            while start < channel.len() {
                let end = (start + SEGMENT_MAX_SAMPLES).min(channel.len());
                self.process_segment(&mut channel[start..end], &mut gains)?;
                start = end;
            }

            for (frame, &value) in channel.iter().enumerate() {
                samples[frame * channels + ch] = value as f32;
            }
        }

        Ok(())
    }

    /// Denoise one bounded span of a channel. Spans shorter than a single
    /// analysis frame are skipped whole, never partially processed.
    fn process_segment(&mut self, segment: &mut [f64], gains: &mut [f64]) -> RestoreResult<()> {
        let frames = frame_count(segment.len(), self.frame_size, self.hop);
        if frames == 0 {
            return Ok(());
        }

        let noise = self.estimate_noise_spectrum(segment, frames)?;

        let mut output = vec![0.0f64; segment.len()];
        let mut weights = vec![0.0f64; segment.len()];

        for frame in 0..frames {
            let start = frame * self.hop;
            self.load_frame(&segment[start..start + self.frame_size]);
            self.kernel.forward(&mut self.scratch)?;

            for bin in 0..self.frame_size {
                let magnitude = self.scratch[bin].norm();
                if magnitude <= 0.0 {
                    continue;
                }

                let reduced =
                    (magnitude - noise[bin] * self.reduction).max(magnitude * self.min_gain);
                let target = reduced / magnitude;

                let gain = GAIN_SMOOTHING * gains[bin] + (1.0 - GAIN_SMOOTHING) * target;
                gains[bin] = gain;

                if gain > 0.0 {
                    self.scratch[bin] *= gain;
                }
            }

            self.kernel.inverse(&mut self.scratch)?;

            for i in 0..self.frame_size {
                output[start + i] += self.scratch[i].re;
                weights[start + i] += self.window[i];
            }
        }

        // Samples never covered by a frame keep their input values.
        for i in 0..segment.len() {
            if weights[i] > 0.0 {
                segment[i] = output[i] / weights[i].max(WEIGHT_EPSILON);
            }
        }

        Ok(())
    }

    /// Bin-wise mean magnitude over the quietest 20% of frames (at least
    /// one), ranked by time-domain RMS with index order breaking ties.
    fn estimate_noise_spectrum(
        &mut self,
        segment: &[f64],
        frames: usize,
    ) -> RestoreResult<Vec<f64>> {
        let mut ranked: Vec<(usize, f64)> = (0..frames)
            .map(|frame| {
                let start = frame * self.hop;
                (frame, rms_f64(&segment[start..start + self.frame_size]))
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        let quiet = ((frames as f64 * QUIET_FRACTION) as usize).max(1);
        let mut noise = vec![0.0f64; self.frame_size];

        for &(frame, _) in ranked.iter().take(quiet) {
            let start = frame * self.hop;
            self.load_frame(&segment[start..start + self.frame_size]);
            self.kernel.forward(&mut self.scratch)?;
            for (bin, accum) in noise.iter_mut().enumerate() {
                *accum += self.scratch[bin].norm();
            }
        }

        for accum in &mut noise {
            *accum /= quiet as f64;
        }

        Ok(noise)
    }

    fn load_frame(&mut self, frame: &[f64]) {
        for (i, &sample) in frame.iter().enumerate() {
            self.scratch[i] = Complex64::new(sample * self.window[i], 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AutoSettings, ProcessingSettings, RepairOptions};

    fn params(amount: f32, gentle: bool) -> DerivedParams {
        let settings = ProcessingSettings::Auto(AutoSettings {
            noise_reduction_amount: amount,
            options: RepairOptions {
                use_spectral_noise_reduction: gentle,
                ..RepairOptions::default()
            },
            ..AutoSettings::default()
        });
        DerivedParams::derive(&settings, 0.01)
    }

    #[test]
    fn test_frame_size_matches_rate() {
        let denoiser = SpectralDenoiser::new(44_100, &params(0.5, false)).unwrap();
        assert_eq!(denoiser.frame_size(), 1024);
    }

    #[test]
    fn test_short_buffer_untouched() {
        let mut denoiser = SpectralDenoiser::new(44_100, &params(0.8, false)).unwrap();
        let mut samples = vec![0.25f32; 100];
        let original = samples.clone();

        denoiser.process(&mut samples, 1).unwrap();
        assert_eq!(samples, original);
    }

    #[test]
    fn test_reduces_noise_energy() {
        let mut denoiser = SpectralDenoiser::new(44_100, &params(0.8, false)).unwrap();

        // Deterministic broadband noise.
        let mut samples: Vec<f32> = (0..44_100)
            .map(|i| {
                let x = (i as u64).wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                (((x >> 33) & 0xffff) as f32 / 65_535.0 - 0.5) * 0.05
            })
            .collect();
        let before = wax_dsp::analysis::rms(&samples);

        denoiser.process(&mut samples, 1).unwrap();
        let after = wax_dsp::analysis::rms(&samples);

        assert!(after < before, "noise RMS should drop: {} -> {}", before, after);
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_gentle_mode_reduces_less() {
        let noise: Vec<f32> = (0..44_100)
            .map(|i| {
                let x = (i as u64).wrapping_mul(2_862_933_555_777_941_757).wrapping_add(3);
                (((x >> 33) & 0xffff) as f32 / 65_535.0 - 0.5) * 0.05
            })
            .collect();

        let mut strong = noise.clone();
        SpectralDenoiser::new(44_100, &params(0.8, false))
            .unwrap()
            .process(&mut strong, 1)
            .unwrap();

        let mut gentle = noise.clone();
        SpectralDenoiser::new(44_100, &params(0.8, true))
            .unwrap()
            .process(&mut gentle, 1)
            .unwrap();

        assert!(wax_dsp::analysis::rms(&gentle) > wax_dsp::analysis::rms(&strong));
    }

    #[test]
    fn test_stereo_channels_processed_independently() {
        let mut denoiser = SpectralDenoiser::new(44_100, &params(0.6, false)).unwrap();

        // Left is silent, right carries noise; left must stay silent.
        let mut samples = Vec::with_capacity(2 * 8192);
        for i in 0..8192 {
            samples.push(0.0f32);
            let x = (i as u64).wrapping_mul(6_364_136_223_846_793_005).wrapping_add(7);
            samples.push((((x >> 33) & 0xffff) as f32 / 65_535.0 - 0.5) * 0.05);
        }

        denoiser.process(&mut samples, 2).unwrap();
        assert!(samples.iter().step_by(2).all(|&s| s.abs() < 1e-9));
    }
}
