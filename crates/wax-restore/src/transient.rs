//! Multi-band transient pre-classification
//!
//! Musical attacks and surface defects both spike the waveform; the
//! difference shows in how the energy spreads across bands over time. The
//! detector mixes the buffer to mono, measures low/mid/high band energy per
//! analysis frame, and flags frames whose energy climbs above the 95th
//! percentile of their two-second neighborhood in any band. Flagged frames
//! relax the impulse thresholds downstream instead of gating repairs
//! outright.

use num_complex::Complex64;
use wax_dsp::analysis::percentile_sorted;
use wax_dsp::window::{adaptive_frame_size, frame_count, hann, hop_size, TRANSIENT_FRAME_RANGE};
use wax_dsp::FftKernel;

use crate::error::RestoreResult;

/// Band split points in Hz.
const MID_BAND_HZ: f64 = 2_000.0;
const HIGH_BAND_HZ: f64 = 6_000.0;

/// Segment threshold percentile.
const THRESHOLD_PERCENTILE: f64 = 0.95;

const BAND_NAMES: [&str; 3] = ["low", "mid", "high"];

/// Per-sample transient map plus the threshold summary.
#[derive(Debug, Clone)]
pub struct TransientMap {
    /// One flag per buffer frame
    pub mask: Vec<bool>,
    /// Human-readable per-band threshold summary
    pub summary: String,
}

impl TransientMap {
    /// A map that flags nothing, used when detection is disabled.
    pub fn disabled(frames: usize) -> Self {
        Self {
            mask: vec![false; frames],
            summary: String::new(),
        }
    }

    /// Whether the frame at `index` was flagged. Out-of-range reads are
    /// non-transient.
    pub fn is_transient(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }
}

/// Three-band spectral transient detector.
pub struct MultibandTransientDetector {
    sample_rate: u32,
    frame_size: usize,
    hop: usize,
    window: Vec<f64>,
    kernel: FftKernel,
    scratch: Vec<Complex64>,
}

impl MultibandTransientDetector {
    /// Build a detector for the sample rate.
    pub fn new(sample_rate: u32) -> RestoreResult<Self> {
        let frame_size = adaptive_frame_size(sample_rate, TRANSIENT_FRAME_RANGE);
        let kernel = FftKernel::new(frame_size)?;

        Ok(Self {
            sample_rate,
            frame_size,
            hop: hop_size(frame_size),
            window: hann(frame_size),
            kernel,
            scratch: vec![Complex64::new(0.0, 0.0); frame_size],
        })
    }

    /// Analysis frame size in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Analyze an interleaved buffer and produce the per-frame map.
    /// The input is not mutated; analysis runs on a mono mixdown.
    pub fn analyze(&mut self, samples: &[f32], channels: usize) -> RestoreResult<TransientMap> {
        let frames_total = samples.len() / channels;

        let mono: Vec<f64> = (0..frames_total)
            .map(|frame| {
                let mut sum = 0.0f64;
                for ch in 0..channels {
                    sum += samples[frame * channels + ch] as f64;
                }
                sum / channels as f64
            })
            .collect();

        let analysis_frames = frame_count(mono.len(), self.frame_size, self.hop);
        if analysis_frames == 0 {
            return Ok(TransientMap::disabled(frames_total));
        }

        let energies = self.band_energies(&mono, analysis_frames)?;

        // Threshold per two-second run of analysis frames, per band.
        let segment_frames = ((self.sample_rate as usize * 2) / self.hop).max(1);
        let mut flagged = vec![false; analysis_frames];
        let mut thresholds: [Vec<f64>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        for (segment, chunk) in energies.chunks(segment_frames).enumerate() {
            let base = segment * segment_frames;
            for band in 0..3 {
                let mut sorted: Vec<f64> = chunk.iter().map(|e| e[band]).collect();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let threshold = percentile_sorted(&sorted, THRESHOLD_PERCENTILE);
                thresholds[band].push(threshold);

                for (offset, energy) in chunk.iter().enumerate() {
                    if energy[band] > threshold {
                        flagged[base + offset] = true;
                    }
                }
            }
        }

        // Dilate by one analysis frame each way.
        let dilated: Vec<bool> = (0..analysis_frames)
            .map(|f| {
                flagged[f]
                    || (f > 0 && flagged[f - 1])
                    || (f + 1 < analysis_frames && flagged[f + 1])
            })
            .collect();

        let mut mask = vec![false; frames_total];
        for (frame, &hit) in dilated.iter().enumerate() {
            if !hit {
                continue;
            }
            let start = frame * self.hop;
            let end = (start + self.hop).min(frames_total);
            for flag in &mut mask[start..end] {
                *flag = true;
            }
        }

        let summary = self.summarize(&thresholds, segment_frames);
        Ok(TransientMap { mask, summary })
    }

    /// Squared-magnitude energy per analysis frame in the low / mid / high
    /// bands, measured below Nyquist at `bin * sample_rate / frame_size`.
    fn band_energies(
        &mut self,
        mono: &[f64],
        analysis_frames: usize,
    ) -> RestoreResult<Vec<[f64; 3]>> {
        let mut energies = Vec::with_capacity(analysis_frames);
        let bin_hz = self.sample_rate as f64 / self.frame_size as f64;

        for frame in 0..analysis_frames {
            let start = frame * self.hop;
            for i in 0..self.frame_size {
                self.scratch[i] = Complex64::new(mono[start + i] * self.window[i], 0.0);
            }
            self.kernel.forward(&mut self.scratch)?;

            let mut bands = [0.0f64; 3];
            for bin in 0..self.frame_size / 2 {
                let freq = bin as f64 * bin_hz;
                let band = if freq < MID_BAND_HZ {
                    0
                } else if freq < HIGH_BAND_HZ {
                    1
                } else {
                    2
                };
                bands[band] += self.scratch[bin].norm_sqr();
            }
            energies.push(bands);
        }

        Ok(energies)
    }

    fn summarize(&self, thresholds: &[Vec<f64>; 3], segment_frames: usize) -> String {
        let segments = thresholds[0].len();
        let mut parts = Vec::with_capacity(3);

        for (band, values) in thresholds.iter().enumerate() {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = values.iter().sum::<f64>() / values.len().max(1) as f64;
            parts.push(format!(
                "{} {:.4e}/{:.4e}/{:.4e}",
                BAND_NAMES[band], min, avg, max
            ));
        }

        format!(
            "band thresholds min/avg/max: {} over {} segment(s) of {} frame(s)",
            parts.join(", "),
            segments,
            segment_frames
        )
    }
}
