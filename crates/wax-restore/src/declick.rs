//! Impulse detection and repair: decrackle, click and pop tiers
//!
//! Samples are classified frame-major with channels innermost, against a
//! three-tier cascade ordered by severity band. Each accepted sample is
//! repaired in place immediately, so later detections see earlier repairs.
//! Detection couples a magnitude guard with an impulse-likeness test: the
//! sample must stand clear of its neighborhood RMS and its second
//! difference must do likewise, which keeps sustained loud material from
//! classifying as a defect.

use serde::{Deserialize, Serialize};

use crate::settings::DerivedParams;
use crate::transient::TransientMap;

/// Threshold relaxation on transient frames.
const TRANSIENT_CLICK_SCALE: f32 = 0.75;
const TRANSIENT_POP_SCALE: f32 = 0.85;

/// Decrackle guard: low bound as a multiple of the noise floor.
const DECRACKLE_FLOOR_SCALE: f32 = 1.8;

/// Neighborhood RMS below this counts as silence.
const QUIET_RMS: f64 = 1e-6;

/// In silence, only magnitudes above this register as impulses.
const QUIET_MAGNITUDE: f32 = 0.001;

/// Band-limited interpolation cutoff (fraction of Nyquist).
const INTERP_CUTOFF: f64 = 0.45;

/// Interpolation weight-sum guard.
const INTERP_EPSILON: f64 = 1e-9;

/// Detected impulse severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Low-level crackle between the noise floor and the click threshold
    Decrackle,
    /// Single-sample defect at or above the click threshold
    Click,
    /// Large defect at or above the pop threshold
    Pop,
}

impl EventKind {
    /// Display name used by the CSV export.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decrackle => "Decrackle",
            Self::Click => "Click",
            Self::Pop => "Pop",
        }
    }
}

/// One detected impulse, recorded before repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedEvent {
    /// Frame position in the buffer
    pub frame: usize,
    /// Severity tier
    pub kind: EventKind,
    /// Magnitude of the offending sample before repair
    pub strength: f32,
}

/// Detection counts and the ordered event list.
#[derive(Debug, Clone, Default)]
pub struct ImpulseOutcome {
    /// Events in detection order (frame-major, channel-major)
    pub events: Vec<DetectedEvent>,
    /// Click-tier detections
    pub clicks: usize,
    /// Pop-tier detections
    pub pops: usize,
    /// Decrackle-tier detections
    pub decrackles: usize,
}

/// Sample at a clamped frame index on one channel.
fn sample_at(samples: &[f32], channels: usize, frames: usize, frame: isize, channel: usize) -> f32 {
    let clamped = frame.clamp(0, frames as isize - 1) as usize;
    samples[clamped * channels + channel]
}

/// RMS over the clamped neighborhood `[frame-window, frame+window]`
/// excluding the center sample.
fn neighborhood_rms(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    window: usize,
) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for offset in -(window as isize)..=(window as isize) {
        if offset == 0 {
            continue;
        }
        let value = sample_at(samples, channels, frames, frame as isize + offset, channel) as f64;
        sum += value * value;
        count += 1;
    }

    (sum / count.max(1) as f64).sqrt()
}

/// Impulse-likeness test: the sample must exceed its neighborhood RMS by
/// `energy_ratio` and its second difference by `hf_ratio`. A silent
/// neighborhood accepts only clearly audible magnitudes.
pub(crate) fn is_impulse_like(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    window: usize,
    energy_ratio: f64,
    hf_ratio: f64,
) -> bool {
    let s = sample_at(samples, channels, frames, frame as isize, channel);
    let local_rms = neighborhood_rms(samples, channels, frames, frame, channel, window);

    if local_rms <= QUIET_RMS {
        return s.abs() > QUIET_MAGNITUDE;
    }

    let prev = sample_at(samples, channels, frames, frame as isize - 1, channel) as f64;
    let next = sample_at(samples, channels, frames, frame as isize + 1, channel) as f64;
    let second_diff = (2.0 * s as f64 - prev - next).abs();

    (s.abs() as f64) > local_rms * energy_ratio && second_diff > local_rms * hf_ratio
}

/// Mean of the clamped neighborhood blended into the sample.
fn neighbor_blend(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    window: usize,
    intensity: f32,
) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for offset in -(window as isize)..=(window as isize) {
        if offset == 0 {
            continue;
        }
        sum += sample_at(samples, channels, frames, frame as isize + offset, channel) as f64;
        count += 1;
    }

    let mean = (sum / count.max(1) as f64) as f32;
    let s = sample_at(samples, channels, frames, frame as isize, channel);
    let i = intensity.clamp(0.0, 1.0);
    s * (1.0 - i) + mean * i
}

/// Median of the clamped neighborhood; an even count averages the two
/// central values.
fn median_repair(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    window: usize,
) -> f32 {
    let mut neighbors = Vec::with_capacity(2 * window);
    for offset in -(window as isize)..=(window as isize) {
        if offset == 0 {
            continue;
        }
        neighbors.push(sample_at(
            samples,
            channels,
            frames,
            frame as isize + offset,
            channel,
        ));
    }

    neighbors.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = neighbors.len();
    if n % 2 == 0 {
        (neighbors[n / 2 - 1] + neighbors[n / 2]) / 2.0
    } else {
        neighbors[n / 2]
    }
}

/// Band-limited estimate of the center sample from its neighbors: a
/// windowed-sinc sum at cutoff 0.45, falling back to the sample itself when
/// the weights cancel.
fn band_limited_estimate(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    radius: usize,
) -> f32 {
    let mut weighted = 0.0f64;
    let mut weight_sum = 0.0f64;

    for offset in -(radius as isize)..=(radius as isize) {
        if offset == 0 {
            continue;
        }
        let delta = offset as f64;
        let x = std::f64::consts::PI * INTERP_CUTOFF * delta;
        let sinc = x.sin() / x;
        let taper = 0.54
            + 0.46 * (std::f64::consts::PI * delta.abs() / radius as f64).cos();
        let weight = sinc * taper;

        weighted +=
            weight * sample_at(samples, channels, frames, frame as isize + offset, channel) as f64;
        weight_sum += weight;
    }

    if weight_sum.abs() < INTERP_EPSILON {
        sample_at(samples, channels, frames, frame as isize, channel)
    } else {
        (weighted / weight_sum) as f32
    }
}

/// Interpolation blended into the sample at the given intensity.
fn interp_blend(
    samples: &[f32],
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
    radius: usize,
    intensity: f32,
) -> f32 {
    let estimate = band_limited_estimate(samples, channels, frames, frame, channel, radius);
    let s = sample_at(samples, channels, frames, frame as isize, channel);
    let i = intensity.clamp(0.0, 1.0);
    s * (1.0 - i) + estimate * i
}

/// Per-request impulse classifier over a working buffer.
pub struct ImpulseRepairer<'a> {
    params: &'a DerivedParams,
    transients: &'a TransientMap,
}

impl<'a> ImpulseRepairer<'a> {
    /// Bind resolved parameters and the transient map.
    pub fn new(params: &'a DerivedParams, transients: &'a TransientMap) -> Self {
        Self { params, transients }
    }

    /// Classify and repair every sample in place. Returns the event list
    /// and per-tier counts.
    pub fn process(&self, samples: &mut [f32], channels: usize) -> ImpulseOutcome {
        let frames = samples.len() / channels;
        let mut outcome = ImpulseOutcome::default();
        let p = self.params;

        for frame in 0..frames {
            let (click_threshold, pop_threshold) = if self.transients.is_transient(frame) {
                (
                    p.click_threshold * TRANSIENT_CLICK_SCALE,
                    p.pop_threshold * TRANSIENT_POP_SCALE,
                )
            } else {
                (p.click_threshold, p.pop_threshold)
            };

            for channel in 0..channels {
                let magnitude = samples[frame * channels + channel].abs();

                let kind = if p.use_decrackle
                    && magnitude >= p.noise_floor * DECRACKLE_FLOOR_SCALE
                    && magnitude < click_threshold
                    && is_impulse_like(samples, channels, frames, frame, channel, 2, 2.2, 1.4)
                {
                    EventKind::Decrackle
                } else if magnitude >= pop_threshold
                    && is_impulse_like(samples, channels, frames, frame, channel, 3, 2.5, 1.2)
                {
                    EventKind::Pop
                } else if magnitude >= click_threshold
                    && is_impulse_like(samples, channels, frames, frame, channel, 2, 2.3, 1.4)
                {
                    EventKind::Click
                } else {
                    continue;
                };

                outcome.events.push(DetectedEvent {
                    frame,
                    kind,
                    strength: magnitude,
                });

                let repaired = match kind {
                    EventKind::Decrackle => {
                        outcome.decrackles += 1;
                        if p.use_band_limited_interpolation {
                            interp_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                6,
                                p.decrackle_intensity,
                            )
                        } else {
                            neighbor_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                1,
                                p.decrackle_intensity,
                            )
                        }
                    }
                    EventKind::Pop => {
                        outcome.pops += 1;
                        if p.use_band_limited_interpolation {
                            interp_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                10,
                                p.pop_intensity,
                            )
                        } else if p.use_median_repair {
                            median_repair(samples, channels, frames, frame, channel, 3)
                        } else {
                            neighbor_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                3,
                                p.pop_intensity,
                            )
                        }
                    }
                    EventKind::Click => {
                        outcome.clicks += 1;
                        if p.use_band_limited_interpolation {
                            interp_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                6,
                                p.click_intensity,
                            )
                        } else if p.use_median_repair {
                            median_repair(samples, channels, frames, frame, channel, 1)
                        } else {
                            neighbor_blend(
                                samples,
                                channels,
                                frames,
                                frame,
                                channel,
                                1,
                                p.click_intensity,
                            )
                        }
                    }
                };

                samples[frame * channels + channel] = repaired;
            }
        }

        outcome
    }
}
