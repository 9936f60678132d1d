//! Pipeline orchestration
//!
//! One request runs start to finish on the calling thread: noise floor,
//! optional spectral denoise, optional transient pre-classification,
//! impulse repair, then diagnostics. The input buffer is cloned into a
//! working copy up front; every later stage mutates only that copy.

use std::time::Instant;

use crate::buffer::AudioBuffer;
use crate::declick::{DetectedEvent, ImpulseRepairer};
use crate::denoise::SpectralDenoiser;
use crate::diagnostics::{
    delta_rms, difference, processing_gain_db, residual_clicks, ProcessingDiagnostics,
};
use crate::error::RestoreResult;
use crate::noise::NoiseProfile;
use crate::settings::{DerivedParams, ProcessingSettings};
use crate::transient::{MultibandTransientDetector, TransientMap};

/// Detection artifacts attached to a result.
#[derive(Debug, Clone)]
pub struct ProcessingArtifacts {
    /// Detected impulses in frame-major, channel-major order
    pub events: Vec<DetectedEvent>,
    /// Segment-RMS profile of the input
    pub noise_profile: NoiseProfile,
}

/// Everything a request produces.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Restored audio, same layout as the input
    pub processed: AudioBuffer,
    /// Sample-wise input minus output
    pub difference: AudioBuffer,
    /// Numeric summary
    pub diagnostics: ProcessingDiagnostics,
    /// Events and noise profile
    pub artifacts: ProcessingArtifacts,
}

/// Run the restoration pipeline over one buffer.
pub fn process(
    input: &AudioBuffer,
    settings: &ProcessingSettings,
) -> RestoreResult<ProcessingResult> {
    let start = Instant::now();
    let channels = input.channels();
    let frames = input.frame_count();

    let noise_profile = NoiseProfile::measure(input);
    let estimated_noise_floor = noise_profile.noise_floor();
    let params = DerivedParams::derive(settings, estimated_noise_floor);
    log::debug!(
        "restore: {} frames x {} ch @ {} Hz, noise floor {:.6}",
        frames,
        channels,
        input.sample_rate(),
        estimated_noise_floor
    );

    let mut working = input.samples().to_vec();

    if params.noise_reduction > 0.0 {
        let mut denoiser = SpectralDenoiser::new(input.sample_rate(), &params)?;
        denoiser.process(&mut working, channels)?;
        log::debug!(
            "restore: spectral denoise done (frame size {})",
            denoiser.frame_size()
        );
    }

    let transients = if params.use_multiband_transient_detection {
        let mut detector = MultibandTransientDetector::new(input.sample_rate())?;
        detector.analyze(&working, channels)?
    } else {
        TransientMap::disabled(frames)
    };

    let outcome = ImpulseRepairer::new(&params, &transients).process(&mut working, channels);
    log::debug!(
        "restore: {} clicks, {} pops, {} decrackles",
        outcome.clicks,
        outcome.pops,
        outcome.decrackles
    );

    let diff = difference(input.samples(), &working);
    let residual = residual_clicks(&working, channels, params.click_threshold);

    let diagnostics = ProcessingDiagnostics {
        elapsed: start.elapsed(),
        clicks_detected: outcome.clicks,
        pops_detected: outcome.pops,
        decrackles_detected: outcome.decrackles,
        residual_clicks: residual,
        estimated_noise_floor,
        processing_gain_db: processing_gain_db(input.samples(), &diff),
        delta_rms: delta_rms(input.samples(), &working),
        transient_threshold_summary: transients.summary,
    };

    Ok(ProcessingResult {
        processed: input.from_processed(working),
        difference: input.from_processed(diff),
        diagnostics,
        artifacts: ProcessingArtifacts {
            events: outcome.events,
            noise_profile,
        },
    })
}
