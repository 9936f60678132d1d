//! Processing settings: automatic and manual modes
//!
//! Settings arrive by value per request. The serde round trip doubles as
//! the preset format; unknown fields (UI state) are ignored on read.

use serde::{Deserialize, Serialize};

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Repair and denoise switches shared by both modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Use median repair when band-limited interpolation is off
    pub use_median_repair: bool,
    /// Gentle flooring mode for the spectral denoiser
    pub use_spectral_noise_reduction: bool,
    /// Run the multi-band transient pre-classifier
    pub use_multiband_transient_detection: bool,
    /// Enable the low-level decrackle tier
    pub use_decrackle: bool,
    /// Repair with band-limited interpolation instead of blend/median
    pub use_band_limited_interpolation: bool,
    /// Decrackle repair intensity (0..1)
    pub decrackle_intensity: f32,
    /// Spectral flooring scale for the denoiser (0..1)
    pub spectral_masking_strength: f32,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            use_median_repair: true,
            use_spectral_noise_reduction: false,
            use_multiband_transient_detection: false,
            use_decrackle: false,
            use_band_limited_interpolation: true,
            decrackle_intensity: 0.5,
            spectral_masking_strength: 0.6,
        }
    }
}

/// Automatic mode: thresholds derived from the estimated noise floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSettings {
    /// Click detection sensitivity (0..1)
    pub click_sensitivity: f32,
    /// Pop detection sensitivity (0..1)
    pub pop_sensitivity: f32,
    /// Spectral noise reduction amount (0..1, 0 disables the denoiser)
    pub noise_reduction_amount: f32,
    /// Shared repair switches
    #[serde(flatten)]
    pub options: RepairOptions,
}

impl Default for AutoSettings {
    fn default() -> Self {
        Self {
            click_sensitivity: 0.5,
            pop_sensitivity: 0.5,
            noise_reduction_amount: 0.0,
            options: RepairOptions::default(),
        }
    }
}

/// Manual mode: absolute amplitude thresholds set by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSettings {
    /// Absolute click threshold (amplitude)
    pub click_threshold: f32,
    /// Click repair intensity (0..1)
    pub click_intensity: f32,
    /// Absolute pop threshold (amplitude)
    pub pop_threshold: f32,
    /// Pop repair intensity (0..1)
    pub pop_intensity: f32,
    /// Time-domain noise floor (amplitude)
    pub noise_floor: f32,
    /// Spectral noise reduction amount (0..1, 0 disables the denoiser)
    pub noise_reduction_amount: f32,
    /// Shared repair switches
    #[serde(flatten)]
    pub options: RepairOptions,
}

impl Default for ManualSettings {
    fn default() -> Self {
        Self {
            click_threshold: 0.3,
            click_intensity: 0.85,
            pop_threshold: 0.5,
            pop_intensity: 0.9,
            noise_floor: 0.01,
            noise_reduction_amount: 0.0,
            options: RepairOptions::default(),
        }
    }
}

/// Per-request processing settings. Exactly one mode is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProcessingSettings {
    /// Thresholds derived from the estimated noise floor
    Auto(AutoSettings),
    /// Operator-supplied absolute thresholds
    Manual(ManualSettings),
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self::Auto(AutoSettings::default())
    }
}

impl ProcessingSettings {
    /// Shared repair switches for the active mode.
    pub fn options(&self) -> &RepairOptions {
        match self {
            Self::Auto(auto) => &auto.options,
            Self::Manual(manual) => &manual.options,
        }
    }
}

/// Absolute detection and repair parameters after mode dispatch.
///
/// Sensitivities and intensities are clamped to [0, 1] here; amplitude
/// thresholds are clamped to be non-negative.
#[derive(Debug, Clone)]
pub struct DerivedParams {
    pub click_threshold: f32,
    pub click_intensity: f32,
    pub pop_threshold: f32,
    pub pop_intensity: f32,
    /// Floor used by the decrackle guard (estimated in auto, given in manual)
    pub noise_floor: f32,
    /// Noise reduction amount before gentle-mode scaling
    pub noise_reduction: f32,
    pub decrackle_intensity: f32,
    pub spectral_masking: f32,
    pub use_median_repair: bool,
    pub use_spectral_noise_reduction: bool,
    pub use_multiband_transient_detection: bool,
    pub use_decrackle: bool,
    pub use_band_limited_interpolation: bool,
}

impl DerivedParams {
    /// Resolve settings against the estimated time-domain noise floor.
    pub fn derive(settings: &ProcessingSettings, estimated_noise_floor: f32) -> Self {
        let options = settings.options().clone();

        let (click_threshold, click_intensity, pop_threshold, pop_intensity, noise_floor, reduction) =
            match settings {
                ProcessingSettings::Auto(auto) => {
                    let click_sens = clamp01(auto.click_sensitivity);
                    let pop_sens = clamp01(auto.pop_sensitivity);
                    (
                        estimated_noise_floor * (1.0 + 8.0 * click_sens),
                        0.7 + 0.3 * click_sens,
                        estimated_noise_floor * (1.0 + 12.0 * pop_sens),
                        0.8 + 0.2 * pop_sens,
                        estimated_noise_floor,
                        clamp01(auto.noise_reduction_amount),
                    )
                }
                ProcessingSettings::Manual(manual) => (
                    manual.click_threshold.max(0.0),
                    clamp01(manual.click_intensity),
                    manual.pop_threshold.max(0.0),
                    clamp01(manual.pop_intensity),
                    manual.noise_floor.max(0.0),
                    clamp01(manual.noise_reduction_amount),
                ),
            };

        Self {
            click_threshold,
            click_intensity,
            pop_threshold,
            pop_intensity,
            noise_floor,
            noise_reduction: reduction,
            decrackle_intensity: clamp01(options.decrackle_intensity),
            spectral_masking: clamp01(options.spectral_masking_strength),
            use_median_repair: options.use_median_repair,
            use_spectral_noise_reduction: options.use_spectral_noise_reduction,
            use_multiband_transient_detection: options.use_multiband_transient_detection,
            use_decrackle: options.use_decrackle,
            use_band_limited_interpolation: options.use_band_limited_interpolation,
        }
    }
}
