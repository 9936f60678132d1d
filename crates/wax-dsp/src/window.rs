//! Hann windows and adaptive frame sizing
//!
//! Analysis frames target 23 ms of audio, rounded up to the next power of
//! two and clamped to the range each consumer tolerates. Hop size is always
//! half the frame (50% overlap).

/// Target analysis frame duration in seconds.
pub const FRAME_TARGET_SECONDS: f64 = 0.023;

/// Frame size bounds for the spectral denoiser.
pub const DENOISE_FRAME_RANGE: (usize, usize) = (512, 8192);

/// Frame size bounds for transient detection.
pub const TRANSIENT_FRAME_RANGE: (usize, usize) = (512, 4096);

/// Maximum samples per channel processed as one denoiser segment.
pub const SEGMENT_MAX_SAMPLES: usize = 1_000_000;

/// Generate a length-`len` Hann window.
pub fn hann(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }

    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / (len - 1) as f64;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Pick an analysis frame size for the sample rate: 23 ms rounded up to the
/// next power of two, clamped to `(min, max)`.
pub fn adaptive_frame_size(sample_rate: u32, range: (usize, usize)) -> usize {
    let target = (sample_rate as f64 * FRAME_TARGET_SECONDS).ceil() as usize;
    let pow2 = target.max(1).next_power_of_two();
    pow2.clamp(range.0, range.1)
}

/// Hop size for a frame (50% overlap).
pub fn hop_size(frame_size: usize) -> usize {
    (frame_size / 2).max(1)
}

/// Number of full analysis frames that fit a span of `len` samples,
/// or zero when the span is shorter than one frame.
pub fn frame_count(len: usize, frame_size: usize, hop: usize) -> usize {
    if len < frame_size {
        0
    } else {
        (len - frame_size) / hop + 1
    }
}
