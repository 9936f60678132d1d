//! In-place complex FFT over power-of-two lengths
//!
//! Thin kernel around rustfft plans. Forward and inverse plans are created
//! once per length and reused across frames; the inverse is normalized by
//! 1/N so that a forward/inverse round trip reproduces the input.

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::{DspError, DspResult};

/// Complex FFT plan pair for one transform length.
pub struct FftKernel {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftKernel {
    /// Plan forward and inverse transforms of the given power-of-two length.
    pub fn new(len: usize) -> DspResult<Self> {
        if len == 0 || !len.is_power_of_two() {
            return Err(DspError::InvalidLength(len));
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);

        Ok(Self {
            len,
            forward,
            inverse,
        })
    }

    /// Transform length
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the planned length is zero (never, by construction)
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Transform `buffer` in place. `invert` selects the inverse transform,
    /// which scales the result by 1/N.
    pub fn process(&self, buffer: &mut [Complex64], invert: bool) -> DspResult<()> {
        if buffer.len() != self.len {
            return Err(DspError::LengthMismatch {
                expected: self.len,
                got: buffer.len(),
            });
        }

        if invert {
            self.inverse.process(buffer);
            let scale = 1.0 / self.len as f64;
            for bin in buffer.iter_mut() {
                *bin *= scale;
            }
        } else {
            self.forward.process(buffer);
        }

        Ok(())
    }

    /// Forward transform in place.
    pub fn forward(&self, buffer: &mut [Complex64]) -> DspResult<()> {
        self.process(buffer, false)
    }

    /// Inverse transform in place, scaled by 1/N.
    pub fn inverse(&self, buffer: &mut [Complex64]) -> DspResult<()> {
        self.process(buffer, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(FftKernel::new(0).is_err());
        assert!(FftKernel::new(1000).is_err());
        assert!(FftKernel::new(1024).is_ok());
        assert!(FftKernel::new(1).is_ok());
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let kernel = FftKernel::new(64).unwrap();
        let mut buffer = vec![Complex64::new(0.0, 0.0); 32];
        assert!(kernel.forward(&mut buffer).is_err());
    }

    #[test]
    fn test_round_trip_1024() {
        let kernel = FftKernel::new(1024).unwrap();

        let input: Vec<Complex64> = (0..1024)
            .map(|i| {
                let t = i as f64 / 1024.0;
                Complex64::new((2.0 * std::f64::consts::PI * 7.0 * t).sin(), 0.0)
            })
            .collect();

        let mut buffer = input.clone();
        kernel.forward(&mut buffer).unwrap();
        kernel.inverse(&mut buffer).unwrap();

        let err: f64 = input
            .iter()
            .zip(&buffer)
            .map(|(a, b)| (a - b).norm_sqr())
            .sum::<f64>()
            / 1024.0;
        assert!(err.sqrt() < 1e-5, "round-trip RMS error {}", err.sqrt());
    }

    #[test]
    fn test_impulse_spectrum_is_flat() {
        let kernel = FftKernel::new(16).unwrap();
        let mut buffer = vec![Complex64::new(0.0, 0.0); 16];
        buffer[0] = Complex64::new(1.0, 0.0);

        kernel.forward(&mut buffer).unwrap();

        for bin in &buffer {
            assert!((bin.norm() - 1.0).abs() < 1e-12);
        }
    }
}
