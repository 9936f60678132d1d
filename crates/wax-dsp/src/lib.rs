//! wax-dsp: DSP primitives for Waxworks
//!
//! Shared numeric building blocks for the restoration pipeline:
//! - `fft` - In-place complex FFT over power-of-two lengths
//! - `window` - Hann windows, adaptive frame sizing, hop/segment constants
//! - `analysis` - RMS and percentile primitives

pub mod analysis;
pub mod fft;
pub mod window;

mod error;

pub use error::{DspError, DspResult};
pub use fft::FftKernel;
