//! Error types for DSP primitives

use thiserror::Error;

/// DSP primitive errors
#[derive(Error, Debug)]
pub enum DspError {
    /// FFT length is not a power of two
    #[error("FFT length must be a power of two, got {0}")]
    InvalidLength(usize),

    /// Buffer length does not match the planned transform
    #[error("Buffer length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;
