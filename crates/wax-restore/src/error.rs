//! Error types for restoration processing

use thiserror::Error;

/// Restoration error types
#[derive(Error, Debug)]
pub enum RestoreError {
    /// Invalid input buffer or settings
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid sample rate
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Decoded audio exceeds the configured sample cap
    #[error("Input too large: {samples} samples exceeds limit of {limit}")]
    InputTooLarge { samples: usize, limit: usize },

    /// DSP primitive failure (bad FFT length)
    #[error("DSP error: {0}")]
    Dsp(#[from] wax_dsp::DspError),

    /// Failed to read an audio file
    #[error("Failed to read audio file: {0}")]
    Read(String),

    /// Failed to write an audio file
    #[error("Failed to write audio file: {0}")]
    Write(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for restoration operations
pub type RestoreResult<T> = Result<T, RestoreError>;
