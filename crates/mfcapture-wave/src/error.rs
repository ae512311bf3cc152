//! Error types for the WAVE writer.

use thiserror::Error;

/// Errors that can occur while writing a WAVE file.
#[derive(Debug, Error)]
pub enum WaveError {
    /// I/O error on the output file.
    #[error("WAVE I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The audio format cannot be written as WAVE.
    #[error("Invalid WAVE format: {0}")]
    InvalidFormat(String),

    /// The header or data would overflow a 32-bit RIFF size field.
    #[error("WAVE data too large: {0} bytes")]
    TooLarge(u64),

    /// The sample source failed.
    #[error("Sample source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl WaveError {
    /// Wrap a sample-source error.
    pub fn source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }
}
