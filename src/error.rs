//! Error types for the transcription engine
//!
//! Only parameter problems, cancellation and export failures are errors.
//! Silence, short buffers and unvoiced audio degrade to empty results instead.

use thiserror::Error;

/// Errors that can occur during transcription
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Invalid input parameters (configuration, sample rate, channel count)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Processing error during analysis
    #[error("Processing error: {0}")]
    ProcessingError(String),

    /// Numerical error (overflow, non-finite values, etc.)
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// MIDI rendering or file write failed
    #[error("MIDI export error: {0}")]
    MidiExportError(String),

    /// Analysis was cancelled before completion
    #[error("Analysis cancelled")]
    Cancelled,
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::MidiExportError(err.to_string())
    }
}
