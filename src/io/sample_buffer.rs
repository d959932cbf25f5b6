//! Shared, immutable sample buffer

use std::sync::Arc;

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_to_mono;

/// Immutable interleaved audio with its sample rate and channel count
///
/// Cloning is cheap: the sample data sits behind an `Arc`, so a caller and a
/// background worker can both hold the same recording for as long as they need it.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    data: Arc<[f32]>,
    sample_rate: u32,
    channels: usize,
}

impl AudioBuffer {
    /// Wrap interleaved samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate or channel count.
    pub fn new(data: Vec<f32>, sample_rate: u32, channels: usize) -> Result<Self, AnalysisError> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
        }
        if channels == 0 {
            return Err(AnalysisError::InvalidInput(
                "Channel count must be > 0".to_string(),
            ));
        }
        Ok(Self {
            data: data.into(),
            sample_rate,
            channels,
        })
    }

    /// Wrap mono samples
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` for a zero sample rate.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AnalysisError> {
        Self::new(samples, sample_rate, 1)
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Raw interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Mono view of the recording, channels averaged
    pub fn to_mono(&self) -> Vec<f32> {
        // channels is validated non-zero in the constructor
        downmix_to_mono(&self.data, self.channels).unwrap_or_default()
    }
}
