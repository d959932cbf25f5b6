//! Tempo estimation from block-energy onsets

use super::ioi_histogram::{bpm_histogram, histogram_mode};
use crate::analysis::result::TempoEstimate;
use crate::config::TranscriptionConfig;
use crate::error::AnalysisError;
use crate::features::onset::detect_block_onsets_cancellable;
use crate::worker::CancelToken;

/// Estimates tempo from onset spacing
#[derive(Debug, Clone)]
pub struct TempoEstimator {
    /// Block size for onset energy comparison
    pub block_size: usize,

    /// Energy increase that marks an onset
    pub onset_energy_ratio: f32,

    /// Onsets required before an estimate is attempted
    pub min_onsets: usize,

    /// Tempo reported when there is not enough evidence
    pub default_bpm: f32,

    /// BPM quantization step
    pub bpm_step: f32,

    /// Minimum BPM
    pub min_bpm: f32,

    /// Maximum BPM
    pub max_bpm: f32,
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::from_config(&TranscriptionConfig::default())
    }
}

impl TempoEstimator {
    /// Build an estimator from the tempo fields of a configuration
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            block_size: config.tempo_block_size,
            onset_energy_ratio: config.onset_energy_ratio,
            min_onsets: config.min_onsets,
            default_bpm: config.default_bpm,
            bpm_step: config.bpm_step,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
        }
    }

    /// Estimate the tempo of a mono buffer
    ///
    /// Never fails: degenerate input (silence, a zero sample rate, too few onsets)
    /// yields the default BPM.
    pub fn estimate(&self, samples: &[f32], sample_rate: u32) -> TempoEstimate {
        match self.estimate_cancellable(samples, sample_rate, &CancelToken::new()) {
            Ok(estimate) => estimate,
            Err(err) => {
                log::warn!("Tempo estimation fell back to default: {}", err);
                self.default_estimate(0)
            }
        }
    }

    /// Estimated BPM of a mono buffer, see [`TempoEstimator::estimate`]
    pub fn estimate_bpm(&self, samples: &[f32], sample_rate: u32) -> f32 {
        self.estimate(samples, sample_rate).bpm
    }

    /// [`TempoEstimator::estimate`], checking `cancel` between blocks
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token fires, or
    /// `AnalysisError::InvalidInput` for a zero block size or sample rate.
    pub fn estimate_cancellable(
        &self,
        samples: &[f32],
        sample_rate: u32,
        cancel: &CancelToken,
    ) -> Result<TempoEstimate, AnalysisError> {
        let onsets = detect_block_onsets_cancellable(
            samples,
            sample_rate,
            self.block_size,
            self.onset_energy_ratio,
            cancel,
        )?;
        let times: Vec<f64> = onsets.iter().map(|o| o.time_seconds).collect();
        Ok(self.estimate_from_onsets(&times))
    }

    /// Estimate the tempo of a list of onset times in seconds
    pub fn estimate_from_onsets(&self, onset_times: &[f64]) -> TempoEstimate {
        if onset_times.len() < self.min_onsets.max(2) {
            log::debug!(
                "Only {} onsets (need {}), using default {} BPM",
                onset_times.len(),
                self.min_onsets,
                self.default_bpm
            );
            return self.default_estimate(onset_times.len());
        }

        let histogram = bpm_histogram(onset_times, self.bpm_step, self.min_bpm, self.max_bpm);
        match histogram_mode(&histogram) {
            Some(best) => {
                log::debug!(
                    "Tempo: {} BPM ({} of {} intervals)",
                    best.bpm,
                    best.votes,
                    onset_times.len() - 1
                );
                TempoEstimate {
                    bpm: best.bpm,
                    onset_count: onset_times.len(),
                    is_default: false,
                }
            }
            None => self.default_estimate(onset_times.len()),
        }
    }

    fn default_estimate(&self, onset_count: usize) -> TempoEstimate {
        TempoEstimate {
            bpm: self.default_bpm,
            onset_count,
            is_default: true,
        }
    }
}
