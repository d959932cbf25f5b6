//! Block energy onset detection
//!
//! Detects onsets by comparing each block's energy with the block before it.
//!
//! Algorithm:
//! 1. Divide audio into non-overlapping blocks of `block_size` samples
//! 2. Compute RMS energy per block
//! 3. Block n is an onset if E[n] > ratio · E[n-1] (E[-1] = 0)
//!
//! # Example
//!
//! ```
//! use stratum_transcribe::features::onset::energy_flux::detect_block_onsets;
//!
//! let samples = vec![0.0f32; 44100];
//! let onsets = detect_block_onsets(&samples, 44100, 1024, 1.5)?;
//! assert!(onsets.is_empty());
//! # Ok::<(), stratum_transcribe::AnalysisError>(())
//! ```

use super::OnsetCandidate;
use crate::error::AnalysisError;
use crate::preprocessing::silence::rms;
use crate::worker::CancelToken;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Detect onsets from block-to-block energy jumps
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `block_size` - Block size in samples (typically 1024)
/// * `energy_ratio` - Required energy increase over the previous block (typically 1.5)
///
/// # Returns
///
/// Onsets sorted by time. A trailing partial block is ignored.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero block size or sample rate.
pub fn detect_block_onsets(
    samples: &[f32],
    sample_rate: u32,
    block_size: usize,
    energy_ratio: f32,
) -> Result<Vec<OnsetCandidate>, AnalysisError> {
    detect_block_onsets_cancellable(samples, sample_rate, block_size, energy_ratio, &CancelToken::new())
}

/// [`detect_block_onsets`], checking `cancel` between blocks
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for a zero block size or sample rate and
/// `AnalysisError::Cancelled` if the token fires.
pub fn detect_block_onsets_cancellable(
    samples: &[f32],
    sample_rate: u32,
    block_size: usize,
    energy_ratio: f32,
    cancel: &CancelToken,
) -> Result<Vec<OnsetCandidate>, AnalysisError> {
    if block_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "Block size must be > 0".to_string(),
        ));
    }

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    if samples.len() < block_size {
        log::debug!(
            "Block size ({}) larger than audio length ({}), no onsets",
            block_size,
            samples.len()
        );
        return Ok(Vec::new());
    }

    let mut onsets = Vec::new();
    let mut previous_energy = 0.0f32;

    for (index, block) in samples.chunks_exact(block_size).enumerate() {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let energy = rms(block);
        if energy > EPSILON && energy > energy_ratio * previous_energy {
            let time_samples = index * block_size;
            onsets.push(OnsetCandidate {
                time_samples,
                time_seconds: time_samples as f64 / sample_rate as f64,
                energy,
            });
        }
        previous_energy = energy;
    }

    log::debug!("Block energy detected {} onsets", onsets.len());

    Ok(onsets)
}
