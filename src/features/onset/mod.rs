//! Onset detection modules
//!
//! Block-energy onset detection for tempo estimation.

pub mod energy_flux;

pub use energy_flux::{detect_block_onsets, detect_block_onsets_cancellable};

/// Detected onset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetCandidate {
    /// Onset time in samples (start of the block)
    pub time_samples: usize,

    /// Onset time in seconds
    pub time_seconds: f64,

    /// RMS energy of the onset block
    pub energy: f32,
}
