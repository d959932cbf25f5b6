//! Period estimation modules
//!
//! Convert onset times to a tempo:
//! - Inter-onset intervals quantized into a BPM histogram
//! - Mode of the histogram as the estimate

pub mod estimator;
pub mod ioi_histogram;

pub use estimator::TempoEstimator;
pub use ioi_histogram::{bpm_histogram, quantize_bpm};

/// BPM histogram bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BpmCandidate {
    /// Quantized BPM
    pub bpm: f32,

    /// Number of inter-onset intervals that fell into this bin
    pub votes: usize,
}
