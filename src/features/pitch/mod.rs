//! Pitch tracking modules
//!
//! Per-window fundamental estimation and the frame loop around it:
//! - YIN estimator with parabolic refinement
//! - Frame analyzer with silence gating

pub mod frames;
pub mod yin;

pub use frames::{FrameAnalyzer, FrameObservation, Frames};
pub use yin::{DifferenceMethod, PitchEstimate, YinEstimator};

/// Sentinel MIDI value for "no pitch"
pub const NO_PITCH: f32 = -1.0;

/// Convert a frequency in Hz to a fractional MIDI pitch (A4 = 440 Hz = 69)
pub fn frequency_to_midi(frequency: f32) -> f32 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

/// Convert a fractional MIDI pitch to a frequency in Hz
pub fn midi_to_frequency(midi: f32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69.0) / 12.0)
}
