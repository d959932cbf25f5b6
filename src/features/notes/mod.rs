//! Note assembly from frame observations
//!
//! Turns the per-frame pitch stream into discrete notes:
//! - Octave-error folding against the sounding pitch
//! - N-frame confirmation smoothing
//! - Duration and range gating
//! - Velocity from peak RMS

pub mod segmenter;

pub use segmenter::NoteSegmenter;
