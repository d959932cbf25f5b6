//! Key detection modules
//!
//! Detect musical key using:
//! - Krumhansl-Kessler templates (24 keys)
//! - Pearson correlation against a weighted pitch-class profile
//! - Histogram root and third as a lightweight alternative

pub mod detector;
pub mod templates;

pub use detector::{
    detect_key_correlation, detect_key_histogram, pitch_class_profile_from_frames,
    pitch_class_profile_from_notes, KeyDetectionResult, KeyEstimator, KeyMethod,
};
pub use templates::KeyTemplates;
