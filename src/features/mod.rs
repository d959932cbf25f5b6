//! Feature extraction modules
//!
//! This module contains all feature extraction algorithms:
//! - Pitch tracking (YIN + frame analysis)
//! - Note segmentation
//! - Key detection
//! - Onset detection (block energy)
//! - Period estimation (BPM detection)

pub mod key;
pub mod notes;
pub mod onset;
pub mod period;
pub mod pitch;
