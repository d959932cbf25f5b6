//! Audio preprocessing modules
//!
//! Utilities for preparing audio for analysis:
//! - Channel mixing (interleaved multi-channel to mono)
//! - RMS measurement and the silence gate

pub mod channel_mixer;
pub mod silence;
