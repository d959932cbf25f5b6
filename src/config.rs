//! Configuration parameters for transcription

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::key::KeyMethod;
use crate::features::pitch::yin::DifferenceMethod;

/// Transcription configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    // Framing
    /// Analysis window size in samples (default: 2048)
    pub window_size: usize,

    /// Hop size between windows in samples (default: 512)
    pub hop_size: usize,

    /// RMS below which a frame is treated as silent (default: 0.01)
    pub silence_threshold: f32,

    // Pitch estimation
    /// YIN absolute threshold on the normalized difference (default: 0.15)
    pub yin_threshold: f32,

    /// Lowest accepted fundamental in Hz (default: 50.0)
    ///
    /// A window must hold at least two periods of this frequency, so lowering it
    /// below `2 * sample_rate / window_size` silences every frame.
    pub min_frequency: f32,

    /// Highest accepted fundamental in Hz (default: 5000.0)
    pub max_frequency: f32,

    /// How the YIN difference function is computed (default: Direct)
    pub difference_method: DifferenceMethod,

    /// Evaluate frames on the rayon thread pool (default: false)
    pub parallel_frames: bool,

    // Note segmentation
    /// Consecutive frames that must agree before a pitch is confirmed (default: 3)
    pub confirmation_frames: usize,

    /// Semitone distance beyond which a frame is folded by octaves (default: 6.0)
    pub octave_tolerance: f32,

    /// Shortest note kept, in seconds (default: 0.06)
    pub min_note_duration: f64,

    /// Lowest MIDI pitch kept (default: 21, A0)
    pub min_pitch: u8,

    /// Highest MIDI pitch kept (default: 108, C8)
    pub max_pitch: u8,

    /// Factor mapping peak RMS to velocity (default: 762.0 = 127 * 6)
    pub velocity_scale: f32,

    /// Velocity floor (default: 0.1)
    pub min_velocity: f32,

    /// Velocity ceiling (default: 1.0)
    pub max_velocity: f32,

    // Key detection
    /// Key estimation strategy (default: Krumhansl-Schmuckler)
    pub key_method: KeyMethod,

    // Tempo detection
    /// Block size for onset energy comparison (default: 1024)
    pub tempo_block_size: usize,

    /// A block is an onset when its RMS exceeds the previous block's RMS by this factor (default: 1.5)
    pub onset_energy_ratio: f32,

    /// Minimum onsets required for a tempo estimate (default: 4)
    pub min_onsets: usize,

    /// Tempo reported when too few onsets are found (default: 120.0)
    pub default_bpm: f32,

    /// BPM quantization step (default: 5.0)
    pub bpm_step: f32,

    /// Minimum BPM (default: 60.0)
    pub min_bpm: f32,

    /// Maximum BPM (default: 200.0)
    pub max_bpm: f32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            silence_threshold: 0.01,
            yin_threshold: 0.15,
            min_frequency: 50.0,
            max_frequency: 5000.0,
            difference_method: DifferenceMethod::Direct,
            parallel_frames: false,
            confirmation_frames: 3,
            octave_tolerance: 6.0,
            min_note_duration: 0.06,
            min_pitch: 21,
            max_pitch: 108,
            velocity_scale: 127.0 * 6.0,
            min_velocity: 0.1,
            max_velocity: 1.0,
            key_method: KeyMethod::KrumhanslSchmuckler,
            tempo_block_size: 1024,
            onset_energy_ratio: 1.5,
            min_onsets: 4,
            default_bpm: 120.0,
            bpm_step: 5.0,
            min_bpm: 60.0,
            max_bpm: 200.0,
        }
    }
}

impl TranscriptionConfig {
    /// Check that every parameter is usable
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        fn invalid(msg: &str) -> Result<(), AnalysisError> {
            Err(AnalysisError::InvalidInput(msg.to_string()))
        }

        if self.window_size < 4 {
            return invalid("window_size must be at least 4 samples");
        }
        if self.hop_size == 0 {
            return invalid("hop_size must be > 0");
        }
        if self.hop_size > self.window_size {
            return invalid("hop_size must not exceed window_size");
        }
        if !(self.silence_threshold >= 0.0) {
            return invalid("silence_threshold must be >= 0");
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold < 1.0) {
            return invalid("yin_threshold must lie in (0, 1)");
        }
        if !(self.min_frequency > 0.0 && self.min_frequency < self.max_frequency) {
            return invalid("frequency band must satisfy 0 < min_frequency < max_frequency");
        }
        if self.confirmation_frames == 0 {
            return invalid("confirmation_frames must be >= 1");
        }
        if !(self.octave_tolerance >= 6.0) {
            return invalid("octave_tolerance must be >= 6 semitones");
        }
        if !(self.min_note_duration >= 0.0) {
            return invalid("min_note_duration must be >= 0");
        }
        if self.min_pitch > self.max_pitch || self.max_pitch > 127 {
            return invalid("pitch range must satisfy min_pitch <= max_pitch <= 127");
        }
        if !(self.velocity_scale > 0.0) {
            return invalid("velocity_scale must be > 0");
        }
        if !(self.min_velocity >= 0.0 && self.min_velocity <= self.max_velocity && self.max_velocity <= 1.0) {
            return invalid("velocity bounds must satisfy 0 <= min_velocity <= max_velocity <= 1");
        }
        if self.tempo_block_size == 0 {
            return invalid("tempo_block_size must be > 0");
        }
        if !(self.onset_energy_ratio > 1.0) {
            return invalid("onset_energy_ratio must be > 1");
        }
        if self.min_onsets < 2 {
            return invalid("min_onsets must be >= 2");
        }
        if !(self.bpm_step > 0.0) {
            return invalid("bpm_step must be > 0");
        }
        if !(self.min_bpm > 0.0 && self.min_bpm <= self.max_bpm) {
            return invalid("BPM range must satisfy 0 < min_bpm <= max_bpm");
        }
        if !(self.default_bpm > 0.0) {
            return invalid("default_bpm must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TranscriptionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_velocity_scale() {
        assert_eq!(TranscriptionConfig::default().velocity_scale, 762.0);
    }

    #[test]
    fn test_rejects_zero_hop() {
        let config = TranscriptionConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_inverted_frequency_band() {
        let config = TranscriptionConfig {
            min_frequency: 1000.0,
            max_frequency: 500.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_velocity_bounds() {
        let config = TranscriptionConfig {
            min_velocity: 0.8,
            max_velocity: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let config = TranscriptionConfig {
            yin_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
