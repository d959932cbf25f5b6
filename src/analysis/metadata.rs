//! Analysis metadata structures

use serde::{Deserialize, Serialize};

/// Analysis metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Duration of the analyzed (mono) audio in seconds
    pub duration_seconds: f64,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of analysis frames
    pub frame_count: usize,

    /// Frames that carried a pitch
    pub voiced_frame_count: usize,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f32,

    /// Algorithm version
    pub algorithm_version: String,
}

impl Default for AnalysisMetadata {
    fn default() -> Self {
        Self {
            duration_seconds: 0.0,
            sample_rate: 0,
            frame_count: 0,
            voiced_frame_count: 0,
            processing_time_ms: 0.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl AnalysisMetadata {
    /// Share of frames that carried a pitch (0.0 for an empty analysis)
    pub fn voiced_ratio(&self) -> f32 {
        if self.frame_count == 0 {
            0.0
        } else {
            self.voiced_frame_count as f32 / self.frame_count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voiced_ratio() {
        let mut metadata = AnalysisMetadata::default();
        assert_eq!(metadata.voiced_ratio(), 0.0);
        metadata.frame_count = 8;
        metadata.voiced_frame_count = 2;
        assert_eq!(metadata.voiced_ratio(), 0.25);
    }
}
