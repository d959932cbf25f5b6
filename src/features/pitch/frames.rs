//! Frame analysis: hop-spaced windows, silence gate, one observation per frame
//!
//! Windows start at multiples of `hop_size` and stop once a window would run past
//! the end of the buffer. Windows whose RMS falls below the silence threshold are
//! reported as silent without running the pitch estimator.

use rayon::prelude::*;

use super::yin::YinEstimator;
use super::NO_PITCH;
use crate::config::TranscriptionConfig;
use crate::error::AnalysisError;
use crate::preprocessing::silence::{rms, SilenceGate};
use crate::worker::CancelToken;

/// Pitch and loudness of one analysis frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameObservation {
    /// Fractional MIDI pitch, `None` for silent or unvoiced frames
    pub pitch: Option<f32>,

    /// RMS amplitude of the window (0.0 for silent frames)
    pub amplitude: f32,
}

impl FrameObservation {
    /// A silent frame
    pub fn silent() -> Self {
        Self {
            pitch: None,
            amplitude: 0.0,
        }
    }

    /// A voiced frame with the given pitch and RMS
    pub fn voiced(midi: f32, amplitude: f32) -> Self {
        Self {
            pitch: Some(midi),
            amplitude,
        }
    }

    /// True if the frame carries a pitch
    pub fn is_voiced(&self) -> bool {
        self.pitch.is_some()
    }

    /// Pitch with the -1.0 sentinel for "no pitch"
    pub fn midi_or_sentinel(&self) -> f32 {
        self.pitch.unwrap_or(NO_PITCH)
    }
}

/// Slides the pitch estimator across a buffer
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    /// Window size in samples
    pub window_size: usize,

    /// Hop between window starts in samples
    pub hop_size: usize,

    /// Silence gate applied before pitch estimation
    pub gate: SilenceGate,

    /// Per-window pitch estimator
    pub estimator: YinEstimator,
}

impl Default for FrameAnalyzer {
    fn default() -> Self {
        Self::from_config(&TranscriptionConfig::default())
    }
}

impl FrameAnalyzer {
    /// Build an analyzer from the framing and pitch fields of a configuration
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            window_size: config.window_size,
            hop_size: config.hop_size,
            gate: SilenceGate::new(config.silence_threshold),
            estimator: YinEstimator::from_config(config),
        }
    }

    /// Number of complete windows in a buffer of `num_samples`
    pub fn frame_count(&self, num_samples: usize) -> usize {
        if self.window_size == 0 || self.hop_size == 0 || num_samples < self.window_size {
            0
        } else {
            (num_samples - self.window_size) / self.hop_size + 1
        }
    }

    /// Observe a single window
    pub fn observe(&self, window: &[f32], sample_rate: u32) -> FrameObservation {
        let level = rms(window);
        if self.gate.is_silent(level) {
            return FrameObservation::silent();
        }

        match self.estimator.estimate(window, sample_rate) {
            Some(estimate) => FrameObservation::voiced(estimate.midi, level),
            None => FrameObservation {
                pitch: None,
                amplitude: level,
            },
        }
    }

    /// Lazy iterator over the frames of `samples`
    ///
    /// Calling this again on the same buffer yields the same sequence.
    pub fn frames<'a>(&'a self, samples: &'a [f32], sample_rate: u32) -> Frames<'a> {
        Frames {
            analyzer: self,
            samples,
            sample_rate,
            next_frame: 0,
            frame_count: self.frame_count(samples.len()),
        }
    }

    /// Observe every frame of `samples`
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Vec<FrameObservation> {
        self.frames(samples, sample_rate).collect()
    }

    /// Observe every frame, checking `cancel` between frames
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token fires before the last frame.
    pub fn analyze_cancellable(
        &self,
        samples: &[f32],
        sample_rate: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<FrameObservation>, AnalysisError> {
        let mut observations = Vec::with_capacity(self.frame_count(samples.len()));
        for observation in self.frames(samples, sample_rate) {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            observations.push(observation);
        }
        Ok(observations)
    }

    /// Observe every frame on the rayon pool
    ///
    /// Produces the same sequence as [`FrameAnalyzer::analyze`]; frames are
    /// independent so only the evaluation order differs.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::Cancelled` if the token fires during the pass.
    pub fn analyze_parallel(
        &self,
        samples: &[f32],
        sample_rate: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<FrameObservation>, AnalysisError> {
        let frame_count = self.frame_count(samples.len());
        let observations: Vec<FrameObservation> = (0..frame_count)
            .into_par_iter()
            .map(|index| {
                if cancel.is_cancelled() {
                    return FrameObservation::silent();
                }
                let start = index * self.hop_size;
                self.observe(&samples[start..start + self.window_size], sample_rate)
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        Ok(observations)
    }
}

/// Iterator over frame observations, see [`FrameAnalyzer::frames`]
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    analyzer: &'a FrameAnalyzer,
    samples: &'a [f32],
    sample_rate: u32,
    next_frame: usize,
    frame_count: usize,
}

impl Iterator for Frames<'_> {
    type Item = FrameObservation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_frame >= self.frame_count {
            return None;
        }
        let start = self.next_frame * self.analyzer.hop_size;
        self.next_frame += 1;
        let window = &self.samples[start..start + self.analyzer.window_size];
        Some(self.analyzer.observe(window, self.sample_rate))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame_count - self.next_frame;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}
