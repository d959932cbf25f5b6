//! Key detection algorithm
//!
//! Builds a 12-bin pitch-class profile from notes (weight = duration × velocity) or
//! from voiced frames (weight = amplitude × frame duration), then either
//! correlates it against the 24 Krumhansl-Kessler templates or reads the root
//! and third straight off the histogram.
//!
//! # Reference
//!
//! Krumhansl, C. L. (1990). *Cognitive Foundations of Musical Pitch*. Oxford University Press.
//! (Key-finding algorithm developed with M. A. Schmuckler.)

use serde::{Deserialize, Serialize};

use super::templates::KeyTemplates;
use crate::analysis::result::{key_label, Key, KeyEstimate, Note};
use crate::features::pitch::FrameObservation;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-9;

/// Key estimation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMethod {
    /// Pearson correlation against rotated Krumhansl-Kessler profiles
    KrumhanslSchmuckler,
    /// Most weighted pitch class is the root, major vs minor third decides the mode
    HistogramRoot,
}

/// Key detection result
#[derive(Debug, Clone)]
pub struct KeyDetectionResult {
    /// Detected key (best match)
    pub key: Key,

    /// Correlation of the best match
    pub score: f32,

    /// Gap between the best and second-best correlation, relative to the best (0.0-1.0)
    pub clarity: f32,

    /// All 24 key scores (ranked, highest first)
    pub all_scores: Vec<(Key, f32)>,
}

/// Estimates the key of a transcription
#[derive(Debug, Clone)]
pub struct KeyEstimator {
    /// Strategy used by the `estimate_*` methods
    pub method: KeyMethod,

    /// Templates used for correlation
    pub templates: KeyTemplates,
}

impl Default for KeyEstimator {
    fn default() -> Self {
        Self::new(KeyMethod::KrumhanslSchmuckler)
    }
}

impl KeyEstimator {
    /// Create an estimator using `method`
    pub fn new(method: KeyMethod) -> Self {
        Self {
            method,
            templates: KeyTemplates::new(),
        }
    }

    /// Estimate the key of a note list, `None` if the notes carry no weight
    pub fn estimate_from_notes(&self, notes: &[Note]) -> Option<KeyEstimate> {
        self.estimate_from_profile(&pitch_class_profile_from_notes(notes))
    }

    /// Key label of a note list, e.g. "A Minor", or "unknown"
    pub fn estimate_key(&self, notes: &[Note]) -> String {
        key_label(self.estimate_from_notes(notes).as_ref())
    }

    /// Estimate the key of a frame stream, `None` if no frame is voiced
    pub fn estimate_from_frames(
        &self,
        frames: &[FrameObservation],
        hop_size: usize,
        sample_rate: u32,
    ) -> Option<KeyEstimate> {
        if sample_rate == 0 {
            return None;
        }
        let frame_seconds = hop_size as f32 / sample_rate as f32;
        self.estimate_from_profile(&pitch_class_profile_from_frames(frames, frame_seconds))
    }

    /// Estimate the key of a pitch-class profile
    pub fn estimate_from_profile(&self, profile: &[f32; 12]) -> Option<KeyEstimate> {
        let estimate = match self.method {
            KeyMethod::KrumhanslSchmuckler => {
                detect_key_correlation(profile, &self.templates).map(|result| KeyEstimate {
                    key: result.key,
                    score: result.score,
                })
            }
            KeyMethod::HistogramRoot => detect_key_histogram(profile),
        };

        match &estimate {
            Some(e) => log::debug!("Detected key: {} (score {:.3})", e.key.name(), e.score),
            None => log::debug!("No key: empty or flat pitch-class profile"),
        }
        estimate
    }
}

/// Pitch-class profile of a note list, each note weighted by duration × velocity
pub fn pitch_class_profile_from_notes(notes: &[Note]) -> [f32; 12] {
    let mut profile = [0.0f32; 12];
    for note in notes {
        let weight = note.duration().max(0.0) as f32 * note.velocity.max(0.0);
        profile[note.pitch_class() as usize] += weight;
    }
    profile
}

/// Pitch-class profile of voiced frames, each weighted by amplitude × frame duration
pub fn pitch_class_profile_from_frames(frames: &[FrameObservation], frame_seconds: f32) -> [f32; 12] {
    let mut profile = [0.0f32; 12];
    for frame in frames {
        if let Some(midi) = frame.pitch.filter(|m| m.is_finite()) {
            let class = (midi.round() as i32).rem_euclid(12) as usize;
            profile[class] += frame.amplitude.max(0.0) * frame_seconds;
        }
    }
    profile
}

/// Krumhansl-Schmuckler key finding
///
/// Correlates `profile` with each of the 24 templates and ranks the keys. Returns
/// `None` for an all-zero or flat profile, where every correlation is undefined.
pub fn detect_key_correlation(profile: &[f32; 12], templates: &KeyTemplates) -> Option<KeyDetectionResult> {
    if !has_shape(profile) {
        return None;
    }

    let mut scores = Vec::with_capacity(24);
    for root in 0..12 {
        let score = pearson_correlation(profile, templates.get_major_template(root));
        scores.push((Key::Major(root), score));
    }
    for root in 0..12 {
        let score = pearson_correlation(profile, templates.get_minor_template(root));
        scores.push((Key::Minor(root), score));
    }

    // Stable sort: on equal scores the earlier key (majors first, C upward) wins
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (key, score) = scores[0];
    let second = scores[1].1;
    let clarity = if score > EPSILON {
        ((score - second) / score).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(KeyDetectionResult {
        key,
        score,
        clarity,
        all_scores: scores,
    })
}

/// Histogram-root key finding
///
/// The heaviest pitch class is the root; the heavier of its major third (+4) and
/// minor third (+3) picks the mode, major on a tie. The score is the winning
/// third's share of both thirds (0.5 when neither sounds).
pub fn detect_key_histogram(profile: &[f32; 12]) -> Option<KeyEstimate> {
    if !has_shape(profile) {
        return None;
    }

    let root = profile
        .iter()
        .enumerate()
        .fold((0usize, f32::MIN), |best, (i, &w)| if w > best.1 { (i, w) } else { best })
        .0;

    let major_third = profile[(root + 4) % 12];
    let minor_third = profile[(root + 3) % 12];
    let total = major_third + minor_third;

    let (key, third) = if major_third >= minor_third {
        (Key::Major(root as u32), major_third)
    } else {
        (Key::Minor(root as u32), minor_third)
    };
    let score = if total > EPSILON { third / total } else { 0.5 };

    Some(KeyEstimate { key, score })
}

/// Pearson correlation between two 12-bin profiles (0.0 if either is flat)
pub fn pearson_correlation(x: &[f32; 12], y: &[f32; 12]) -> f32 {
    let mean_x = x.iter().sum::<f32>() / 12.0;
    let mean_y = y.iter().sum::<f32>() / 12.0;

    let mut covariance = 0.0f32;
    let mut var_x = 0.0f32;
    let mut var_y = 0.0f32;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator < EPSILON {
        0.0
    } else {
        covariance / denominator
    }
}

/// True if the profile has weight and is not flat
fn has_shape(profile: &[f32; 12]) -> bool {
    if profile.iter().any(|w| !w.is_finite()) {
        return false;
    }
    let max = profile.iter().cloned().fold(f32::MIN, f32::max);
    let min = profile.iter().cloned().fold(f32::MAX, f32::min);
    max > EPSILON && max - min > EPSILON
}
