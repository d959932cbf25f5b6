//! Transcription result types

use std::fmt;

use serde::{Deserialize, Serialize};

use super::metadata::AnalysisMetadata;

/// Pitch-class names, C = 0
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Parse a pitch-class name ("C", "F#", "Bb") into 0-11
pub fn parse_pitch_class(name: &str) -> Option<u32> {
    let mut chars = name.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let accidental: i32 = match chars.as_str() {
        "" => 0,
        "#" | "♯" => 1,
        "b" | "♭" => -1,
        _ => return None,
    };
    Some((base + accidental).rem_euclid(12) as u32)
}

/// A detected note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch (0-127)
    pub pitch: u8,

    /// Onset time in seconds
    pub start_time: f64,

    /// Release time in seconds (always after `start_time`)
    pub end_time: f64,

    /// Velocity in [0, 1]
    pub velocity: f32,

    /// Mean deviation of the note's frames from `pitch`, in cents (±50)
    pub cent_offset: Option<f32>,
}

impl Note {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Start position in samples at `sample_rate`
    pub fn start_sample(&self, sample_rate: u32) -> usize {
        (self.start_time * sample_rate as f64).round() as usize
    }

    /// End position in samples at `sample_rate`
    pub fn end_sample(&self, sample_rate: u32) -> usize {
        (self.end_time * sample_rate as f64).round() as usize
    }

    /// Pitch class (0 = C)
    pub fn pitch_class(&self) -> u32 {
        self.pitch as u32 % 12
    }

    /// Copy of this note at a different pitch
    pub fn with_pitch(&self, pitch: u8) -> Self {
        Self {
            pitch,
            ..self.clone()
        }
    }
}

/// Musical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Major key (0 = C, 1 = C#, ..., 11 = B)
    Major(u32),
    /// Minor key (0 = C, 1 = C#, ..., 11 = B)
    Minor(u32),
}

impl Key {
    /// Root pitch class (0-11)
    pub fn root(&self) -> u32 {
        match self {
            Key::Major(i) | Key::Minor(i) => *i % 12,
        }
    }

    /// True for major keys
    pub fn is_major(&self) -> bool {
        matches!(self, Key::Major(_))
    }

    /// Key name, e.g. "C Major", "F# Minor"
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_transcribe::analysis::result::Key;
    ///
    /// assert_eq!(Key::Major(0).name(), "C Major");
    /// assert_eq!(Key::Minor(9).name(), "A Minor");
    /// assert_eq!(Key::Major(6).name(), "F# Major");
    /// ```
    pub fn name(&self) -> String {
        let root = PITCH_CLASS_NAMES[self.root() as usize];
        match self {
            Key::Major(_) => format!("{} Major", root),
            Key::Minor(_) => format!("{} Minor", root),
        }
    }

    /// Parse a key name such as "D Major", "a minor", "Bb Minor"
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_transcribe::analysis::result::Key;
    ///
    /// assert_eq!(Key::from_name("D Major"), Some(Key::Major(2)));
    /// assert_eq!(Key::from_name("Bb minor"), Some(Key::Minor(10)));
    /// assert_eq!(Key::from_name("Chromatic"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let mut parts = name.split_whitespace();
        let root = parse_pitch_class(parts.next()?)?;
        let mode = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        match mode.to_ascii_lowercase().as_str() {
            "major" => Some(Key::Major(root)),
            "minor" => Some(Key::Minor(root)),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Key estimate with the score that selected it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Detected key
    pub key: Key,

    /// Score of the winning key (Pearson r for Krumhansl-Schmuckler,
    /// third-interval share for the histogram method)
    pub score: f32,
}

/// Tempo estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Quantized BPM
    pub bpm: f32,

    /// Number of onsets the estimate was built from
    pub onset_count: usize,

    /// True when too few onsets were found and `bpm` is the default
    pub is_default: bool,
}

/// Complete transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Detected notes in time order
    pub notes: Vec<Note>,

    /// Detected key, `None` when there is nothing to judge from
    pub key: Option<KeyEstimate>,

    /// Tempo estimate
    pub tempo: TempoEstimate,

    /// Analysis metadata
    pub metadata: AnalysisMetadata,
}

impl TranscriptionResult {
    /// Key label, "unknown" when no key was detected
    pub fn key_label(&self) -> String {
        key_label(self.key.as_ref())
    }

    /// Detected BPM
    pub fn bpm(&self) -> f32 {
        self.tempo.bpm
    }
}

/// Label for an optional key estimate, "unknown" for `None`
pub fn key_label(estimate: Option<&KeyEstimate>) -> String {
    estimate
        .map(|e| e.key.name())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pitch_class() {
        assert_eq!(parse_pitch_class("C"), Some(0));
        assert_eq!(parse_pitch_class("c#"), Some(1));
        assert_eq!(parse_pitch_class("Cb"), Some(11));
        assert_eq!(parse_pitch_class("B#"), Some(0));
        assert_eq!(parse_pitch_class("H"), None);
        assert_eq!(parse_pitch_class("C##"), None);
    }

    #[test]
    fn test_key_name_round_trip() {
        for root in 0..12 {
            for key in [Key::Major(root), Key::Minor(root)] {
                assert_eq!(Key::from_name(&key.name()), Some(key));
            }
        }
    }

    #[test]
    fn test_key_label_unknown() {
        assert_eq!(key_label(None), "unknown");
        let estimate = KeyEstimate {
            key: Key::Minor(0),
            score: 0.9,
        };
        assert_eq!(key_label(Some(&estimate)), "C Minor");
    }

    #[test]
    fn test_note_helpers() {
        let note = Note {
            pitch: 64,
            start_time: 0.5,
            end_time: 1.25,
            velocity: 0.8,
            cent_offset: None,
        };
        assert!((note.duration() - 0.75).abs() < 1e-12);
        assert_eq!(note.start_sample(44100), 22050);
        assert_eq!(note.end_sample(44100), 55125);
        assert_eq!(note.pitch_class(), 4);
        assert_eq!(note.with_pitch(60).pitch, 60);
        assert_eq!(note.with_pitch(60).start_time, 0.5);
    }
}
