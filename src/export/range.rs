//! Playable range presets

use serde::{Deserialize, Serialize};

/// Pitch range a transcription is folded into before export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PitchRange {
    /// Any MIDI note
    #[default]
    Full,
    /// C2 (36) to C5 (72)
    C2ToC5,
    /// C3 (48) to C6 (84)
    C3ToC6,
    /// C4 (60) to C7 (96)
    C4ToC7,
}

impl PitchRange {
    /// All presets in menu order
    pub const ALL: [PitchRange; 4] = [
        PitchRange::Full,
        PitchRange::C2ToC5,
        PitchRange::C3ToC6,
        PitchRange::C4ToC7,
    ];

    /// Inclusive MIDI bounds
    pub fn bounds(&self) -> (u8, u8) {
        match self {
            PitchRange::Full => (0, 127),
            PitchRange::C2ToC5 => (36, 72),
            PitchRange::C3ToC6 => (48, 84),
            PitchRange::C4ToC7 => (60, 96),
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            PitchRange::Full => "Full Range",
            PitchRange::C2ToC5 => "C2-C5",
            PitchRange::C3ToC6 => "C3-C6",
            PitchRange::C4ToC7 => "C4-C7",
        }
    }

    /// Parse a display label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(label.trim()))
    }

    /// True if `pitch` lies inside the range
    pub fn contains(&self, pitch: u8) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&pitch)
    }

    /// Move `pitch` by whole octaves until it lies inside the range
    ///
    /// Every preset spans at least an octave, so the pitch class is always kept.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_transcribe::export::range::PitchRange;
    ///
    /// assert_eq!(PitchRange::C3ToC6.fit(40), 52);
    /// assert_eq!(PitchRange::C3ToC6.fit(100), 76);
    /// assert_eq!(PitchRange::C3ToC6.fit(60), 60);
    /// ```
    pub fn fit(&self, pitch: u8) -> u8 {
        let (low, high) = self.bounds();
        let mut fitted = pitch;
        while fitted < low {
            fitted += 12;
        }
        while fitted > high {
            fitted -= 12;
        }
        fitted
    }
}
