//! Scale quantization
//!
//! Snaps MIDI notes to the nearest tone of a named scale. The catalogue holds the
//! twelve major and twelve natural minor scales plus "Chromatic", which leaves
//! every note alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::result::{Key, PITCH_CLASS_NAMES};

/// Major scale intervals from the root
pub const MAJOR_INTERVALS: [u32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Natural minor scale intervals from the root
pub const MINOR_INTERVALS: [u32; 7] = [0, 2, 3, 5, 7, 8, 10];

/// Name of the scale that accepts every pitch class
pub const CHROMATIC: &str = "Chromatic";

/// Scale family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    /// Major (Ionian)
    Major,
    /// Natural minor (Aeolian)
    Minor,
    /// All twelve pitch classes
    Chromatic,
}

/// A scale rooted on a pitch class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    /// Root pitch class (0 = C)
    pub root: u32,

    /// Scale family
    pub kind: ScaleKind,
}

impl Scale {
    /// Major scale on `root`
    pub fn major(root: u32) -> Self {
        Self {
            root: root % 12,
            kind: ScaleKind::Major,
        }
    }

    /// Natural minor scale on `root`
    pub fn minor(root: u32) -> Self {
        Self {
            root: root % 12,
            kind: ScaleKind::Minor,
        }
    }

    /// The chromatic scale
    pub fn chromatic() -> Self {
        Self {
            root: 0,
            kind: ScaleKind::Chromatic,
        }
    }

    /// Look a scale up by name ("C Major", "F# Minor", "Chromatic")
    ///
    /// Returns `None` for names outside the catalogue.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.trim().eq_ignore_ascii_case(CHROMATIC) {
            return Some(Self::chromatic());
        }
        Key::from_name(name).map(Self::from)
    }

    /// Every scale name in the catalogue, majors then minors then "Chromatic"
    pub fn names() -> Vec<String> {
        let majors = (0..12).map(|root| Scale::major(root).name());
        let minors = (0..12).map(|root| Scale::minor(root).name());
        majors
            .chain(minors)
            .chain(std::iter::once(CHROMATIC.to_string()))
            .collect()
    }

    /// Display name, matching [`Key::name`] for major and minor scales
    pub fn name(&self) -> String {
        let root = PITCH_CLASS_NAMES[(self.root % 12) as usize];
        match self.kind {
            ScaleKind::Major => format!("{} Major", root),
            ScaleKind::Minor => format!("{} Minor", root),
            ScaleKind::Chromatic => CHROMATIC.to_string(),
        }
    }

    /// Pitch classes in the scale, ascending from the root
    pub fn pitch_classes(&self) -> Vec<u32> {
        let intervals: &[u32] = match self.kind {
            ScaleKind::Major => &MAJOR_INTERVALS,
            ScaleKind::Minor => &MINOR_INTERVALS,
            ScaleKind::Chromatic => return (0..12).collect(),
        };
        intervals.iter().map(|i| (self.root + i) % 12).collect()
    }

    /// True if `midi` already lies on the scale
    pub fn contains(&self, midi: u8) -> bool {
        self.kind == ScaleKind::Chromatic || self.pitch_classes().contains(&(midi as u32 % 12))
    }

    /// Nearest scale tone to `midi`
    ///
    /// Searches across octave boundaries, so B snaps up to the next C in C major.
    /// Equidistant candidates resolve downward. Candidates outside 0-127 are never
    /// chosen.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_transcribe::export::scale::Scale;
    ///
    /// let c_major = Scale::from_name("C Major").unwrap();
    /// assert_eq!(c_major.snap(61), 60); // C# -> C
    /// assert_eq!(c_major.snap(66), 65); // F# -> F
    /// assert_eq!(c_major.snap(64), 64);
    /// ```
    pub fn snap(&self, midi: u8) -> u8 {
        if self.contains(midi) {
            return midi;
        }

        let note = midi as i32;
        let pc = note.rem_euclid(12);
        let mut best = note;
        let mut best_distance = i32::MAX;

        for &degree in &self.pitch_classes() {
            let down = (pc - degree as i32).rem_euclid(12);
            let up = (degree as i32 - pc).rem_euclid(12);
            // down first so ties go to the lower tone
            for candidate in [note - down, note + up] {
                if !(0..=127).contains(&candidate) {
                    continue;
                }
                let distance = (candidate - note).abs();
                if distance < best_distance || (distance == best_distance && candidate < best) {
                    best = candidate;
                    best_distance = distance;
                }
            }
        }

        best as u8
    }
}

impl From<Key> for Scale {
    fn from(key: Key) -> Self {
        match key {
            Key::Major(root) => Scale::major(root),
            Key::Minor(root) => Scale::minor(root),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Snap `midi` to the scale called `scale_name`
///
/// Unknown names and "Chromatic" return the note unchanged.
pub fn snap_to_scale(midi: u8, scale_name: &str) -> u8 {
    match Scale::from_name(scale_name) {
        Some(scale) => scale.snap(midi),
        None => {
            log::debug!("Unknown scale '{}', note left unchanged", scale_name);
            midi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue() {
        let names = Scale::names();
        assert_eq!(names.len(), 25);
        assert_eq!(names[0], "C Major");
        assert_eq!(names[12], "C Minor");
        assert_eq!(names[24], "Chromatic");
        for name in &names {
            assert_eq!(&Scale::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_pitch_classes() {
        assert_eq!(Scale::major(2).pitch_classes(), vec![2, 4, 6, 7, 9, 11, 1]);
        assert_eq!(Scale::minor(9).pitch_classes(), vec![9, 11, 0, 2, 4, 5, 7]);
    }

    #[test]
    fn test_c_major_snapping() {
        let scale = Scale::major(0);
        for (input, expected) in [(60, 60), (61, 60), (63, 62), (66, 65), (68, 67), (70, 69), (71, 71)] {
            assert_eq!(scale.snap(input), expected, "snap({})", input);
        }
    }

    #[test]
    fn test_snap_crosses_octave_boundary() {
        // B major has no C: C4 snaps down to B3, not up to B4
        assert_eq!(Scale::major(11).snap(60), 59);
        // F# major has no A, G# sits below and A# above; ties go down
        assert_eq!(Scale::major(6).snap(69), 68);
    }

    #[test]
    fn test_ties_resolve_downward() {
        // D minor: D# sits between D and E
        assert_eq!(Scale::minor(2).snap(63), 62);
        // G# minor: G sits between F# and G#
        assert_eq!(Scale::minor(8).snap(67), 66);
        // E major: C sits between B and C#
        assert_eq!(Scale::major(4).snap(72), 71);
        // A minor: C# sits between C and D
        assert_eq!(Scale::minor(9).snap(61), 60);
    }

    #[test]
    fn test_snap_stays_in_midi_range() {
        // B major has no C; 0 snaps up to C# since the B below is out of range
        assert_eq!(Scale::major(11).snap(0), 1);
        // C major: 127 is G, already in scale
        assert_eq!(Scale::major(0).snap(127), 127);
        // C# major has no G; 127 ties F# (126) / G# (128), down wins
        assert_eq!(Scale::major(1).snap(127), 126);
    }

    #[test]
    fn test_chromatic_and_unknown_are_identity() {
        for midi in [0u8, 61, 127] {
            assert_eq!(snap_to_scale(midi, "Chromatic"), midi);
            assert_eq!(snap_to_scale(midi, "Lydian Dominant"), midi);
        }
        assert_eq!(snap_to_scale(61, "C Major"), 60);
    }

    #[test]
    fn test_from_key() {
        assert_eq!(Scale::from(Key::Minor(9)), Scale::minor(9));
        assert_eq!(Scale::from(Key::Major(7)).name(), "G Major");
    }
}
