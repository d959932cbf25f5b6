//! Krumhansl-Kessler key templates
//!
//! Tonal profiles for 24 keys (12 major + 12 minor), rotated from the C major
//! and C minor probe-tone ratings.

/// Krumhansl-Kessler major profile, tonic at index 0
pub const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor profile, tonic at index 0
pub const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Major key templates (12 keys: C, C#, D, ..., B), indexed by pitch class
    pub major: [[f32; 12]; 12],

    /// Minor key templates (12 keys: C, C#, D, ..., B), indexed by pitch class
    pub minor: [[f32; 12]; 12],
}

impl KeyTemplates {
    /// Create key templates from the Krumhansl-Kessler profiles
    pub fn new() -> Self {
        Self::from_profiles(&MAJOR_PROFILE, &MINOR_PROFILE)
    }

    /// Create key templates from arbitrary tonic-first profiles
    pub fn from_profiles(major: &[f32; 12], minor: &[f32; 12]) -> Self {
        let mut templates = Self {
            major: [[0.0; 12]; 12],
            minor: [[0.0; 12]; 12],
        };
        for root in 0..12 {
            templates.major[root] = rotate(major, root);
            templates.minor[root] = rotate(minor, root);
        }
        templates
    }

    /// Template for the major key on `root` (0 = C)
    pub fn get_major_template(&self, root: u32) -> &[f32; 12] {
        &self.major[root as usize % 12]
    }

    /// Template for the minor key on `root` (0 = C)
    pub fn get_minor_template(&self, root: u32) -> &[f32; 12] {
        &self.minor[root as usize % 12]
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}

/// Move the tonic-first `profile` so its tonic lands on pitch class `root`
fn rotate(profile: &[f32; 12], root: usize) -> [f32; 12] {
    let mut rotated = [0.0; 12];
    for (degree, &weight) in profile.iter().enumerate() {
        rotated[(root + degree) % 12] = weight;
    }
    rotated
}
