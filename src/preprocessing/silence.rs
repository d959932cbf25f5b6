//! RMS measurement and the silence gate

/// Root-mean-square level of a block of samples (0.0 for an empty block)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&x| x * x).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Gate that marks frames below an RMS threshold as silent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceGate {
    /// RMS threshold (default: 0.01)
    pub threshold: f32,
}

impl Default for SilenceGate {
    fn default() -> Self {
        Self { threshold: 0.01 }
    }
}

impl SilenceGate {
    /// Create a gate with the given RMS threshold
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// True if `level` (an RMS value) falls below the threshold
    pub fn is_silent(&self, level: f32) -> bool {
        !(level >= self.threshold)
    }
}
