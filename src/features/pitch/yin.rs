//! YIN fundamental frequency estimation
//!
//! Algorithm:
//! 1. Difference function: d(τ) = Σ (x[i] - x[i+τ])² over the first half of the window
//! 2. Cumulative mean normalized difference: d'(τ) = d(τ)·τ / Σ_{j=1..τ} d(j), d'(0) = 1
//! 3. First τ with d'(τ) below threshold, then descend to the local minimum;
//!    if nothing crosses the threshold, take the global minimum
//! 4. Parabolic interpolation around τ for sub-sample precision
//! 5. frequency = sample_rate / τ, MIDI = 69 + 12·log2(f / 440)
//!
//! # Reference
//!
//! de Cheveigné, A., & Kawahara, H. (2002). YIN, a fundamental frequency estimator for
//! speech and music. *The Journal of the Acoustical Society of America*, 111(4), 1917-1930.
//!
//! # Example
//!
//! ```
//! use stratum_transcribe::features::pitch::yin::YinEstimator;
//!
//! let sample_rate = 44100;
//! let samples: Vec<f32> = (0..2048)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
//!     .collect();
//!
//! let estimator = YinEstimator::default();
//! let estimate = estimator.estimate(&samples, sample_rate).unwrap();
//! assert!((estimate.midi - 69.0).abs() < 0.5);
//! ```

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use super::{frequency_to_midi, NO_PITCH};
use crate::config::TranscriptionConfig;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Interpolation is skipped when the parabola is flatter than this
const PARABOLA_EPSILON: f32 = 1e-6;

/// How the difference function d(τ) is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferenceMethod {
    /// Direct O(N·τ) summation (reference behaviour)
    Direct,
    /// FFT cross-correlation plus prefix energies, cheaper for large windows
    Fft,
}

/// Single-window pitch estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz
    pub frequency: f32,

    /// Fractional MIDI pitch
    pub midi: f32,

    /// Refined period in samples
    pub period: f32,

    /// d'(τ) at the chosen lag (0.0 = perfectly periodic)
    pub aperiodicity: f32,
}

/// YIN pitch estimator
#[derive(Debug, Clone)]
pub struct YinEstimator {
    /// Absolute threshold on d'(τ) (typically 0.1-0.2)
    pub threshold: f32,

    /// Lowest accepted fundamental in Hz
    pub min_frequency: f32,

    /// Highest accepted fundamental in Hz
    pub max_frequency: f32,

    /// Difference function implementation
    pub method: DifferenceMethod,
}

impl Default for YinEstimator {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            min_frequency: 50.0,
            max_frequency: 5000.0,
            method: DifferenceMethod::Direct,
        }
    }
}

impl YinEstimator {
    /// Create an estimator with the given threshold and frequency band
    pub fn new(threshold: f32, min_frequency: f32, max_frequency: f32) -> Self {
        Self {
            threshold,
            min_frequency,
            max_frequency,
            method: DifferenceMethod::Direct,
        }
    }

    /// Build an estimator from the pitch fields of a configuration
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            threshold: config.yin_threshold,
            min_frequency: config.min_frequency,
            max_frequency: config.max_frequency,
            method: config.difference_method,
        }
    }

    /// Use a different difference function implementation
    pub fn with_method(mut self, method: DifferenceMethod) -> Self {
        self.method = method;
        self
    }

    /// Estimate the fundamental of one window
    ///
    /// Returns `None` when the window cannot hold two periods of `min_frequency`,
    /// carries no energy, or resolves to a frequency outside the accepted band.
    pub fn estimate(&self, samples: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        let n = samples.len();
        if n < 4 || sample_rate == 0 || !(self.min_frequency > 0.0) {
            return None;
        }

        let sr = sample_rate as f32;
        let max_period = (sr / self.min_frequency).ceil() as usize;
        if n < 2 * max_period {
            return None;
        }

        let half = n / 2;
        let tau_min = ((sr / self.max_frequency).floor() as usize).max(2);
        let tau_limit = half.min(max_period + 2);
        if tau_min + 1 >= tau_limit {
            return None;
        }

        let energy: f32 = samples.iter().map(|&x| x * x).sum();
        if !(energy > EPSILON) {
            return None;
        }

        let diff = match self.method {
            DifferenceMethod::Direct => difference_direct(samples, half, tau_limit),
            DifferenceMethod::Fft => difference_fft(samples, half, tau_limit),
        };
        let cmnd = cumulative_mean_normalized(&diff);

        let search_end = (max_period + 1).min(tau_limit);
        let tau = pick_period(&cmnd, tau_min, search_end, self.threshold);
        let period = parabolic_refine(&cmnd, tau);
        if !(period > 0.0) {
            return None;
        }

        let frequency = sr / period;
        if !frequency.is_finite()
            || frequency < self.min_frequency
            || frequency > self.max_frequency
        {
            return None;
        }

        Some(PitchEstimate {
            frequency,
            midi: frequency_to_midi(frequency),
            period,
            aperiodicity: cmnd[tau],
        })
    }

    /// Estimate the fractional MIDI pitch of one window, or [`NO_PITCH`] (-1.0)
    pub fn estimate_midi(&self, samples: &[f32], sample_rate: u32) -> f32 {
        self.estimate(samples, sample_rate)
            .map(|e| e.midi)
            .unwrap_or(NO_PITCH)
    }
}

/// d(τ) for τ in [0, tau_limit) by direct summation over `window` samples
pub fn difference_direct(samples: &[f32], window: usize, tau_limit: usize) -> Vec<f32> {
    let mut diff = vec![0.0f32; tau_limit];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        let head = &samples[..window];
        let lagged = &samples[tau..tau + window];
        *d = head
            .iter()
            .zip(lagged)
            .map(|(&a, &b)| {
                let delta = a - b;
                delta * delta
            })
            .sum();
    }
    diff
}

/// d(τ) for τ in [0, tau_limit) via FFT cross-correlation
///
/// d(τ) = Σx[i]² + Σx[i+τ]² - 2·Σx[i]·x[i+τ], the energies from prefix sums and the
/// cross term from one forward/inverse FFT pair.
pub fn difference_fft(samples: &[f32], window: usize, tau_limit: usize) -> Vec<f32> {
    let n = samples.len();
    let fft_size = (n + window).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let mut full: Vec<Complex<f32>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    full.resize(fft_size, Complex::new(0.0, 0.0));

    let mut head: Vec<Complex<f32>> = samples[..window]
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    head.resize(fft_size, Complex::new(0.0, 0.0));

    fft.process(&mut full);
    fft.process(&mut head);

    for (a, b) in full.iter_mut().zip(&head) {
        *a *= b.conj();
    }
    ifft.process(&mut full);

    let scale = 1.0 / fft_size as f32;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &x in samples {
        acc += (x as f64) * (x as f64);
        prefix.push(acc);
    }

    let head_energy = prefix[window];
    let mut diff = vec![0.0f32; tau_limit];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        let lagged_energy = prefix[tau + window] - prefix[tau];
        let cross = (full[tau].re * scale) as f64;
        *d = (head_energy + lagged_energy - 2.0 * cross).max(0.0) as f32;
    }
    diff
}

/// Cumulative mean normalized difference d'(τ), with d'(0) = 1
pub fn cumulative_mean_normalized(diff: &[f32]) -> Vec<f32> {
    let mut cmnd = vec![1.0f32; diff.len()];
    let mut running_sum = 0.0f32;
    for tau in 1..diff.len() {
        running_sum += diff[tau];
        cmnd[tau] = if running_sum > EPSILON {
            diff[tau] * tau as f32 / running_sum
        } else {
            1.0
        };
    }
    cmnd
}

/// First lag below `threshold` descended to its local minimum, else the global minimum
fn pick_period(cmnd: &[f32], tau_min: usize, search_end: usize, threshold: f32) -> usize {
    for tau in tau_min..search_end {
        if cmnd[tau] < threshold {
            let mut best = tau;
            while best + 1 < cmnd.len() && cmnd[best + 1] < cmnd[best] {
                best += 1;
            }
            return best;
        }
    }

    (tau_min..search_end)
        .min_by(|&a, &b| {
            cmnd[a]
                .partial_cmp(&cmnd[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(tau_min)
}

/// Sub-sample lag from a parabola through (τ-1, τ, τ+1)
fn parabolic_refine(cmnd: &[f32], tau: usize) -> f32 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return tau as f32;
    }

    let y1 = cmnd[tau - 1];
    let y2 = cmnd[tau];
    let y3 = cmnd[tau + 1];

    let denominator = y1 - 2.0 * y2 + y3;
    if denominator.abs() < PARABOLA_EPSILON {
        return tau as f32;
    }

    let shift = 0.5 * (y1 - y3) / denominator;
    if shift.abs() > 1.0 {
        return tau as f32;
    }
    tau as f32 + shift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32)
                        .sin()
            })
            .collect()
    }

    #[test]
    fn test_sine_440_is_a4() {
        let samples = sine(440.0, 44100, 2048, 0.8);
        let estimate = YinEstimator::default().estimate(&samples, 44100).unwrap();
        assert!(
            (estimate.midi - 69.0).abs() < 0.5,
            "Expected MIDI ~69, got {:.3}",
            estimate.midi
        );
        assert!((estimate.frequency - 440.0).abs() < 3.0);
        assert!(estimate.aperiodicity < 0.15);
    }

    #[test]
    fn test_sine_round_trip_across_range() {
        let estimator = YinEstimator::default();
        for &frequency in &[82.41f32, 110.0, 196.0, 261.63, 523.25, 987.77, 1760.0] {
            let samples = sine(frequency, 44100, 2048, 0.5);
            let expected = frequency_to_midi(frequency);
            let midi = estimator.estimate_midi(&samples, 44100);
            assert!(
                (midi - expected).abs() < 0.5,
                "{} Hz: expected MIDI {:.2}, got {:.2}",
                frequency,
                expected,
                midi
            );
        }
    }

    #[test]
    fn test_amplitude_does_not_change_pitch() {
        let estimator = YinEstimator::default();
        let loud = estimator.estimate_midi(&sine(330.0, 44100, 2048, 0.9), 44100);
        let quiet = estimator.estimate_midi(&sine(330.0, 44100, 2048, 0.02), 44100);
        assert!((loud - quiet).abs() < 0.05);
    }

    #[test]
    fn test_silence_has_no_pitch() {
        let estimator = YinEstimator::default();
        assert!(estimator.estimate(&[0.0; 2048], 44100).is_none());
        assert_eq!(estimator.estimate_midi(&[0.0; 2048], 44100), NO_PITCH);
    }

    #[test]
    fn test_short_input_has_no_pitch() {
        // 50 Hz at 44.1 kHz needs 2 * 882 samples
        let samples = sine(440.0, 44100, 1000, 0.8);
        assert!(YinEstimator::default().estimate(&samples, 44100).is_none());
        assert!(YinEstimator::default().estimate(&[0.5; 3], 44100).is_none());
    }

    #[test]
    fn test_zero_sample_rate_has_no_pitch() {
        let samples = sine(440.0, 44100, 2048, 0.8);
        assert!(YinEstimator::default().estimate(&samples, 0).is_none());
    }

    #[test]
    fn test_out_of_band_is_rejected() {
        let estimator = YinEstimator::new(0.15, 50.0, 1000.0);
        let samples = sine(1500.0, 44100, 2048, 0.8);
        assert!(estimator.estimate(&samples, 44100).is_none());
    }

    #[test]
    fn test_fft_difference_matches_direct() {
        let samples = sine(220.0, 44100, 2048, 0.7);
        let direct = difference_direct(&samples, 1024, 900);
        let fft = difference_fft(&samples, 1024, 900);
        let peak = direct.iter().cloned().fold(0.0f32, f32::max);
        for (tau, (a, b)) in direct.iter().zip(&fft).enumerate() {
            assert!(
                (a - b).abs() <= peak * 1e-3 + 1e-3,
                "tau {}: direct {} vs fft {}",
                tau,
                a,
                b
            );
        }
    }

    #[test]
    fn test_fft_method_estimates_same_pitch() {
        let samples = sine(261.63, 44100, 4096, 0.6);
        let direct = YinEstimator::default().estimate_midi(&samples, 44100);
        let fft = YinEstimator::default()
            .with_method(DifferenceMethod::Fft)
            .estimate_midi(&samples, 44100);
        assert!((direct - fft).abs() < 0.05, "direct {} vs fft {}", direct, fft);
        assert!((direct - 60.0).abs() < 0.5);
    }

    #[test]
    fn test_cmnd_starts_at_one() {
        let cmnd = cumulative_mean_normalized(&[0.0, 2.0, 1.0, 3.0]);
        assert_eq!(cmnd[0], 1.0);
        assert!((cmnd[1] - 1.0).abs() < 1e-6);
        assert!((cmnd[2] - 2.0 / 3.0).abs() < 1e-6);
        assert!((cmnd[3] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_flat_parabola_keeps_integer_lag() {
        assert_eq!(parabolic_refine(&[0.5, 0.5, 0.5, 0.5], 2), 2.0);
        assert_eq!(parabolic_refine(&[0.5, 0.4, 0.3], 2), 2.0);
    }

    #[test]
    fn test_global_minimum_fallback() {
        // nothing below threshold: the global minimum inside the search range wins
        let cmnd = [1.0, 0.9, 0.8, 0.6, 0.7, 0.5, 0.9, 0.95];
        assert_eq!(pick_period(&cmnd, 2, 7, 0.1), 5);
    }

    #[test]
    fn test_threshold_crossing_descends_to_local_minimum() {
        let cmnd = [1.0, 0.9, 0.8, 0.09, 0.05, 0.02, 0.3, 0.01];
        assert_eq!(pick_period(&cmnd, 2, 8, 0.1), 5);
    }
}
