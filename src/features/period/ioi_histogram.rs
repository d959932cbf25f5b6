//! Inter-onset interval histogram
//!
//! Each interval between consecutive onsets votes for `60 / interval` BPM,
//! quantized to a fixed step and clamped to the accepted tempo range. Taking the
//! mode rather than the mean keeps a few spurious onsets from dragging the tempo.

use std::collections::BTreeMap;

use super::BpmCandidate;

/// Quantize `bpm` to the nearest multiple of `step`, clamped to [min_bpm, max_bpm]
pub fn quantize_bpm(bpm: f32, step: f32, min_bpm: f32, max_bpm: f32) -> f32 {
    ((bpm / step).round() * step).clamp(min_bpm, max_bpm)
}

/// Histogram of quantized BPM votes from consecutive onset times (seconds)
///
/// Bins are returned in ascending BPM order. Non-increasing onset pairs are skipped.
pub fn bpm_histogram(onset_times: &[f64], step: f32, min_bpm: f32, max_bpm: f32) -> Vec<BpmCandidate> {
    let mut bins: BTreeMap<i64, usize> = BTreeMap::new();

    for pair in onset_times.windows(2) {
        let interval = pair[1] - pair[0];
        if !(interval > 0.0) {
            continue;
        }
        let bpm = quantize_bpm((60.0 / interval) as f32, step, min_bpm, max_bpm);
        *bins.entry((bpm / step).round() as i64).or_insert(0) += 1;
    }

    bins.into_iter()
        .map(|(bin, votes)| BpmCandidate {
            bpm: bin as f32 * step,
            votes,
        })
        .collect()
}

/// Most voted bin, the lower BPM on ties
pub fn histogram_mode(histogram: &[BpmCandidate]) -> Option<BpmCandidate> {
    histogram
        .iter()
        .fold(None, |best: Option<BpmCandidate>, &candidate| match best {
            Some(b) if b.votes >= candidate.votes => Some(b),
            _ => Some(candidate),
        })
}
