//! Channel mixing utilities (multi-channel to mono conversion)

use crate::error::AnalysisError;

/// Collapse interleaved multi-channel audio to mono by averaging channels
///
/// # Arguments
///
/// * `interleaved` - Samples ordered frame by frame (`L R L R ...` for stereo)
/// * `channels` - Number of interleaved channels (>= 1)
///
/// # Returns
///
/// One sample per frame. A trailing partial frame is dropped.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `channels` is zero.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    if channels == 0 {
        return Err(AnalysisError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }

    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    if interleaved.len() % channels != 0 {
        log::warn!(
            "Interleaved buffer length {} is not a multiple of {} channels, dropping partial frame",
            interleaved.len(),
            channels
        );
    }

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}

/// Convert separate stereo channels to mono: (L + R) / 2
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the channels differ in length.
pub fn stereo_to_mono(left: &[f32], right: &[f32]) -> Result<Vec<f32>, AnalysisError> {
    if left.len() != right.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "Channel length mismatch: left={}, right={}",
            left.len(),
            right.len()
        )));
    }

    Ok(left
        .iter()
        .zip(right)
        .map(|(&l, &r)| (l + r) * 0.5)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo_averages() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = downmix_to_mono(&interleaved, 2).unwrap();
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1).unwrap(), samples.to_vec());
    }

    #[test]
    fn test_downmix_drops_partial_frame() {
        let interleaved = [0.3, 0.3, 0.3, 0.6, 0.6, 0.6, 0.9];
        let mono = downmix_to_mono(&interleaved, 3).unwrap();
        assert_eq!(mono.len(), 2);
        assert!((mono[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_downmix_zero_channels_is_error() {
        assert!(downmix_to_mono(&[0.0; 4], 0).is_err());
    }

    #[test]
    fn test_stereo_to_mono() {
        let mono = stereo_to_mono(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert_eq!(mono, vec![0.5, 0.5]);
        assert!(stereo_to_mono(&[1.0], &[]).is_err());
    }
}
