//! # Stratum Transcribe
//!
//! Monophonic audio-to-MIDI transcription: turns a recorded melody into a list of
//! timed notes, estimates its key and tempo, and writes the result as a Standard
//! MIDI File.
//!
//! ## Features
//!
//! - **Pitch Tracking**: YIN fundamental estimation per window, with an FFT
//!   difference function for large windows
//! - **Note Assembly**: Octave-error folding, multi-frame confirmation, duration and
//!   range gating, velocity from loudness
//! - **Key Detection**: Krumhansl-Schmuckler correlation over a weighted pitch-class
//!   profile
//! - **Tempo Detection**: Block-energy onsets and an inter-onset interval histogram
//! - **Export**: Scale snapping, range presets and MIDI file writing
//! - **Background Work**: Cancellable worker where the newest request wins
//!
//! ## Quick Start
//!
//! ```no_run
//! use stratum_transcribe::{transcribe_audio, TranscriptionConfig};
//! use stratum_transcribe::export::{render_midi, MidiExportOptions};
//!
//! // Load audio samples (mono, f32, normalized)
//! let samples: Vec<f32> = vec![]; // Your audio data
//! let sample_rate = 44100;
//!
//! let result = transcribe_audio(&samples, sample_rate, &TranscriptionConfig::default())?;
//!
//! println!("{} notes, key {}, {} BPM", result.notes.len(), result.key_label(), result.bpm());
//! let midi = render_midi(&result.notes, &MidiExportOptions::for_result(&result))?;
//! # Ok::<(), stratum_transcribe::AnalysisError>(())
//! ```
//!
//! ## Architecture
//!
//! The transcription pipeline follows this flow:
//!
//! ```text
//! Audio Input → Frame Analysis (YIN) → Note Segmentation → Key Estimation → Output
//!             ↘ Block Onsets → IOI Histogram (tempo)    ↗
//! ```
//!
//! Pitch and tempo run side by side on the rayon pool; both read the same buffer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod io;
pub mod preprocessing;
pub mod worker;

// Re-export main types
pub use analysis::metadata::AnalysisMetadata;
pub use analysis::result::{Key, KeyEstimate, Note, TempoEstimate, TranscriptionResult};
pub use config::TranscriptionConfig;
pub use error::AnalysisError;
pub use io::sample_buffer::AudioBuffer;
pub use worker::{CancelToken, TranscriptionHandle, TranscriptionWorker};

use features::key::KeyEstimator;
use features::notes::NoteSegmenter;
use features::period::TempoEstimator;
use features::pitch::FrameAnalyzer;

/// Main transcription function
///
/// Detects the notes of a monophonic recording and estimates its key and tempo.
///
/// # Arguments
///
/// * `samples` - Mono audio samples, normalized to [-1.0, 1.0]
/// * `sample_rate` - Sample rate in Hz (typically 44100 or 48000)
/// * `config` - Transcription parameters
///
/// # Returns
///
/// `TranscriptionResult` with notes in time order, the key (`None` when nothing was
/// voiced) and the tempo (default BPM when too few onsets were found)
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` for an invalid configuration or a zero
/// sample rate. Silent, short or empty audio is not an error.
///
/// # Example
///
/// ```
/// use stratum_transcribe::{transcribe_audio, TranscriptionConfig};
///
/// let samples = vec![0.0f32; 44100]; // one second of silence
/// let result = transcribe_audio(&samples, 44100, &TranscriptionConfig::default())?;
/// assert!(result.notes.is_empty());
/// assert_eq!(result.key_label(), "unknown");
/// assert_eq!(result.bpm(), 120.0);
/// # Ok::<(), stratum_transcribe::AnalysisError>(())
/// ```
pub fn transcribe_audio(
    samples: &[f32],
    sample_rate: u32,
    config: &TranscriptionConfig,
) -> Result<TranscriptionResult, AnalysisError> {
    transcribe_with_cancel(samples, sample_rate, config, &CancelToken::new())
}

/// Transcribe a shared buffer, downmixing it to mono first
///
/// # Errors
///
/// See [`transcribe_audio`].
pub fn transcribe_buffer(
    buffer: &AudioBuffer,
    config: &TranscriptionConfig,
) -> Result<TranscriptionResult, AnalysisError> {
    transcribe_audio(&buffer.to_mono(), buffer.sample_rate(), config)
}

/// [`transcribe_audio`] with cooperative cancellation
///
/// The token is checked between analysis frames and between tempo blocks. A
/// cancelled run returns no partial result.
///
/// # Errors
///
/// Returns `AnalysisError::Cancelled` if the token fires, plus the errors of
/// [`transcribe_audio`].
pub fn transcribe_with_cancel(
    samples: &[f32],
    sample_rate: u32,
    config: &TranscriptionConfig,
    cancel: &CancelToken,
) -> Result<TranscriptionResult, AnalysisError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting transcription: {} samples at {} Hz",
        samples.len(),
        sample_rate
    );

    config.validate()?;

    if sample_rate == 0 {
        return Err(AnalysisError::InvalidInput("Invalid sample rate".to_string()));
    }

    let analyzer = FrameAnalyzer::from_config(config);
    let segmenter = NoteSegmenter::from_config(config);
    let key_estimator = KeyEstimator::new(config.key_method);
    let tempo_estimator = TempoEstimator::from_config(config);

    if samples.len() < config.window_size {
        log::warn!(
            "Audio shorter than one analysis window ({} < {} samples)",
            samples.len(),
            config.window_size
        );
    }

    let (pitch_track, tempo) = rayon::join(
        || {
            let frames = if config.parallel_frames {
                analyzer.analyze_parallel(samples, sample_rate, cancel)?
            } else {
                analyzer.analyze_cancellable(samples, sample_rate, cancel)?
            };
            let notes = segmenter.segment(&frames, config.hop_size, sample_rate);
            let key = key_estimator.estimate_from_notes(&notes);
            Ok::<_, AnalysisError>((frames, notes, key))
        },
        || tempo_estimator.estimate_cancellable(samples, sample_rate, cancel),
    );

    let (frames, notes, key) = pitch_track?;
    let tempo = tempo?;

    if cancel.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    let voiced_frame_count = frames.iter().filter(|f| f.is_voiced()).count();
    log::debug!(
        "{} frames ({} voiced), {} notes",
        frames.len(),
        voiced_frame_count,
        notes.len()
    );

    let processing_time_ms = start_time.elapsed().as_secs_f32() * 1000.0;

    Ok(TranscriptionResult {
        notes,
        key,
        tempo,
        metadata: AnalysisMetadata {
            duration_seconds: samples.len() as f64 / sample_rate as f64,
            sample_rate,
            frame_count: frames.len(),
            voiced_frame_count,
            processing_time_ms,
            ..AnalysisMetadata::default()
        },
    })
}
