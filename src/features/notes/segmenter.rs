//! Note segmentation
//!
//! A single forward pass over frame observations with one note in progress at a time:
//!
//! 1. Fold each voiced frame by octaves until it lies within `octave_tolerance`
//!    semitones of the reference (the sounding note, else the previous voiced frame)
//! 2. Push the rounded pitch into a rolling window of `confirmation_frames`;
//!    the pitch is confirmed once the whole window agrees
//! 3. A confirmed pitch that differs from the sounding note closes it and opens a
//!    new note at the confirming frame
//! 4. Silent or unvoiced frames clear the window and end the sounding note
//! 5. Closed notes shorter than `min_note_duration` or outside the pitch range are dropped
//!
//! Velocity is the loudest frame's RMS times `velocity_scale`, clamped to the
//! configured bounds.

use std::collections::VecDeque;

use crate::analysis::result::Note;
use crate::config::TranscriptionConfig;
use crate::features::pitch::FrameObservation;

/// Assembles notes from a frame stream
#[derive(Debug, Clone)]
pub struct NoteSegmenter {
    /// Frames that must agree before a pitch is confirmed
    pub confirmation_frames: usize,

    /// Semitone distance beyond which frames are folded by octaves
    pub octave_tolerance: f32,

    /// Shortest note kept, in seconds
    pub min_note_duration: f64,

    /// Lowest MIDI pitch kept
    pub min_pitch: u8,

    /// Highest MIDI pitch kept
    pub max_pitch: u8,

    /// Peak RMS to velocity factor
    pub velocity_scale: f32,

    /// Velocity floor
    pub min_velocity: f32,

    /// Velocity ceiling
    pub max_velocity: f32,
}

impl Default for NoteSegmenter {
    fn default() -> Self {
        Self::from_config(&TranscriptionConfig::default())
    }
}

/// Note in progress
#[derive(Debug)]
struct ActiveNote {
    pitch: i32,
    start_frame: usize,
    peak_amplitude: f32,
    cents_sum: f32,
    cents_frames: u32,
}

impl ActiveNote {
    fn new(pitch: i32, start_frame: usize) -> Self {
        Self {
            pitch,
            start_frame,
            peak_amplitude: 0.0,
            cents_sum: 0.0,
            cents_frames: 0,
        }
    }

    fn absorb(&mut self, midi: f32, amplitude: f32) {
        self.peak_amplitude = self.peak_amplitude.max(amplitude);
        if midi.round() as i32 == self.pitch {
            self.cents_sum += (midi - self.pitch as f32) * 100.0;
            self.cents_frames += 1;
        }
    }
}

impl NoteSegmenter {
    /// Build a segmenter from the note fields of a configuration
    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self {
            confirmation_frames: config.confirmation_frames,
            octave_tolerance: config.octave_tolerance,
            min_note_duration: config.min_note_duration,
            min_pitch: config.min_pitch,
            max_pitch: config.max_pitch,
            velocity_scale: config.velocity_scale,
            min_velocity: config.min_velocity,
            max_velocity: config.max_velocity,
        }
    }

    /// Segment a slice of frame observations into notes
    ///
    /// Frame `i` starts at `i * hop_size / sample_rate` seconds. An empty slice, a
    /// zero hop or a zero sample rate yields no notes.
    pub fn segment(
        &self,
        frames: &[FrameObservation],
        hop_size: usize,
        sample_rate: u32,
    ) -> Vec<Note> {
        self.segment_stream(frames.iter().copied(), hop_size, sample_rate)
    }

    /// Segment any frame stream into notes, see [`NoteSegmenter::segment`]
    pub fn segment_stream<I>(&self, frames: I, hop_size: usize, sample_rate: u32) -> Vec<Note>
    where
        I: IntoIterator<Item = FrameObservation>,
    {
        let mut notes = Vec::new();
        if hop_size == 0 || sample_rate == 0 {
            return notes;
        }

        let frame_seconds = hop_size as f64 / sample_rate as f64;
        let window_len = self.confirmation_frames.max(1);
        let mut recent: VecDeque<i32> = VecDeque::with_capacity(window_len);
        let mut previous_pitch: Option<f32> = None;
        let mut active: Option<ActiveNote> = None;
        let mut frame_count = 0usize;

        for (index, frame) in frames.into_iter().enumerate() {
            frame_count = index + 1;

            let raw = match frame.pitch {
                Some(midi) if midi.is_finite() => midi,
                _ => {
                    recent.clear();
                    previous_pitch = None;
                    if let Some(note) = active.take() {
                        self.close(note, index, frame_seconds, &mut notes);
                    }
                    continue;
                }
            };

            let reference = active
                .as_ref()
                .map(|note| note.pitch as f32)
                .or(previous_pitch);
            let midi = match reference {
                Some(reference) => fold_octaves(raw, reference, self.octave_tolerance),
                None => raw,
            };
            previous_pitch = Some(midi);

            let rounded = midi.round() as i32;
            if recent.len() == window_len {
                recent.pop_front();
            }
            recent.push_back(rounded);
            let confirmed = recent.len() == window_len && recent.iter().all(|&p| p == rounded);

            match active.as_mut() {
                Some(note) if note.pitch == rounded || !confirmed => {
                    note.absorb(midi, frame.amplitude);
                }
                _ if confirmed => {
                    if let Some(note) = active.take() {
                        self.close(note, index, frame_seconds, &mut notes);
                    }
                    let mut note = ActiveNote::new(rounded, index);
                    note.absorb(midi, frame.amplitude);
                    active = Some(note);
                }
                _ => {}
            }
        }

        if let Some(note) = active.take() {
            self.close(note, frame_count, frame_seconds, &mut notes);
        }

        log::debug!(
            "Segmented {} frames into {} notes",
            frame_count,
            notes.len()
        );

        notes
    }

    /// Map a peak RMS to a velocity
    pub fn velocity(&self, peak_amplitude: f32) -> f32 {
        (peak_amplitude * self.velocity_scale).clamp(self.min_velocity, self.max_velocity)
    }

    fn close(&self, note: ActiveNote, end_frame: usize, frame_seconds: f64, out: &mut Vec<Note>) {
        let start_time = note.start_frame as f64 * frame_seconds;
        let end_time = end_frame as f64 * frame_seconds;
        let duration = end_time - start_time;

        if !(duration > 0.0) || duration < self.min_note_duration - 1e-9 {
            log::trace!(
                "Dropping note {} at {:.3}s: {:.1} ms is below the duration gate",
                note.pitch,
                start_time,
                duration * 1000.0
            );
            return;
        }

        if note.pitch < self.min_pitch as i32 || note.pitch > self.max_pitch as i32 {
            log::trace!("Dropping note {} at {:.3}s: outside pitch range", note.pitch, start_time);
            return;
        }

        let cent_offset = if note.cents_frames > 0 {
            Some(note.cents_sum / note.cents_frames as f32)
        } else {
            None
        };

        out.push(Note {
            pitch: note.pitch as u8,
            start_time,
            end_time,
            velocity: self.velocity(note.peak_amplitude),
            cent_offset,
        });
    }
}

/// Shift `midi` by octaves until it is within `tolerance` semitones of `reference`
pub fn fold_octaves(midi: f32, reference: f32, tolerance: f32) -> f32 {
    let mut folded = midi;
    while folded - reference > tolerance {
        folded -= 12.0;
    }
    while reference - folded > tolerance {
        folded += 12.0;
    }
    folded
}
