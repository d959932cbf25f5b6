//! Note post-processing and Standard MIDI File export
//!
//! Scale snapping and range fitting produce new notes; the transcription result is
//! never modified in place.

pub mod midi;
pub mod range;
pub mod scale;

pub use midi::{prepare_notes, render_midi, write_midi_file, MidiExportOptions};
pub use range::PitchRange;
pub use scale::{Scale, ScaleKind};
