//! Standard MIDI File export
//!
//! Writes a single-track (format 0) file at 960 ticks per quarter note. Note times in
//! seconds map to ticks through the export tempo, which is also written as the
//! first meta event, so a sequencer plays the notes back at their original times.

use std::cmp::Ordering;
use std::path::Path;

use midly::num::{u14, u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent, TrackEventKind,
};
use serde::{Deserialize, Serialize};

use super::range::PitchRange;
use super::scale::Scale;
use crate::analysis::result::{Note, TranscriptionResult};
use crate::error::AnalysisError;

/// Standard resolution used by most sequencers
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 960;

/// Pitch bend centre (no bend)
const BEND_CENTER: i32 = 8192;

/// Largest absolute tick that still leaves room in a 28-bit delta
const MAX_TICK: u32 = 0x0FFF_FFFF;

/// Largest tempo a 24-bit meta event holds
const MAX_TEMPO: u32 = 0x00FF_FFFF;

/// Bend range assumed by receivers, in cents either side of centre
const BEND_RANGE_CENTS: f32 = 200.0;

/// Export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiExportOptions {
    /// Ticks per quarter note
    pub ticks_per_quarter: u16,

    /// Tempo written to the file and used to place notes
    pub bpm: f32,

    /// MIDI channel, 0-15
    pub channel: u8,

    /// Emit a pitch bend before each note carrying its cent offset
    pub pitch_bend: bool,

    /// Snap notes to this scale before writing
    pub scale: Option<Scale>,

    /// Fold notes into this range before writing
    pub range: PitchRange,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        Self {
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            bpm: 120.0,
            channel: 0,
            pitch_bend: false,
            scale: None,
            range: PitchRange::Full,
        }
    }
}

impl MidiExportOptions {
    /// Options carrying the tempo detected in `result`
    pub fn for_result(result: &TranscriptionResult) -> Self {
        Self {
            bpm: result.bpm(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > 0x7FFF {
            return Err(AnalysisError::MidiExportError(format!(
                "Ticks per quarter must be in 1..=32767, got {}",
                self.ticks_per_quarter
            )));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(AnalysisError::MidiExportError(format!(
                "Tempo must be positive, got {}",
                self.bpm
            )));
        }
        if self.channel > 15 {
            return Err(AnalysisError::MidiExportError(format!(
                "MIDI channel must be 0-15, got {}",
                self.channel
            )));
        }
        Ok(())
    }

    fn seconds_to_ticks(&self, seconds: f64) -> u32 {
        let ticks = seconds.max(0.0) * self.ticks_per_quarter as f64 * self.bpm as f64 / 60.0;
        ticks.round().min(MAX_TICK as f64) as u32
    }

    fn tempo_micros_per_quarter(&self) -> u32 {
        ((60_000_000.0 / self.bpm as f64).round() as u32).min(MAX_TEMPO)
    }
}

/// Apply the scale and range transforms of `options` to copies of `notes`
///
/// Notes with a non-positive duration are dropped. The result is sorted by start time.
pub fn prepare_notes(notes: &[Note], options: &MidiExportOptions) -> Vec<Note> {
    let mut prepared: Vec<Note> = notes
        .iter()
        .filter(|note| {
            let keep = note.end_time > note.start_time;
            if !keep {
                log::warn!(
                    "Skipping note {} with non-positive duration at {:.3}s",
                    note.pitch,
                    note.start_time
                );
            }
            keep
        })
        .map(|note| {
            let snapped = match &options.scale {
                Some(scale) => scale.snap(note.pitch),
                None => note.pitch,
            };
            note.with_pitch(options.range.fit(snapped))
        })
        .collect();

    prepared.sort_by(|a, b| {
        a.start_time
            .partial_cmp(&b.start_time)
            .unwrap_or(Ordering::Equal)
    });
    prepared
}

/// Render notes to Standard MIDI File bytes
///
/// # Errors
///
/// Returns `AnalysisError::MidiExportError` for invalid options or if encoding fails.
pub fn render_midi(notes: &[Note], options: &MidiExportOptions) -> Result<Vec<u8>, AnalysisError> {
    options.validate()?;

    let channel = u4::from(options.channel);
    let prepared = prepare_notes(notes, options);

    // (absolute tick, order within tick, event); note-offs sort first so a repeated
    // pitch is released before it is struck again
    let mut timed: Vec<(u32, u8, TrackEventKind<'static>)> = Vec::with_capacity(prepared.len() * 3);

    for note in &prepared {
        let start = options.seconds_to_ticks(note.start_time);
        let end = options.seconds_to_ticks(note.end_time).max(start + 1);
        let key = u7::from(note.pitch.min(127));

        if options.pitch_bend {
            timed.push((
                start,
                1,
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::PitchBend {
                        bend: PitchBend(u14::from(bend_value(note.cent_offset))),
                    },
                },
            ));
        }

        timed.push((
            start,
            2,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::from(midi_velocity(note.velocity)),
                },
            },
        ));
        timed.push((
            end,
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::from(0),
                },
            },
        ));
    }

    timed.sort_by_key(|(tick, order, _)| (*tick, *order));

    let mut track = Vec::with_capacity(timed.len() + 2);
    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(
            options.tempo_micros_per_quarter(),
        ))),
    });

    let mut current_tick = 0u32;
    for (tick, _, kind) in timed {
        track.push(TrackEvent {
            delta: u28::from(tick - current_tick),
            kind,
        });
        current_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::from(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::from(options.ticks_per_quarter)),
        ),
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| AnalysisError::MidiExportError(format!("Failed to write MIDI data: {:?}", e)))?;

    log::debug!(
        "Rendered {} notes to {} bytes of MIDI at {} BPM",
        prepared.len(),
        bytes.len(),
        options.bpm
    );
    Ok(bytes)
}

/// Render notes and write them to `path`
///
/// # Errors
///
/// Returns `AnalysisError::MidiExportError` for invalid options, encoding failures and
/// I/O errors.
pub fn write_midi_file<P: AsRef<Path>>(
    path: P,
    notes: &[Note],
    options: &MidiExportOptions,
) -> Result<(), AnalysisError> {
    let bytes = render_midi(notes, options)?;
    std::fs::write(path.as_ref(), &bytes)?;
    log::debug!("Wrote MIDI file {}", path.as_ref().display());
    Ok(())
}

/// Velocity in [0, 1] to a MIDI velocity in [1, 127]
///
/// Zero is avoided since a note-on with velocity 0 is a note-off.
pub fn midi_velocity(velocity: f32) -> u8 {
    if !velocity.is_finite() {
        return 1;
    }
    (velocity * 127.0).round().clamp(1.0, 127.0) as u8
}

/// 14-bit pitch bend for a cent offset, assuming a ±2 semitone bend range
fn bend_value(cent_offset: Option<f32>) -> u16 {
    let cents = cent_offset.filter(|c| c.is_finite()).unwrap_or(0.0);
    let offset = (cents / BEND_RANGE_CENTS * BEND_CENTER as f32).round() as i32;
    (BEND_CENTER + offset).clamp(0, 16383) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start_time: f64, end_time: f64, velocity: f32) -> Note {
        Note {
            pitch,
            start_time,
            end_time,
            velocity,
            cent_offset: None,
        }
    }

    fn midi_events(bytes: &[u8]) -> Vec<(u32, MidiMessage)> {
        let smf = Smf::parse(bytes).unwrap();
        let mut tick = 0u32;
        let mut events = Vec::new();
        for event in &smf.tracks[0] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = event.kind {
                events.push((tick, message));
            }
        }
        events
    }

    #[test]
    fn test_header_and_tempo() {
        let bytes = render_midi(&[note(60, 0.0, 0.5, 0.8)], &MidiExportOptions::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::from(960)));
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::from(500_000)))
        );
        assert_eq!(
            smf.tracks[0].last().unwrap().kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        );
    }

    #[test]
    fn test_note_placement() {
        // 120 BPM, 960 tpq: one second is 1920 ticks
        let notes = [note(60, 0.0, 0.5, 0.8), note(64, 1.0, 1.25, 1.0)];
        let events = midi_events(&render_midi(&notes, &MidiExportOptions::default()).unwrap());
        assert_eq!(
            events,
            vec![
                (0, MidiMessage::NoteOn { key: u7::from(60), vel: u7::from(102) }),
                (960, MidiMessage::NoteOff { key: u7::from(60), vel: u7::from(0) }),
                (1920, MidiMessage::NoteOn { key: u7::from(64), vel: u7::from(127) }),
                (2400, MidiMessage::NoteOff { key: u7::from(64), vel: u7::from(0) }),
            ]
        );
    }

    #[test]
    fn test_tempo_scales_ticks() {
        let options = MidiExportOptions {
            bpm: 90.0,
            ..MidiExportOptions::default()
        };
        let events = midi_events(&render_midi(&[note(62, 2.0, 3.0, 0.5)], &options).unwrap());
        // 2 s at 90 BPM is 3 beats
        assert_eq!(events[0].0, 2880);
        assert_eq!(events[1].0, 4320);
        let smf_bytes = render_midi(&[], &options).unwrap();
        let smf = Smf::parse(&smf_bytes).unwrap();
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::from(666_667)))
        );
    }

    #[test]
    fn test_repeated_pitch_releases_before_restrike() {
        let notes = [note(60, 0.0, 0.5, 0.5), note(60, 0.5, 1.0, 0.5)];
        let events = midi_events(&render_midi(&notes, &MidiExportOptions::default()).unwrap());
        assert!(matches!(events[1], (960, MidiMessage::NoteOff { .. })));
        assert!(matches!(events[2], (960, MidiMessage::NoteOn { .. })));
    }

    #[test]
    fn test_velocity_mapping() {
        assert_eq!(midi_velocity(0.0), 1);
        assert_eq!(midi_velocity(0.1), 13);
        assert_eq!(midi_velocity(0.5), 64);
        assert_eq!(midi_velocity(1.0), 127);
        assert_eq!(midi_velocity(3.0), 127);
        assert_eq!(midi_velocity(f32::NAN), 1);
    }

    #[test]
    fn test_pitch_bend_from_cent_offset() {
        assert_eq!(bend_value(None), 8192);
        assert_eq!(bend_value(Some(50.0)), 10240);
        assert_eq!(bend_value(Some(-50.0)), 6144);

        let mut bent = note(69, 0.0, 0.5, 0.8);
        bent.cent_offset = Some(25.0);
        let options = MidiExportOptions {
            pitch_bend: true,
            ..MidiExportOptions::default()
        };
        let events = midi_events(&render_midi(&[bent], &options).unwrap());
        assert_eq!(
            events[0],
            (0, MidiMessage::PitchBend { bend: PitchBend(u14::from(9216)) })
        );
        assert!(matches!(events[1], (0, MidiMessage::NoteOn { .. })));
    }

    #[test]
    fn test_prepare_applies_scale_and_range_without_mutating_input() {
        let notes = vec![note(61, 1.0, 1.5, 0.5), note(30, 0.0, 0.5, 0.5), note(70, 2.0, 2.0, 0.5)];
        let options = MidiExportOptions {
            scale: Scale::from_name("C Major"),
            range: PitchRange::C3ToC6,
            ..MidiExportOptions::default()
        };
        let prepared = prepare_notes(&notes, &options);
        // zero-length note dropped, sorted by start
        assert_eq!(prepared.len(), 2);
        // F#1 (30) snaps to F (29) then folds up to F3 (53)
        assert_eq!(prepared[0].pitch, 53);
        assert_eq!(prepared[1].pitch, 60);
        assert_eq!(notes[0].pitch, 61);
        assert_eq!(notes[1].pitch, 30);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let notes = [note(60, 0.0, 0.5, 0.8)];
        for options in [
            MidiExportOptions { bpm: 0.0, ..MidiExportOptions::default() },
            MidiExportOptions { channel: 16, ..MidiExportOptions::default() },
            MidiExportOptions { ticks_per_quarter: 0, ..MidiExportOptions::default() },
        ] {
            assert!(matches!(
                render_midi(&notes, &options),
                Err(AnalysisError::MidiExportError(_))
            ));
        }
    }

    #[test]
    fn test_write_midi_file() {
        let path = std::env::temp_dir().join(format!("stratum_transcribe_{}.mid", std::process::id()));
        write_midi_file(&path, &[note(60, 0.0, 0.5, 0.8)], &MidiExportOptions::default()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"MThd"));
        std::fs::remove_file(&path).unwrap();
    }
}
