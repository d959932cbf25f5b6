//! Performance benchmarks for transcription

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratum_transcribe::export::{render_midi, MidiExportOptions};
use stratum_transcribe::features::pitch::{DifferenceMethod, YinEstimator};
use stratum_transcribe::{transcribe_audio, TranscriptionConfig};

fn melody(seconds_per_note: f32, pitches: &[f32]) -> Vec<f32> {
    let per_note = (44100.0 * seconds_per_note) as usize;
    pitches
        .iter()
        .flat_map(|&midi| {
            let frequency = 440.0 * 2.0f32.powf((midi - 69.0) / 12.0);
            (0..per_note).map(move |i| {
                (i as f32 * frequency * 2.0 * std::f32::consts::PI / 44100.0).sin() * 0.5
            })
        })
        .collect()
}

fn bench_transcribe_audio(c: &mut Criterion) {
    // 30 seconds of a looping C major scale
    let scale = [60.0, 62.0, 64.0, 65.0, 67.0, 69.0, 71.0, 72.0];
    let samples: Vec<f32> = melody(0.5, &scale).into_iter().cycle().take(44100 * 30).collect();

    let config = TranscriptionConfig::default();
    c.bench_function("transcribe_audio_30s", |b| {
        b.iter(|| {
            let _ = transcribe_audio(black_box(&samples), black_box(44100), black_box(&config));
        });
    });

    let parallel = TranscriptionConfig {
        parallel_frames: true,
        ..TranscriptionConfig::default()
    };
    c.bench_function("transcribe_audio_30s_parallel", |b| {
        b.iter(|| {
            let _ = transcribe_audio(black_box(&samples), black_box(44100), black_box(&parallel));
        });
    });
}

fn bench_yin_window(c: &mut Criterion) {
    let window = melody(0.1, &[57.0]);
    let window = &window[..2048];

    let direct = YinEstimator::default();
    c.bench_function("yin_direct_2048", |b| {
        b.iter(|| direct.estimate(black_box(window), black_box(44100)));
    });

    let fft = YinEstimator::default().with_method(DifferenceMethod::Fft);
    c.bench_function("yin_fft_2048", |b| {
        b.iter(|| fft.estimate(black_box(window), black_box(44100)));
    });
}

fn bench_midi_export(c: &mut Criterion) {
    let samples = melody(0.25, &[60.0, 64.0, 67.0, 72.0, 67.0, 64.0, 60.0, 55.0]);
    let result = match transcribe_audio(&samples, 44100, &TranscriptionConfig::default()) {
        Ok(result) => result,
        Err(err) => panic!("transcription failed: {}", err),
    };
    let options = MidiExportOptions::for_result(&result);

    c.bench_function("render_midi", |b| {
        b.iter(|| render_midi(black_box(&result.notes), black_box(&options)));
    });
}

criterion_group!(benches, bench_transcribe_audio, bench_yin_window, bench_midi_export);
criterion_main!(benches);
