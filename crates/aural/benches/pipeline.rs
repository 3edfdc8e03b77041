//! Benchmarks for the aural processing pipeline and its components.

use std::hint::black_box;

use aural::{AudioProcessor, Config};
use aural_aec::{EchoCanceller, EchoCancellerConfig};
use aural_common_audio::channel_buffer::ChannelBuffer;
use aural_common_audio::push_sinc_resampler::PushSincResampler;
use aural_ns::{NoiseSuppressor, NsConfig};
use criterion::{Criterion, criterion_group, criterion_main};

// ---------------------------------------------------------------------------
// Full pipeline benchmarks
// ---------------------------------------------------------------------------

fn tone(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.01).sin() * 0.1).collect()
}

fn make_processor(sample_rate_hz: u32, num_channels: u16) -> AudioProcessor {
    let mut processor = AudioProcessor::new(true, true, true);
    processor
        .set_stream_format(sample_rate_hz, num_channels)
        .unwrap();
    processor
        .set_reverse_stream_format(sample_rate_hz, num_channels)
        .unwrap();

    // Warm up so we bench steady-state.
    let frame = tone(sample_rate_hz as usize / 100 * num_channels as usize);
    let mut output = vec![0.0f32; frame.len()];
    for _ in 0..20 {
        processor.analyze_reverse_stream(&frame).unwrap();
        processor.process_stream(&frame, &mut output).unwrap();
    }
    processor
}

fn bench_process_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_stream");

    for (name, rate, channels) in [
        ("16k_mono", 16_000, 1),
        ("48k_mono", 48_000, 1),
        ("48k_stereo", 48_000, 2),
    ] {
        let mut processor = make_processor(rate, channels);
        let frame = tone(rate as usize / 100 * channels as usize);
        let mut output = vec![0.0f32; frame.len()];

        group.bench_function(name, |b| {
            b.iter(|| {
                processor.analyze_reverse_stream(black_box(&frame)).unwrap();
                processor
                    .process_stream(black_box(&frame), &mut output)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_passthrough(c: &mut Criterion) {
    let mut group = c.benchmark_group("passthrough");
    let mut processor = AudioProcessor::with_config(Config::default());
    processor.set_stream_format_with_output(44_100, 2, 48_000, 1).unwrap();
    let frame = tone(882);
    let mut output = vec![0.0f32; 480];

    group.bench_function("44k1_stereo_to_48k_mono", |b| {
        b.iter(|| {
            processor
                .process_stream(black_box(&frame), &mut output)
                .unwrap();
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Component benchmarks
// ---------------------------------------------------------------------------

fn float_s16_frame(len: usize) -> ChannelBuffer<f32> {
    let mut frame = ChannelBuffer::new(len, 1);
    for (i, s) in frame.channel_mut(0).iter_mut().enumerate() {
        *s = (i as f32 * 0.05).sin() * 3000.0;
    }
    frame
}

fn bench_noise_suppressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_suppressor");
    let mut ns = NoiseSuppressor::new(NsConfig::default(), 16_000, 1);
    let input = float_s16_frame(160);
    let mut frame = input.clone();

    for _ in 0..50 {
        frame.copy_from(&input);
        ns.process(&mut frame);
    }

    group.bench_function("16k_mono", |b| {
        b.iter(|| {
            frame.copy_from(&input);
            ns.process(black_box(&mut frame));
        });
    });

    group.finish();
}

fn bench_echo_canceller(c: &mut Criterion) {
    let mut group = c.benchmark_group("echo_canceller");
    let mut ec = EchoCanceller::new(EchoCancellerConfig::default(), 16_000, 1);
    let input = float_s16_frame(160);
    let reference = input.channel(0).to_vec();
    let mut frame = input.clone();

    group.bench_function("16k_mono", |b| {
        b.iter(|| {
            frame.copy_from(&input);
            ec.process(black_box(&mut frame), &reference);
        });
    });

    group.finish();
}

fn bench_sinc_resampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("sinc_resampler");

    let mut resampler = PushSincResampler::new(480, 160);
    let source = tone(480);
    let mut destination = vec![0.0f32; 160];

    for _ in 0..20 {
        resampler.resample(&source, &mut destination);
    }

    group.bench_function("48k_to_16k", |b| {
        b.iter(|| {
            resampler.resample(black_box(&source), &mut destination);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_process_stream,
    bench_passthrough,
    bench_noise_suppressor,
    bench_echo_canceller,
    bench_sinc_resampler,
);
criterion_main!(benches);
