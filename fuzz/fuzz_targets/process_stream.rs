#![no_main]

use arbitrary::Arbitrary;
use aural::AudioProcessor;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Sample rate index: 0=8k, 1=16k, 2=32k, 3=44.1k, 4=48k
    sample_rate_idx: u8,
    /// Number of channels (clamped to 1-2)
    channels: u8,
    /// Render-to-capture delay, clamped by the processor
    delay_ms: i16,
    /// Far-end and near-end samples, consumed frame by frame
    samples: Vec<f32>,
}

fn sample_rate(idx: u8) -> u32 {
    match idx % 5 {
        0 => 8000,
        1 => 16000,
        2 => 32000,
        3 => 44100,
        _ => 48000,
    }
}

/// Clamp to valid audio range [-1, 1], replacing NaN/inf with 0.
fn sanitize_sample(s: f32) -> f32 {
    if s.is_finite() {
        s.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fuzz_target!(|input: FuzzInput| {
    let rate = sample_rate(input.sample_rate_idx);
    let channels = u16::from(input.channels % 2) + 1;
    let len = (rate / 100) as usize * channels as usize;

    let mut processor = AudioProcessor::new(true, true, true);
    processor.set_stream_format(rate, channels).unwrap();
    processor.set_reverse_stream_format(rate, channels).unwrap();
    let _ = processor.set_stream_delay_ms(i32::from(input.delay_ms));

    let samples: Vec<f32> = input.samples.iter().copied().map(sanitize_sample).collect();
    let mut output = vec![0.0f32; len];
    for pair in samples.chunks_exact(2 * len) {
        let (far, near) = pair.split_at(len);
        processor.analyze_reverse_stream(far).unwrap();
        processor.process_stream(near, &mut output).unwrap();
        assert!(output.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }
});
