#![no_main]

use arbitrary::Arbitrary;
use aural::{AudioProcessor, Error};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    SetStreamFormat {
        rate_in: u32,
        channels_in: u8,
        rate_out: u32,
        channels_out: u8,
    },
    SetReverseFormat {
        rate: u32,
        channels: u8,
    },
    SetDelay(i32),
    Process(u8),
    AnalyzeReverse(u8),
}

/// Keeps rates small enough that frames stay cheap.
fn rate(raw: u32) -> u32 {
    raw % 100_000
}

fuzz_target!(|ops: Vec<Op>| {
    let mut processor = AudioProcessor::new(true, true, true);
    for op in ops {
        match op {
            Op::SetStreamFormat {
                rate_in,
                channels_in,
                rate_out,
                channels_out,
            } => {
                let before = processor.input_format();
                let result = processor.set_stream_format_with_output(
                    rate(rate_in),
                    u16::from(channels_in % 4),
                    rate(rate_out),
                    u16::from(channels_out % 4),
                );
                if result.is_err() {
                    assert_eq!(processor.input_format(), before);
                }
            }
            Op::SetReverseFormat { rate: r, channels } => {
                let _ = processor.set_reverse_stream_format(rate(r), u16::from(channels % 4));
            }
            Op::SetDelay(delay) => {
                let _ = processor.set_stream_delay_ms(delay);
                assert!(processor.stream_delay_ms() <= aural::MAX_STREAM_DELAY_MS);
            }
            Op::Process(fill) => {
                let Some(format) = processor.input_format() else {
                    continue;
                };
                let input = vec![f32::from(fill) / 255.0; format.num_samples()];
                match processor.process(&input) {
                    Ok(output) => {
                        assert_eq!(
                            Some(output.len()),
                            processor.output_format().map(|f| f.num_samples())
                        );
                    }
                    Err(Error::MissingReverseFormat) => {
                        assert!(processor.reverse_format().is_none());
                    }
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
            Op::AnalyzeReverse(fill) => {
                let Some(format) = processor.reverse_format() else {
                    continue;
                };
                let frame = vec![f32::from(fill) / 255.0 - 0.5; format.num_samples()];
                processor.analyze_reverse_stream(&frame).unwrap();
            }
        }
    }
});
