//! Minimal echo cancellation demo.
//!
//! Feeds a synthetic stereo far-end signal and a mono near-end signal that
//! picks up part of it, then prints how much of the echo was removed.
//!
//! ```sh
//! cargo run -p aural --example simple
//! ```

use aural::{AudioProcessor, Error};

const SAMPLE_RATE_HZ: u32 = 48_000;
const FRAME_SIZE: usize = (SAMPLE_RATE_HZ / 100) as usize; // 10 ms

fn main() -> Result<(), Error> {
    let mut processor = AudioProcessor::new(true, false, false);
    processor.set_stream_format(SAMPLE_RATE_HZ, 1)?;
    processor.set_reverse_stream_format(SAMPLE_RATE_HZ, 2)?;

    let mut far_end = vec![0.0f32; FRAME_SIZE * 2];
    let mut near_end = vec![0.0f32; FRAME_SIZE];
    let mut output = vec![0.0f32; FRAME_SIZE];

    let mut state = 0x1234_5678u32;
    let (mut echo_energy, mut residual_energy) = (0.0f64, 0.0f64);
    for frame in 0..300 {
        for i in 0..FRAME_SIZE {
            // Speaker signal: white noise, same on both channels.
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let speaker = (state as f32 / u32::MAX as f32 - 0.5) * 0.4;
            far_end[2 * i] = speaker;
            far_end[2 * i + 1] = speaker;
            // The microphone hears the speaker attenuated by 6 dB.
            near_end[i] = speaker * 0.5;
        }

        processor.analyze_reverse_stream(&far_end)?;
        processor.process_stream(&near_end, &mut output)?;

        // Skip the convergence period.
        if frame >= 200 {
            echo_energy += near_end.iter().map(|&v| f64::from(v * v)).sum::<f64>();
            residual_energy += output.iter().map(|&v| f64::from(v * v)).sum::<f64>();
        }
    }

    let reduction_db = 10.0 * (echo_energy / residual_energy.max(1e-12)).log10();
    println!("Echo reduced by {reduction_db:.1} dB");
    println!("{:#?}", processor.statistics());
    Ok(())
}
