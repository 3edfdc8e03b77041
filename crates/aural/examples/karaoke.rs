//! Microphone loopback with echo cancellation, creating a karaoke-like effect.
//!
//! Uses cpal for audio I/O and ring buffers to shuttle samples between the
//! input/output callbacks and a processing thread.
//!
//! ```sh
//! cargo run -p aural --features examples --example karaoke
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use aural::AudioProcessor;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: u32 = 48_000;
const NUM_CHANNELS: u16 = 1;
const FRAME_SIZE: usize = (SAMPLE_RATE / 100) as usize; // 10 ms

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let running = Arc::new(AtomicBool::new(true));

    ctrlc::set_handler({
        let running = running.clone();
        move || running.store(false, Ordering::SeqCst)
    })?;

    let host = cpal::default_host();
    let input_device = host
        .default_input_device()
        .context("no input device available")?;
    let output_device = host
        .default_output_device()
        .context("no output device available")?;

    println!("Input:  {}", input_device.name()?);
    println!("Output: {}", output_device.name()?);

    let cpal_config = cpal::StreamConfig {
        channels: NUM_CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    // Ring buffers: input callback → processing thread → output callback.
    let ring_size = FRAME_SIZE * 8;
    let (mut in_prod, mut in_cons) = HeapRb::<f32>::new(ring_size).split();
    let (mut out_prod, mut out_cons) = HeapRb::<f32>::new(ring_size).split();

    let input_stream = input_device.build_input_stream(
        &cpal_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            in_prod.push_slice(data);
        },
        |err| eprintln!("input error: {err}"),
        None,
    )?;

    let output_stream = output_device.build_output_stream(
        &cpal_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let filled = out_cons.pop_slice(data);
            data[filled..].fill(0.0);
        },
        |err| eprintln!("output error: {err}"),
        None,
    )?;

    input_stream.play()?;
    output_stream.play()?;

    let mut processor = AudioProcessor::new(true, true, false);
    processor.set_stream_format(SAMPLE_RATE, NUM_CHANNELS)?;
    processor.set_reverse_stream_format(SAMPLE_RATE, NUM_CHANNELS)?;

    // Processing thread: read 10 ms frames, cancel the echo, push to output.
    let running_proc = running.clone();
    let proc_thread = thread::spawn(move || -> Result<AudioProcessor> {
        let mut mic = vec![0.0f32; FRAME_SIZE];
        let mut speaker = vec![0.0f32; FRAME_SIZE];
        let mut capture_out = vec![0.0f32; FRAME_SIZE];

        while running_proc.load(Ordering::SeqCst) {
            if in_cons.occupied_len() < FRAME_SIZE {
                thread::sleep(Duration::from_millis(1));
                continue;
            }
            in_cons.pop_slice(&mut mic);

            // The previous output frame is what the speaker is playing now.
            processor.analyze_reverse_stream(&speaker)?;
            processor.process_stream(&mic, &mut capture_out)?;
            speaker.copy_from_slice(&capture_out);

            out_prod.push_slice(&capture_out);
        }
        Ok(processor)
    });

    println!("Looping mic -> AEC -> speakers (Ctrl+C to stop)");

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(100));
    }

    drop(input_stream);
    drop(output_stream);
    let processor = proc_thread
        .join()
        .map_err(|_| anyhow::anyhow!("processing thread panicked"))??;

    println!("\n{:#?}", processor.statistics());
    Ok(())
}
