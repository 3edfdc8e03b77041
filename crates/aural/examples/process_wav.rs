//! Run a WAV file through the processor and write the result.
//!
//! An optional second file is used as the far-end (speaker) signal for echo
//! cancellation. Both files are processed in 10 ms frames; a trailing
//! partial frame is zero padded.
//!
//! ```sh
//! cargo run -p aural --features examples --example process_wav -- \
//!     mic.wav out.wav --reverse speaker.wav --ns --agc
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use aural::{AudioProcessor, Config};
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Process a 16-bit WAV file through aural")]
struct Args {
    /// Near-end (microphone) input.
    input: PathBuf,

    /// Processed output.
    output: PathBuf,

    /// Far-end (speaker) signal; enables echo cancellation.
    #[arg(long)]
    reverse: Option<PathBuf>,

    /// Output sample rate; defaults to the input rate.
    #[arg(long)]
    output_rate: Option<u32>,

    /// Render-to-capture delay in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: i32,

    /// Enable noise suppression.
    #[arg(long)]
    ns: bool,

    /// Enable automatic gain control.
    #[arg(long)]
    agc: bool,
}

fn read_i16(path: &Path) -> Result<(WavSpec, Vec<i16>)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!("{}: only 16-bit PCM is supported", path.display());
    }
    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok((spec, samples))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let (spec, capture) = read_i16(&args.input)?;
    let reverse = args.reverse.as_deref().map(read_i16).transpose()?;
    let output_rate = args.output_rate.unwrap_or(spec.sample_rate);

    let mut processor = AudioProcessor::with_config(Config::with_effects(
        reverse.is_some(),
        args.ns,
        args.agc,
    ));
    processor.set_stream_format_with_output(
        spec.sample_rate,
        spec.channels,
        output_rate,
        spec.channels,
    )?;
    if let Some((reverse_spec, _)) = &reverse {
        processor.set_reverse_stream_format(reverse_spec.sample_rate, reverse_spec.channels)?;
        if let Err(err) = processor.set_stream_delay_ms(args.delay_ms) {
            eprintln!("warning: {err}, using {} ms", processor.stream_delay_ms());
        }
    }

    let input_len = processor.input_format().map_or(0, |f| f.num_samples());
    let output_len = processor.output_format().map_or(0, |f| f.num_samples());
    let reverse_len = processor.reverse_format().map_or(0, |f| f.num_samples());

    let out_spec = WavSpec {
        sample_rate: output_rate,
        ..spec
    };
    let mut writer = WavWriter::create(&args.output, out_spec)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut input = vec![0i16; input_len];
    let mut output = vec![0i16; output_len];
    let mut far_end = vec![0i16; reverse_len];
    for (index, chunk) in capture.chunks(input_len).enumerate() {
        input.fill(0);
        input[..chunk.len()].copy_from_slice(chunk);

        if let Some((_, samples)) = &reverse {
            far_end.fill(0);
            let start = (index * reverse_len).min(samples.len());
            let end = (start + reverse_len).min(samples.len());
            far_end[..end - start].copy_from_slice(&samples[start..end]);
            processor.analyze_reverse_stream_i16(&far_end)?;
        }

        processor.process_stream_i16(&input, &mut output)?;
        for &sample in &output {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()?;

    println!("{:#?}", processor.statistics());
    Ok(())
}
