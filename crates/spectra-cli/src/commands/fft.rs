//! One-shot power spectrum of a synthetic tone.

use std::f64::consts::TAU;

use clap::Args;
use spectra_dsp::{EngineConfig, SpectralEngine, Window};

use super::common::parse_fft_size;

/// Compute the power spectrum of a complex tone.
#[derive(Args)]
pub struct FftArgs {
    /// Transform size (power of two)
    #[arg(long, default_value = "1024", value_parser = parse_fft_size)]
    size: usize,

    /// Tone frequency in bins; negative values lie below DC
    #[arg(long, default_value = "100", allow_hyphen_values = true)]
    tone_bin: i64,

    /// Window: rect, hann, hamming, blackman or blackman-harris
    #[arg(long, default_value = "hann")]
    window: Window,

    /// Skip the accelerated backend
    #[arg(long)]
    software: bool,

    /// Number of strongest bins to list
    #[arg(long, default_value = "5")]
    peaks: usize,

    /// Print the whole row as a JSON array
    #[arg(long)]
    json: bool,
}

/// Run the fft command.
pub fn run(args: FftArgs) -> anyhow::Result<()> {
    let config = if args.software {
        EngineConfig::software_only()
    } else {
        EngineConfig::default()
    };
    let mut engine = SpectralEngine::create(&config);

    let iq = tone(args.size, args.tone_bin);
    let row = engine.fft_windowed(&iq, args.size, &args.window.coefficients(args.size));

    if args.json {
        println!("{}", serde_json::to_string(&row)?);
        return Ok(());
    }

    println!(
        "{} point FFT on {} ({:?} window)",
        args.size,
        engine.status().backend,
        args.window
    );
    for (index, db) in strongest(&row, args.peaks) {
        let bin = index as i64 - (args.size / 2) as i64;
        println!("  bin {bin:+6}  {db:8.2} dB");
    }
    Ok(())
}

/// Unit complex exponential at `bin` cycles per `size` samples.
fn tone(size: usize, bin: i64) -> Vec<f32> {
    let step = TAU * bin as f64 / size as f64;
    (0..size)
        .flat_map(|n| {
            let phase = step * n as f64;
            [phase.cos() as f32, phase.sin() as f32]
        })
        .collect()
}

/// Indices and values of the `count` largest entries, strongest first.
fn strongest(row: &[f32], count: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(count);
    ranked
}
