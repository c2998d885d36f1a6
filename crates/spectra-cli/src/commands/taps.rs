//! FIR tap design command.

use clap::Args;
use spectra_dsp::{FilterKind, design_taps};

use super::common::parse_normalized;

/// Design windowed-sinc FIR taps.
#[derive(Args)]
pub struct TapsArgs {
    /// Number of taps
    #[arg(long = "taps", default_value = "63")]
    num_taps: usize,

    /// Normalized cutoff in cycles per sample; lower edge for band-pass
    #[arg(long, value_parser = parse_normalized)]
    cutoff: f32,

    /// Response: lowpass, highpass or bandpass
    #[arg(long, default_value = "lowpass")]
    kind: FilterKind,

    /// Upper edge for band-pass
    #[arg(long, value_parser = parse_normalized)]
    cutoff2: Option<f32>,

    /// Print the taps as a JSON array
    #[arg(long)]
    json: bool,
}

/// Run the taps command.
pub fn run(args: TapsArgs) -> anyhow::Result<()> {
    if args.num_taps % 2 == 0 {
        tracing::warn!(taps = args.num_taps, "even tap count; the filter delay is not an integer");
    }
    let taps = design_taps(args.num_taps, args.cutoff, args.kind, args.cutoff2);

    if args.json {
        println!("{}", serde_json::to_string(&taps)?);
        return Ok(());
    }

    let dc_gain: f32 = taps.iter().sum();
    println!("{:?} filter, {} taps, cutoff {}", args.kind, taps.len(), args.cutoff);
    if let Some(upper) = args.cutoff2 {
        println!("upper edge {upper}");
    }
    println!("DC gain {dc_gain:.6}");
    println!();
    for (n, tap) in taps.iter().enumerate() {
        println!("  h[{n:3}] = {tap:+.8}");
    }
    Ok(())
}
