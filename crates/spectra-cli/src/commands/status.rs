//! Compute backend status command.

use clap::Args;
use spectra_dsp::{AccelerationMode, EngineConfig, SpectralEngine};

use super::common::load_config;

/// Show which backend the engine negotiated and what it can do.
#[derive(Args)]
pub struct StatusArgs {
    /// Configuration name or path; engine settings are taken from it
    #[arg(long)]
    config: Option<String>,

    /// Skip the accelerated backend
    #[arg(long)]
    software: bool,

    /// Run this many 4096-point transforms and report throughput
    #[arg(long, default_value = "0")]
    probe_calls: usize,

    /// Print status as JSON
    #[arg(long)]
    json: bool,
}

/// Run the status command.
pub fn run(args: StatusArgs) -> anyhow::Result<()> {
    let mut config: EngineConfig = match args.config.as_deref() {
        Some(name) => load_config(Some(name))?.engine,
        None => EngineConfig::default(),
    };
    if args.software {
        config.acceleration = AccelerationMode::SoftwareOnly;
    }
    let mut engine = SpectralEngine::create(&config);

    if args.probe_calls > 0 {
        let iq = vec![0.5f32; 2 * 4096];
        for _ in 0..args.probe_calls {
            engine.fft(&iq, 4096);
        }
    }

    let status = engine.status();
    let stats = engine.stats().snapshot();
    if args.json {
        let report = serde_json::json!({ "status": status, "stats": stats });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Backend:      {}", status.backend);
    println!("Accelerated:  {}", status.accelerated);
    println!("Adapter:      {} ({})", status.adapter.name, status.adapter.vendor);
    if !status.adapter.description.is_empty() {
        println!("              {}", status.adapter.description);
    }
    println!("Max FFT size: {}", status.limits.max_fft_size);
    println!("Max buffer:   {} bytes", status.limits.max_buffer_size);
    if let Some(reason) = &status.fallback_reason {
        println!("Fallback:     {reason}");
    }
    if stats.fft_calls > 0 {
        println!(
            "Throughput:   {:.1} Msamples/s over {} transforms",
            stats.samples_per_second / 1e6,
            stats.fft_calls
        );
    }
    Ok(())
}
