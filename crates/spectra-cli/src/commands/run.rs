//! Pipeline run command.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use spectra_dsp::AccelerationMode;
use spectra_graph::{NodeKind, SharedAudioBuffer, SharedSurface};

use super::common::load_config;

/// Run a pipeline for a number of ticks or a fixed duration.
#[derive(Args)]
pub struct RunArgs {
    /// Configuration name or path (default: user config, else the demo pipeline)
    config: Option<String>,

    /// Number of ticks to run as fast as possible
    #[arg(long, default_value = "600")]
    ticks: u64,

    /// Run in real time for this many seconds instead of a tick count
    #[arg(long)]
    duration: Option<f64>,

    /// Tick rate in Hz when running in real time
    #[arg(long, default_value = "60")]
    rate: f64,

    /// Skip the accelerated backend
    #[arg(long)]
    software: bool,

    /// Raw little-endian f32 interleaved IQ file fed to every iq_input node
    #[arg(long)]
    iq: Option<PathBuf>,

    /// Complex samples per tick read from --iq
    #[arg(long, default_value = "800")]
    iq_block: usize,
}

/// Run the run command.
pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.software {
        config.engine.acceleration = AccelerationMode::SoftwareOnly;
    }
    let mut graph = config.build_graph()?;

    let iq = args.iq.as_deref().map(read_iq_file).transpose()?;
    let mut speakers = Vec::new();
    let mut displays = Vec::new();
    for node in &config.pipeline.nodes {
        match node.kind {
            NodeKind::AudioOut => {
                let buffer = SharedAudioBuffer::new();
                graph.attach_audio_output(&node.id, buffer.clone())?;
                speakers.push((node.id.as_str(), buffer));
            }
            NodeKind::SpectrumDisplay => {
                let surface = SharedSurface::new();
                graph.attach_render_surface(&node.id, surface.clone())?;
                displays.push((node.id.as_str(), surface));
            }
            NodeKind::IqInput => match &iq {
                Some(samples) => {
                    let mut blocks = samples
                        .chunks(args.iq_block.max(1) * 2)
                        .map(<[f32]>::to_vec)
                        .collect::<Vec<_>>()
                        .into_iter();
                    graph.attach_iq_source(&node.id, move || blocks.next())?;
                }
                None => tracing::warn!(node = %node.id, "iq_input node without --iq produces nothing"),
            },
            _ => {}
        }
    }

    let started = Instant::now();
    graph.start();
    let ticks = match args.duration {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
            graph.run_for(Duration::from_secs_f64(seconds), args.rate)
        }
        Some(seconds) => anyhow::bail!("--duration must be positive, got {seconds}"),
        None => graph.run_ticks(args.ticks),
    };
    graph.stop();
    let elapsed = started.elapsed();

    let status = graph.engine().status();
    let stats = graph.engine().stats().snapshot();
    println!(
        "Ran {ticks} ticks of {} nodes in {:.3}s on {}",
        graph.node_count(),
        elapsed.as_secs_f64(),
        status.backend
    );
    if let Some(reason) = &status.fallback_reason {
        println!("  fallback: {reason}");
    }
    println!(
        "  engine: {} fft, {} filter, {} demod calls ({} fell back)",
        stats.fft_calls, stats.filter_calls, stats.demod_calls, stats.fallback_calls
    );
    for (id, buffer) in &speakers {
        println!("  {id}: {} audio samples in {} writes", buffer.samples().len(), buffer.writes());
    }
    for (id, surface) in &displays {
        println!("  {id}: {} rows drawn, {} presents", surface.row_count(), surface.presents());
    }
    for node in &config.pipeline.nodes {
        if node.kind == NodeKind::Recorder
            && let Some(recorded) = graph.recorded(&node.id)
        {
            println!("  {}: {} values recorded", node.id, recorded.len());
        }
    }
    Ok(())
}

/// Reads raw little-endian `f32` samples.
fn read_iq_file(path: &Path) -> anyhow::Result<Vec<f32>> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("failed to read '{}': {e}", path.display()))?;
    if bytes.len() % 8 != 0 {
        anyhow::bail!(
            "'{}' is {} bytes; interleaved f32 IQ needs a multiple of 8",
            path.display(),
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_iq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.iq");
        let samples = [0.5f32, -0.25, 1.0, 0.0];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_iq_file(&path).unwrap(), samples);
    }

    #[test]
    fn rejects_partial_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.iq");
        std::fs::write(&path, [0u8; 12]).unwrap();
        assert!(read_iq_file(&path).is_err());
    }
}
