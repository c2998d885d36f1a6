//! Spectra CLI - run signal pipelines and query the spectral engine.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spectra")]
#[command(author, version, about = "Spectral compute and signal pipeline CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline configuration
    Run(commands::run::RunArgs),

    /// Compute one power spectrum of a test tone
    Fft(commands::fft::FftArgs),

    /// Design FIR taps
    Taps(commands::taps::TapsArgs),

    /// Show the negotiated compute backend
    Status(commands::status::StatusArgs),

    /// List node kinds and their ports
    Nodes(commands::nodes::NodesArgs),

    /// Write a starter configuration file
    Init(commands::init::InitArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Fft(args) => commands::fft::run(args),
        Commands::Taps(args) => commands::taps::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Init(args) => commands::init::run(args),
    }
}
