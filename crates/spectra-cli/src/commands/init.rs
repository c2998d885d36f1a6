//! Starter configuration command.

use std::path::PathBuf;

use clap::Args;
use spectra_config::{SpectraConfig, default_config_path};

/// Write the demonstration pipeline to a configuration file.
#[derive(Args)]
pub struct InitArgs {
    /// Destination (default: the user configuration file)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

/// Run the init command.
pub fn run(args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(default_config_path);
    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Pass --force to overwrite it.",
            path.display()
        );
    }
    SpectraConfig::with_default_pipeline().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spectra.toml");
        let args = |force| InitArgs {
            path: Some(path.clone()),
            force,
        };

        run(args(false)).unwrap();
        assert!(run(args(false)).is_err());
        run(args(true)).unwrap();
        assert_eq!(
            SpectraConfig::load(&path).unwrap(),
            SpectraConfig::with_default_pipeline()
        );
    }
}
