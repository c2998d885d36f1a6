//! Shared CLI helpers used across multiple commands.

use spectra_config::{SpectraConfig, default_config_path, find_config};

/// Load a configuration by name or path.
///
/// With no name, the user configuration file is used when it exists and the
/// built-in demonstration pipeline otherwise. Named configurations are
/// resolved as a file path first, then in the user pipelines directory.
pub fn load_config(name: Option<&str>) -> anyhow::Result<SpectraConfig> {
    let config = match name {
        Some(name) => {
            let Some(path) = find_config(name) else {
                anyhow::bail!(
                    "Configuration '{name}' not found. Use 'spectra init' to write a starter file."
                );
            };
            tracing::info!(path = %path.display(), "loading configuration");
            SpectraConfig::load(&path)?
        }
        None => {
            let path = default_config_path();
            if path.is_file() {
                tracing::info!(path = %path.display(), "loading configuration");
                SpectraConfig::load(&path)?
            } else {
                SpectraConfig::with_default_pipeline()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Parse a normalized frequency in `(0, 0.5)` for clap's `value_parser`.
pub fn parse_normalized(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("'{s}': {e}"))?;
    if value > 0.0 && value < 0.5 {
        Ok(value)
    } else {
        Err(format!("'{s}' is outside (0, 0.5)"))
    }
}

/// Parse a power-of-two transform size for clap's `value_parser`.
pub fn parse_fft_size(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|e| format!("'{s}': {e}"))?;
    if value >= 2 && value.is_power_of_two() {
        Ok(value)
    } else {
        Err(format!("{value} is not a power of two"))
    }
}
