//! Configuration files for spectra pipelines.
//!
//! A `spectra.toml` file carries three sections: `[engine]` (accelerator
//! negotiation and pool sizes), `[stream]` (display ring defaults) and
//! `[pipeline]` (the node graph). Missing sections and fields take their
//! defaults, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use spectra_config::{SpectraConfig, default_config_path};
//!
//! let config = SpectraConfig::load(default_config_path()).unwrap();
//! config.validate().unwrap();
//! let mut graph = config.build_graph().unwrap();
//! graph.start();
//! graph.run_ticks(60);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{SpectraConfig, StreamSettings, default_pipeline};
pub use error::ConfigError;
pub use paths::{
    CONFIG_FILE_NAME, default_config_path, ensure_dir, find_config, user_config_dir,
    user_pipelines_dir,
};
