//! The `spectra.toml` file format.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spectra_dsp::EngineConfig;
use spectra_dsp::engine::SOFTWARE_MAX_FFT_SIZE;
use spectra_graph::{
    GraphEngine, GraphError, NodeKind, Params, PipelineDescription, param_problem,
};
use spectra_stream::{DrainPolicy, MAX_RING_VALUES};

use crate::error::ConfigError;

/// Display ring defaults applied to every `spectrum_display` node that does
/// not set its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Rows each display ring holds.
    pub capacity: usize,
    /// Drain rates and catch-up threshold.
    pub drain: DrainPolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            capacity: 64,
            drain: DrainPolicy::default(),
        }
    }
}

/// Complete configuration: engine negotiation, stream defaults and the
/// pipeline to run.
///
/// # TOML Format
///
/// ```toml
/// [engine]
/// acceleration = "auto"
/// pool_capacity = 8
///
/// [stream]
/// capacity = 64
/// [stream.drain]
/// backlog_threshold = 16
///
/// [[pipeline.nodes]]
/// id = "osc"
/// kind = "tone"
/// params = { frequency = 1000.0 }
///
/// [[pipeline.nodes]]
/// id = "fft"
/// kind = "spectrum"
///
/// [[pipeline.connections]]
/// source = "osc"
/// target = "fft"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectraConfig {
    /// Spectral engine construction.
    pub engine: EngineConfig,
    /// Display ring defaults.
    pub stream: StreamSettings,
    /// Pipeline graph.
    pub pipeline: PipelineDescription,
}

impl SpectraConfig {
    /// Configuration with the built-in demonstration pipeline.
    pub fn with_default_pipeline() -> Self {
        Self {
            pipeline: default_pipeline(),
            ..Self::default()
        }
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), nodes = config.pipeline.nodes.len(), "config: loaded");
        Ok(config)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            crate::paths::ensure_dir(parent)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Checks value ranges. Graph structure is checked when the pipeline
    /// loads.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.max_fft_size < 2 || !engine.max_fft_size.is_power_of_two() {
            return Err(ConfigError::invalid(
                "engine.max_fft_size",
                format!("{} is not a power of two", engine.max_fft_size),
            ));
        }
        if engine.pool_capacity == 0 {
            return Err(ConfigError::invalid("engine.pool_capacity", "must be at least 1"));
        }
        if engine.stats_window_ms == 0 {
            return Err(ConfigError::invalid("engine.stats_window_ms", "must be at least 1"));
        }

        let stream = &self.stream;
        if stream.capacity == 0 {
            return Err(ConfigError::invalid("stream.capacity", "must be at least 1"));
        }
        if stream.capacity > MAX_RING_VALUES {
            return Err(ConfigError::invalid(
                "stream.capacity",
                format!("{} exceeds {MAX_RING_VALUES}", stream.capacity),
            ));
        }
        if stream.drain.normal_rate == 0 {
            return Err(ConfigError::invalid("stream.drain.normal_rate", "must be at least 1"));
        }
        if stream.drain.catch_up_rate < stream.drain.normal_rate {
            return Err(ConfigError::invalid(
                "stream.drain.catch_up_rate",
                "must not be below normal_rate",
            ));
        }
        if stream.drain.backlog_threshold >= stream.capacity {
            return Err(ConfigError::invalid(
                "stream.drain.backlog_threshold",
                format!("must be below stream.capacity ({})", stream.capacity),
            ));
        }

        for node in &self.pipeline.nodes {
            if let Some(size) = node.params.number("fft_size")
                && !(size >= 2.0 && size.fract() == 0.0 && (size as usize).is_power_of_two())
            {
                return Err(ConfigError::invalid(
                    &format!("pipeline.{}.fft_size", node.id),
                    format!("{size} is not a power of two"),
                ));
            }
            if let Some((param, reason)) =
                param_problem(&node.kind, &node.params, SOFTWARE_MAX_FFT_SIZE)
            {
                return Err(ConfigError::invalid(
                    &format!("pipeline.{}.{param}", node.id),
                    reason,
                ));
            }
            if node.kind == NodeKind::SpectrumDisplay
                && let Some(rows) = node.params.number("capacity")
                && !(1.0..=MAX_RING_VALUES as f64).contains(&rows)
            {
                return Err(ConfigError::invalid(
                    &format!("pipeline.{}.capacity", node.id),
                    format!("{rows} is outside 1..={MAX_RING_VALUES}"),
                ));
            }
        }
        Ok(())
    }

    /// The pipeline with [`StreamSettings`] filled into display nodes that
    /// leave them unset.
    pub fn resolved_pipeline(&self) -> PipelineDescription {
        let mut pipeline = self.pipeline.clone();
        let drain = &self.stream.drain;
        let defaults = [
            ("capacity", self.stream.capacity),
            ("normal_rate", drain.normal_rate),
            ("catch_up_rate", drain.catch_up_rate),
            ("backlog_threshold", drain.backlog_threshold),
        ];
        for node in &mut pipeline.nodes {
            if node.kind != NodeKind::SpectrumDisplay {
                continue;
            }
            for (key, value) in defaults {
                if node.params.get(key).is_none() {
                    node.params.set(key, i64::try_from(value).unwrap_or(i64::MAX));
                }
            }
        }
        pipeline
    }

    /// Creates an engine for this configuration and loads the pipeline.
    pub fn build_graph(&self) -> Result<GraphEngine, GraphError> {
        let mut graph = GraphEngine::with_config(&self.engine);
        graph.load_pipeline(&self.resolved_pipeline())?;
        Ok(graph)
    }
}

/// Demonstration pipeline: a 1 kHz tone feeding an FM demodulator into an
/// audio output, and a spectrum into a waterfall display.
pub fn default_pipeline() -> PipelineDescription {
    PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new().with("frequency", 1000.0))
        .node("fm", NodeKind::FmDemod, Params::new())
        .node("speaker", NodeKind::AudioOut, Params::new())
        .node(
            "fft",
            NodeKind::Spectrum,
            Params::new().with("fft_size", 1024_i64).with("window", "hann"),
        )
        .node("waterfall", NodeKind::SpectrumDisplay, Params::new())
        .connect("osc", "fm")
        .connect("fm", "speaker")
        .connect("osc", "fft")
        .connect("fft", "waterfall")
}
