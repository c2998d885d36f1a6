//! Tick-driven dataflow graph engine for signal pipelines.
//!
//! A pipeline is a set of typed nodes joined by connections. The engine
//! validates it once at load time (port types, fan-in, cycles), fixes an
//! evaluation order, and then runs every node once per tick, passing each
//! node's output to the nodes connected downstream.
//!
//! # Modules
//!
//! - [`description`]: serializable pipeline, node and parameter descriptions
//! - [`kind`]: node kinds and their typed ports
//! - [`signal`]: values that flow along connections
//! - [`context`]: per-node state that survives between ticks
//! - [`sink`]: host-supplied audio outputs, render surfaces and IQ sources
//! - [`engine`]: [`GraphEngine`], the loader and tick loop
//! - [`order`]: dependency ordering
//! - [`error`]: load-time errors
//!
//! Processing itself is delegated to [`spectra_dsp::SpectralEngine`], which
//! the graph engine owns and lends to DSP nodes.

pub mod context;
pub mod description;
pub mod engine;
pub mod error;
pub mod kind;
pub mod order;
mod processors;
pub mod signal;
pub mod sink;

pub use context::{CleanupFn, NodeContext};
pub use description::{ConnectionDescription, NodeDescription, ParamValue, Params, PipelineDescription};
pub use engine::{GraphEngine, TickReport};
pub use error::GraphError;
pub use kind::{NodeCategory, NodeKind, PortSpec, PortType};
pub use order::topological_order;
pub use processors::{
    DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE, MAX_TAPS, param_problem,
};
pub use signal::Signal;
pub use sink::{AudioOutput, IqSource, RenderSurface, SharedAudioBuffer, SharedSurface};
