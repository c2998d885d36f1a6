//! Tick-driven evaluation of a loaded pipeline.
//!
//! [`GraphEngine`] validates a [`PipelineDescription`] once at load time,
//! computes a dependency order, and then evaluates every node once per
//! [`tick`](GraphEngine::tick) in that order. Outputs of a tick are visible
//! to later nodes in the same tick and through
//! [`output`](GraphEngine::output) until the next tick starts.
//!
//! Evaluation is single-threaded and cooperative: tick N completes before
//! tick N+1 starts, and the engine owns the [`SpectralEngine`] handle that
//! DSP nodes share.
//!
//! ```rust
//! use spectra_graph::{GraphEngine, NodeKind, Params, PipelineDescription, SharedAudioBuffer};
//!
//! let pipeline = PipelineDescription::default()
//!     .node("osc", NodeKind::Tone, Params::new().with("frequency", 1000_i64))
//!     .node("fm", NodeKind::FmDemod, Params::new())
//!     .node("speaker", NodeKind::AudioOut, Params::new())
//!     .connect("osc", "fm")
//!     .connect("fm", "speaker");
//!
//! let mut graph = GraphEngine::software_only();
//! graph.load_pipeline(&pipeline)?;
//! let audio = SharedAudioBuffer::new();
//! graph.attach_audio_output("speaker", audio.clone())?;
//!
//! graph.start();
//! graph.run_ticks(3);
//! graph.stop();
//! assert_eq!(audio.writes(), 3);
//! # Ok::<(), spectra_graph::GraphError>(())
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use spectra_dsp::{EngineConfig, SpectralEngine};

use crate::context::NodeContext;
use crate::description::{ConnectionDescription, NodeDescription, Params, PipelineDescription};
use crate::error::GraphError;
use crate::kind::NodeKind;
use crate::order::topological_order;
use crate::processors::{self, param_problem};
use crate::signal::Signal;
use crate::sink::{AudioOutput, IqSource, RenderSurface};

/// Summary of one evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Nodes evaluated.
    pub executed: usize,
    /// Nodes that produced an output.
    pub produced: usize,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

#[derive(Debug)]
struct LoadedNode {
    id: String,
    kind: NodeKind,
    params: Params,
}

/// Loaded pipeline plus its runtime state.
#[derive(Debug)]
pub struct GraphEngine {
    engine: SpectralEngine,
    nodes: Vec<LoadedNode>,
    index: HashMap<String, usize>,
    /// `upstream[n]`: nodes feeding node `n`, in connection order.
    upstream: Vec<Vec<usize>>,
    order: Vec<usize>,
    contexts: Vec<NodeContext>,
    outputs: Vec<Option<Signal>>,
    running: bool,
    ticks: u64,
}

impl GraphEngine {
    /// Empty graph driving `engine`.
    pub fn new(engine: SpectralEngine) -> Self {
        Self {
            engine,
            nodes: Vec::new(),
            index: HashMap::new(),
            upstream: Vec::new(),
            order: Vec::new(),
            contexts: Vec::new(),
            outputs: Vec::new(),
            running: false,
            ticks: 0,
        }
    }

    /// Empty graph with a freshly negotiated engine.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new(SpectralEngine::create(config))
    }

    /// Empty graph whose engine never uses acceleration.
    pub fn software_only() -> Self {
        Self::new(SpectralEngine::software_only())
    }

    /// Loads a pipeline description.
    ///
    /// See [`load`](Self::load).
    pub fn load_pipeline(&mut self, pipeline: &PipelineDescription) -> Result<(), GraphError> {
        self.load(&pipeline.nodes, &pipeline.connections)
    }

    /// Validates and installs a pipeline, replacing the current one.
    ///
    /// A running engine is stopped first. Connections naming missing nodes
    /// or ports are dropped with a warning; unknown node kinds load and
    /// evaluate to nothing. On error the previous pipeline stays in place.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateNode`] if two nodes share an id
    /// - [`GraphError::PortTypeMismatch`] if a connection joins incompatible ports
    /// - [`GraphError::FanIn`] if a non-combiner node has several inputs
    /// - [`GraphError::CycleDetected`] if the connections form a cycle
    pub fn load(
        &mut self,
        nodes: &[NodeDescription],
        connections: &[ConnectionDescription],
    ) -> Result<(), GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            if let NodeKind::Unknown(name) = &node.kind {
                tracing::warn!(node = %node.id, kind = %name, "graph: unknown node kind, node will produce nothing");
            }
            if let Some((param, reason)) =
                param_problem(&node.kind, &node.params, self.engine.max_fft_size())
            {
                tracing::warn!(node = %node.id, param, %reason, "graph: parameter out of range, node will produce nothing");
            }
        }

        let mut upstream = vec![Vec::new(); nodes.len()];
        for conn in connections {
            let (Some(&src), Some(&dst)) = (index.get(&conn.source), index.get(&conn.target)) else {
                tracing::warn!(connection = %conn.id, source = %conn.source, target = %conn.target,
                    "graph: connection names a missing node, dropped");
                continue;
            };
            let (Some(out_port), Some(in_port)) = (
                nodes[src].kind.output(&conn.source_port),
                nodes[dst].kind.input(&conn.target_port),
            ) else {
                tracing::warn!(connection = %conn.id, source_port = %conn.source_port,
                    target_port = %conn.target_port, "graph: connection names a missing port, dropped");
                continue;
            };
            if !out_port.ty.compatible_with(in_port.ty) {
                return Err(GraphError::PortTypeMismatch {
                    connection: conn.id.clone(),
                    source_node: conn.source.clone(),
                    source_port: conn.source_port.clone(),
                    source_type: out_port.ty,
                    target_node: conn.target.clone(),
                    target_port: conn.target_port.clone(),
                    target_type: in_port.ty,
                });
            }
            upstream[dst].push(src);
        }

        for (node, feeds) in nodes.iter().zip(&upstream) {
            if feeds.len() > 1 && !node.kind.accepts_fan_in() {
                return Err(GraphError::FanIn {
                    node: node.id.clone(),
                    count: feeds.len(),
                });
            }
        }

        let order = topological_order(&upstream)
            .map_err(|n| GraphError::CycleDetected(nodes[n].id.clone()))?;

        if self.running {
            self.stop();
        }

        tracing::debug!(
            nodes = nodes.len(),
            connections = upstream.iter().map(Vec::len).sum::<usize>(),
            order = ?order.iter().map(|&n| nodes[n].id.as_str()).collect::<Vec<_>>(),
            "graph: loaded"
        );

        self.nodes = nodes
            .iter()
            .map(|n| LoadedNode {
                id: n.id.clone(),
                kind: n.kind.clone(),
                params: n.params.clone(),
            })
            .collect();
        self.contexts = (0..nodes.len()).map(|_| NodeContext::new()).collect();
        self.outputs = vec![None; nodes.len()];
        self.index = index;
        self.upstream = upstream;
        self.order = order;
        self.ticks = 0;
        Ok(())
    }

    /// Enables ticking.
    pub fn start(&mut self) {
        if !self.running {
            tracing::info!(nodes = self.nodes.len(), "graph: started");
        }
        self.running = true;
    }

    /// Disables ticking and runs every node's cleanup callbacks.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        for ctx in &mut self.contexts {
            ctx.cleanup();
        }
        tracing::info!(ticks = self.ticks, "graph: stopped");
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Evaluates every node once in dependency order.
    ///
    /// Returns `None` without doing anything while stopped.
    pub fn tick(&mut self) -> Option<TickReport> {
        if !self.running {
            return None;
        }
        let started = Instant::now();
        self.outputs.fill(None);

        let mut inputs = Vec::new();
        let mut produced = 0;
        for &n in &self.order {
            inputs.clear();
            inputs.extend(self.upstream[n].iter().filter_map(|&u| self.outputs[u].clone()));

            let node = &self.nodes[n];
            let output = processors::process(
                &node.kind,
                &inputs,
                &node.params,
                &mut self.contexts[n],
                &mut self.engine,
            );
            produced += usize::from(output.is_some());
            self.outputs[n] = output;
        }

        self.ticks += 1;
        Some(TickReport {
            tick: self.ticks,
            executed: self.order.len(),
            produced,
            elapsed: started.elapsed(),
        })
    }

    /// Runs up to `count` ticks, stopping early if the engine stops.
    /// Returns the number of ticks run.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut ran = 0;
        while ran < count && self.tick().is_some() {
            ran += 1;
        }
        ran
    }

    /// Ticks at `rate_hz` for `duration`, sleeping between ticks.
    /// A non-positive rate ticks as fast as possible. Returns ticks run.
    pub fn run_for(&mut self, duration: Duration, rate_hz: f64) -> u64 {
        let period = if rate_hz.is_finite() && rate_hz > 0.0 {
            Duration::from_secs_f64(1.0 / rate_hz)
        } else {
            Duration::ZERO
        };
        let started = Instant::now();
        let mut next = started;
        let mut ran = 0;
        while started.elapsed() < duration && self.tick().is_some() {
            ran += 1;
            next += period;
            if let Some(wait) = next.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
        ran
    }

    /// Output of `node` from the most recent tick.
    pub fn output(&self, node: &str) -> Option<&Signal> {
        self.outputs.get(*self.index.get(node)?)?.as_ref()
    }

    /// Context of `node`.
    pub fn context(&self, node: &str) -> Option<&NodeContext> {
        self.contexts.get(*self.index.get(node)?)
    }

    /// Samples accumulated by recorder `node`.
    pub fn recorded(&self, node: &str) -> Option<&[f32]> {
        self.context(node).map(NodeContext::recorded)
    }

    /// Node ids in evaluation order.
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.order.iter().map(|&n| self.nodes[n].id.as_str()).collect()
    }

    /// Kind of `node`.
    pub fn kind(&self, node: &str) -> Option<&NodeKind> {
        Some(&self.nodes[*self.index.get(node)?].kind)
    }

    /// Number of loaded nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of connections that survived validation.
    pub fn connection_count(&self) -> usize {
        self.upstream.iter().map(Vec::len).sum()
    }

    /// Ticks run since the last load.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// The compute engine, e.g. for status displays.
    pub fn engine(&self) -> &SpectralEngine {
        &self.engine
    }

    /// Mutable access to the compute engine.
    pub fn engine_mut(&mut self) -> &mut SpectralEngine {
        &mut self.engine
    }

    /// Attaches the audio output of an `audio_out` node.
    pub fn attach_audio_output(
        &mut self,
        node: &str,
        output: impl AudioOutput + 'static,
    ) -> Result<(), GraphError> {
        self.context_mut(node)?.audio = Some(Box::new(output));
        Ok(())
    }

    /// Attaches the render surface of a `spectrum_display` node.
    pub fn attach_render_surface(
        &mut self,
        node: &str,
        surface: impl RenderSurface + 'static,
    ) -> Result<(), GraphError> {
        self.context_mut(node)?.surface = Some(Box::new(surface));
        Ok(())
    }

    /// Attaches the sample source of an `iq_input` node.
    pub fn attach_iq_source(
        &mut self,
        node: &str,
        source: impl IqSource + 'static,
    ) -> Result<(), GraphError> {
        self.context_mut(node)?.iq_source = Some(Box::new(source));
        Ok(())
    }

    /// Registers a callback run when the engine stops.
    pub fn on_cleanup(
        &mut self,
        node: &str,
        callback: impl FnOnce() + 'static,
    ) -> Result<(), GraphError> {
        self.context_mut(node)?.on_cleanup(callback);
        Ok(())
    }

    fn context_mut(&mut self, node: &str) -> Result<&mut NodeContext, GraphError> {
        let i = *self
            .index
            .get(node)
            .ok_or_else(|| GraphError::NodeNotFound(node.to_string()))?;
        Ok(&mut self.contexts[i])
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(SpectralEngine::default())
    }
}

impl Drop for GraphEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
