//! Per-node mutable state.
//!
//! Node descriptions are immutable; everything a processor needs to remember
//! between ticks lives in that node's [`NodeContext`]. Contexts are never
//! shared between nodes.

use spectra_dsp::{FilterSpec, Window};
use spectra_stream::{Drainer, SpectrumRing};

use crate::sink::{AudioOutput, IqSource, RenderSurface};

/// Callback run once when the engine stops.
pub type CleanupFn = Box<dyn FnOnce()>;

/// State owned by one node.
#[derive(Default)]
pub struct NodeContext {
    initialized: bool,
    /// Oscillator phase in radians, kept in `[0, 2 pi)`.
    pub(crate) phase: f64,
    /// Trailing input samples per channel carried into the next tick.
    pub(crate) history: Vec<Vec<f32>>,
    /// Cached taps keyed by the `FilterSpec` they came from.
    pub(crate) taps: Option<(FilterSpec, Vec<f32>)>,
    /// Last IQ sample of the previous tick.
    pub(crate) last_iq: Option<[f32; 2]>,
    /// Window coefficients for the size they were computed for.
    pub(crate) window: Option<(Window, usize, Vec<f32>)>,
    /// Recorder accumulation.
    pub(crate) recorded: Vec<f32>,
    pub(crate) ring: Option<SpectrumRing>,
    pub(crate) drainer: Drainer,
    pub(crate) audio: Option<Box<dyn AudioOutput>>,
    pub(crate) surface: Option<Box<dyn RenderSurface>>,
    pub(crate) iq_source: Option<Box<dyn IqSource>>,
    cleanup: Vec<CleanupFn>,
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("initialized", &self.initialized)
            .field("phase", &self.phase)
            .field("recorded", &self.recorded.len())
            .field("ring", &self.ring.as_ref().map(SpectrumRing::available))
            .field("audio", &self.audio.is_some())
            .field("surface", &self.surface.is_some())
            .field("iq_source", &self.iq_source.is_some())
            .field("cleanup", &self.cleanup.len())
            .finish_non_exhaustive()
    }
}

impl NodeContext {
    /// Fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly once, on the first call.
    pub fn first_run(&mut self) -> bool {
        !std::mem::replace(&mut self.initialized, true)
    }

    /// Registers a callback for [`cleanup`](Self::cleanup).
    pub fn on_cleanup(&mut self, callback: impl FnOnce() + 'static) {
        self.cleanup.push(Box::new(callback));
    }

    /// Runs and discards every registered callback, then tells attached
    /// sinks the stream ended.
    pub fn cleanup(&mut self) {
        for callback in self.cleanup.drain(..) {
            callback();
        }
        if let Some(audio) = self.audio.as_mut() {
            audio.finish();
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.finish();
        }
    }

    /// Samples accumulated by a recorder node.
    pub fn recorded(&self) -> &[f32] {
        &self.recorded
    }

    /// The display ring of a spectrum display node.
    pub fn ring(&self) -> Option<&SpectrumRing> {
        self.ring.as_ref()
    }

    /// The drain state of a spectrum display node.
    pub fn drainer(&self) -> &Drainer {
        &self.drainer
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::sink::SharedAudioBuffer;

    #[test]
    fn first_run_fires_once() {
        let mut ctx = NodeContext::new();
        assert!(ctx.first_run());
        assert!(!ctx.first_run());
    }

    #[test]
    fn cleanup_runs_callbacks_once() {
        let count = Rc::new(Cell::new(0));
        let mut ctx = NodeContext::new();
        let seen = Rc::clone(&count);
        ctx.on_cleanup(move || seen.set(seen.get() + 1));

        let audio = SharedAudioBuffer::new();
        ctx.audio = Some(Box::new(audio.clone()));

        ctx.cleanup();
        ctx.cleanup();
        assert_eq!(count.get(), 1);
        assert!(audio.is_finished());
    }
}
