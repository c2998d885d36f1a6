//! Host-supplied endpoints attached to node contexts.
//!
//! The engine writes into these but never creates or owns the underlying
//! device or surface.

use std::sync::{Arc, Mutex};

/// Destination for `audio_out` nodes.
pub trait AudioOutput {
    /// Accepts one tick's audio.
    fn write(&mut self, samples: &[f32]);

    /// Called once when the engine stops.
    fn finish(&mut self) {}
}

/// Drawing target for `spectrum_display` nodes.
pub trait RenderSurface {
    /// Draws one drained waterfall row.
    fn draw_row(&mut self, row: &[f32]);

    /// Shows the instantaneous spectrum; called once per tick.
    fn present(&mut self, _latest: &[f32]) {}

    /// Called once when the engine stops.
    fn finish(&mut self) {}
}

/// Supplier for `iq_input` nodes.
pub trait IqSource {
    /// Next block of interleaved IQ, or `None` when nothing arrived.
    fn read(&mut self) -> Option<Vec<f32>>;
}

impl<F: FnMut() -> Option<Vec<f32>>> IqSource for F {
    fn read(&mut self) -> Option<Vec<f32>> {
        self()
    }
}

/// Audio output that collects everything into a shared buffer.
///
/// Clones share the buffer, so the host keeps one clone to read back what
/// the graph wrote.
#[derive(Debug, Clone, Default)]
pub struct SharedAudioBuffer {
    inner: Arc<Mutex<AudioLog>>,
}

#[derive(Debug, Default)]
struct AudioLog {
    samples: Vec<f32>,
    writes: usize,
    finished: bool,
}

impl SharedAudioBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every sample written so far.
    pub fn samples(&self) -> Vec<f32> {
        self.inner.lock().map(|log| log.samples.clone()).unwrap_or_default()
    }

    /// Number of `write` calls.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|log| log.writes).unwrap_or(0)
    }

    /// True once `finish` was called.
    pub fn is_finished(&self) -> bool {
        self.inner.lock().map(|log| log.finished).unwrap_or(false)
    }
}

impl AudioOutput for SharedAudioBuffer {
    fn write(&mut self, samples: &[f32]) {
        if let Ok(mut log) = self.inner.lock() {
            log.samples.extend_from_slice(samples);
            log.writes += 1;
        }
    }

    fn finish(&mut self) {
        if let Ok(mut log) = self.inner.lock() {
            log.finished = true;
        }
    }
}

/// Render surface that keeps the rows it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface {
    inner: Arc<Mutex<SurfaceLog>>,
}

#[derive(Debug, Default)]
struct SurfaceLog {
    rows: Vec<Vec<f32>>,
    latest: Option<Vec<f32>>,
    presents: usize,
}

impl SharedSurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows drawn so far, oldest first.
    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.inner.lock().map(|log| log.rows.clone()).unwrap_or_default()
    }

    /// Number of rows drawn.
    pub fn row_count(&self) -> usize {
        self.inner.lock().map(|log| log.rows.len()).unwrap_or(0)
    }

    /// The last presented spectrum.
    pub fn latest(&self) -> Option<Vec<f32>> {
        self.inner.lock().ok().and_then(|log| log.latest.clone())
    }

    /// Number of `present` calls.
    pub fn presents(&self) -> usize {
        self.inner.lock().map(|log| log.presents).unwrap_or(0)
    }
}

impl RenderSurface for SharedSurface {
    fn draw_row(&mut self, row: &[f32]) {
        if let Ok(mut log) = self.inner.lock() {
            log.rows.push(row.to_vec());
        }
    }

    fn present(&mut self, latest: &[f32]) {
        if let Ok(mut log) = self.inner.lock() {
            log.latest = Some(latest.to_vec());
            log.presents += 1;
        }
    }
}
