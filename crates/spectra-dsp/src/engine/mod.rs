//! Spectral compute engine.
//!
//! [`SpectralEngine`] answers FFT, filter and demodulation calls through one
//! of two [`ComputeBackend`] implementations. The accelerated backend is
//! probed once in [`SpectralEngine::create`]; if it is missing, or later
//! reports device loss, the engine degrades permanently to the software
//! backend. Callers never observe the switch other than through
//! [`SpectralEngine::status`].
//!
//! Pre- and post-processing (deinterleaving, windowing, power, dB,
//! FFT-shift) happen here, so both backends only provide the transform
//! kernels and their results agree within floating-point tolerance.
//!
//! # Example
//!
//! ```rust
//! use spectra_dsp::{EngineConfig, SpectralEngine};
//!
//! let mut engine = SpectralEngine::create(&EngineConfig::default());
//! let iq = vec![0.0f32; 2 * 1024];
//! let row = engine.fft(&iq, 1024);
//! assert_eq!(row.len(), 1024);
//! ```

mod accelerated;
mod backend;
mod pool;
mod software;
mod stats;
mod status;

pub use accelerated::{AcceleratedBackend, DEFAULT_MAX_FFT_SIZE};
pub use backend::{AdapterInfo, BackendError, BackendKind, BackendLimits, ComputeBackend};
pub use pool::SizePool;
pub use software::{SOFTWARE_MAX_FFT_SIZE, SoftwareBackend};
pub use stats::{EngineStats, StatsSnapshot};
pub use status::{DeviceLossHandle, EngineStatus};

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::iq::{FLOOR_DB, FrameAlign, complex_frame, shifted_power_db};

/// Whether the engine may use the accelerated backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelerationMode {
    /// Probe the accelerator and use it when present.
    #[default]
    Auto,
    /// Never probe; answer everything in software.
    SoftwareOnly,
}

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accelerator negotiation mode.
    pub acceleration: AccelerationMode,
    /// Transform sizes kept resident per pool.
    pub pool_capacity: usize,
    /// Largest transform the accelerated backend accepts.
    pub max_fft_size: usize,
    /// Throughput window for [`EngineStats`], in milliseconds.
    pub stats_window_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            acceleration: AccelerationMode::Auto,
            pool_capacity: 8,
            max_fft_size: DEFAULT_MAX_FFT_SIZE,
            stats_window_ms: 1000,
        }
    }
}

impl EngineConfig {
    /// Configuration that skips the accelerator probe.
    pub fn software_only() -> Self {
        Self {
            acceleration: AccelerationMode::SoftwareOnly,
            ..Self::default()
        }
    }
}

/// Handle to the spectral compute engine.
///
/// All operations take `&mut self`; one owner drives the engine at a time.
#[derive(Debug)]
pub struct SpectralEngine {
    software: SoftwareBackend,
    accelerated: Option<AcceleratedBackend>,
    status: EngineStatus,
    stats: EngineStats,
    loss: DeviceLossHandle,
}

impl SpectralEngine {
    /// Negotiates a backend and returns a ready engine.
    ///
    /// Never fails: an unavailable accelerator leaves the engine on the
    /// software path with the reason recorded in [`EngineStatus`].
    pub fn create(config: &EngineConfig) -> Self {
        let software = SoftwareBackend::new(config.pool_capacity);
        let loss = DeviceLossHandle::new();
        let stats = EngineStats::new(Duration::from_millis(config.stats_window_ms));

        let probed = match config.acceleration {
            AccelerationMode::SoftwareOnly => {
                Err(BackendError::Unavailable("disabled by configuration".to_string()))
            }
            AccelerationMode::Auto => {
                AcceleratedBackend::probe(config.pool_capacity, config.max_fft_size, loss.clone())
            }
        };

        let (accelerated, status) = match probed {
            Ok(accel) => {
                let status = status_of(&accel, None);
                #[cfg(feature = "tracing")]
                tracing::info!(adapter = %status.adapter.description, "spectral engine: accelerated");
                (Some(accel), status)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::info!(reason = %err, "spectral engine: software");
                (None, status_of(&software, Some(err.to_string())))
            }
        };

        Self {
            software,
            accelerated,
            status,
            stats,
            loss,
        }
    }

    /// Engine that never probes the accelerator.
    pub fn software_only() -> Self {
        Self::create(&EngineConfig::software_only())
    }

    /// Current capability surface.
    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Performance bookkeeping.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Clears the performance counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Largest transform size [`fft`](Self::fft) computes. Every backend
    /// falls back to software, so this is the software limit.
    pub fn max_fft_size(&self) -> usize {
        SOFTWARE_MAX_FFT_SIZE
    }

    /// Handle through which the accelerator (or a test) reports device loss.
    pub fn device_loss_handle(&self) -> DeviceLossHandle {
        self.loss.clone()
    }

    /// Power spectrum in dB of the first `size` complex samples of
    /// interleaved IQ, FFT-shifted so the centre bin is DC.
    ///
    /// Short input is zero-padded. A size that is zero or not a power of two
    /// yields a row of `size` floor values. A size above
    /// [`max_fft_size`](Self::max_fft_size) yields an empty row.
    pub fn fft(&mut self, samples: &[f32], size: usize) -> Vec<f32> {
        self.power_spectrum(samples, size, FrameAlign::Head, None)
    }

    /// Like [`fft`](Self::fft) but over the most recent `size` complex
    /// samples, each multiplied by `window[k]` first.
    ///
    /// Coefficients beyond the end of `window` count as 1.
    pub fn fft_windowed(&mut self, samples: &[f32], size: usize, window: &[f32]) -> Vec<f32> {
        self.power_spectrum(samples, size, FrameAlign::Tail, Some(window))
    }

    /// Causal FIR filter with zero history; output length equals input length.
    pub fn filter(&mut self, samples: &[f32], taps: &[f32]) -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }
        self.stats.record_filter(samples.len());
        if taps.is_empty() {
            return vec![0.0; samples.len()];
        }
        self.dispatch(|backend| backend.filter(samples, taps))
            .unwrap_or_else(|| vec![0.0; samples.len()])
    }

    /// Instantaneous phase difference `atan2(x[n] * conj(x[n-1]))`, with
    /// `out[0] == 0`. Output length is `i.len()`.
    pub fn fm_demod(&mut self, i: &[f32], q: &[f32]) -> Vec<f32> {
        if i.is_empty() {
            return Vec::new();
        }
        self.stats.record_demod(i.len());
        self.dispatch(|backend| backend.fm_demod(i, q))
            .unwrap_or_else(|| vec![0.0; i.len()])
    }

    /// Per-sample magnitude `sqrt(i^2 + q^2)`.
    pub fn am_demod(&mut self, i: &[f32], q: &[f32]) -> Vec<f32> {
        if i.is_empty() {
            return Vec::new();
        }
        self.stats.record_demod(i.len());
        self.dispatch(|backend| backend.am_demod(i, q))
            .unwrap_or_else(|| vec![0.0; i.len()])
    }

    fn power_spectrum(
        &mut self,
        samples: &[f32],
        size: usize,
        align: FrameAlign,
        window: Option<&[f32]>,
    ) -> Vec<f32> {
        if size > SOFTWARE_MAX_FFT_SIZE {
            #[cfg(feature = "tracing")]
            tracing::debug!(size, max = SOFTWARE_MAX_FFT_SIZE, "spectral engine: fft size over limit");
            return Vec::new();
        }
        if !size.is_power_of_two() {
            return vec![FLOOR_DB; size];
        }
        let started = Instant::now();
        let frame = complex_frame(samples, size, align, window);

        // Each attempt works on its own copy so a backend that fails midway
        // cannot leak a partial transform into the fallback.
        let bins = self.dispatch(|backend| {
            let mut buffer = frame.clone();
            backend.fft(&mut buffer)?;
            Ok(buffer)
        });

        let row = match bins {
            Some(bins) => shifted_power_db(&bins),
            None => vec![FLOOR_DB; size],
        };
        self.stats.record_fft(size, started.elapsed());
        row
    }

    /// Runs `op` on the accelerated backend if present, otherwise (or on
    /// failure) on the software backend.
    fn dispatch<R>(
        &mut self,
        mut op: impl FnMut(&mut dyn ComputeBackend) -> Result<R, BackendError>,
    ) -> Option<R> {
        if self.accelerated.is_some()
            && let Some(reason) = self.loss.lost_reason()
        {
            self.degrade(BackendError::DeviceLost(reason));
        }

        if let Some(accel) = self.accelerated.as_mut() {
            match op(accel) {
                Ok(out) => return Some(out),
                Err(err) if err.is_fatal() => self.degrade(err),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(error = %_err, "spectral engine: call answered in software");
                }
            }
            self.stats.record_fallback();
        }

        op(&mut self.software).ok()
    }

    fn degrade(&mut self, err: BackendError) {
        if self.accelerated.take().is_none() {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %err, "spectral engine: acceleration lost, using software");
        self.status = status_of(&self.software, Some(err.to_string()));
    }
}

impl Default for SpectralEngine {
    fn default() -> Self {
        Self::create(&EngineConfig::default())
    }
}

fn status_of(backend: &dyn ComputeBackend, fallback_reason: Option<String>) -> EngineStatus {
    EngineStatus {
        accelerated: backend.kind() == BackendKind::Accelerated,
        backend: backend.kind(),
        adapter: backend.adapter(),
        limits: backend.limits(),
        fallback_reason,
    }
}
