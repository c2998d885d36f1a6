//! The compute backend seam.
//!
//! Every backend implements the same four primitives. The engine owns the
//! shared front end (deinterleaving, windowing) and back end (power, dB,
//! FFT-shift) so only the numerical kernels differ between backends.

use rustfft::num_complex::Complex32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which implementation answered a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Reference radix-2 implementation.
    Software,
    /// Vectorized implementation.
    Accelerated,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Software => write!(f, "software"),
            BackendKind::Accelerated => write!(f, "accelerated"),
        }
    }
}

/// Adapter description reported to status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    /// Short adapter name.
    pub name: String,
    /// Vendor or architecture.
    pub vendor: String,
    /// Free-form capability description.
    pub description: String,
}

/// Resource limits of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendLimits {
    /// Largest single buffer the backend will allocate, in bytes.
    pub max_buffer_size: usize,
    /// Largest transform size the backend accepts.
    pub max_fft_size: usize,
}

/// Backend failures. None of these reach engine callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be initialized.
    #[error("accelerator unavailable: {0}")]
    Unavailable(String),

    /// The device reported loss; the backend is permanently unusable.
    #[error("accelerator device lost: {0}")]
    DeviceLost(String),

    /// This particular call exceeds the backend's limits.
    #[error("unsupported request: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// True if the backend must never be used again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable(_) | BackendError::DeviceLost(_)
        )
    }
}

/// Numerical kernels shared by the software and accelerated paths.
///
/// Implementations must agree within floating-point tolerance. Inputs are
/// already validated by the engine: `fft` buffers have a power-of-two length.
pub trait ComputeBackend {
    /// Backend identity.
    fn kind(&self) -> BackendKind;

    /// Adapter description.
    fn adapter(&self) -> AdapterInfo;

    /// Resource limits.
    fn limits(&self) -> BackendLimits;

    /// In-place unnormalized forward DFT (`exp(-2 pi i k n / N)` kernel).
    fn fft(&mut self, buffer: &mut [Complex32]) -> Result<(), BackendError>;

    /// Causal convolution `out[i] = sum_j taps[j] * samples[i - j]`, same
    /// length as `samples`, zero history.
    fn filter(&mut self, samples: &[f32], taps: &[f32]) -> Result<Vec<f32>, BackendError>;

    /// Phase difference between consecutive samples; `out[0] == 0`.
    fn fm_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError>;

    /// Per-sample magnitude.
    fn am_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError>;
}

/// Phase of `x[n] * conj(x[n-1])`.
#[inline]
pub(crate) fn phase_step(i0: f32, q0: f32, i1: f32, q1: f32) -> f32 {
    let re = i1 * i0 + q1 * q0;
    let im = q1 * i0 - i1 * q0;
    im.atan2(re)
}
