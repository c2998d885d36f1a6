//! Spectra DSP - spectral compute for IQ streams
//!
//! This crate provides the numerical core of spectra:
//!
//! - [`engine`] - [`SpectralEngine`]: FFT power spectra, FIR filtering and
//!   FM/AM demodulation with an accelerated backend and a software fallback
//! - [`filter_design`] - Windowed-sinc FIR tap design ([`design_taps`])
//! - [`window`] - Window functions for spectral analysis
//! - [`iq`] - Interleaved IQ helpers and dB conversion
//!
//! # Backends
//!
//! Both backends implement [`ComputeBackend`]. The software backend is a
//! scalar radix-2 Cooley-Tukey reference; the accelerated backend runs
//! `rustfft`'s SIMD kernels. The engine probes acceleration once and falls
//! back permanently on failure or device loss. Results agree within
//! floating-point tolerance, so callers never need to know which one ran.
//!
//! # Example
//!
//! ```rust
//! use spectra_dsp::{FilterKind, SpectralEngine, design_taps};
//!
//! let mut engine = SpectralEngine::software_only();
//! let taps = design_taps(31, 0.1, FilterKind::LowPass, None);
//! let audio = engine.filter(&[1.0; 64], &taps);
//! assert_eq!(audio.len(), 64);
//! ```
//!
//! # Logging
//!
//! Enable the `tracing` feature to get backend selection, degradation and
//! pool eviction events through the `tracing` crate.

pub mod engine;
pub mod filter_design;
pub mod iq;
pub mod window;

pub use engine::{
    AccelerationMode, AdapterInfo, BackendError, BackendKind, BackendLimits, ComputeBackend,
    DeviceLossHandle, EngineConfig, EngineStats, EngineStatus, SpectralEngine, StatsSnapshot,
};
pub use filter_design::{FilterKind, FilterSpec, design_taps};
pub use iq::{FLOOR_DB, POWER_FLOOR, deinterleave, interleave, power_to_db};
pub use window::Window;
