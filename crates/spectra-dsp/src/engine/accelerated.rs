//! Vectorized backend built on `rustfft`.
//!
//! `rustfft` selects AVX, SSE or NEON kernels at plan time. Probing fails when
//! the host exposes none of them, which routes the engine to the software
//! path. Plans and scratch buffers are pooled per size; long filters run as
//! zero-padded FFT convolution.
//!
//! The backend also honours a [`DeviceLossHandle`]. Once loss is reported
//! every call returns [`BackendError::DeviceLost`] and pooled resources are
//! released.

use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use super::backend::{AdapterInfo, BackendError, BackendKind, BackendLimits, ComputeBackend, phase_step};
use super::pool::SizePool;
use super::software::direct_convolution;
use super::status::DeviceLossHandle;

/// Default largest transform size.
pub const DEFAULT_MAX_FFT_SIZE: usize = 1 << 20;

/// Filters shorter than this run as direct convolution.
const FFT_CONVOLUTION_MIN_TAPS: usize = 32;

/// A pooled plan together with its scratch space.
struct PlanEntry {
    plan: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex32>,
}

impl PlanEntry {
    fn forward(size: usize) -> Self {
        Self::from_plan(FftPlanner::new().plan_fft_forward(size))
    }

    fn inverse(size: usize) -> Self {
        Self::from_plan(FftPlanner::new().plan_fft_inverse(size))
    }

    fn from_plan(plan: Arc<dyn Fft<f32>>) -> Self {
        let scratch = vec![Complex32::new(0.0, 0.0); plan.get_inplace_scratch_len()];
        Self { plan, scratch }
    }

    fn run(&mut self, buffer: &mut [Complex32]) {
        self.plan.process_with_scratch(buffer, &mut self.scratch);
    }
}

/// Vector-unit implementation of the engine kernels.
pub struct AcceleratedBackend {
    features: Vec<&'static str>,
    max_fft_size: usize,
    forward: SizePool<PlanEntry>,
    inverse: SizePool<PlanEntry>,
    loss: DeviceLossHandle,
}

impl std::fmt::Debug for AcceleratedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceleratedBackend")
            .field("features", &self.features)
            .field("max_fft_size", &self.max_fft_size)
            .field("resident_forward", &self.forward.len())
            .field("resident_inverse", &self.inverse.len())
            .finish()
    }
}

impl AcceleratedBackend {
    /// Detects vector extensions and initializes the backend.
    ///
    /// # Errors
    ///
    /// [`BackendError::Unavailable`] if the host has no usable vector unit.
    pub fn probe(
        pool_capacity: usize,
        max_fft_size: usize,
        loss: DeviceLossHandle,
    ) -> Result<Self, BackendError> {
        let features = detect_vector_features();
        if features.is_empty() {
            return Err(BackendError::Unavailable(format!(
                "no vector extension detected on {}",
                std::env::consts::ARCH
            )));
        }
        Ok(Self {
            features,
            max_fft_size: max_fft_size.max(2),
            forward: SizePool::new(pool_capacity),
            inverse: SizePool::new(pool_capacity),
            loss,
        })
    }

    /// Vector extensions in use.
    pub fn features(&self) -> &[&'static str] {
        &self.features
    }

    /// Number of forward plans resident in the pool.
    pub fn resident_sizes(&self) -> usize {
        self.forward.len()
    }

    fn check_device(&mut self) -> Result<(), BackendError> {
        if let Some(reason) = self.loss.lost_reason() {
            self.forward.clear();
            self.inverse.clear();
            return Err(BackendError::DeviceLost(reason));
        }
        Ok(())
    }

    /// Zero-padded FFT convolution truncated to the causal part.
    fn fft_convolution(&mut self, samples: &[f32], taps: &[f32]) -> Vec<f32> {
        let size = (samples.len() + taps.len() - 1).next_power_of_two();

        let mut signal = vec![Complex32::new(0.0, 0.0); size];
        for (dst, &x) in signal.iter_mut().zip(samples) {
            dst.re = x;
        }
        let mut kernel = vec![Complex32::new(0.0, 0.0); size];
        for (dst, &h) in kernel.iter_mut().zip(taps) {
            dst.re = h;
        }

        let forward = self.forward.get_or_insert_with(size, || PlanEntry::forward(size));
        forward.run(&mut signal);
        forward.run(&mut kernel);

        for (s, k) in signal.iter_mut().zip(&kernel) {
            *s *= *k;
        }

        self.inverse
            .get_or_insert_with(size, || PlanEntry::inverse(size))
            .run(&mut signal);

        let scale = 1.0 / size as f32;
        signal[..samples.len()].iter().map(|c| c.re * scale).collect()
    }
}

impl ComputeBackend for AcceleratedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn adapter(&self) -> AdapterInfo {
        AdapterInfo {
            name: "rustfft-simd".to_string(),
            vendor: std::env::consts::ARCH.to_string(),
            description: format!("vector FFT ({})", self.features.join(", ")),
        }
    }

    fn limits(&self) -> BackendLimits {
        BackendLimits {
            max_buffer_size: self.max_fft_size * size_of::<Complex32>(),
            max_fft_size: self.max_fft_size,
        }
    }

    fn fft(&mut self, buffer: &mut [Complex32]) -> Result<(), BackendError> {
        self.check_device()?;
        let size = buffer.len();
        if size > self.max_fft_size {
            return Err(BackendError::Unsupported(format!(
                "fft size {size} exceeds {}",
                self.max_fft_size
            )));
        }
        if size < 2 {
            return Ok(());
        }
        self.forward
            .get_or_insert_with(size, || PlanEntry::forward(size))
            .run(buffer);
        Ok(())
    }

    fn filter(&mut self, samples: &[f32], taps: &[f32]) -> Result<Vec<f32>, BackendError> {
        self.check_device()?;
        if samples.is_empty() || taps.is_empty() {
            return Ok(vec![0.0; samples.len()]);
        }
        let padded = (samples.len() + taps.len() - 1).next_power_of_two();
        if taps.len() < FFT_CONVOLUTION_MIN_TAPS || padded > self.max_fft_size {
            return Ok(direct_convolution(samples, taps));
        }
        Ok(self.fft_convolution(samples, taps))
    }

    fn fm_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError> {
        self.check_device()?;
        let n = i.len().min(q.len());
        let mut out = Vec::with_capacity(i.len());
        if !i.is_empty() {
            out.push(0.0);
        }
        out.extend(
            i[..n]
                .windows(2)
                .zip(q[..n].windows(2))
                .map(|(iw, qw)| phase_step(iw[0], qw[0], iw[1], qw[1])),
        );
        out.resize(i.len(), 0.0);
        Ok(out)
    }

    fn am_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError> {
        self.check_device()?;
        let n = i.len().min(q.len());
        let mut out: Vec<f32> = i[..n]
            .iter()
            .zip(&q[..n])
            .map(|(&re, &im)| (re * re + im * im).sqrt())
            .collect();
        out.extend(i[n..].iter().map(|x| x.abs()));
        Ok(out)
    }
}

/// Vector extensions `rustfft` can dispatch to on this host.
fn detect_vector_features() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut found = Vec::new();
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx") && std::arch::is_x86_feature_detected!("fma") {
            found.push("avx+fma");
        }
        if std::arch::is_x86_feature_detected!("sse4.1") {
            found.push("sse4.1");
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            found.push("neon");
        }
    }
    found
}
