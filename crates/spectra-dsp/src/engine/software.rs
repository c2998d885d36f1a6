//! Reference software backend.
//!
//! Radix-2 decimation-in-time Cooley-Tukey: a bit-reversal permutation
//! followed by `log2(N)` butterfly stages. Twiddle and permutation tables are
//! cached per size in a [`SizePool`].

use rustfft::num_complex::Complex32;

use super::backend::{AdapterInfo, BackendError, BackendKind, BackendLimits, ComputeBackend, phase_step};
use super::pool::SizePool;

/// Largest transform the reference path accepts.
pub const SOFTWARE_MAX_FFT_SIZE: usize = 1 << 24;

/// Precomputed tables for one transform size.
#[derive(Debug)]
struct Radix2Plan {
    /// `bit_reverse[i]` is the destination of element `i`.
    bit_reverse: Vec<u32>,
    /// `exp(-2 pi i k / N)` for `k < N / 2`.
    twiddles: Vec<Complex32>,
}

impl Radix2Plan {
    fn new(size: usize) -> Self {
        let bits = size.trailing_zeros();
        let bit_reverse = (0..size as u32)
            .map(|i| if bits == 0 { 0 } else { i.reverse_bits() >> (32 - bits) })
            .collect();
        let twiddles = (0..size / 2)
            .map(|k| {
                let angle = -2.0 * std::f64::consts::PI * k as f64 / size as f64;
                Complex32::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();
        Self {
            bit_reverse,
            twiddles,
        }
    }

    fn permute(&self, buffer: &mut [Complex32]) {
        for (i, &j) in self.bit_reverse.iter().enumerate() {
            let j = j as usize;
            if j > i {
                buffer.swap(i, j);
            }
        }
    }

    /// One butterfly stage combining pairs of half-length sub-transforms.
    fn butterfly_stage(&self, buffer: &mut [Complex32], len: usize) {
        let n = buffer.len();
        let half = len / 2;
        let stride = n / len;
        for block in buffer.chunks_exact_mut(len) {
            let (lo, hi) = block.split_at_mut(half);
            for (k, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
                let t = *b * self.twiddles[k * stride];
                *b = *a - t;
                *a += t;
            }
        }
    }

    fn process(&self, buffer: &mut [Complex32]) {
        self.permute(buffer);
        let mut len = 2;
        while len <= buffer.len() {
            self.butterfly_stage(buffer, len);
            len <<= 1;
        }
    }
}

/// Reference implementation of every engine kernel.
#[derive(Debug)]
pub struct SoftwareBackend {
    plans: SizePool<Radix2Plan>,
}

impl SoftwareBackend {
    /// Creates a backend caching tables for up to `pool_capacity` sizes.
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            plans: SizePool::new(pool_capacity),
        }
    }

    /// Number of transform sizes with resident tables.
    pub fn resident_sizes(&self) -> usize {
        self.plans.len()
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ComputeBackend for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn adapter(&self) -> AdapterInfo {
        AdapterInfo {
            name: "reference".to_string(),
            vendor: std::env::consts::ARCH.to_string(),
            description: "scalar radix-2 Cooley-Tukey".to_string(),
        }
    }

    fn limits(&self) -> BackendLimits {
        BackendLimits {
            max_buffer_size: SOFTWARE_MAX_FFT_SIZE * size_of::<Complex32>(),
            max_fft_size: SOFTWARE_MAX_FFT_SIZE,
        }
    }

    fn fft(&mut self, buffer: &mut [Complex32]) -> Result<(), BackendError> {
        let size = buffer.len();
        if size > SOFTWARE_MAX_FFT_SIZE {
            return Err(BackendError::Unsupported(format!(
                "fft size {size} exceeds {SOFTWARE_MAX_FFT_SIZE}"
            )));
        }
        if size < 2 {
            return Ok(());
        }
        let plan = self.plans.get_or_insert_with(size, || Radix2Plan::new(size));
        plan.process(buffer);
        Ok(())
    }

    fn filter(&mut self, samples: &[f32], taps: &[f32]) -> Result<Vec<f32>, BackendError> {
        Ok(direct_convolution(samples, taps))
    }

    fn fm_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError> {
        let n = i.len().min(q.len());
        let mut out = vec![0.0; i.len()];
        for k in 1..n {
            out[k] = phase_step(i[k - 1], q[k - 1], i[k], q[k]);
        }
        Ok(out)
    }

    fn am_demod(&mut self, i: &[f32], q: &[f32]) -> Result<Vec<f32>, BackendError> {
        Ok(i
            .iter()
            .enumerate()
            .map(|(k, &re)| {
                let im = q.get(k).copied().unwrap_or(0.0);
                (re * re + im * im).sqrt()
            })
            .collect())
    }
}

/// Causal direct-form convolution with zero history.
pub(crate) fn direct_convolution(samples: &[f32], taps: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; samples.len()];
    for (n, y) in out.iter_mut().enumerate() {
        let reach = taps.len().min(n + 1);
        *y = taps[..reach]
            .iter()
            .enumerate()
            .map(|(j, &h)| h * samples[n - j])
            .sum();
    }
    out
}
