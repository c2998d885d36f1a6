//! Windowed-sinc FIR tap design.
//!
//! Taps are Hamming-windowed sinc kernels, normalized so that the sum of the
//! absolute tap values is 1. Cutoffs are normalized frequencies (cycles per
//! sample) in `(0, 0.5)`. Out-of-range cutoffs are not rejected; they produce
//! degenerate taps.
//!
//! ```rust
//! use spectra_dsp::filter_design::{design_taps, FilterKind};
//!
//! let taps = design_taps(31, 0.25, FilterKind::LowPass, None);
//! let abs_sum: f32 = taps.iter().map(|t| t.abs()).sum();
//! assert!((abs_sum - 1.0).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Filter response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Passes frequencies below the cutoff.
    #[default]
    LowPass,
    /// Passes frequencies above the cutoff.
    HighPass,
    /// Passes frequencies between `cutoff` and `cutoff2`.
    BandPass,
}

impl std::str::FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "lowpass" | "lp" => Ok(FilterKind::LowPass),
            "highpass" | "hp" => Ok(FilterKind::HighPass),
            "bandpass" | "bp" => Ok(FilterKind::BandPass),
            _ => Err(format!("unknown filter kind '{s}'")),
        }
    }
}

/// Complete description of a FIR design.
///
/// Two specs that compare equal design identical taps, so holders can cache
/// the taps and redesign only when the filter spec changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Response shape.
    #[serde(default)]
    pub kind: FilterKind,
    /// Number of taps (odd, at least 3).
    #[serde(default = "default_num_taps")]
    pub num_taps: usize,
    /// Normalized cutoff; the lower edge for band-pass.
    pub cutoff: f32,
    /// Upper edge for band-pass, ignored otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff2: Option<f32>,
}

fn default_num_taps() -> usize {
    63
}

impl FilterSpec {
    /// Low-pass spec.
    pub fn low_pass(num_taps: usize, cutoff: f32) -> Self {
        Self {
            kind: FilterKind::LowPass,
            num_taps,
            cutoff,
            cutoff2: None,
        }
    }

    /// Designs the taps for this spec.
    pub fn design(&self) -> Vec<f32> {
        design_taps(self.num_taps, self.cutoff, self.kind, self.cutoff2)
    }
}

/// Designs FIR taps.
///
/// - `LowPass`: Hamming-windowed sinc at `cutoff`.
/// - `HighPass`: spectral inversion of the low-pass design.
/// - `BandPass`: high-pass at `cutoff` plus low-pass at `cutoff2`, with the
///   shared center impulse removed so the two halves overlap only inside the
///   band. A missing `cutoff2` defaults to `0.5 - cutoff / 2`.
///
/// The result is rescaled so that `sum(|taps|) == 1`. Fewer than two taps
/// yield a pass-through kernel.
pub fn design_taps(
    num_taps: usize,
    cutoff: f32,
    kind: FilterKind,
    cutoff2: Option<f32>,
) -> Vec<f32> {
    if num_taps < 2 {
        return vec![1.0; num_taps];
    }

    let taps = match kind {
        FilterKind::LowPass => low_pass(num_taps, f64::from(cutoff)),
        FilterKind::HighPass => high_pass(num_taps, f64::from(cutoff)),
        FilterKind::BandPass => {
            let upper = cutoff2.unwrap_or(0.5 - cutoff / 2.0);
            let mut band = high_pass(num_taps, f64::from(cutoff));
            for (b, l) in band.iter_mut().zip(low_pass(num_taps, f64::from(upper))) {
                *b += l;
            }
            if num_taps % 2 == 1 {
                band[num_taps / 2] -= 1.0;
            }
            band
        }
    };

    normalize_abs(taps)
}

/// Hamming-windowed sinc, scaled to unity DC gain.
fn low_pass(num_taps: usize, fc: f64) -> Vec<f64> {
    let m = (num_taps - 1) as f64;
    let mut taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let x = i as f64 - m / 2.0;
            let sinc = if x.abs() < 1e-12 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * x).sin() / (PI * x)
            };
            let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / m).cos();
            sinc * window
        })
        .collect();

    let dc: f64 = taps.iter().sum();
    if dc.abs() > 1e-12 {
        for t in &mut taps {
            *t /= dc;
        }
    }
    taps
}

/// Spectral inversion: `delta - low_pass`.
fn high_pass(num_taps: usize, fc: f64) -> Vec<f64> {
    let mut taps: Vec<f64> = low_pass(num_taps, fc).into_iter().map(|t| -t).collect();
    // Even lengths have no center tap; the inversion is then only approximate.
    taps[num_taps / 2] += 1.0;
    taps
}

fn normalize_abs(taps: Vec<f64>) -> Vec<f32> {
    let abs_sum: f64 = taps.iter().map(|t| t.abs()).sum();
    let scale = if abs_sum > 1e-12 { 1.0 / abs_sum } else { 1.0 };
    taps.into_iter().map(|t| (t * scale) as f32).collect()
}
