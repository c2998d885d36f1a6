//! Interleaved IQ helpers and power-spectrum post-processing.

use rustfft::num_complex::Complex32;

/// Power floor applied before the dB conversion (-200 dB).
pub const POWER_FLOOR: f32 = 1e-20;

/// [`POWER_FLOOR`] in dB; the value of every bin in a degenerate row.
pub const FLOOR_DB: f32 = -200.0;

/// Converts power to decibels with [`POWER_FLOOR`].
#[inline]
pub fn power_to_db(power: f32) -> f32 {
    if power <= POWER_FLOOR {
        return FLOOR_DB;
    }
    (10.0 * power.log10()).max(FLOOR_DB)
}

/// Number of complex samples in an interleaved `[I0, Q0, I1, Q1, ...]` buffer.
#[inline]
pub fn complex_len(interleaved: &[f32]) -> usize {
    interleaved.len() / 2
}

/// Splits interleaved IQ into separate I and Q vectors.
pub fn deinterleave(interleaved: &[f32]) -> (Vec<f32>, Vec<f32>) {
    interleaved
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .unzip()
}

/// Interleaves separate I and Q slices (shorter length wins).
pub fn interleave(i: &[f32], q: &[f32]) -> Vec<f32> {
    i.iter().zip(q).flat_map(|(&re, &im)| [re, im]).collect()
}

/// Which end of the input a frame is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAlign {
    /// First `size` complex samples.
    Head,
    /// Most recent `size` complex samples.
    Tail,
}

/// Builds a complex transform frame of exactly `size` samples, zero padded,
/// optionally multiplied by `window` (missing coefficients count as 1).
pub fn complex_frame(
    interleaved: &[f32],
    size: usize,
    align: FrameAlign,
    window: Option<&[f32]>,
) -> Vec<Complex32> {
    let available = complex_len(interleaved);
    let take = available.min(size);
    let first = match align {
        FrameAlign::Head => 0,
        FrameAlign::Tail => available - take,
    };

    let mut frame = vec![Complex32::new(0.0, 0.0); size];
    let source = interleaved[first * 2..(first + take) * 2].chunks_exact(2);
    for (k, (dst, pair)) in frame.iter_mut().zip(source).enumerate() {
        let w = window.and_then(|w| w.get(k)).copied().unwrap_or(1.0);
        *dst = Complex32::new(pair[0] * w, pair[1] * w);
    }
    frame
}

/// Squared magnitude in dB, FFT-shifted so index 0 is the most negative
/// frequency and index `N / 2` is DC.
pub fn shifted_power_db(bins: &[Complex32]) -> Vec<f32> {
    let n = bins.len();
    let half = n / 2;
    (0..n)
        .map(|i| power_to_db(bins[(i + half) % n].norm_sqr()))
        .collect()
}

/// Output index of positive-frequency bin `k` after the FFT-shift.
#[inline]
pub fn shifted_index(k: usize, size: usize) -> usize {
    (k + size / 2) % size
}
