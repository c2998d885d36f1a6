//! Property-based tests for tap design and engine output shapes.

use proptest::prelude::*;
use spectra_dsp::{FLOOR_DB, FilterKind, SpectralEngine, design_taps};

fn any_kind() -> impl Strategy<Value = FilterKind> {
    prop_oneof![
        Just(FilterKind::LowPass),
        Just(FilterKind::HighPass),
        Just(FilterKind::BandPass),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Designed taps always have unit absolute sum and the requested length.
    #[test]
    fn taps_have_unit_absolute_sum(
        half in 1usize..64,
        cutoff in 0.01f32..0.24f32,
        kind in any_kind(),
    ) {
        let num_taps = 2 * half + 1;
        let taps = design_taps(num_taps, cutoff, kind, Some(cutoff + 0.2));
        prop_assert_eq!(taps.len(), num_taps);
        let sum: f64 = taps.iter().map(|t| f64::from(t.abs())).sum();
        prop_assert!((sum - 1.0).abs() < 1e-5, "sum {}", sum);
    }

    /// Linear-phase designs are symmetric.
    #[test]
    fn taps_are_symmetric(half in 1usize..40, cutoff in 0.01f32..0.49f32) {
        let taps = design_taps(2 * half + 1, cutoff, FilterKind::LowPass, None);
        for (a, b) in taps.iter().zip(taps.iter().rev()) {
            prop_assert!((a - b).abs() < 1e-6);
        }
    }

    /// Filtering preserves length and never produces non-finite output.
    #[test]
    fn filter_preserves_length(
        input in prop::collection::vec(-1.0f32..=1.0f32, 0..600),
        half in 1usize..50,
    ) {
        let mut engine = SpectralEngine::default();
        let taps = design_taps(2 * half + 1, 0.1, FilterKind::LowPass, None);
        let out = engine.filter(&input, &taps);
        prop_assert_eq!(out.len(), input.len());
        prop_assert!(out.iter().all(|v| v.is_finite()));
    }

    /// Every FFT row has the requested width and stays at or above the floor.
    #[test]
    fn fft_rows_have_requested_width(
        input in prop::collection::vec(-1.0f32..=1.0f32, 0..1024),
        log2 in 0u32..10,
    ) {
        let size = 1usize << log2;
        let mut engine = SpectralEngine::software_only();
        let row = engine.fft(&input, size);
        prop_assert_eq!(row.len(), size);
        prop_assert!(row.iter().all(|&v| v >= FLOOR_DB && v.is_finite()));
    }
}
