use spectra_dsp::{SpectralEngine, Window, power_to_db};

use crate::context::NodeContext;
use crate::description::Params;
use crate::signal::Signal;

/// Windowed power spectrum over the most recent `fft_size` IQ samples.
///
/// Input accumulates across ticks so blocks smaller than the transform still
/// fill it.
pub(super) fn spectrum(
    input: &Signal,
    params: &Params,
    ctx: &mut NodeContext,
    engine: &mut SpectralEngine,
) -> Option<Signal> {
    let Signal::Iq(iq) = input else {
        return None;
    };
    let size = params.usize_or("fft_size", 1024);
    if size > engine.max_fft_size() {
        return None;
    }
    let window = params.parse_or("window", Window::Hann);

    if ctx.history.len() != 1 {
        ctx.history = vec![Vec::new()];
    }
    let recent = &mut ctx.history[0];
    recent.extend_from_slice(iq);
    let excess = recent.len().saturating_sub(2 * size);
    recent.drain(..excess - excess % 2);

    if ctx
        .window
        .as_ref()
        .is_none_or(|(w, n, _)| *w != window || *n != size)
    {
        ctx.window = Some((window, size, window.coefficients(size)));
    }
    let coefficients = &ctx.window.as_ref()?.2;

    let row = engine.fft_windowed(&ctx.history[0], size, coefficients);
    Some(Signal::Spectrum(row.into()))
}

/// Level in dB: mean power for audio and IQ, peak bin for spectra, fraction
/// of ones for bits.
pub(super) fn level_meter(input: &Signal) -> Option<Signal> {
    let level = match input {
        Signal::Audio(s) => mean_power_db(s, s.len())?,
        Signal::Iq(s) => mean_power_db(s, s.len() / 2)?,
        Signal::Spectrum(row) => row.iter().copied().reduce(f32::max)?,
        Signal::Bits(bits) => {
            if bits.is_empty() {
                return None;
            }
            bits.iter().filter(|&&b| b != 0).count() as f32 / bits.len() as f32
        }
        Signal::Scalar(v) => *v,
    };
    Some(Signal::Scalar(level))
}

fn mean_power_db(samples: &[f32], count: usize) -> Option<f32> {
    if count == 0 {
        return None;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum();
    Some(power_to_db(energy / count as f32))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn spectrum_accumulates_small_blocks() {
        let mut engine = SpectralEngine::software_only();
        let params = Params::new().with("fft_size", 64_i64).with("window", "rect");
        let mut ctx = NodeContext::new();

        let block: Vec<f32> = (0..16).flat_map(|_| [1.0, 0.0]).collect();
        let mut row = None;
        for _ in 0..8 {
            row = spectrum(&Signal::Iq(Arc::from(block.as_slice())), &params, &mut ctx, &mut engine);
        }
        assert_eq!(ctx.history[0].len(), 128);

        let Some(Signal::Spectrum(row)) = row else {
            panic!("expected a spectrum row");
        };
        assert_eq!(row.len(), 64);
        // DC sits in the centre bin: |64|^2 -> ~36.1 dB.
        assert!((row[32] - 10.0 * 4096f32.log10()).abs() < 1e-3);
    }

    #[test]
    fn spectrum_over_engine_limit_produces_nothing() {
        let mut engine = SpectralEngine::software_only();
        let size = engine.max_fft_size() as i64 * 2;
        let params = Params::new().with("fft_size", size);
        let mut ctx = NodeContext::new();
        let iq = Signal::Iq(Arc::from(vec![1.0f32; 64]));
        assert!(spectrum(&iq, &params, &mut ctx, &mut engine).is_none());
        assert!(ctx.history.is_empty());
        assert!(ctx.window.is_none());
    }

    #[test]
    fn level_of_unit_tone_is_zero_db() {
        let iq: Vec<f32> = (0..100)
            .flat_map(|n| {
                let p = n as f32 * 0.1;
                [p.cos(), p.sin()]
            })
            .collect();
        let Some(Signal::Scalar(db)) = level_meter(&Signal::Iq(iq.into())) else {
            panic!("expected a scalar");
        };
        assert!(db.abs() < 1e-3);

        assert_eq!(
            level_meter(&Signal::Spectrum(Arc::from(&[-80.0f32, -3.0, -40.0][..]))),
            Some(Signal::Scalar(-3.0))
        );
        assert_eq!(level_meter(&Signal::Audio(Arc::from(&[][..]))), None);
    }
}
