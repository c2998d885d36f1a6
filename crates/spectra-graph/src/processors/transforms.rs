use spectra_dsp::{FilterKind, FilterSpec, SpectralEngine, deinterleave, interleave};

use crate::context::NodeContext;
use crate::description::Params;
use crate::signal::Signal;

use super::MAX_TAPS;

/// FIR filter over audio or IQ. The trailing `num_taps - 1` input samples
/// of each channel carry into the next tick, so consecutive blocks filter
/// as one continuous stream.
pub(super) fn fir(
    input: &Signal,
    params: &Params,
    ctx: &mut NodeContext,
    engine: &mut SpectralEngine,
) -> Option<Signal> {
    let spec = FilterSpec {
        kind: params.parse_or("response", FilterKind::LowPass),
        num_taps: params.usize_or("num_taps", 63),
        cutoff: params.f32_or("cutoff", 0.1),
        cutoff2: params.number("cutoff2").map(|v| v as f32),
    };
    if spec.num_taps > MAX_TAPS {
        return None;
    }
    if ctx.taps.as_ref().is_none_or(|(designed, _)| *designed != spec) {
        ctx.taps = Some((spec, spec.design()));
        ctx.history.clear();
    }
    let taps = &ctx.taps.as_ref()?.1;

    let mut channels = match input {
        Signal::Iq(iq) => {
            let (i, q) = deinterleave(iq);
            vec![i, q]
        }
        Signal::Audio(s) | Signal::Spectrum(s) => vec![s.to_vec()],
        Signal::Bits(_) | Signal::Scalar(_) => return None,
    };
    if ctx.history.len() != channels.len() {
        ctx.history = vec![Vec::new(); channels.len()];
    }

    let keep = taps.len().saturating_sub(1);
    for (channel, history) in channels.iter_mut().zip(ctx.history.iter_mut()) {
        let carried = history.len();
        history.extend_from_slice(channel);
        let filtered = engine.filter(history, taps);
        *channel = filtered[carried..].to_vec();
        let excess = history.len().saturating_sub(keep);
        history.drain(..excess);
    }

    let samples = match channels.as_slice() {
        [i, q] => interleave(i, q),
        _ => channels.pop().unwrap_or_default(),
    };
    Some(input.same_kind(samples))
}

/// FM discriminator. The last sample of the previous tick seeds the first
/// phase difference of this one.
pub(super) fn fm_demod(
    input: &Signal,
    params: &Params,
    ctx: &mut NodeContext,
    engine: &mut SpectralEngine,
) -> Option<Signal> {
    let Signal::Iq(iq) = input else {
        return None;
    };
    let (mut i, mut q) = deinterleave(iq);
    let (&last_i, &last_q) = (i.last()?, q.last()?);

    let carried = ctx.last_iq.replace([last_i, last_q]);
    if let Some([pi, pq]) = carried {
        i.insert(0, pi);
        q.insert(0, pq);
    }

    let mut audio = engine.fm_demod(&i, &q);
    if carried.is_some() {
        audio.remove(0);
    }
    scale(&mut audio, params.f32_or("gain", 1.0));
    Some(Signal::Audio(audio.into()))
}

/// AM envelope, optionally with the block mean removed.
pub(super) fn am_demod(
    input: &Signal,
    params: &Params,
    engine: &mut SpectralEngine,
) -> Option<Signal> {
    let Signal::Iq(iq) = input else {
        return None;
    };
    let (i, q) = deinterleave(iq);
    let mut audio = engine.am_demod(&i, &q);
    if audio.is_empty() {
        return None;
    }
    if params.bool_or("remove_dc", false) {
        let mean = audio.iter().sum::<f32>() / audio.len() as f32;
        audio.iter_mut().for_each(|s| *s -= mean);
    }
    scale(&mut audio, params.f32_or("gain", 1.0));
    Some(Signal::Audio(audio.into()))
}

/// Hard decision: 1 where the sample exceeds `threshold`.
pub(super) fn slicer(input: &Signal, params: &Params) -> Option<Signal> {
    let samples = input.samples()?;
    let threshold = params.f32_or("threshold", 0.0);
    let bits: Vec<u8> = samples.iter().map(|&s| u8::from(s > threshold)).collect();
    Some(Signal::Bits(bits.into()))
}

/// Explicit fan-in. Float signals are summed element-wise (or averaged with
/// `mode = "average"`), zero-extending shorter inputs; the result takes the
/// variant of the first float input. Bits are concatenated in connection
/// order and scalars combine like floats.
pub(super) fn combiner(inputs: &[Signal], params: &Params) -> Option<Signal> {
    let average = params.text("mode") == Some("average");

    if inputs.iter().all(|s| matches!(s, Signal::Bits(_))) {
        let bits: Vec<u8> = inputs
            .iter()
            .filter_map(|s| match s {
                Signal::Bits(b) => Some(b.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect();
        return (!bits.is_empty()).then(|| Signal::Bits(bits.into()));
    }

    if inputs.iter().all(|s| matches!(s, Signal::Scalar(_))) {
        let values: Vec<f32> = inputs
            .iter()
            .filter_map(|s| match s {
                Signal::Scalar(v) => Some(*v),
                _ => None,
            })
            .collect();
        let sum: f32 = values.iter().sum();
        return Some(Signal::Scalar(if average {
            sum / values.len() as f32
        } else {
            sum
        }));
    }

    let first = inputs.iter().find(|s| s.samples().is_some())?;
    let buffers: Vec<&[f32]> = inputs.iter().filter_map(Signal::samples).collect();
    let len = buffers.iter().map(|b| b.len()).max().unwrap_or(0);
    let mut mixed = vec![0.0f32; len];
    for buffer in &buffers {
        for (acc, &s) in mixed.iter_mut().zip(buffer.iter()) {
            *acc += s;
        }
    }
    if average {
        scale(&mut mixed, 1.0 / buffers.len() as f32);
    }
    Some(first.same_kind(mixed))
}

fn scale(samples: &mut [f32], gain: f32) {
    if gain != 1.0 {
        samples.iter_mut().for_each(|s| *s *= gain);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn audio(samples: &[f32]) -> Signal {
        Signal::Audio(Arc::from(samples))
    }

    #[test]
    fn fir_with_too_many_taps_produces_nothing() {
        let mut engine = SpectralEngine::software_only();
        let params = Params::new().with("num_taps", i64::MAX);
        let mut ctx = NodeContext::new();
        assert!(fir(&audio(&[1.0, 0.0]), &params, &mut ctx, &mut engine).is_none());
        assert!(ctx.taps.is_none());
    }

    #[test]
    fn fir_history_makes_blocks_continuous() {
        let mut engine = SpectralEngine::software_only();
        let params = Params::new().with("num_taps", 15_i64).with("cutoff", 0.2);
        let signal: Vec<f32> = (0..300).map(|n| (n as f32 * 0.37).sin()).collect();

        let whole = engine.filter(&signal, &spectra_dsp::design_taps(15, 0.2, FilterKind::LowPass, None));

        let mut ctx = NodeContext::new();
        let mut pieces = Vec::new();
        for chunk in signal.chunks(64) {
            let out = fir(&audio(chunk), &params, &mut ctx, &mut engine).unwrap();
            pieces.extend_from_slice(out.samples().unwrap());
        }

        assert_eq!(pieces.len(), whole.len());
        for (a, b) in pieces.iter().zip(&whole) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn fir_keeps_iq_interleaved() {
        let mut engine = SpectralEngine::software_only();
        let params = Params::new().with("num_taps", 3_i64);
        let iq = Signal::Iq(Arc::from(&[1.0f32, -1.0, 1.0, -1.0, 1.0, -1.0][..]));
        let out = fir(&iq, &params, &mut NodeContext::new(), &mut engine).unwrap();
        let samples = out.samples().unwrap();
        assert!(matches!(out, Signal::Iq(_)));
        assert_eq!(samples.len(), 6);
        for pair in samples.chunks_exact(2) {
            assert!((pair[0] + pair[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn fm_demod_is_continuous_across_ticks() {
        let mut engine = SpectralEngine::software_only();
        let step = 0.3f32;
        let iq: Vec<f32> = (0..20)
            .flat_map(|n| [(n as f32 * step).cos(), (n as f32 * step).sin()])
            .collect();
        let mut ctx = NodeContext::new();
        let params = Params::new();

        let first = fm_demod(&Signal::Iq(Arc::from(&iq[..20])), &params, &mut ctx, &mut engine).unwrap();
        let second = fm_demod(&Signal::Iq(Arc::from(&iq[20..])), &params, &mut ctx, &mut engine).unwrap();

        assert_eq!(first.samples().unwrap()[0], 0.0);
        let second = second.samples().unwrap();
        assert_eq!(second.len(), 10);
        assert!(second.iter().all(|p| (p - step).abs() < 1e-4));
    }

    #[test]
    fn slicer_thresholds() {
        let bits = slicer(&audio(&[-0.5, 0.2, 0.0, 0.9]), &Params::new()).unwrap();
        assert_eq!(bits, Signal::Bits(Arc::from(&[0u8, 1, 0, 1][..])));
    }

    #[test]
    fn combiner_sums_or_averages() {
        let inputs = [audio(&[1.0, 1.0, 1.0]), audio(&[1.0])];
        assert_eq!(
            combiner(&inputs, &Params::new()),
            Some(audio(&[2.0, 1.0, 1.0]))
        );
        assert_eq!(
            combiner(&inputs, &Params::new().with("mode", "average")),
            Some(audio(&[1.0, 0.5, 0.5]))
        );
        assert_eq!(combiner(&[], &Params::new()), None);
    }
}
