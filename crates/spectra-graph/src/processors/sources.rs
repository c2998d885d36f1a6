use std::f64::consts::TAU;

use crate::context::NodeContext;
use crate::description::Params;
use crate::signal::Signal;

use super::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, MAX_BLOCK_SIZE};

/// Complex exponential at `frequency` Hz, phase-continuous across ticks.
pub(super) fn tone(params: &Params, ctx: &mut NodeContext) -> Option<Signal> {
    let sample_rate = f64::from(params.f32_or("sample_rate", DEFAULT_SAMPLE_RATE));
    let frequency = f64::from(params.f32_or("frequency", 1000.0));
    let amplitude = params.f32_or("amplitude", 1.0);
    let block = params.usize_or("block_size", DEFAULT_BLOCK_SIZE);
    if sample_rate.is_nan() || sample_rate <= 0.0 || block == 0 || block > MAX_BLOCK_SIZE {
        return None;
    }

    let step = TAU * frequency / sample_rate;
    let mut phase = ctx.phase;
    let mut iq = Vec::with_capacity(block * 2);
    for _ in 0..block {
        iq.push(amplitude * phase.cos() as f32);
        iq.push(amplitude * phase.sin() as f32);
        phase = (phase + step).rem_euclid(TAU);
    }
    ctx.phase = phase;
    Some(Signal::Iq(iq.into()))
}

/// Next block from the attached IQ source.
pub(super) fn iq_input(ctx: &mut NodeContext) -> Option<Signal> {
    let block = ctx.iq_source.as_mut()?.read()?;
    (!block.is_empty()).then(|| Signal::Iq(block.into()))
}
