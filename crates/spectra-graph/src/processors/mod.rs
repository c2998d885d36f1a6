//! Node processors.
//!
//! Each processor is a function of `(input, params, context)` plus the
//! shared engine handle. Sources ignore their input; sinks act through the
//! context and return `None`. A processor that needs an input returns
//! `None` when its upstream produced nothing this tick.

mod analysis;
mod sinks;
mod sources;
mod transforms;

use spectra_dsp::SpectralEngine;

use crate::context::NodeContext;
use crate::description::Params;
use crate::kind::NodeKind;
use crate::signal::Signal;

/// Default sample rate for generated signals.
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Default samples per tick for generated signals (60 ticks per second).
pub const DEFAULT_BLOCK_SIZE: usize = 800;

/// Largest `block_size` a tone source generates, in complex samples.
pub const MAX_BLOCK_SIZE: usize = 1 << 20;

/// Largest `num_taps` a FIR node designs.
pub const MAX_TAPS: usize = 1 << 16;

/// First parameter of a `kind` node outside the range its processor
/// accepts, as `(name, reason)`. Out-of-range nodes load but produce
/// nothing.
pub fn param_problem(
    kind: &NodeKind,
    params: &Params,
    max_fft_size: usize,
) -> Option<(&'static str, String)> {
    let over = |name: &'static str, default: usize, max: usize| {
        let value = params.usize_or(name, default);
        (value > max).then(|| (name, format!("{value} exceeds {max}")))
    };
    match kind {
        NodeKind::Tone => over("block_size", DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE),
        NodeKind::Fir => over("num_taps", 0, MAX_TAPS),
        NodeKind::Spectrum => over("fft_size", 0, max_fft_size),
        _ => None,
    }
}

/// Evaluates one node for one tick.
pub(crate) fn process(
    kind: &NodeKind,
    inputs: &[Signal],
    params: &Params,
    ctx: &mut NodeContext,
    engine: &mut SpectralEngine,
) -> Option<Signal> {
    let input = inputs.first();
    match kind {
        NodeKind::Tone => sources::tone(params, ctx),
        NodeKind::IqInput => sources::iq_input(ctx),
        NodeKind::Fir => transforms::fir(input?, params, ctx, engine),
        NodeKind::FmDemod => transforms::fm_demod(input?, params, ctx, engine),
        NodeKind::AmDemod => transforms::am_demod(input?, params, engine),
        NodeKind::Slicer => transforms::slicer(input?, params),
        NodeKind::Combiner => transforms::combiner(inputs, params),
        NodeKind::Spectrum => analysis::spectrum(input?, params, ctx, engine),
        NodeKind::LevelMeter => analysis::level_meter(input?),
        NodeKind::SpectrumDisplay => sinks::spectrum_display(input, params, ctx),
        NodeKind::AudioOut => sinks::audio_out(input?, ctx),
        NodeKind::Recorder => sinks::recorder(input?, params, ctx),
        NodeKind::Unknown(_) => None,
    }
}
