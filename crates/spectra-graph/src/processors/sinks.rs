use spectra_stream::{DrainPolicy, Drainer, SpectrumRing};

use crate::context::NodeContext;
use crate::description::Params;
use crate::signal::Signal;

/// Buffers incoming spectrum rows and drains them onto the render surface
/// at the drain policy's rate. Drains every tick, with or without input.
pub(super) fn spectrum_display(
    input: Option<&Signal>,
    params: &Params,
    ctx: &mut NodeContext,
) -> Option<Signal> {
    if ctx.first_run() {
        let defaults = DrainPolicy::default();
        ctx.drainer = Drainer::new(DrainPolicy {
            normal_rate: params.usize_or("normal_rate", defaults.normal_rate),
            catch_up_rate: params.usize_or("catch_up_rate", defaults.catch_up_rate),
            backlog_threshold: params.usize_or("backlog_threshold", defaults.backlog_threshold),
        });
    }

    if let Some(Signal::Spectrum(row)) = input
        && !row.is_empty()
    {
        let capacity = params.usize_or("capacity", 64);
        let ring = ctx
            .ring
            .get_or_insert_with(|| SpectrumRing::new(capacity, row.len()));
        if ring.width() != row.len() {
            ring.resize(row.len());
        }
        ring.push(row);
    }

    let ring = ctx.ring.as_mut()?;
    let surface = &mut ctx.surface;
    ctx.drainer.tick(ring, |row| {
        if let Some(surface) = surface.as_mut() {
            surface.draw_row(row);
        }
    });
    if let (Some(surface), Some(latest)) = (ctx.surface.as_mut(), ring.latest()) {
        surface.present(latest);
    }
    None
}

/// Hands audio to the attached output.
pub(super) fn audio_out(input: &Signal, ctx: &mut NodeContext) -> Option<Signal> {
    if let (Some(audio), Some(samples)) = (ctx.audio.as_mut(), input.samples())
        && !samples.is_empty()
    {
        audio.write(samples);
    }
    None
}

/// Appends input to the context, up to `max_samples` values.
pub(super) fn recorder(input: &Signal, params: &Params, ctx: &mut NodeContext) -> Option<Signal> {
    let limit = params.usize_or("max_samples", 48_000 * 60);
    let room = limit.saturating_sub(ctx.recorded.len());
    match input {
        Signal::Iq(s) | Signal::Audio(s) | Signal::Spectrum(s) => {
            ctx.recorded.extend(s.iter().take(room));
        }
        Signal::Bits(bits) => {
            ctx.recorded.extend(bits.iter().take(room).map(|&b| f32::from(b)));
        }
        Signal::Scalar(v) => {
            if room > 0 {
                ctx.recorded.push(*v);
            }
        }
    }
    None
}
