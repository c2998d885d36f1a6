//! End-to-end pipeline loading and evaluation.

use std::cell::Cell;
use std::rc::Rc;

use spectra_graph::{
    ConnectionDescription, GraphEngine, GraphError, NodeKind, Params, PipelineDescription,
    PortType, SharedAudioBuffer, SharedSurface, Signal,
};

fn engine_with(pipeline: &PipelineDescription) -> GraphEngine {
    let mut graph = GraphEngine::software_only();
    graph.load_pipeline(pipeline).expect("pipeline should load");
    graph
}

fn position(order: &[&str], id: &str) -> usize {
    order.iter().position(|n| *n == id).expect("node in order")
}

#[test]
fn chain_evaluates_in_dependency_order() {
    // Declared out of order on purpose; D is unconnected.
    let pipeline = PipelineDescription::default()
        .node("C", NodeKind::AudioOut, Params::new())
        .node("D", NodeKind::Tone, Params::new())
        .node("B", NodeKind::FmDemod, Params::new())
        .node("A", NodeKind::Tone, Params::new())
        .connect("A", "B")
        .connect("B", "C");
    let graph = engine_with(&pipeline);

    let order = graph.evaluation_order();
    assert_eq!(order.len(), 4);
    assert!(position(&order, "A") < position(&order, "B"));
    assert!(position(&order, "B") < position(&order, "C"));
    assert!(order.contains(&"D"));
}

#[test]
fn tone_to_fm_demod_to_audio_delivers_every_tick() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new().with("frequency", 1000_i64))
        .node("fm", NodeKind::FmDemod, Params::new())
        .node("speaker", NodeKind::AudioOut, Params::new())
        .connect("osc", "fm")
        .connect("fm", "speaker");
    let mut graph = engine_with(&pipeline);
    let audio = SharedAudioBuffer::new();
    graph.attach_audio_output("speaker", audio.clone()).unwrap();

    graph.start();
    assert_eq!(graph.run_ticks(100), 100);
    assert_eq!(graph.tick_count(), 100);
    assert_eq!(audio.writes(), 100);

    let samples = audio.samples();
    assert!(!samples.is_empty());
    // A steady 1 kHz tone demodulates to a constant 2 pi 1000 / 48000.
    let expected = std::f32::consts::TAU * 1000.0 / 48_000.0;
    let tail = &samples[samples.len() - 100..];
    assert!(tail.iter().all(|s| (s - expected).abs() < 1e-3), "got {:?}", &tail[..4]);

    graph.stop();
    assert!(audio.is_finished());
}

#[test]
fn cycles_are_rejected() {
    let pipeline = PipelineDescription::default()
        .node("a", NodeKind::Fir, Params::new())
        .node("b", NodeKind::Fir, Params::new())
        .connect("a", "b")
        .connect("b", "a");
    let mut graph = GraphEngine::software_only();
    let err = graph.load_pipeline(&pipeline).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected(_)));
    assert_eq!(graph.node_count(), 0);
}

#[test]
fn fan_in_requires_a_combiner() {
    let fed = |kind: NodeKind| {
        PipelineDescription::default()
            .node("x", NodeKind::Tone, Params::new())
            .node("y", NodeKind::Tone, Params::new())
            .node("sum", kind, Params::new())
            .connect("x", "sum")
            .connect("y", "sum")
    };

    let mut graph = GraphEngine::software_only();
    assert_eq!(
        graph.load_pipeline(&fed(NodeKind::Fir)).unwrap_err(),
        GraphError::FanIn {
            node: "sum".to_string(),
            count: 2
        }
    );

    graph.load_pipeline(&fed(NodeKind::Combiner)).unwrap();
    graph.start();
    graph.tick().unwrap();
    let Some(Signal::Iq(sum)) = graph.output("sum") else {
        panic!("combiner should emit IQ");
    };
    // Two identical unit tones add to amplitude 2.
    assert!((sum[0] - 2.0).abs() < 1e-6);
}

#[test]
fn unknown_kind_produces_nothing_without_halting() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("mystery", NodeKind::from("warp_drive"), Params::new())
        .node("meter", NodeKind::LevelMeter, Params::new())
        .connect("osc", "mystery")
        .connect("mystery", "meter");
    let mut graph = engine_with(&pipeline);

    graph.start();
    let report = graph.tick().unwrap();
    assert_eq!(report.executed, 3);
    assert_eq!(report.produced, 1);
    assert!(graph.output("osc").is_some());
    assert!(graph.output("mystery").is_none());
    assert!(graph.output("meter").is_none());
    assert!(graph.tick().is_some());
}

#[test]
fn dangling_connections_are_dropped() {
    let mut pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("meter", NodeKind::LevelMeter, Params::new())
        .connect("osc", "meter")
        .connect("osc", "nowhere");
    pipeline.connections.push(ConnectionDescription {
        source_port: "sideband".to_string(),
        ..ConnectionDescription::new("osc", "meter")
    });

    let mut graph = engine_with(&pipeline);
    assert_eq!(graph.connection_count(), 1);
    graph.start();
    graph.tick();
    assert!(matches!(graph.output("meter"), Some(Signal::Scalar(_))));
}

#[test]
fn incompatible_ports_are_rejected() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("fm", NodeKind::FmDemod, Params::new())
        .node("fft", NodeKind::Spectrum, Params::new())
        .connect("osc", "fm")
        .connect("fm", "fft");
    let err = GraphEngine::software_only()
        .load_pipeline(&pipeline)
        .unwrap_err();
    let (source_type, target_type, target_node) = match err {
        GraphError::PortTypeMismatch {
            source_type,
            target_type,
            target_node,
            ..
        } => (source_type, target_type, target_node),
        other => panic!("expected a port mismatch, got {other}"),
    };
    assert_eq!(source_type, PortType::Audio);
    assert_eq!(target_type, PortType::Iq);
    assert_eq!(target_node, "fft");
}

#[test]
fn duplicate_ids_are_rejected() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("osc", NodeKind::Tone, Params::new());
    assert_eq!(
        GraphEngine::software_only()
            .load_pipeline(&pipeline)
            .unwrap_err(),
        GraphError::DuplicateNode("osc".to_string())
    );
}

#[test]
fn stop_runs_cleanup_once() {
    let pipeline = PipelineDescription::default().node("osc", NodeKind::Tone, Params::new());
    let mut graph = engine_with(&pipeline);
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    graph
        .on_cleanup("osc", move || seen.set(seen.get() + 1))
        .unwrap();

    graph.start();
    graph.run_ticks(3);
    graph.stop();
    graph.stop();
    assert_eq!(count.get(), 1);
    assert!(!graph.is_running());
    assert!(graph.tick().is_none());
}

#[test]
fn reload_stops_the_running_pipeline() {
    let pipeline = PipelineDescription::default().node("osc", NodeKind::Tone, Params::new());
    let mut graph = engine_with(&pipeline);
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    graph
        .on_cleanup("osc", move || seen.set(seen.get() + 1))
        .unwrap();

    graph.start();
    graph.tick();
    graph.load_pipeline(&pipeline).unwrap();
    assert!(!graph.is_running());
    assert_eq!(count.get(), 1);
    assert_eq!(graph.tick_count(), 0);
}

#[test]
fn spectrum_display_draws_tone_peak() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new().with("frequency", 1000_i64))
        .node("fft", NodeKind::Spectrum, Params::new().with("fft_size", 1024_i64))
        .node("waterfall", NodeKind::SpectrumDisplay, Params::new())
        .connect("osc", "fft")
        .connect("fft", "waterfall");
    let mut graph = engine_with(&pipeline);
    let surface = SharedSurface::new();
    graph
        .attach_render_surface("waterfall", surface.clone())
        .unwrap();

    graph.start();
    graph.run_ticks(4);
    assert_eq!(surface.row_count(), 4);
    assert_eq!(surface.presents(), 4);

    let latest = surface.latest().unwrap();
    assert_eq!(latest.len(), 1024);
    let peak = latest
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    // 1 kHz at 48 kHz over 1024 bins is bin 21.3, shifted by 512.
    assert!((531..=535).contains(&peak), "peak at {peak}");

    let ring = graph.context("waterfall").unwrap().ring().unwrap();
    assert_eq!(ring.width(), 1024);
    assert!(ring.is_empty());
}

#[test]
fn recorder_keeps_upstream_audio() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new().with("block_size", 16_i64))
        .node("am", NodeKind::AmDemod, Params::new())
        .node("tape", NodeKind::Recorder, Params::new())
        .connect("osc", "am")
        .connect("am", "tape");
    let mut graph = engine_with(&pipeline);

    graph.start();
    graph.run_ticks(2);
    let recorded = graph.recorded("tape").unwrap();
    assert_eq!(recorded.len(), 32);
    assert!(graph.recorded("missing").is_none());
}

#[test]
fn out_of_range_params_load_but_produce_nothing() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new().with("block_size", i64::MAX))
        .node("huge", NodeKind::Spectrum, Params::new().with("fft_size", 1_i64 << 40))
        .node("wide", NodeKind::Tone, Params::new())
        .node("fft", NodeKind::Spectrum, Params::new().with("fft_size", 256_i64))
        .node("waterfall", NodeKind::SpectrumDisplay, Params::new().with("capacity", i64::MAX))
        .connect("osc", "huge")
        .connect("wide", "fft")
        .connect("fft", "waterfall");
    let mut graph = engine_with(&pipeline);
    let surface = SharedSurface::new();
    graph
        .attach_render_surface("waterfall", surface.clone())
        .unwrap();

    graph.start();
    assert_eq!(graph.run_ticks(3), 3);
    assert!(graph.output("osc").is_none());
    assert!(graph.output("huge").is_none());
    assert_eq!(surface.row_count(), 3);

    let mut graph = engine_with(
        &PipelineDescription::default()
            .node("osc", NodeKind::Tone, Params::new())
            .node("huge", NodeKind::Spectrum, Params::new().with("fft_size", 1_i64 << 40))
            .connect("osc", "huge"),
    );
    graph.start();
    graph.tick();
    assert!(graph.output("osc").is_some());
    assert!(graph.output("huge").is_none());
}

#[test]
fn outputs_travel_on_their_port_type() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("fft", NodeKind::Spectrum, Params::new().with("fft_size", 256_i64))
        .node("meter", NodeKind::LevelMeter, Params::new())
        .connect("osc", "fft")
        .connect("fft", "meter");
    let mut graph = engine_with(&pipeline);

    graph.start();
    graph.tick();
    assert_eq!(graph.output("osc").map(Signal::port_type), Some(PortType::Iq));
    assert_eq!(graph.output("fft").map(Signal::port_type), Some(PortType::Spectrum));
    assert_eq!(graph.output("meter").map(Signal::port_type), Some(PortType::Scalar));
}

#[test]
fn engine_stats_reset_between_runs() {
    let pipeline = PipelineDescription::default()
        .node("osc", NodeKind::Tone, Params::new())
        .node("fft", NodeKind::Spectrum, Params::new().with("fft_size", 256_i64))
        .connect("osc", "fft");
    let mut graph = engine_with(&pipeline);

    graph.start();
    graph.run_ticks(3);
    assert_eq!(graph.engine().stats().fft_calls(), 3);

    graph.engine_mut().reset_stats();
    assert_eq!(graph.engine().stats().fft_calls(), 0);
    graph.run_ticks(2);
    assert_eq!(graph.engine().stats().fft_calls(), 2);
}
