//! Property-based tests for pipeline ordering and evaluation.

use proptest::prelude::*;
use spectra_graph::{GraphEngine, NodeKind, Params, PipelineDescription, topological_order};

/// Random DAG: node `n` may only be fed by nodes with a smaller index.
fn dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..24).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
            .collect::<Vec<_>>()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn order_places_producers_first(upstream in dag()) {
        let order = topological_order(&upstream).unwrap();
        prop_assert_eq!(order.len(), upstream.len());

        let mut position = vec![usize::MAX; upstream.len()];
        for (pos, &n) in order.iter().enumerate() {
            prop_assert_eq!(position[n], usize::MAX, "node {} emitted twice", n);
            position[n] = pos;
        }
        for (n, feeds) in upstream.iter().enumerate() {
            for &u in feeds {
                prop_assert!(position[u] < position[n]);
            }
        }
    }

    #[test]
    fn closing_edge_makes_a_cycle(len in 2usize..16) {
        let mut upstream: Vec<Vec<usize>> = (0..len)
            .map(|i| if i == 0 { Vec::new() } else { vec![i - 1] })
            .collect();
        upstream[0].push(len - 1);
        prop_assert!(topological_order(&upstream).is_err());
    }

    #[test]
    fn fir_chain_ticks_for_any_length(len in 1usize..8, ticks in 1u64..10) {
        let mut pipeline = PipelineDescription::default()
            .node("src", NodeKind::Tone, Params::new().with("block_size", 32_i64));
        let mut previous = "src".to_string();
        for k in 0..len {
            let id = format!("fir{k}");
            pipeline = pipeline
                .node(&id, NodeKind::Fir, Params::new().with("num_taps", 7_i64))
                .connect(&previous, &id);
            previous = id;
        }

        let mut graph = GraphEngine::software_only();
        graph.load_pipeline(&pipeline).unwrap();
        graph.start();
        prop_assert_eq!(graph.run_ticks(ticks), ticks);
        let out = graph.output(&previous).unwrap();
        prop_assert_eq!(out.len(), 64);
    }
}
