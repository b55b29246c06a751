//! Property-based tests for the splicing proxy.
//!
//! Random page behavior must never produce a second engine per context or a
//! source that plays both filtered and unfiltered at once.

use eqsplice_core::{AudioGraph, MemoryGraph, NodeId};
use eqsplice_splice::SplicingGraph;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum PageOp {
    NewSource,
    ConnectToDestination(usize),
    ConnectThroughGain(usize),
    Disconnect(usize),
}

fn page_op() -> impl Strategy<Value = PageOp> {
    prop_oneof![
        Just(PageOp::NewSource),
        (0..8usize).prop_map(PageOp::ConnectToDestination),
        (0..8usize).prop_map(PageOp::ConnectThroughGain),
        (0..8usize).prop_map(PageOp::Disconnect),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn page_graphs_keep_single_filtered_paths(ops in prop::collection::vec(page_op(), 1..40)) {
        let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let ctx = graph.create_context();
        let dest = graph.destination(ctx).unwrap();
        let mut nodes: Vec<NodeId> = Vec::new();

        for op in ops {
            match op {
                PageOp::NewSource => {
                    nodes.push(graph.create_buffer_source(ctx, vec![0.1; 4]).unwrap());
                }
                PageOp::ConnectToDestination(i) if !nodes.is_empty() => {
                    let node = nodes[i % nodes.len()];
                    prop_assert_eq!(graph.connect(node, dest).unwrap(), dest);
                }
                PageOp::ConnectThroughGain(i) if !nodes.is_empty() => {
                    let node = nodes[i % nodes.len()];
                    let gain = graph.create_gain(ctx, 0.8).unwrap();
                    graph.connect(node, gain).unwrap();
                    graph.connect(gain, dest).unwrap();
                    nodes.push(gain);
                }
                PageOp::Disconnect(i) if !nodes.is_empty() => {
                    graph.disconnect(nodes[i % nodes.len()]).unwrap();
                }
                _ => {}
            }

            prop_assert!(graph.registry().created() <= 1);
            if let Some(engine) = graph.engine(ctx) {
                let input = engine.input();
                prop_assert_eq!(graph.inner().outgoing(engine.output()), &[dest]);
                for &node in &nodes {
                    let out = graph.inner().outgoing(node);
                    prop_assert!(
                        !(out.contains(&input) && out.contains(&dest)),
                        "node {} feeds both the equalizer and the destination",
                        node
                    );
                    prop_assert_eq!(out.contains(&input), graph.is_routed(node));
                }
            }
        }
    }

    #[test]
    fn repeated_splices_create_one_engine(repeats in 1..20usize) {
        let mut graph = SplicingGraph::new(MemoryGraph::new(48000.0));
        let el = graph.inner_mut().add_element(vec![0.1; 4]);
        let spliced = (0..repeats)
            .filter(|_| graph.splice_element(el).is_spliced())
            .count();
        prop_assert_eq!(spliced, 1);
        prop_assert_eq!(graph.registry().created(), 1);
    }
}
