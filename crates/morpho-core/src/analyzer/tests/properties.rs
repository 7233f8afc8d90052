//! Property-based tests for lattice decoding.
//!
//! Random short inputs over the fixture vocabulary are decoded and checked
//! against a brute-force enumeration of every BOS→EOS path.

use proptest::prelude::*;

use super::sumomo_analyzer;
use crate::analyzer::{AnalyzeOptions, Lattice, NodeId, NodeKind};
use crate::dict::Connector;

// ---------------------------------------------------------------------------
// Strategy: short strings mixing dictionary and fallback characters
// ---------------------------------------------------------------------------

fn arb_text() -> impl Strategy<Value = String> {
    let ch = prop_oneof![
        6 => prop::sample::select(vec!['す', 'も', 'の', 'う', 'ち']),
        2 => prop::sample::select(vec!['カ', 'キ']),
        1 => prop::sample::select(vec!['a', '1', ' ', '漢', 'ぬ', '、']),
    ];
    prop::collection::vec(ch, 1..8).prop_map(|cs| cs.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Brute force: every complete path as (node sequence, cost)
// ---------------------------------------------------------------------------

fn enumerate_paths(lattice: &Lattice, conn: &dyn Connector) -> Vec<(Vec<NodeId>, i64)> {
    fn walk(
        lattice: &Lattice,
        conn: &dyn Connector,
        id: NodeId,
        cost: i64,
        stack: &mut Vec<NodeId>,
        out: &mut Vec<(Vec<NodeId>, i64)>,
    ) {
        let node = lattice.node(id);
        for &next in lattice.begin_nodes(node.end()) {
            let s = lattice.node(next);
            let step = cost + conn.cost(node.right_id, s.left_id) as i64 + s.cost as i64;
            if s.kind == NodeKind::Eos {
                out.push((stack.clone(), step));
                continue;
            }
            stack.push(next);
            walk(lattice, conn, next, step, stack, out);
            stack.pop();
        }
    }

    let mut out = Vec::new();
    walk(lattice, conn, lattice.bos(), 0, &mut Vec::new(), &mut out);
    out
}

fn decode(text: &str) -> (crate::analyzer::Analyzer, Lattice) {
    let analyzer = sumomo_analyzer();
    let mut lattice = Lattice::new();
    let options = AnalyzeOptions {
        nbest: true,
        ..Default::default()
    };
    analyzer.analyze(&mut lattice, text, options).unwrap();
    (analyzer, lattice)
}

// ---------------------------------------------------------------------------
// proptest entry point
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn best_path_covers_input(text in arb_text()) {
        let analyzer = sumomo_analyzer();
        let morphemes = analyzer.parse(&text).unwrap();
        let mut pos = 0;
        for m in &morphemes {
            prop_assert_eq!(m.begin, pos);
            prop_assert!(m.len > 0);
            pos += m.len;
        }
        prop_assert_eq!(pos, text.chars().count());
        let joined: String = morphemes.iter().map(|m| m.surface.as_str()).collect();
        prop_assert_eq!(joined, text);
    }

    #[test]
    fn forward_cost_is_brute_force_minimum(text in arb_text()) {
        let (analyzer, lattice) = decode(&text);
        let paths = enumerate_paths(&lattice, analyzer.connector());
        let min = paths.iter().map(|(_, c)| *c).min().unwrap();
        prop_assert_eq!(lattice.best_cost(), Some(min));
        let bos = lattice.node(lattice.bos());
        prop_assert_eq!(bos.backward_cost(), Some(min));
    }

    #[test]
    fn nbest_enumerates_every_path_in_order(text in arb_text()) {
        let (analyzer, lattice) = decode(&text);
        let mut expected = enumerate_paths(&lattice, analyzer.connector());
        prop_assume!(expected.len() <= 2000);

        let got: Vec<_> = analyzer.nbest(&lattice).unwrap().collect();
        for pair in got.windows(2) {
            prop_assert!(pair[0].cost <= pair[1].cost);
        }
        prop_assert_eq!(got.first().map(|p| p.cost), lattice.best_cost());

        let mut got: Vec<(Vec<NodeId>, i64)> =
            got.into_iter().map(|p| (p.nodes, p.cost)).collect();
        got.sort();
        expected.sort();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn decoding_is_deterministic(text in arb_text()) {
        let (analyzer, lattice) = decode(&text);
        let (_, again) = decode(&text);
        let first: Vec<_> = analyzer.nbest(&lattice).unwrap().take(10).collect();
        let second: Vec<_> = analyzer.nbest(&again).unwrap().take(10).collect();
        prop_assert_eq!(first, second);
        prop_assert_eq!(
            crate::analyzer::best_path(&lattice),
            crate::analyzer::best_path(&again)
        );
    }
}
