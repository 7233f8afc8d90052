use tracing::{debug, debug_span, warn};

use crate::dict::{Dictionary, WordMatch};
use crate::unknown::{UnknownCandidate, UnknownHandler};

use super::lattice::{Lattice, NodeKind, WordRef};
use super::AnalysisError;

/// Scratch buffers reused across positions so a build allocates once.
#[derive(Default)]
struct Scratch {
    matches: Vec<WordMatch>,
    unknowns: Vec<UnknownCandidate>,
}

/// Populate `lattice` with every candidate morpheme of `text`.
///
/// Positions are scanned left to right; a position where no node ends is
/// unreachable and skipped. At a reachable position the dictionary is
/// searched with `common_prefix_search`, and the unknown-word fallback runs
/// when there is no match, when the char's category asks for it, or when the
/// longest match is shorter than `greedy_threshold` (0 disables that rule).
pub(crate) fn build_lattice(
    lattice: &mut Lattice,
    dict: &dyn Dictionary,
    unknown: &dyn UnknownHandler,
    text: &str,
    greedy_threshold: usize,
) -> Result<(), AnalysisError> {
    lattice.reset(text);
    let char_count = lattice.char_count();
    let _span = debug_span!("build_lattice", char_count).entered();
    let mut scratch = Scratch::default();

    for begin in 0..char_count {
        if lattice.end_nodes(begin).is_empty() {
            continue;
        }

        scratch.matches.clear();
        dict.common_prefix_search(lattice.suffix(begin), &mut scratch.matches);
        let mut longest = 0;
        for m in &scratch.matches {
            if m.len == 0 || begin + m.len > char_count {
                continue;
            }
            longest = longest.max(m.len);
            let e = m.entry;
            lattice.insert(
                begin,
                m.len,
                WordRef::Known(e.word_id),
                NodeKind::Normal,
                (e.left_id, e.right_id, e.cost),
            );
        }

        let invoke = longest == 0
            || unknown.should_invoke(lattice.chars()[begin])
            || longest < greedy_threshold;
        if invoke {
            scratch.unknowns.clear();
            unknown.synthesize(lattice.chars(), begin, &mut scratch.unknowns);
            for c in &scratch.unknowns {
                if c.len == 0 || begin + c.len > char_count {
                    continue;
                }
                let word = WordRef::Unknown(c.word_id);
                let duplicate = lattice.begin_nodes(begin).iter().any(|&id| {
                    let n = lattice.node(id);
                    n.len == c.len && n.word == word
                });
                if duplicate {
                    continue;
                }
                lattice.insert(
                    begin,
                    c.len,
                    word,
                    NodeKind::Unknown,
                    (c.left_id, c.right_id, c.cost),
                );
            }
        }

        if lattice.begin_nodes(begin).is_empty() {
            warn!(position = begin, "no candidate at reachable position");
            return Err(AnalysisError::DisconnectedLattice { position: begin });
        }
    }

    if lattice.end_nodes(char_count).is_empty() {
        warn!(position = char_count, "end of input unreachable");
        return Err(AnalysisError::DisconnectedLattice {
            position: char_count,
        });
    }
    lattice.place_eos();

    debug!(node_count = lattice.node_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::analyzer::testutil::{test_dict, NoFallback};
    use crate::unknown::CategoryFallback;

    fn build(text: &str) -> Lattice {
        let dict = test_dict();
        let unknown = CategoryFallback::default();
        let mut lattice = Lattice::new();
        build_lattice(&mut lattice, &dict, &unknown, text, 0).unwrap();
        lattice
    }

    fn surfaces_at(lattice: &Lattice, pos: usize) -> Vec<&str> {
        lattice
            .begin_nodes(pos)
            .iter()
            .map(|&id| lattice.surface(id))
            .collect()
    }

    #[test]
    fn test_build_lattice_basic() {
        let lattice = build("すもももももも");
        assert_eq!(lattice.char_count(), 7);
        assert_eq!(surfaces_at(&lattice, 0), vec!["すもも"]);
        // "も" has two entries, "もも" one
        assert_eq!(surfaces_at(&lattice, 3), vec!["も", "も", "もも"]);
        assert!(lattice.is_built());
    }

    #[test]
    fn test_sentinels() {
        let lattice = build("すもも");
        assert_eq!(lattice.end_nodes(0), &[lattice.bos()]);
        let eos = lattice.eos().unwrap();
        assert_eq!(lattice.begin_nodes(3), &[eos]);
        assert_eq!(lattice.node(eos).kind, NodeKind::Eos);
    }

    #[test]
    fn test_unknown_word_fallback() {
        let lattice = build("ぬ");
        let nodes: Vec<_> = lattice.begin_nodes(0).to_vec();
        assert_eq!(nodes.len(), 1);
        let node = lattice.node(nodes[0]);
        assert_eq!(node.kind, NodeKind::Unknown);
        assert_eq!(node.len, 1);
        assert_eq!(lattice.surface(nodes[0]), "ぬ");
    }

    #[test]
    fn test_invoke_category_adds_unknown_alongside_matches() {
        // "カキ" is in the dictionary, but KATAKANA always invokes the fallback.
        let lattice = build("カキ");
        let kinds: Vec<NodeKind> = lattice
            .begin_nodes(0)
            .iter()
            .map(|&id| lattice.node(id).kind)
            .collect();
        assert_eq!(kinds[0], NodeKind::Normal);
        assert!(kinds[1..].iter().all(|&k| k == NodeKind::Unknown));
        assert!(kinds.len() >= 2);
    }

    #[test]
    fn test_greedy_threshold_invokes_fallback() {
        let dict = test_dict();
        let unknown = CategoryFallback::default();
        let mut lattice = Lattice::new();

        build_lattice(&mut lattice, &dict, &unknown, "もな", 0).unwrap();
        let without = lattice.begin_nodes(0).len();

        build_lattice(&mut lattice, &dict, &unknown, "もな", 2).unwrap();
        let with = lattice.begin_nodes(0).len();
        assert!(with > without);
        assert!(lattice
            .begin_nodes(0)
            .iter()
            .any(|&id| lattice.node(id).kind == NodeKind::Unknown));
    }

    #[test]
    fn test_unreachable_positions_skipped() {
        // The ALPHA group covers "abc" in one node, so positions 1 and 2 are
        // never reached and get no nodes of their own.
        let lattice = build("abc");
        assert!(lattice.begin_nodes(1).is_empty());
        assert!(lattice.begin_nodes(2).is_empty());
        assert_eq!(surfaces_at(&lattice, 0), vec!["abc"]);
    }

    #[test]
    fn test_lattice_connectivity() {
        let lattice = build("すもももももものうち");
        for pos in 1..=lattice.char_count() {
            let reachable = !lattice.end_nodes(pos).is_empty();
            if pos < lattice.char_count() && reachable {
                assert!(!lattice.begin_nodes(pos).is_empty(), "dead end at {pos}");
            }
        }
        assert!(!lattice.end_nodes(lattice.char_count()).is_empty());
    }

    #[test]
    fn test_nodes_by_begin_end_consistency() {
        let lattice = build("すもももももものうち");
        for (id, node) in lattice.nodes() {
            if node.kind != NodeKind::Bos {
                assert!(lattice.begin_nodes(node.begin).contains(&id));
            }
            if node.kind != NodeKind::Eos {
                assert!(lattice.end_nodes(node.end()).contains(&id));
            }
        }
        for pos in 0..=lattice.char_count() {
            for &id in lattice.begin_nodes(pos) {
                assert_eq!(lattice.node(id).begin, pos);
            }
            for &id in lattice.end_nodes(pos) {
                assert_eq!(lattice.node(id).end(), pos);
            }
        }
    }

    #[test]
    fn test_no_duplicate_nodes() {
        let lattice = build("カタカナとカキ");
        let mut seen = HashSet::new();
        for (_, node) in lattice.nodes() {
            assert!(
                seen.insert((node.begin, node.len, node.word, node.kind)),
                "duplicate node at {}",
                node.begin
            );
        }
    }

    #[test]
    fn test_disconnected_without_fallback() {
        let dict = test_dict();
        let mut lattice = Lattice::new();
        let err = build_lattice(&mut lattice, &dict, &NoFallback, "ももぬ", 0).unwrap_err();
        assert_eq!(err, AnalysisError::DisconnectedLattice { position: 2 });
    }
}
