use tracing::{debug, debug_span, warn};

use crate::dict::Connector;

use super::lattice::{Lattice, NodeId, UNREACHED};
use super::AnalysisError;

/// Forward pass: minimum cost from BOS to every reachable node.
///
/// One left-to-right sweep over begin positions. Every predecessor of a node
/// starting at `p` ends at `p` and was finalized earlier in the sweep. Among
/// equal-cost predecessors the first one in end-list order wins.
///
/// Returns the best total cost (the forward cost of EOS).
pub(crate) fn forward(lattice: &mut Lattice, conn: &dyn Connector) -> Result<i64, AnalysisError> {
    let char_count = lattice.char_count();
    let _span = debug_span!("forward", char_count).entered();
    let bos = lattice.bos();
    let Lattice {
        nodes,
        begin_nodes,
        end_nodes,
        ..
    } = lattice;

    nodes[bos.index()].forward_cost = 0;

    for pos in 0..=char_count {
        for &id in &begin_nodes[pos] {
            let left_id = nodes[id.index()].left_id;
            let mut best: Option<(i64, NodeId)> = None;
            for &prev in &end_nodes[pos] {
                let p = &nodes[prev.index()];
                if p.forward_cost == UNREACHED {
                    continue;
                }
                let cost = p.forward_cost + conn.cost(p.right_id, left_id) as i64;
                if best.map_or(true, |(b, _)| cost < b) {
                    best = Some((cost, prev));
                }
            }
            if let Some((cost, prev)) = best {
                let node = &mut nodes[id.index()];
                node.forward_cost = cost + node.cost as i64;
                node.best_prev = Some(prev);
            }
        }
    }

    lattice.state.forward = true;
    let eos = lattice
        .eos()
        .ok_or(AnalysisError::DisconnectedLattice {
            position: char_count,
        })?;
    match lattice.node(eos).forward_cost() {
        Some(total) => {
            debug!(best_cost = total);
            Ok(total)
        }
        None => {
            warn!("EOS unreachable after forward pass");
            Err(AnalysisError::DisconnectedLattice {
                position: char_count,
            })
        }
    }
}

/// Backward pass: minimum cost from every node to EOS, inclusive of the
/// node's own emission.
///
/// Mirror of `forward`: a right-to-left sweep over end positions. Successors
/// of a node ending at `p` begin at `p` and end after it (or are EOS), so they
/// are final by the time `p` is visited.
pub(crate) fn backward(lattice: &mut Lattice, conn: &dyn Connector) -> Result<(), AnalysisError> {
    let char_count = lattice.char_count();
    let _span = debug_span!("backward", char_count).entered();
    let eos = lattice
        .eos()
        .ok_or(AnalysisError::DisconnectedLattice {
            position: char_count,
        })?;
    let Lattice {
        nodes,
        begin_nodes,
        end_nodes,
        ..
    } = lattice;

    nodes[eos.index()].backward_cost = 0;

    for pos in (0..=char_count).rev() {
        for &id in &end_nodes[pos] {
            let right_id = nodes[id.index()].right_id;
            let mut best: Option<i64> = None;
            for &next in &begin_nodes[pos] {
                let s = &nodes[next.index()];
                if s.backward_cost == UNREACHED {
                    continue;
                }
                let cost = conn.cost(right_id, s.left_id) as i64 + s.backward_cost;
                if best.map_or(true, |b| cost < b) {
                    best = Some(cost);
                }
            }
            if let Some(cost) = best {
                let node = &mut nodes[id.index()];
                node.backward_cost = cost + node.cost as i64;
            }
        }
    }

    lattice.state.backward = true;
    debug!(bos_backward = ?lattice.node(lattice.bos()).backward_cost());
    Ok(())
}

/// Follow best-predecessor links from EOS back to BOS.
///
/// Returns the non-sentinel nodes of the best path in input order, or `None`
/// when the forward pass has not run or EOS was not reached.
pub fn best_path(lattice: &Lattice) -> Option<Vec<NodeId>> {
    if !lattice.has_forward() {
        return None;
    }
    let eos = lattice.eos()?;
    lattice.node(eos).forward_cost()?;

    let mut path = Vec::new();
    let mut cur = lattice.node(eos).best_prev();
    while let Some(id) = cur {
        let node = lattice.node(id);
        if node.is_sentinel() {
            break;
        }
        path.push(id);
        cur = node.best_prev();
    }
    path.reverse();
    Some(path)
}

/// Node posteriors by forward-backward over `exp(-cost / theta)`.
///
/// `marginals[i]` is the probability that node `i` lies on a segmentation
/// drawn from the lattice's Gibbs distribution. Sentinels get 1.0, nodes that
/// cannot reach both ends get 0.0.
pub(crate) fn marginals(lattice: &mut Lattice, conn: &dyn Connector, theta: f64) {
    let char_count = lattice.char_count();
    let _span = debug_span!("marginals", char_count, theta).entered();
    let Some(eos) = lattice.eos() else {
        return;
    };
    let count = lattice.node_count();
    let scale = 1.0 / theta;
    let mut alpha = vec![f64::NEG_INFINITY; count];
    let mut beta = vec![f64::NEG_INFINITY; count];
    let nodes = &lattice.nodes;

    alpha[lattice.bos().index()] = 0.0;
    for pos in 0..=char_count {
        for &id in &lattice.begin_nodes[pos] {
            let n = &nodes[id.index()];
            let mut acc = f64::NEG_INFINITY;
            for &prev in &lattice.end_nodes[pos] {
                let p = &nodes[prev.index()];
                let edge = -(conn.cost(p.right_id, n.left_id) as f64) * scale;
                acc = log_sum_exp(acc, alpha[prev.index()] + edge);
            }
            alpha[id.index()] = acc - n.cost as f64 * scale;
        }
    }

    beta[eos.index()] = 0.0;
    for pos in (0..=char_count).rev() {
        for &id in &lattice.end_nodes[pos] {
            let n = &nodes[id.index()];
            let mut acc = f64::NEG_INFINITY;
            for &next in &lattice.begin_nodes[pos] {
                let s = &nodes[next.index()];
                let edge = -(conn.cost(n.right_id, s.left_id) as f64) * scale;
                acc = log_sum_exp(acc, beta[next.index()] + edge);
            }
            beta[id.index()] = acc - n.cost as f64 * scale;
        }
    }

    let z = alpha[eos.index()];
    let probs: Vec<f64> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            if alpha[i] == f64::NEG_INFINITY || beta[i] == f64::NEG_INFINITY {
                return 0.0;
            }
            // alpha and beta both include the node's own emission.
            (alpha[i] + beta[i] + n.cost as f64 * scale - z).exp()
        })
        .collect();
    lattice.marginals = probs;
}

fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}
