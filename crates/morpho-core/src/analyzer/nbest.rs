use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, debug_span, trace};

use crate::dict::Connector;

use super::lattice::{Lattice, NodeId, NodeKind};

/// A complete BOS→EOS segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Non-sentinel nodes in input order
    pub nodes: Vec<NodeId>,
    /// Sum of emission and connection costs along the path
    pub cost: i64,
}

/// One ranked predecessor edge of a node.
#[derive(Clone, Copy)]
struct Step {
    prev: NodeId,
    /// Connection cost of the edge
    edge: i64,
}

/// A partial path back from EOS, stored as a parent-linked arena entry.
#[derive(Clone, Copy)]
struct Partial {
    node: NodeId,
    /// Entry for the node that follows `node` on the path
    parent: Option<u32>,
    /// Position of `node` in the parent's ranked predecessor list
    rank: u32,
    /// Exact cost of the suffix after `node`, excluding its emission
    realized: i64,
}

#[derive(PartialEq, Eq)]
struct QueueItem {
    key: i64,
    seq: u64,
    partial: u32,
}

// BinaryHeap is a max-heap; smallest key pops first, then the newest entry.
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lazy N-best enumerator over a decoded lattice.
///
/// Runs a best-first search from EOS back toward BOS. Each queue entry is
/// keyed by its realized suffix cost plus the forward cost of its frontier
/// node, which is the exact cost of the cheapest completion, so every
/// complete path pops in non-decreasing cost order.
///
/// Predecessors of a node are ranked once by `forward_cost + edge`, stable
/// in end-list order, so rank 0 is the node's Viterbi `best_prev`. They are
/// consumed one rank at a time: popping an entry pushes its next-ranked
/// sibling and then its own best predecessor. Every partial path is pushed
/// exactly once and no segmentation is produced twice. Equal keys pop
/// newest first, so the search follows the best-predecessor chain before
/// trying a tied sibling and the first path is the Viterbi path.
///
/// Each `next()` performs pops until one complete path is found. Dropping
/// the iterator stops the search.
pub struct NBest<'a> {
    lattice: &'a Lattice,
    conn: &'a dyn Connector,
    heap: BinaryHeap<QueueItem>,
    partials: Vec<Partial>,
    /// Ranked predecessors per node, filled on first expansion
    ranked: Vec<Option<Box<[Step]>>>,
    seq: u64,
    yielded: usize,
}

impl<'a> NBest<'a> {
    /// Start an enumeration. The lattice must have run the forward pass.
    pub(crate) fn new(lattice: &'a Lattice, conn: &'a dyn Connector) -> Self {
        let mut nbest = Self {
            lattice,
            conn,
            heap: BinaryHeap::new(),
            partials: Vec::new(),
            ranked: vec![None; lattice.node_count()],
            seq: 0,
            yielded: 0,
        };
        if let Some(eos) = lattice.eos() {
            if let Some(cost) = lattice.node(eos).forward_cost() {
                nbest.push(
                    Partial {
                        node: eos,
                        parent: None,
                        rank: 0,
                        realized: 0,
                    },
                    cost,
                );
            }
        }
        nbest
    }

    fn push(&mut self, partial: Partial, remaining: i64) {
        let idx = self.partials.len() as u32;
        self.partials.push(partial);
        self.heap.push(QueueItem {
            key: partial.realized + remaining,
            seq: self.seq,
            partial: idx,
        });
        self.seq += 1;
    }

    /// Reached predecessors of `id`, cheapest prefix first (stable on ties).
    fn ranked(&mut self, id: NodeId) -> &[Step] {
        let lattice = self.lattice;
        let conn = self.conn;
        self.ranked[id.index()].get_or_insert_with(|| {
            let node = lattice.node(id);
            let mut steps: Vec<(i64, Step)> = lattice
                .end_nodes(node.begin)
                .iter()
                .filter_map(|&prev| {
                    let p = lattice.node(prev);
                    let forward = p.forward_cost()?;
                    let edge = conn.cost(p.right_id, node.left_id) as i64;
                    Some((forward + edge, Step { prev, edge }))
                })
                .collect();
            steps.sort_by_key(|&(key, _)| key);
            steps.into_iter().map(|(_, step)| step).collect()
        })
    }

    /// Push the entry for rank `rank` of `parent_idx`'s predecessors, if any.
    fn push_predecessor(&mut self, parent_idx: u32, rank: u32) {
        let parent = self.partials[parent_idx as usize];
        let Some(&step) = self.ranked(parent.node).get(rank as usize) else {
            return;
        };
        let parent_node = self.lattice.node(parent.node);
        let realized = parent.realized + parent_node.cost as i64 + step.edge;
        let remaining = self
            .lattice
            .node(step.prev)
            .forward_cost()
            .unwrap_or_default();
        self.push(
            Partial {
                node: step.prev,
                parent: Some(parent_idx),
                rank,
                realized,
            },
            remaining,
        );
    }

    /// Walk parent links from the BOS entry, which visits nodes in input order.
    fn materialize(&self, mut idx: u32) -> Path {
        let cost = self.partials[idx as usize].realized;
        let mut nodes = Vec::new();
        loop {
            let p = self.partials[idx as usize];
            if !self.lattice.node(p.node).is_sentinel() {
                nodes.push(p.node);
            }
            match p.parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
        Path { nodes, cost }
    }
}

impl Iterator for NBest<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        let _span = debug_span!("nbest", rank = self.yielded).entered();
        while let Some(item) = self.heap.pop() {
            let partial = self.partials[item.partial as usize];
            if let Some(parent) = partial.parent {
                self.push_predecessor(parent, partial.rank + 1);
            }
            if self.lattice.node(partial.node).kind == NodeKind::Bos {
                let path = self.materialize(item.partial);
                self.yielded += 1;
                debug!(cost = path.cost, len = path.nodes.len(), queue = self.heap.len());
                return Some(path);
            }
            self.push_predecessor(item.partial, 0);
            trace!(key = item.key, queue = self.heap.len());
        }
        None
    }
}
