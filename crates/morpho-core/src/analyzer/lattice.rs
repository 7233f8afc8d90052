use serde::Serialize;

/// Index of a node in a `Lattice` arena. Valid until the lattice is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Bos,
    Eos,
    Normal,
    Unknown,
}

/// Opaque handle to a node's feature data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordRef {
    /// BOS/EOS
    Sentinel,
    /// Word id in the dictionary
    Known(u32),
    /// Word id in the unknown-word fallback
    Unknown(u32),
}

/// Forward/backward cost of a node not reached by the corresponding pass.
pub const UNREACHED: i64 = i64::MAX;

/// A candidate morpheme occurrence in the lattice.
#[derive(Debug, Clone)]
pub struct Node {
    /// Start position (char index, inclusive)
    pub begin: usize,
    /// Span length in chars
    pub len: usize,
    pub word: WordRef,
    pub left_id: u16,
    pub right_id: u16,
    /// Emission cost (lower = more preferred)
    pub cost: i16,
    pub kind: NodeKind,
    /// Minimum cost from BOS to this node, inclusive
    pub(crate) forward_cost: i64,
    /// Minimum cost from this node to EOS, inclusive of its own emission
    pub(crate) backward_cost: i64,
    pub(crate) best_prev: Option<NodeId>,
}

impl Node {
    fn new(begin: usize, len: usize, word: WordRef, kind: NodeKind) -> Self {
        Self {
            begin,
            len,
            word,
            left_id: 0,
            right_id: 0,
            cost: 0,
            kind,
            forward_cost: UNREACHED,
            backward_cost: UNREACHED,
            best_prev: None,
        }
    }

    /// End position (char index, exclusive)
    pub fn end(&self) -> usize {
        self.begin + self.len
    }

    pub fn forward_cost(&self) -> Option<i64> {
        (self.forward_cost != UNREACHED).then_some(self.forward_cost)
    }

    pub fn backward_cost(&self) -> Option<i64> {
        (self.backward_cost != UNREACHED).then_some(self.backward_cost)
    }

    pub fn best_prev(&self) -> Option<NodeId> {
        self.best_prev
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.kind, NodeKind::Bos | NodeKind::Eos)
    }
}

/// How far a lattice has been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DecodeState {
    pub built: bool,
    pub forward: bool,
    pub backward: bool,
}

/// The lattice: all candidate morphemes for one input, plus decoding state.
///
/// A lattice is reusable: `reset` drops the previous analysis but keeps the
/// allocated buffers, so a caller analysing many strings can hold one
/// lattice and pass it to every call.
#[derive(Debug, Default)]
pub struct Lattice {
    text: String,
    /// byte_offsets[i] = byte offset of char i; last entry is `text.len()`
    byte_offsets: Vec<usize>,
    chars: Vec<char>,
    pub(crate) nodes: Vec<Node>,
    /// begin_nodes[i] = nodes that start at position i
    pub(crate) begin_nodes: Vec<Vec<NodeId>>,
    /// end_nodes[i] = nodes that end at position i
    pub(crate) end_nodes: Vec<Vec<NodeId>>,
    pub(crate) marginals: Vec<f64>,
    pub(crate) state: DecodeState,
}

impl Lattice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the previous analysis and prepare for `text`, placing BOS.
    pub(crate) fn reset(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        self.chars.clear();
        self.byte_offsets.clear();
        for (i, c) in text.char_indices() {
            self.byte_offsets.push(i);
            self.chars.push(c);
        }
        self.byte_offsets.push(text.len());

        let slots = self.chars.len() + 1;
        self.nodes.clear();
        self.marginals.clear();
        for list in self.begin_nodes.iter_mut().chain(self.end_nodes.iter_mut()) {
            list.clear();
        }
        self.begin_nodes.resize_with(slots, Vec::new);
        self.begin_nodes.truncate(slots);
        self.end_nodes.resize_with(slots, Vec::new);
        self.end_nodes.truncate(slots);
        self.state = DecodeState::default();

        let bos = self.push_node(Node::new(0, 0, WordRef::Sentinel, NodeKind::Bos));
        self.end_nodes[0].push(bos);
    }

    /// Place EOS as the sole begin-list entry at the last position.
    pub(crate) fn place_eos(&mut self) {
        let n = self.char_count();
        let eos = self.push_node(Node::new(n, 0, WordRef::Sentinel, NodeKind::Eos));
        self.begin_nodes[n].push(eos);
        self.state.built = true;
    }

    /// Add a non-sentinel node to the arena and both position lists.
    pub(crate) fn insert(
        &mut self,
        begin: usize,
        len: usize,
        word: WordRef,
        kind: NodeKind,
        (left_id, right_id, cost): (u16, u16, i16),
    ) -> NodeId {
        let mut node = Node::new(begin, len, word, kind);
        node.left_id = left_id;
        node.right_id = right_id;
        node.cost = cost;
        let id = self.push_node(node);
        self.begin_nodes[begin].push(id);
        self.end_nodes[begin + len].push(id);
        id
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The analysed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of chars in the input (N).
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Suffix of the input starting at char position `pos`.
    pub fn suffix(&self, pos: usize) -> &str {
        &self.text[self.byte_offsets[pos]..]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes starting at `pos`, in insertion order.
    pub fn begin_nodes(&self, pos: usize) -> &[NodeId] {
        &self.begin_nodes[pos]
    }

    /// Nodes ending at `pos`, in insertion order.
    pub fn end_nodes(&self, pos: usize) -> &[NodeId] {
        &self.end_nodes[pos]
    }

    /// Surface text covered by a node.
    pub fn surface(&self, id: NodeId) -> &str {
        let node = self.node(id);
        &self.text[self.byte_offsets[node.begin]..self.byte_offsets[node.end()]]
    }

    pub fn bos(&self) -> NodeId {
        NodeId(0)
    }

    /// EOS is the single node starting at the last position.
    pub fn eos(&self) -> Option<NodeId> {
        self.begin_nodes
            .last()
            .and_then(|list| list.iter().copied().find(|&id| self.node(id).kind == NodeKind::Eos))
    }

    pub fn is_built(&self) -> bool {
        self.state.built
    }

    pub fn has_forward(&self) -> bool {
        self.state.forward
    }

    pub fn has_backward(&self) -> bool {
        self.state.backward
    }

    /// Total cost of the best segmentation, once the forward pass has run.
    pub fn best_cost(&self) -> Option<i64> {
        if !self.state.forward {
            return None;
        }
        self.eos().and_then(|eos| self.node(eos).forward_cost())
    }

    /// Number of non-sentinel nodes whose left or right context id is not
    /// below `num_ids`.
    pub fn out_of_range_ids(&self, num_ids: u16) -> usize {
        self.nodes
            .iter()
            .filter(|n| !n.is_sentinel() && (n.left_id >= num_ids || n.right_id >= num_ids))
            .count()
    }

    /// Posterior probability of a node, when marginals were computed.
    pub fn marginal(&self, id: NodeId) -> Option<f64> {
        self.marginals.get(id.index()).copied()
    }
}
