/// Context-transition cost service.
///
/// `cost(right_id, left_id)` scores a morpheme whose right context is
/// `right_id` followed by one whose left context is `left_id`. Context id 0
/// is the sentence boundary (BOS/EOS) class.
pub trait Connector: Send + Sync {
    fn cost(&self, right_id: u16, left_id: u16) -> i32;

    /// Number of context ids covered by the table.
    fn num_ids(&self) -> u16;
}

/// A square connection cost matrix mapping (right_id, left_id) → cost.
#[derive(Debug, Clone)]
pub struct ConnectionMatrix {
    pub(super) num_ids: u16,
    pub(super) costs: Vec<i16>,
}

impl ConnectionMatrix {
    /// Create a matrix from row-major costs (`right_id * num_ids + left_id`).
    ///
    /// Returns `None` when `costs` does not have exactly `num_ids²` cells.
    pub fn new(num_ids: u16, costs: Vec<i16>) -> Option<Self> {
        let n = num_ids as usize;
        (costs.len() == n * n).then_some(Self { num_ids, costs })
    }

    /// A matrix of `num_ids²` cells all holding `cost`.
    pub fn filled(num_ids: u16, cost: i16) -> Self {
        let n = num_ids as usize;
        Self {
            num_ids,
            costs: vec![cost; n * n],
        }
    }

    /// Overwrite a single cell. Out-of-range ids are ignored.
    pub fn set(&mut self, right_id: u16, left_id: u16, cost: i16) {
        if let Some(idx) = self.index(right_id, left_id) {
            self.costs[idx] = cost;
        }
    }

    /// Look up the connection cost. Out-of-range ids read as 0; `Analyzer`
    /// warns when a lattice contains such ids.
    pub fn get(&self, right_id: u16, left_id: u16) -> i16 {
        self.index(right_id, left_id)
            .and_then(|idx| self.costs.get(idx).copied())
            .unwrap_or(0)
    }

    fn index(&self, right_id: u16, left_id: u16) -> Option<usize> {
        if right_id >= self.num_ids || left_id >= self.num_ids {
            return None;
        }
        Some(right_id as usize * self.num_ids as usize + left_id as usize)
    }
}

impl Connector for ConnectionMatrix {
    fn cost(&self, right_id: u16, left_id: u16) -> i32 {
        self.get(right_id, left_id) as i32
    }

    fn num_ids(&self) -> u16 {
        self.num_ids
    }
}
