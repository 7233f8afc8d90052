use serde::Serialize;

use super::lattice::{Lattice, NodeId, NodeKind};
use super::viterbi::best_path;
use super::AnalysisError;

/// One analysed morpheme, detached from the lattice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Morpheme {
    pub surface: String,
    pub feature: String,
    /// Start position in chars
    pub begin: usize,
    /// Length in chars
    pub len: usize,
    pub kind: NodeKind,
    pub left_id: u16,
    pub right_id: u16,
    /// Emission cost of the word itself
    pub word_cost: i16,
    /// Cost from BOS up to and including this morpheme, along the path it
    /// was reported on
    pub total_cost: i64,
    /// Posterior probability, present when marginals were computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
}

/// A ranked segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    pub cost: i64,
    pub morphemes: Vec<Morpheme>,
}

/// A lattice node annotated for all-morphs output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatticeMorph {
    pub id: NodeId,
    /// Cost of the cheapest complete path through this node
    pub best_cost_through: i64,
    pub on_best_path: bool,
}

/// `LatticeMorph` with its feature data resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphCandidate {
    #[serde(flatten)]
    pub morpheme: Morpheme,
    pub best_cost_through: i64,
    pub on_best_path: bool,
}

impl Lattice {
    /// Every non-sentinel node that lies on some BOS→EOS path, in arena
    /// order (begin position, then insertion).
    ///
    /// Needs both decoding passes.
    pub fn all_morphs(&self) -> Result<Vec<LatticeMorph>, AnalysisError> {
        if !self.has_forward() || !self.has_backward() {
            return Err(AnalysisError::NotDecoded);
        }
        let best = best_path(self).unwrap_or_default();
        let mut out: Vec<LatticeMorph> = self
            .nodes()
            .filter(|(_, n)| !n.is_sentinel())
            .filter_map(|(id, n)| {
                let through = n.forward_cost()? + n.backward_cost()? - n.cost as i64;
                Some(LatticeMorph {
                    id,
                    best_cost_through: through,
                    on_best_path: best.contains(&id),
                })
            })
            .collect();
        out.sort_by_key(|m| (self.node(m.id).begin, m.id));
        Ok(out)
    }
}
