//! Morphological analysis via lattice construction and Viterbi search.
//!
//! Builds a char-level lattice from dictionary lookups and the unknown-word
//! fallback, finds the cheapest segmentation with a forward pass, and
//! optionally runs a backward pass for N-best enumeration, all-morphs
//! output and node marginals.

mod builder;
pub mod lattice;
mod morpheme;
pub mod nbest;
#[cfg(test)]
pub(crate) mod testutil;
mod viterbi;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::dict::{Connector, Dictionary};
use crate::settings::settings;
use crate::unknown::{CategoryFallback, UnknownHandler};

pub use lattice::{Lattice, Node, NodeId, NodeKind, WordRef};
pub use morpheme::{LatticeMorph, MorphCandidate, Morpheme, Segmentation};
pub use nbest::{NBest, Path};
pub use viterbi::best_path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("input text is empty")]
    InvalidInput,

    #[error("lattice disconnected at char position {position}")]
    DisconnectedLattice { position: usize },

    #[error("lattice was not decoded for this request")]
    NotDecoded,
}

/// Which optional passes `Analyzer::analyze` runs after the forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Run the backward pass so `Analyzer::nbest` can be used
    pub nbest: bool,
    /// Run the backward pass so `Lattice::all_morphs` can be used
    pub all_morphs: bool,
    /// Compute node marginals (`Morpheme::prob`)
    pub marginal: bool,
}

impl AnalyzeOptions {
    fn needs_backward(&self) -> bool {
        self.nbest || self.all_morphs
    }
}

/// Lattice analyzer over shared, read-only services.
///
/// An `Analyzer` holds no per-call state and can be shared across threads.
/// Each call borrows a caller-owned `Lattice`, which is reset and reused.
pub struct Analyzer {
    dict: Arc<dyn Dictionary>,
    conn: Arc<dyn Connector>,
    unknown: Arc<dyn UnknownHandler>,
    greedy_threshold: usize,
    theta: f64,
}

impl Analyzer {
    /// Analyzer with the unknown-word fallback and thresholds taken from the
    /// global settings.
    pub fn new(dict: Arc<dyn Dictionary>, conn: Arc<dyn Connector>) -> Self {
        let s = settings();
        Self {
            dict,
            conn,
            unknown: Arc::new(CategoryFallback::new(&s.unknown)),
            greedy_threshold: s.builder.greedy_threshold,
            theta: s.marginal.theta,
        }
    }

    pub fn with_unknown(mut self, unknown: Arc<dyn UnknownHandler>) -> Self {
        self.unknown = unknown;
        self
    }

    pub fn with_greedy_threshold(mut self, threshold: usize) -> Self {
        self.greedy_threshold = threshold;
        self
    }

    /// Marginal temperature. Non-positive or non-finite values are ignored.
    pub fn with_theta(mut self, theta: f64) -> Self {
        if theta.is_finite() && theta > 0.0 {
            self.theta = theta;
        }
        self
    }

    pub fn connector(&self) -> &dyn Connector {
        self.conn.as_ref()
    }

    /// Build and decode `text` into `lattice`.
    ///
    /// Always runs the forward pass; `options` adds the backward pass and
    /// marginals. Empty text is rejected before the lattice is touched.
    pub fn analyze(
        &self,
        lattice: &mut Lattice,
        text: &str,
        options: AnalyzeOptions,
    ) -> Result<(), AnalysisError> {
        if text.is_empty() {
            return Err(AnalysisError::InvalidInput);
        }
        let _span = debug_span!("analyze", len = text.len()).entered();

        builder::build_lattice(
            lattice,
            self.dict.as_ref(),
            self.unknown.as_ref(),
            text,
            self.greedy_threshold,
        )?;
        let num_ids = self.conn.num_ids();
        let foreign = lattice.out_of_range_ids(num_ids);
        if foreign > 0 {
            warn!(
                nodes = foreign,
                num_ids,
                "context ids outside the connection matrix read as cost 0"
            );
        }
        let best = viterbi::forward(lattice, self.conn.as_ref())?;
        if options.needs_backward() {
            viterbi::backward(lattice, self.conn.as_ref())?;
        }
        if options.marginal {
            viterbi::marginals(lattice, self.conn.as_ref(), self.theta);
        }
        debug!(best_cost = best, nodes = lattice.node_count());
        Ok(())
    }

    /// Feature string for a node's word handle.
    pub fn feature(&self, word: WordRef) -> &str {
        match word {
            WordRef::Sentinel => "",
            WordRef::Known(id) => self.dict.feature(id),
            WordRef::Unknown(id) => self.unknown.feature(id),
        }
    }

    /// Resolve a node into a detached `Morpheme`. `total_cost` is the node's
    /// best cost from BOS.
    pub fn morpheme(&self, lattice: &Lattice, id: NodeId) -> Morpheme {
        let node = lattice.node(id);
        Morpheme {
            surface: lattice.surface(id).to_string(),
            feature: self.feature(node.word).to_string(),
            begin: node.begin,
            len: node.len,
            kind: node.kind,
            left_id: node.left_id,
            right_id: node.right_id,
            word_cost: node.cost,
            total_cost: node.forward_cost().unwrap_or_default(),
            prob: lattice.marginal(id),
        }
    }

    /// Morphemes of the best path of an analysed lattice.
    pub fn best_morphemes(&self, lattice: &Lattice) -> Result<Vec<Morpheme>, AnalysisError> {
        let path = best_path(lattice).ok_or(AnalysisError::NotDecoded)?;
        Ok(path.iter().map(|&id| self.morpheme(lattice, id)).collect())
    }

    /// Lazy N-best paths. The lattice must have been analysed with
    /// `AnalyzeOptions::nbest` (or `all_morphs`).
    pub fn nbest<'a>(&'a self, lattice: &'a Lattice) -> Result<NBest<'a>, AnalysisError> {
        if !lattice.has_backward() {
            return Err(AnalysisError::NotDecoded);
        }
        Ok(NBest::new(lattice, self.conn.as_ref()))
    }

    /// Resolve a path into a `Segmentation`. Each `total_cost` is the running
    /// cost along this path, not the node's best cost.
    pub fn segmentation(&self, lattice: &Lattice, path: &Path) -> Segmentation {
        let mut prev_right = lattice.node(lattice.bos()).right_id;
        let mut total = 0i64;
        let morphemes = path
            .nodes
            .iter()
            .map(|&id| {
                let node = lattice.node(id);
                total += self.conn.cost(prev_right, node.left_id) as i64 + node.cost as i64;
                prev_right = node.right_id;
                Morpheme {
                    total_cost: total,
                    ..self.morpheme(lattice, id)
                }
            })
            .collect();
        Segmentation {
            cost: path.cost,
            morphemes,
        }
    }

    /// Every node on some complete path, with feature data resolved.
    pub fn all_morphs(&self, lattice: &Lattice) -> Result<Vec<MorphCandidate>, AnalysisError> {
        Ok(lattice
            .all_morphs()?
            .into_iter()
            .map(|m| MorphCandidate {
                morpheme: self.morpheme(lattice, m.id),
                best_cost_through: m.best_cost_through,
                on_best_path: m.on_best_path,
            })
            .collect())
    }

    /// Best segmentation of `text` using a fresh lattice.
    pub fn parse(&self, text: &str) -> Result<Vec<Morpheme>, AnalysisError> {
        let mut lattice = Lattice::new();
        self.analyze(&mut lattice, text, AnalyzeOptions::default())?;
        self.best_morphemes(&lattice)
    }

    /// Surfaces of the best segmentation.
    pub fn wakati(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        Ok(self.parse(text)?.into_iter().map(|m| m.surface).collect())
    }

    /// Up to `n` best segmentations of `text`, cheapest first.
    pub fn parse_nbest(&self, text: &str, n: usize) -> Result<Vec<Segmentation>, AnalysisError> {
        let mut lattice = Lattice::new();
        let options = AnalyzeOptions {
            nbest: true,
            ..Default::default()
        };
        self.analyze(&mut lattice, text, options)?;
        Ok(self
            .nbest(&lattice)?
            .take(n)
            .map(|path| self.segmentation(&lattice, &path))
            .collect())
    }
}
