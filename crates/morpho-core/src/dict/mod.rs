//! Dictionary and connection-matrix services consumed by the analyzer.
//!
//! `TrieDictionary` maps surface strings to word entries through an FST and
//! answers common-prefix queries. `ConnectionMatrix` holds the context-id
//! bigram costs used to score adjacent morphemes.

pub mod connection;
mod connection_io;
mod entry;
mod trie_dict;
mod trie_dict_io;

pub use connection::{ConnectionMatrix, Connector};
pub use entry::{DictRecord, WordEntry, WordMatch};
pub use trie_dict::TrieDictionary;

use std::io;

/// Error type for building and loading dictionaries and connection matrices.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("FST error: {0}")]
    Fst(#[from] fst::Error),

    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("empty surface at line {0}")]
    EmptySurface(usize),
}

impl DictError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        DictError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// Read-only morpheme lookup service.
///
/// Implementations are shared across concurrent analyses and are never
/// mutated by the analyzer.
pub trait Dictionary: Send + Sync {
    /// Append every entry whose surface is a prefix of `query` to `out`.
    ///
    /// Matches are appended shortest surface first; entries sharing a surface
    /// keep their insertion order. An empty result is valid.
    fn common_prefix_search(&self, query: &str, out: &mut Vec<WordMatch>);

    /// Feature string (part of speech, reading, ...) of a word.
    fn feature(&self, word_id: u32) -> &str;
}
