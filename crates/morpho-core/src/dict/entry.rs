use serde::{Deserialize, Serialize};

/// A dictionary word as seen by the lattice builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    /// Handle into the dictionary's feature table
    pub word_id: u32,
    /// Emission cost (lower = more preferred)
    pub cost: i16,
    /// Left context id
    pub left_id: u16,
    /// Right context id
    pub right_id: u16,
}

/// One hit of a common-prefix search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordMatch {
    /// Surface length in chars
    pub len: usize,
    pub entry: WordEntry,
}

/// Source record used to build a `TrieDictionary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictRecord {
    pub surface: String,
    pub cost: i16,
    pub left_id: u16,
    pub right_id: u16,
    pub feature: String,
}
