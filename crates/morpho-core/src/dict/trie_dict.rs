use std::collections::BTreeMap;

use fst::raw::Output;
use fst::Map;

use super::{DictError, DictRecord, Dictionary, WordEntry, WordMatch};

/// In-memory dictionary: an FST from surface bytes to a slot in `values`.
///
/// Word ids are assigned in record order, so `feature(word_id)` and the
/// per-surface entry order both follow the order records were supplied in.
pub struct TrieDictionary {
    map: Map<Vec<u8>>,
    values: Vec<Vec<WordEntry>>,
    features: Vec<String>,
}

impl TrieDictionary {
    pub fn from_entries(records: impl IntoIterator<Item = DictRecord>) -> Result<Self, DictError> {
        let mut grouped: BTreeMap<String, Vec<WordEntry>> = BTreeMap::new();
        let mut features = Vec::new();

        for (i, rec) in records.into_iter().enumerate() {
            if rec.surface.is_empty() {
                return Err(DictError::EmptySurface(i + 1));
            }
            let word_id = features.len() as u32;
            features.push(rec.feature);
            grouped.entry(rec.surface).or_default().push(WordEntry {
                word_id,
                cost: rec.cost,
                left_id: rec.left_id,
                right_id: rec.right_id,
            });
        }

        // BTreeMap<String, _> iterates in byte order, which is what the FST
        // builder requires.
        let mut values = Vec::with_capacity(grouped.len());
        let mut keys = Vec::with_capacity(grouped.len());
        for (slot, (surface, entries)) in grouped.into_iter().enumerate() {
            keys.push((surface, slot as u64));
            values.push(entries);
        }
        let map = Map::from_iter(keys)?;

        Ok(Self {
            map,
            values,
            features,
        })
    }

    /// Entries registered under exactly `surface`.
    pub fn lookup(&self, surface: &str) -> Option<&[WordEntry]> {
        self.map
            .get(surface.as_bytes())
            .map(|slot| self.values[slot as usize].as_slice())
    }

    /// Returns (surface_count, entry_count).
    pub fn stats(&self) -> (usize, usize) {
        (self.values.len(), self.features.len())
    }
}

impl Dictionary for TrieDictionary {
    fn common_prefix_search(&self, query: &str, out: &mut Vec<WordMatch>) {
        let fst = self.map.as_fst();
        let mut node = fst.root();
        let mut output = Output::zero();
        let mut char_len = 0;

        for (i, &byte) in query.as_bytes().iter().enumerate() {
            let Some(t) = node.find_input(byte) else {
                break;
            };
            let trans = node.transition(t);
            output = output.cat(trans.out);
            node = fst.node(trans.addr);

            let end = i + 1;
            if !query.is_char_boundary(end) {
                continue;
            }
            char_len += 1;
            if node.is_final() {
                let slot = output.cat(node.final_output()).value() as usize;
                out.extend(self.values[slot].iter().map(|&entry| WordMatch {
                    len: char_len,
                    entry,
                }));
            }
        }
    }

    fn feature(&self, word_id: u32) -> &str {
        self.features
            .get(word_id as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}
