//! Unknown-word fallback.
//!
//! When the dictionary has nothing (or not enough) at a position, the
//! fallback synthesizes candidates from the character category of the
//! current char so the lattice stays connected.

use crate::settings::{settings, CategoryDef, UnknownSettings};
use crate::unicode;

/// Character category used to pick an unknown-word definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharCategory {
    Default = 0,
    Space,
    Hiragana,
    Katakana,
    Kanji,
    Alpha,
    Numeric,
    Symbol,
}

impl CharCategory {
    pub const COUNT: usize = 8;

    pub fn of(c: char) -> Self {
        if unicode::is_space(c) {
            CharCategory::Space
        } else if unicode::is_hiragana(c) {
            CharCategory::Hiragana
        } else if unicode::is_katakana(c) {
            CharCategory::Katakana
        } else if unicode::is_kanji(c) {
            CharCategory::Kanji
        } else if unicode::is_latin(c) {
            CharCategory::Alpha
        } else if unicode::is_numeric(c) {
            CharCategory::Numeric
        } else if unicode::is_symbol(c) {
            CharCategory::Symbol
        } else {
            CharCategory::Default
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CharCategory::Default => "DEFAULT",
            CharCategory::Space => "SPACE",
            CharCategory::Hiragana => "HIRAGANA",
            CharCategory::Katakana => "KATAKANA",
            CharCategory::Kanji => "KANJI",
            CharCategory::Alpha => "ALPHA",
            CharCategory::Numeric => "NUMERIC",
            CharCategory::Symbol => "SYMBOL",
        }
    }
}

/// A synthesized unknown-word candidate starting at the queried position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCandidate {
    /// Span length in chars (always ≥ 1)
    pub len: usize,
    pub cost: i16,
    pub left_id: u16,
    pub right_id: u16,
    /// Handle passed back to `UnknownHandler::feature`
    pub word_id: u32,
}

/// Unknown-word fallback service.
pub trait UnknownHandler: Send + Sync {
    /// Whether the fallback runs at a position starting with `c` even when the
    /// dictionary matched.
    fn should_invoke(&self, c: char) -> bool;

    /// Append candidates starting at `chars[begin]` to `out`.
    ///
    /// Must append at least one candidate of length ≥ 1 whenever
    /// `begin < chars.len()`.
    fn synthesize(&self, chars: &[char], begin: usize, out: &mut Vec<UnknownCandidate>);

    fn feature(&self, word_id: u32) -> &str;
}

/// Category-driven fallback: one definition per `CharCategory`.
#[derive(Debug, Clone)]
pub struct CategoryFallback {
    defs: Vec<CategoryDef>,
}

impl CategoryFallback {
    pub fn new(unknown: &UnknownSettings) -> Self {
        // Order matches the `CharCategory` discriminants.
        let defs = vec![
            unknown.default.clone(),
            unknown.space.clone(),
            unknown.hiragana.clone(),
            unknown.katakana.clone(),
            unknown.kanji.clone(),
            unknown.alpha.clone(),
            unknown.numeric.clone(),
            unknown.symbol.clone(),
        ];
        Self { defs }
    }

    /// Build from the global `[unknown.*]` settings.
    pub fn from_settings() -> Self {
        Self::new(&settings().unknown)
    }

    pub fn def(&self, category: CharCategory) -> &CategoryDef {
        &self.defs[category as usize]
    }

    fn push(&self, category: CharCategory, len: usize, out: &mut Vec<UnknownCandidate>) {
        let def = self.def(category);
        out.push(UnknownCandidate {
            len,
            cost: def.cost,
            left_id: def.left_id,
            right_id: def.right_id,
            word_id: category as u32,
        });
    }
}

impl Default for CategoryFallback {
    fn default() -> Self {
        Self::from_settings()
    }
}

impl UnknownHandler for CategoryFallback {
    fn should_invoke(&self, c: char) -> bool {
        self.def(CharCategory::of(c)).invoke
    }

    fn synthesize(&self, chars: &[char], begin: usize, out: &mut Vec<UnknownCandidate>) {
        let Some(&first) = chars.get(begin) else {
            return;
        };
        let category = CharCategory::of(first);
        let def = self.def(category);
        let run = chars[begin..]
            .iter()
            .take_while(|&&c| CharCategory::of(c) == category)
            .count();

        let group_len = def.group.then_some(run);
        if let Some(len) = group_len {
            self.push(category, len, out);
        }
        for len in 1..=def.length.min(run) {
            if Some(len) != group_len {
                self.push(category, len, out);
            }
        }
        if group_len.is_none() && def.length == 0 {
            self.push(category, 1, out);
        }
    }

    fn feature(&self, word_id: u32) -> &str {
        self.defs
            .get(word_id as usize)
            .map(|d| d.feature.as_str())
            .unwrap_or("")
    }
}
