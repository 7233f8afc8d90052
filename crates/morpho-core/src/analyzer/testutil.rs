//! Shared fixtures for analyzer tests.

use crate::dict::{ConnectionMatrix, DictRecord, TrieDictionary};
use crate::unknown::{UnknownCandidate, UnknownHandler};

pub(crate) fn record(
    surface: &str,
    cost: i16,
    left_id: u16,
    right_id: u16,
    feature: &str,
) -> DictRecord {
    DictRecord {
        surface: surface.to_string(),
        cost,
        left_id,
        right_id,
        feature: feature.to_string(),
    }
}

/// Small dictionary around "すもももももものうち".
///
/// Context ids: 1 = noun, 2 = particle, 3 = の.
/// Deliberately has no entry for "す", "う", "な" or "ぬ".
pub(crate) fn test_dict() -> TrieDictionary {
    TrieDictionary::from_entries(vec![
        record("すもも", 3000, 1, 1, "名詞,一般,すもも"),
        record("もも", 3000, 1, 1, "名詞,一般,もも"),
        record("も", 2000, 2, 2, "助詞,係助詞,も"),
        record("も", 6000, 1, 1, "名詞,一般,藻"),
        record("の", 1500, 3, 3, "助詞,連体化,の"),
        record("うち", 3500, 1, 1, "名詞,非自立,うち"),
        record("カキ", 4000, 1, 1, "名詞,一般,カキ"),
    ])
    .unwrap()
}

/// Connection costs favouring noun/particle alternation.
pub(crate) fn test_conn() -> ConnectionMatrix {
    let mut conn = ConnectionMatrix::filled(10, 0);
    conn.set(0, 1, 0);
    conn.set(1, 0, 0);
    conn.set(1, 2, -500);
    conn.set(2, 1, -500);
    conn.set(1, 1, 1500);
    conn.set(2, 2, 2000);
    conn.set(1, 3, -500);
    conn.set(3, 1, -500);
    conn.set(2, 0, 1500);
    conn.set(3, 0, 2000);
    conn
}

/// Two-char toy: "ab" as one word or as "a" + "b".
pub(crate) fn toy_dict() -> TrieDictionary {
    TrieDictionary::from_entries(vec![
        record("ab", 1, 1, 1, "ab"),
        record("a", 5, 1, 2, "a"),
        record("b", 5, 2, 1, "b"),
    ])
    .unwrap()
}

/// Every transition costs 10000 except BOS/EOS to id 1, 1→1 (free) and
/// 2→2 (100).
pub(crate) fn toy_conn() -> ConnectionMatrix {
    let mut conn = ConnectionMatrix::filled(3, 10000);
    conn.set(0, 1, 0);
    conn.set(1, 0, 0);
    conn.set(1, 1, 0);
    conn.set(2, 2, 100);
    conn
}

/// Fallback that never produces anything.
pub(crate) struct NoFallback;

impl UnknownHandler for NoFallback {
    fn should_invoke(&self, _c: char) -> bool {
        false
    }

    fn synthesize(&self, _chars: &[char], _begin: usize, _out: &mut Vec<UnknownCandidate>) {}

    fn feature(&self, _word_id: u32) -> &str {
        ""
    }
}
