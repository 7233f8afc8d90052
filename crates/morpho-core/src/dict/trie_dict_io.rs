use std::fs;
use std::path::Path;

use super::{DictError, DictRecord, TrieDictionary};

impl TrieDictionary {
    /// Build from MeCab-style CSV lines: `surface,left_id,right_id,cost,feature...`.
    ///
    /// Everything after the fourth comma is kept verbatim as the feature
    /// string. Blank lines and lines starting with `#` are skipped.
    pub fn from_csv(text: &str) -> Result<Self, DictError> {
        let mut records = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let lineno = i + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            records.push(parse_csv_line(line, lineno)?);
        }
        Self::from_entries(records)
    }

    /// Read a CSV dictionary source from disk.
    pub fn open_csv(path: &Path) -> Result<Self, DictError> {
        Self::from_csv(&fs::read_to_string(path)?)
    }
}

fn parse_csv_line(line: &str, lineno: usize) -> Result<DictRecord, DictError> {
    let mut fields = line.splitn(5, ',');
    let mut next = |name: &str| {
        fields
            .next()
            .ok_or_else(|| DictError::parse(lineno, format!("missing {name}")))
    };

    let surface = next("surface")?;
    if surface.is_empty() {
        return Err(DictError::EmptySurface(lineno));
    }
    let left_id = next("left_id")?
        .trim()
        .parse()
        .map_err(|e| DictError::parse(lineno, format!("left_id: {e}")))?;
    let right_id = next("right_id")?
        .trim()
        .parse()
        .map_err(|e| DictError::parse(lineno, format!("right_id: {e}")))?;
    let cost = next("cost")?
        .trim()
        .parse()
        .map_err(|e| DictError::parse(lineno, format!("cost: {e}")))?;
    let feature = fields.next().unwrap_or("").to_string();

    Ok(DictRecord {
        surface: surface.to_string(),
        cost,
        left_id,
        right_id,
        feature,
    })
}
