use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::connection::ConnectionMatrix;
use super::DictError;

/// Parse one whitespace-separated field, naming it in the error.
fn field<T>(lineno: usize, name: &str, raw: &str) -> Result<T, DictError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| DictError::parse(lineno, format!("invalid {name} '{raw}': {e}")))
}

/// `num_ids` or `num_right num_left`; the matrix must be square.
fn header(fields: &[&str]) -> Result<u16, DictError> {
    match *fields {
        [n] => field(1, "num_ids", n),
        [r, l] => {
            let right: u16 = field(1, "num_right", r)?;
            let left: u16 = field(1, "num_left", l)?;
            if right != left {
                return Err(DictError::parse(
                    1,
                    format!("matrix must be square, got {right}x{left}"),
                ));
            }
            Ok(right)
        }
        _ => Err(DictError::parse(
            1,
            format!("header needs 1 or 2 values, got {}", fields.len()),
        )),
    }
}

impl ConnectionMatrix {
    /// Build from a text matrix definition.
    ///
    /// The first line is `num_ids` or `num_right num_left`. The body layout
    /// is picked from its first non-blank line:
    /// - `right_id left_id cost` triplets, as in MeCab's `matrix.def`.
    ///   Unlisted cells cost 0.
    /// - one cost per line, row-major, exactly `num_ids²` of them.
    ///
    /// Blank lines are ignored. Errors carry 1-based line numbers.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut lines = text.lines();
        let first = lines
            .next()
            .ok_or_else(|| DictError::parse(1, "missing header"))?;
        let num_ids = header(&first.split_whitespace().collect::<Vec<_>>())?;
        let n = num_ids as usize;

        let body: Vec<(usize, Vec<&str>)> = lines
            .enumerate()
            .map(|(i, line)| (i + 2, line.split_whitespace().collect::<Vec<_>>()))
            .filter(|(_, fields)| !fields.is_empty())
            .collect();

        let triplets = body.first().is_some_and(|(_, fields)| fields.len() == 3);
        let mut costs = if triplets {
            vec![0i16; n * n]
        } else {
            Vec::with_capacity(n * n)
        };

        for (lineno, fields) in &body {
            let lineno = *lineno;
            match (triplets, fields.as_slice()) {
                (true, &[r, l, c]) => {
                    let right: usize = field(lineno, "right_id", r)?;
                    let left: usize = field(lineno, "left_id", l)?;
                    if right >= n || left >= n {
                        return Err(DictError::parse(
                            lineno,
                            format!("ids ({right}, {left}) outside {n}x{n} matrix"),
                        ));
                    }
                    costs[right * n + left] = field(lineno, "cost", c)?;
                }
                (false, &[c]) => costs.push(field(lineno, "cost", c)?),
                (_, other) => {
                    return Err(DictError::parse(
                        lineno,
                        format!(
                            "expected {} field(s), got {}",
                            if triplets { 3 } else { 1 },
                            other.len()
                        ),
                    ));
                }
            }
        }

        if costs.len() != n * n {
            return Err(DictError::parse(
                text.lines().count(),
                format!("expected {} costs, got {}", n * n, costs.len()),
            ));
        }
        Ok(Self { num_ids, costs })
    }

    /// Read a text matrix definition from disk.
    pub fn open_text(path: &Path) -> Result<Self, DictError> {
        Self::from_text(&fs::read_to_string(path)?)
    }
}
