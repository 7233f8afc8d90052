use std::path::Path;
use std::process;
use std::sync::Arc;

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use morpho_core::analyzer::{
    AnalysisError, AnalyzeOptions, Analyzer, Lattice, MorphCandidate, Morpheme, Segmentation,
};
use morpho_core::dict::{ConnectionMatrix, TrieDictionary};
use morpho_core::settings::settings;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Output switches for `analyze`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeFlags {
    pub json: bool,
    pub all_morphs: bool,
    pub marginal: bool,
}

#[derive(Debug, Serialize)]
struct AnalyzeReport<'a> {
    text: &'a str,
    best_cost: Option<i64>,
    morphemes: Vec<Morpheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_morphs: Option<Vec<MorphCandidate>>,
}

#[derive(Debug, Serialize)]
struct NBestReport<'a> {
    text: &'a str,
    paths: Vec<Segmentation>,
}

pub fn open_analyzer(dict_file: &str, conn_file: &str) -> Analyzer {
    let dict = die!(
        TrieDictionary::open_csv(Path::new(dict_file)),
        "Error opening dictionary: {}"
    );
    let conn = die!(
        ConnectionMatrix::open_text(Path::new(conn_file)),
        "Error opening connection matrix: {}"
    );
    Analyzer::new(Arc::new(dict), Arc::new(conn))
}

pub fn analyze_cmd(dict_file: &str, conn_file: &str, text: &str, flags: AnalyzeFlags) {
    let analyzer = open_analyzer(dict_file, conn_file);
    let out = die!(render_analyze(&analyzer, text, flags), "Error: {}");
    print!("{out}");
}

pub fn nbest_cmd(dict_file: &str, conn_file: &str, text: &str, n: Option<usize>, json: bool) {
    let analyzer = open_analyzer(dict_file, conn_file);
    let n = n.unwrap_or(settings().nbest.default_n);
    let out = die!(render_nbest(&analyzer, text, n, json), "Error: {}");
    print!("{out}");
}

/// Analyse `text` and format the result as a table or JSON.
pub fn render_analyze(
    analyzer: &Analyzer,
    text: &str,
    flags: AnalyzeFlags,
) -> Result<String, AnalysisError> {
    let mut lattice = Lattice::new();
    let options = AnalyzeOptions {
        nbest: false,
        all_morphs: flags.all_morphs,
        marginal: flags.marginal,
    };
    analyzer.analyze(&mut lattice, text, options)?;
    let morphemes = analyzer.best_morphemes(&lattice)?;
    let all_morphs = if flags.all_morphs {
        Some(analyzer.all_morphs(&lattice)?)
    } else {
        None
    };

    if flags.json {
        let report = AnalyzeReport {
            text,
            best_cost: lattice.best_cost(),
            morphemes,
            all_morphs,
        };
        return Ok(to_json(&report));
    }

    let mut out = format_morphemes(&morphemes);
    out.push_str("EOS\n");
    if let Some(candidates) = all_morphs {
        out.push('\n');
        out.push_str(&format_candidates(&candidates));
    }
    Ok(out)
}

/// Enumerate up to `n` segmentations and format them.
pub fn render_nbest(
    analyzer: &Analyzer,
    text: &str,
    n: usize,
    json: bool,
) -> Result<String, AnalysisError> {
    let paths = analyzer.parse_nbest(text, n)?;
    if json {
        return Ok(to_json(&NBestReport { text, paths }));
    }
    let mut out = String::new();
    for (i, seg) in paths.iter().enumerate() {
        let surfaces: Vec<&str> = seg.morphemes.iter().map(|m| m.surface.as_str()).collect();
        out.push_str(&format!("#{:>2}: {}  ({})\n", i + 1, surfaces.join(" | "), seg.cost));
    }
    Ok(out)
}

/// One line per morpheme: surface, feature, costs and probability.
pub fn format_morphemes(morphemes: &[Morpheme]) -> String {
    let width = morphemes
        .iter()
        .map(|m| m.surface.width())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for m in morphemes {
        out.push_str(&pad(&m.surface, width));
        out.push('\t');
        out.push_str(&m.feature);
        out.push_str(&format!("\t{}\t{}", m.word_cost, m.total_cost));
        if let Some(p) = m.prob {
            out.push_str(&format!("\t{p:.4}"));
        }
        out.push('\n');
    }
    out
}

/// All-morphs listing; best-path nodes are marked with `*`.
pub fn format_candidates(candidates: &[MorphCandidate]) -> String {
    let width = candidates
        .iter()
        .map(|c| c.morpheme.surface.width())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for c in candidates {
        let m = &c.morpheme;
        let mark = if c.on_best_path { '*' } else { ' ' };
        out.push_str(&format!(
            "{mark} {:>3}+{:<2} {}\t{}\t{}\n",
            m.begin,
            m.len,
            pad(&m.surface, width),
            c.best_cost_through,
            m.feature
        ));
    }
    out
}

/// Pad to `width` terminal columns (full-width chars count as two).
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

fn to_json<T: Serialize>(value: &T) -> String {
    let mut s = die!(serde_json::to_string_pretty(value), "JSON serialization failed: {}");
    s.push('\n');
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const DICT_CSV: &str = "\
すもも,1,1,3000,名詞,一般
もも,1,1,3000,名詞,一般
も,2,2,2000,助詞,係助詞
の,3,3,1500,助詞,連体化
うち,1,1,3500,名詞,非自立
";

    const MATRIX: &str = "\
4 4
0 1 0
1 0 0
1 1 1500
1 2 -500
2 1 -500
2 2 2000
1 3 -500
3 1 -500
2 0 1500
3 0 2000
";

    fn analyzer() -> Analyzer {
        let dict = TrieDictionary::from_csv(DICT_CSV).unwrap();
        let conn = ConnectionMatrix::from_text(MATRIX).unwrap();
        Analyzer::new(Arc::new(dict), Arc::new(conn))
    }

    #[test]
    fn test_pad_counts_columns() {
        assert_eq!(pad("もも", 6), "もも  ");
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("すもも", 4), "すもも");
    }

    #[test]
    fn test_render_analyze_table() {
        let out = render_analyze(&analyzer(), "すもももももものうち", AnalyzeFlags::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("すもも\t名詞,一般\t3000"));
        assert!(lines[1].starts_with("も    \t助詞,係助詞"));
        assert_eq!(lines[7], "EOS");
    }

    #[test]
    fn test_render_analyze_json() {
        let flags = AnalyzeFlags {
            json: true,
            all_morphs: true,
            marginal: true,
        };
        let out = render_analyze(&analyzer(), "ももの", flags).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["text"], "ももの");
        let morphemes = v["morphemes"].as_array().unwrap();
        assert_eq!(morphemes.len(), 2);
        assert_eq!(morphemes[0]["surface"], "もも");
        assert_eq!(morphemes[0]["kind"], "Normal");
        assert!(morphemes[0]["prob"].as_f64().unwrap() > 0.0);
        let all = v["all_morphs"].as_array().unwrap();
        assert!(all.len() >= 3);
        assert!(all.iter().any(|c| c["on_best_path"] == true));
        assert!(all[0]["best_cost_through"].is_i64());
    }

    #[test]
    fn test_render_analyze_without_prob_omits_field() {
        let flags = AnalyzeFlags {
            json: true,
            ..Default::default()
        };
        let out = render_analyze(&analyzer(), "もも", flags).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(v["morphemes"][0].get("prob").is_none());
        assert!(v.get("all_morphs").is_none());
    }

    #[test]
    fn test_render_nbest() {
        let out = render_nbest(&analyzer(), "もも", 3, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# 1: もも  ("));
    }

    #[test]
    fn test_render_nbest_json() {
        let out = render_nbest(&analyzer(), "もも", 2, true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        let paths = v["paths"].as_array().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0]["cost"].as_i64().unwrap() <= paths[1]["cost"].as_i64().unwrap());
    }

    #[test]
    fn test_render_empty_input() {
        let err = render_analyze(&analyzer(), "", AnalyzeFlags::default()).unwrap_err();
        assert_eq!(err, AnalysisError::InvalidInput);
    }

    #[test]
    fn test_open_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let dict_path = dir.path().join("dict.csv");
        let conn_path = dir.path().join("matrix.def");
        std::fs::write(&dict_path, DICT_CSV).unwrap();
        std::fs::write(&conn_path, MATRIX).unwrap();
        let analyzer = open_analyzer(dict_path.to_str().unwrap(), conn_path.to_str().unwrap());
        assert_eq!(analyzer.wakati("ももの").unwrap(), vec!["もも", "の"]);
    }
}
