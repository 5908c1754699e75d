//! Text normalization primitives for the catalog pipeline.
//!
//! Brand spreadsheets arrive with inconsistent encodings of the same
//! information: bullet lists pasted into single cells, dimensions written as
//! "120 ml" or "120ml", keyword columns that repeat each other with
//! different casing. Every brand adapter funnels its raw cell values through
//! the functions in this module so that the composed product descriptions
//! come out as uniform, dot-terminated sentence sequences.

use regex::Regex;
use std::sync::OnceLock;

/// Bullet glyphs observed across the brand spreadsheets.
const BULLETS: &[char] = &[
    '\u{2022}', '\u{00B7}', '\u{25CF}', '\u{23FA}', '\u{26AB}', '\u{2B24}', '\u{2219}',
    '\u{22C5}', '\u{1F311}', '\u{30FB}',
];

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*([A-Za-z]+)").unwrap())
}

fn dot_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").unwrap())
}

fn spaced_dot_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(\s+\.)+").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n|\s{2,}").unwrap())
}

fn keyword_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;,|/.\-]").unwrap())
}

fn edge_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\w]+|[^\w]+$").unwrap())
}

/// Removes the fixed set of bullet glyphs.
pub fn strip_bullets(s: &str) -> String {
    s.chars().filter(|c| !BULLETS.contains(c)).collect()
}

/// Collapses "<number> <unit>" into "<number><unit>", e.g. "120 ml" -> "120ml".
pub fn squash_units(s: &str) -> String {
    unit_re().replace_all(s, "$1$2").into_owned()
}

/// Collapses runs of two or more periods, and period-whitespace-period
/// patterns, into a single period. Output never contains "..".
pub fn reduce_dots(s: &str) -> String {
    let s = dot_run_re().replace_all(s, ".");
    spaced_dot_re().replace_all(&s, ".").into_owned()
}

/// Reduces a keyword list to unique entries, ignoring case but keeping the
/// first-seen original casing. Candidates are sorted by descending length and
/// a candidate is kept only if no already-kept string contains it as a
/// case-insensitive substring, so shorter near-duplicates of a longer kept
/// phrase are dropped. O(n^2), fine at per-product keyword scale.
pub fn unique_keywords(keywords: &[String]) -> Vec<String> {
    let mut candidates: Vec<&str> = keywords.iter().map(|s| s.trim()).collect();
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut kept: Vec<String> = Vec::new();
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        if lower.is_empty() {
            continue;
        }
        if !kept.iter().any(|k| k.to_lowercase().contains(&lower)) {
            kept.push(candidate.to_string());
        }
    }
    kept
}

/// Builds the "Keywords:" payload for one record: splits raw keyword cells on
/// common separators, trims edge punctuation, lowercases, deduplicates, and
/// joins with "; " plus a trailing period. All-empty input yields an empty
/// string, never a lone period.
pub fn make_keywords(cells: &[String]) -> String {
    let mut keywords: Vec<String> = Vec::new();
    for cell in cells.iter().filter(|c| !c.trim().is_empty()) {
        for part in keyword_split_re().split(cell) {
            let part = edge_punct_re().replace_all(part, "");
            let part = part.trim().to_lowercase();
            keywords.push(part);
        }
    }
    let unique = unique_keywords(&keywords);
    if unique.is_empty() {
        return String::new();
    }
    format!("{}.", unique.join("; "))
}

/// Filters blank fields, joins the rest with ". ", guarantees a trailing
/// period, and reduces any dot runs the join produced. Empty input yields an
/// empty string.
pub fn join_non_empty(fields: &[String]) -> String {
    let non_empty: Vec<&str> = fields
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if non_empty.is_empty() {
        return String::new();
    }
    reduce_dots(&format!("{}.", non_empty.join(". ")))
}

/// Collapses multi-line cell content into a single line of dot-terminated
/// fragments.
pub fn collapse_lines(s: &str) -> String {
    let fragments: Vec<String> = fragment_re()
        .split(s)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| {
            if f.ends_with('.') {
                f.to_string()
            } else {
                format!("{}.", f)
            }
        })
        .collect();
    reduce_dots(&fragments.join(" "))
}

/// Whole-cell cleanup applied when a raw sheet is loaded: fragments split on
/// newlines or wide gaps, units squashed, bullets stripped, internal periods
/// removed, whitespace collapsed. Sentence punctuation is added later by the
/// composition recipes, so cells themselves stay dot-free.
pub fn clean_cell(s: &str) -> String {
    let fragments: Vec<String> = fragment_re()
        .split(s.trim())
        .map(|f| squash_units(f.trim()))
        .filter(|f| !f.is_empty())
        .collect();
    let joined = fragments.join(" ");
    let no_bullets = strip_bullets(&joined);
    let no_dots: String = no_bullets.chars().filter(|c| *c != '.').collect();
    whitespace_re()
        .replace_all(&no_dots, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bullets() {
        assert_eq!(strip_bullets("• Hidrata · la piel"), " Hidrata  la piel");
        assert_eq!(strip_bullets("sin viñetas"), "sin viñetas");
    }

    #[test]
    fn test_squash_units() {
        assert_eq!(squash_units("120 ml"), "120ml");
        assert_eq!(squash_units("50 gr y 120 ml"), "50gr y 120ml");
        assert_eq!(squash_units("ya 120ml"), "ya 120ml");
    }

    #[test]
    fn test_reduce_dots_runs() {
        assert_eq!(reduce_dots("Esto es una prueba... y otra.."), "Esto es una prueba. y otra.");
        assert_eq!(reduce_dots("a. . b"), "a. b");
    }

    #[test]
    fn test_reduce_dots_no_double_dot_postcondition() {
        let inputs = [
            "a...b",
            "a. . . b",
            "....",
            ". .",
            "normal sentence.",
            "a.. b.. c..",
        ];
        for input in inputs {
            assert!(!reduce_dots(input).contains(".."), "failed for {:?}", input);
        }
    }

    #[test]
    fn test_unique_keywords_drops_contained() {
        let input = vec![
            "crema".to_string(),
            "crema hidratante".to_string(),
            "CREMA".to_string(),
        ];
        let out = unique_keywords(&input);
        assert_eq!(out, vec!["crema hidratante".to_string()]);
    }

    #[test]
    fn test_unique_keywords_preserves_casing() {
        let input = vec!["Piel Seca".to_string(), "rostro".to_string()];
        let out = unique_keywords(&input);
        assert!(out.contains(&"Piel Seca".to_string()));
        assert!(out.contains(&"rostro".to_string()));
    }

    #[test]
    fn test_unique_keywords_idempotent() {
        let input = vec![
            "hidratante corporal".to_string(),
            "hidratante".to_string(),
            "corporal".to_string(),
            "piel sensible".to_string(),
            "piel".to_string(),
        ];
        let once = unique_keywords(&input);
        let twice = unique_keywords(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_make_keywords() {
        let cells = vec!["facial, hidratante".to_string(), "Facial; rostro".to_string()];
        let out = make_keywords(&cells);
        assert!(out.ends_with('.'));
        assert!(out.contains("hidratante"));
        assert!(out.contains("rostro"));
        // "facial" appears once despite showing up in both cells
        assert_eq!(out.matches("facial").count(), 1);
    }

    #[test]
    fn test_make_keywords_empty_never_lone_dot() {
        assert_eq!(make_keywords(&[]), "");
        assert_eq!(make_keywords(&["".to_string(), "  ".to_string()]), "");
        assert_eq!(make_keywords(&[";;".to_string()]), "");
    }

    #[test]
    fn test_join_non_empty() {
        let fields = vec![
            "Hidrata la piel".to_string(),
            "".to_string(),
            "   ".to_string(),
            "Uso diario.".to_string(),
        ];
        assert_eq!(join_non_empty(&fields), "Hidrata la piel. Uso diario.");
    }

    #[test]
    fn test_join_non_empty_empty_input() {
        assert_eq!(join_non_empty(&[]), "");
        assert_eq!(join_non_empty(&["".to_string(), " ".to_string()]), "");
    }

    #[test]
    fn test_collapse_lines() {
        let input = "Primera línea\nSegunda línea.\nTercera";
        assert_eq!(collapse_lines(input), "Primera línea. Segunda línea. Tercera.");
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("• Crema  120 ml\ncon SPF 30 "), "Crema 120ml con SPF 30");
        assert_eq!(clean_cell(""), "");
        assert_eq!(clean_cell("  \n  "), "");
    }

    #[test]
    fn test_clean_cell_removes_internal_dots() {
        assert_eq!(clean_cell("Aplicar. Dejar actuar."), "Aplicar Dejar actuar");
    }
}
