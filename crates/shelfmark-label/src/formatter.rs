use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::abbreviations::abbreviate;

/// Default shelf-label width, in characters.
pub const DEFAULT_LABEL_WIDTH: usize = 36;

const COLORS: &[&str] = &[
    "blanco", "negro", "azul", "rojo", "verde", "gris", "amarillo", "blco", "neg", "az", "white",
    "black", "blue", "red", "green", "gray", "grey", "yellow",
];
const CONNECTORS: &[&str] = &["y", "de", "del", "para", "con", "-", "and", "of", "for", "with"];
const GENERIC_WORDS: &[&str] = &[
    "con", "el", "la", "y", "térm", "term", "construcción", "const", "decorativo", "alta",
    "calidad",
];
const FILLER_WORDS: &[&str] = &[
    "premium", "prem", "especial", "esp", "profesional", "prof", "estándar", "standard", "std",
    "-",
];

/// Which step produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStep {
    Unchanged,
    Abbreviated,
    ImportantWords,
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub step: LabelStep,
}

/// Compresses titles to at most `max_len` characters.
///
/// Steps, first fit wins: whitespace-normalized title as is, abbreviated
/// title, most important words of the abbreviated title (original order
/// kept), clean cut at a word boundary. The result never exceeds `max_len`
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFormatter {
    pub max_len: usize,
}

impl Default for LabelFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_WIDTH)
    }
}

fn word_re(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn is_dims_3d(word: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    word_re(
        &RE,
        r#"(?i)\d+(?:\.\d+)?["']?[x×]\d+(?:\.\d+)?["']?[x×]\d+"#,
    )
    .is_some_and(|re| re.is_match(word))
}

fn is_dims_2d(word: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    word_re(&RE, r#"(?i)\d+(?:\.\d+)?["']?[x×]\d+"#).is_some_and(|re| re.is_match(word))
}

fn is_quantity(word: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    word_re(&RE, r"(?i)^\d+(?:pz|pzs|pcs|un)$").is_some_and(|re| re.is_match(word))
}

fn is_r_value(word: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    word_re(&RE, r"(?i)^r-?\d+$").is_some_and(|re| re.is_match(word))
}

fn is_measure(word: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    word_re(&RE, r#"(?i)^\d+(?:[./]\d+)?\s*(?:cm|mm|in|m|"|')$"#).is_some_and(|re| re.is_match(word))
}

/// Importance of `word` at `position` in a title of `total` words.
pub fn word_importance(word: &str, position: usize, total: usize) -> u32 {
    let lower = word.to_lowercase();
    let mut score = 0;

    // the head noun names the product
    if position == 0 {
        score += 1000;
    }
    if is_dims_3d(word) {
        score += 920;
    } else if is_dims_2d(word) {
        score += 900;
    }
    if is_quantity(word) {
        score += 880;
    }
    if is_r_value(word) {
        score += 850;
    }
    let brand_like = word.chars().next().is_some_and(char::is_uppercase)
        && word.chars().count() > 2
        && word.chars().all(char::is_alphabetic);
    if brand_like && (position as f64) < total as f64 / 2.0 {
        score += 800;
    }
    if COLORS.contains(&lower.as_str()) {
        score += 700;
    }
    if is_measure(word) {
        score += 650;
    }
    if matches!(lower.as_str(), "para" | "de") {
        score += 200;
    }
    if GENERIC_WORDS.contains(&lower.as_str()) {
        score += 50;
    }
    if FILLER_WORDS.contains(&lower.as_str()) {
        score += 10;
    }
    if (position as f64) < total as f64 * 0.3 {
        score += 50;
    }
    score
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn drop_trailing_connectors(words: &mut Vec<&str>) {
    while words
        .last()
        .is_some_and(|w| CONNECTORS.contains(&w.to_lowercase().as_str()))
    {
        words.pop();
    }
}

impl LabelFormatter {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn format(&self, title: &str) -> String {
        self.format_with_step(title).text
    }

    pub fn format_with_step(&self, title: &str) -> Label {
        let normalized = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if char_len(&normalized) <= self.max_len {
            return Label {
                text: normalized,
                step: LabelStep::Unchanged,
            };
        }

        let abbreviated = abbreviate(&normalized);
        if char_len(&abbreviated) <= self.max_len {
            return Label {
                text: abbreviated,
                step: LabelStep::Abbreviated,
            };
        }

        let important = self.keep_important_words(&abbreviated);
        if !important.is_empty() && char_len(&important) <= self.max_len {
            return Label {
                text: important,
                step: LabelStep::ImportantWords,
            };
        }

        let label = Label {
            text: self.clean_truncate(&abbreviated),
            step: LabelStep::Truncated,
        };
        tracing::debug!(title, label = %label.text, "label truncated");
        label
    }

    /// Greedy pick by importance until the budget is spent, then restore the
    /// title's word order. Ties go to the earlier word.
    pub fn keep_important_words(&self, title: &str) -> String {
        let words: Vec<&str> = title.split_whitespace().collect();
        let total = words.len();
        let mut ranked: Vec<(usize, u32)> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (i, word_importance(w, i, total)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut selected = vec![false; total];
        let mut used = 0;
        for (i, _) in ranked {
            let cost = char_len(words[i]) + usize::from(used > 0);
            if used + cost <= self.max_len {
                selected[i] = true;
                used += cost;
            }
        }

        let mut kept: Vec<&str> = words
            .iter()
            .zip(&selected)
            .filter_map(|(w, keep)| keep.then_some(*w))
            .collect();
        drop_trailing_connectors(&mut kept);
        kept.join(" ")
    }

    /// Cut at the last word boundary that fits; a single over-long word is
    /// cut hard and marked with `...`.
    pub fn clean_truncate(&self, title: &str) -> String {
        if char_len(title) <= self.max_len {
            return title.to_string();
        }
        let prefix: String = title.chars().take(self.max_len).collect();
        // a boundary right after the prefix keeps the last word whole
        let next_is_space = title.chars().nth(self.max_len).is_some_and(char::is_whitespace);
        let cut = if next_is_space {
            Some(prefix.len())
        } else {
            prefix.rfind(' ').filter(|&i| i > 0)
        };
        match cut {
            Some(i) => {
                let mut words: Vec<&str> = prefix[..i].split_whitespace().collect();
                drop_trailing_connectors(&mut words);
                let out = words.join(" ");
                if out.is_empty() {
                    self.hard_cut(title)
                } else {
                    out
                }
            }
            None => self.hard_cut(title),
        }
    }

    fn hard_cut(&self, title: &str) -> String {
        if self.max_len > 3 {
            let mut out: String = title.chars().take(self.max_len - 3).collect();
            out.push_str("...");
            out
        } else {
            title.chars().take(self.max_len).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_unchanged() {
        let label = LabelFormatter::default().format_with_step("Caseton   Poliestireno 60x60x2cm");
        assert_eq!(label.step, LabelStep::Unchanged);
        assert_eq!(label.text, "Caseton Poliestireno 60x60x2cm");
    }

    #[test]
    fn test_abbreviation_is_enough() {
        let label = LabelFormatter::default().format_with_step("Caseton Poliestireno 60x60x2cm Blanco");
        assert_eq!(label.step, LabelStep::Abbreviated);
        assert_eq!(label.text, "Caseton Poliestir 60x60x2cm Blco");
    }

    #[test]
    fn test_important_words_keep_specs() {
        let label = LabelFormatter::default().format_with_step(
            "Fibra de Vidrio Owens Corning R-13 15x93x3.5 Gris Aislamiento Térmico",
        );
        assert_eq!(label.step, LabelStep::ImportantWords);
        assert_eq!(label.text, "Fibra Vid Owens R-13 15x93x3.5 Gris");
    }

    #[test]
    fn test_word_importance_ranks_specs_above_filler() {
        assert!(word_importance("15x93x3.5", 5, 10) > word_importance("Premium", 5, 10));
        assert!(word_importance("100pz", 5, 10) > word_importance("Corning", 5, 10));
        assert!(word_importance("Tornillo", 0, 10) > word_importance("60x60", 4, 10));
        // "Corning" contains "in" but is not a measure
        assert_eq!(word_importance("Corning", 6, 10), 0);
    }

    #[test]
    fn test_clean_truncate_word_boundary() {
        let f = LabelFormatter::new(10);
        assert_eq!(f.clean_truncate("Chapa de Baño Bari"), "Chapa");
        assert_eq!(f.clean_truncate("Chapa Bari Cromo"), "Chapa Bari");
        assert_eq!(f.clean_truncate("Supercalifragilistic"), "Superca...");
        assert_eq!(LabelFormatter::new(2).clean_truncate("abcdef"), "ab");
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(LabelFormatter::new(0).format("Chapa"), "");
    }
}
