//! Rule-based descriptor extraction
//!
//! Every function here is total: malformed or empty input yields `None`
//! (or an empty descriptor), never a panic.

use regex::Regex;
use std::sync::OnceLock;

use crate::vocabulary::{lookup_domain_term, BRAND_STOP_WORDS, COLORS, TILE_PATTERN_LEXICON};
use crate::ProductDescriptor;

// ============================================================================
// Patterns
// ============================================================================

const DIMENSIONS_PATTERN: &str = r#"(?i)\d+(?:\.\d+)?\s*(?:cm|mm|"|')?\s*[x×]\s*\d+(?:\.\d+)?\s*(?:cm|mm|"|')?(?:\s*[x×]\s*\d+(?:\.\d+)?\s*(?:cm|mm|"|')?)?"#;
const QUANTITY_PATTERN: &str =
    r"(?i)\b(\d+)\s*(pzs|pz|piezas|pieza|unidades|unidad|un|pcs|pieces)\b";
const R_VALUE_PATTERN: &str = r"(?i)\bR-?\s*\d+\b";

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid extraction pattern");
            None
        }
    })
    .as_ref()
}

fn dimensions_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, DIMENSIONS_PATTERN)
}

fn quantity_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, QUANTITY_PATTERN)
}

fn r_value_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, R_VALUE_PATTERN)
}

// ============================================================================
// Tokens
// ============================================================================

/// Strip leading/trailing punctuation from a whitespace-delimited word.
pub fn clean_token(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Whitespace tokens, edge punctuation stripped, upper-cased, empties dropped.
pub fn upper_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// `tornillo` / `TORNILLO` -> `Tornillo`.
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

// ============================================================================
// Field extractors
// ============================================================================

/// First `<n>x<n>` or `<n>x<n>x<n>` run, verbatim.
pub fn extract_dimensions(title: &str) -> Option<String> {
    dimensions_re()?
        .find(title)
        .map(|m| m.as_str().trim().to_string())
}

pub fn extract_quantity(title: &str) -> Option<String> {
    quantity_re()?
        .find(title)
        .map(|m| m.as_str().trim().to_string())
}

pub fn extract_r_value(title: &str) -> Option<String> {
    r_value_re()?
        .find(title)
        .map(|m| m.as_str().trim().to_string())
}

/// First whole-word color, title-cased.
pub fn extract_color(title: &str) -> Option<String> {
    title
        .split_whitespace()
        .map(|w| clean_token(w).to_lowercase())
        .find(|w| COLORS.contains(&w.as_str()))
        .map(|w| title_case(&w))
}

/// First capitalized alphabetic token (len > 2) among the first three tokens
/// that is not a stop word.
pub fn extract_brand(title: &str) -> Option<String> {
    title
        .split_whitespace()
        .take(3)
        .find(|w| {
            w.chars().next().is_some_and(char::is_uppercase)
                && w.chars().all(char::is_alphabetic)
                && w.chars().count() > 2
                && !BRAND_STOP_WORDS.contains(&w.to_lowercase().as_str())
        })
        .map(str::to_string)
}

/// First whole word of `title`, upper-cased, accepted by `is_pattern`.
pub fn find_tile_pattern<F>(title: &str, is_pattern: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    upper_tokens(title).into_iter().find(|t| is_pattern(t.as_str()))
}

pub fn extract_tile_pattern(title: &str) -> Option<String> {
    find_tile_pattern(title, |t| TILE_PATTERN_LEXICON.iter().any(|(p, _)| *p == t))
}

// ============================================================================
// Descriptor
// ============================================================================

/// Build a descriptor from a raw title.
pub fn extract_descriptor(raw_title: &str) -> ProductDescriptor {
    let mut d = ProductDescriptor::new(raw_title);
    let title = raw_title.trim();
    if title.is_empty() {
        return d;
    }

    d.description = Some(title.to_string());
    d.dimensions = extract_dimensions(title);
    d.quantity = extract_quantity(title);
    d.r_value = extract_r_value(title);
    d.color = extract_color(title);
    d.brand = extract_brand(title);
    d.tile_pattern = extract_tile_pattern(title);

    for token in upper_tokens(title) {
        if let Some(term) = lookup_domain_term(&token) {
            d.push_domain_term(term);
        }
    }

    tracing::debug!(
        title,
        domain_terms = d.detected_domain_terms.len(),
        dimensions = ?d.dimensions,
        "extracted descriptor"
    );
    d
}
