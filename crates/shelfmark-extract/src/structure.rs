//! Structured-line parsing
//!
//! Some inputs arrive as one line carrying both the product text and its
//! taxonomy placement, e.g.
//!
//! ```text
//! BAMBOO AMARILLO 21X31 PISOS Y PAREDES CERAMICA DE MUROS LISTELOS
//! ```
//!
//! The first taxonomy record whose department, family and category words all
//! occur in the line is taken as the placement. The product title is the text
//! before the earliest of those three phrases.
//!
//! Lines carrying only part of a placement fall back to an indicator table: a
//! whole word such as LISTELOS or PISOS maps to a fixed triple, used when that
//! triple exists in the taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use shelfmark_taxonomy::{normalize_key, TaxonomyRecord, TaxonomyStore};

use crate::{extract_descriptor, upper_tokens, ProductDescriptor};

/// Placement found inside a structured line.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredLine<'a> {
    pub title: String,
    pub record: &'a TaxonomyRecord,
    /// Found through a placement indicator rather than the full placement.
    pub partial: bool,
}

/// Indicator word → taxonomy triple for partial placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementIndicator {
    pub word: String,
    pub department: String,
    pub family: String,
    pub category: String,
}

fn indicator(word: &str, department: &str, family: &str, category: &str) -> PlacementIndicator {
    PlacementIndicator {
        word: word.to_string(),
        department: department.to_string(),
        family: family.to_string(),
        category: category.to_string(),
    }
}

/// Checked in order; the first indicator present whose triple exists wins.
pub fn default_placement_indicators() -> Vec<PlacementIndicator> {
    const WALLS: &str = "CERAMICA DE MUROS Y COMPLEMENTOS";
    vec![
        indicator("LISTELOS", "REVESTIMIENTOS", WALLS, "LISTELOS"),
        indicator("MALLAS", "REVESTIMIENTOS", WALLS, "LISTELOS"),
        indicator("CERAMICA", "REVESTIMIENTOS", "CERAMICA DE PISOS", "BALDOSA"),
        indicator("PISOS", "REVESTIMIENTOS", "CERAMICA DE PISOS", "BALDOSA"),
        indicator("PAREDES", "REVESTIMIENTOS", WALLS, "CERAMICA DE MURO"),
    ]
}

fn significant_words(field: &str) -> impl Iterator<Item = String> + '_ {
    upper_tokens(field)
        .into_iter()
        .filter(|w| w.chars().count() > 2)
}

/// Byte offset in `line` where `phrase` (already normalized) starts, compared
/// case-insensitively.
fn find_phrase(line: &str, phrase: &str) -> Option<usize> {
    if phrase.is_empty() {
        return None;
    }
    line.char_indices()
        .map(|(i, _)| i)
        .find(|&i| normalize_key(&line[i..]).starts_with(phrase))
}

/// Text before `cut`, or the whole line when nothing precedes it.
fn title_before(line: &str, cut: usize) -> String {
    let title = line[..cut].trim();
    let title = if title.is_empty() { line } else { title };
    title.to_string()
}

/// Locate a taxonomy placement inside `line` using the default indicators.
pub fn find_structure<'a>(line: &str, store: &'a TaxonomyStore) -> Option<StructuredLine<'a>> {
    find_structure_with(line, store, &default_placement_indicators())
}

pub fn find_structure_with<'a>(
    line: &str,
    store: &'a TaxonomyStore,
    indicators: &[PlacementIndicator],
) -> Option<StructuredLine<'a>> {
    let line = line.trim();
    let words: HashSet<String> = upper_tokens(line).into_iter().collect();

    let full = store.all_records().iter().find(|r| {
        let mut required = significant_words(r.department())
            .chain(significant_words(r.family()))
            .chain(significant_words(r.category()))
            .peekable();
        required.peek().is_some() && required.all(|w| words.contains(&w))
    });
    let Some(record) = full else {
        return find_partial(line, &words, store, indicators);
    };

    let cut = [
        record.department_key(),
        record.family_key(),
        record.category_key(),
    ]
    .iter()
    .filter_map(|phrase| find_phrase(line, phrase))
    .min()
    .unwrap_or(line.len());

    Some(StructuredLine {
        title: title_before(line, cut),
        record,
        partial: false,
    })
}

fn find_partial<'a>(
    line: &str,
    words: &HashSet<String>,
    store: &'a TaxonomyStore,
    indicators: &[PlacementIndicator],
) -> Option<StructuredLine<'a>> {
    indicators.iter().find_map(|ind| {
        let word = normalize_key(&ind.word);
        if !words.contains(&word) {
            return None;
        }
        let record = store.find_exact(&ind.department, &ind.family, &ind.category)?;
        let cut = find_phrase(line, &word).unwrap_or(line.len());
        Some(StructuredLine {
            title: title_before(line, cut),
            record,
            partial: true,
        })
    })
}

/// Descriptor for a structured line: extraction runs on the title part and the
/// located record becomes the three hints. Lines with no placement fall back
/// to plain extraction of the whole line.
pub fn parse_structured_line(line: &str, store: &TaxonomyStore) -> ProductDescriptor {
    match find_structure(line, store) {
        Some(found) => {
            tracing::debug!(
                title = %found.title,
                category = found.record.category(),
                partial = found.partial,
                "structured line placement"
            );
            let mut d = extract_descriptor(&found.title);
            d.department_hint = Some(found.record.department().to_string());
            d.family_hint = Some(found.record.family().to_string());
            d.category_hint = Some(found.record.category().to_string());
            d
        }
        None => extract_descriptor(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TaxonomyStore {
        TaxonomyStore::from_records(vec![
            TaxonomyRecord::new(
                "PISOS Y PAREDES",
                "CERAMICA DE PISOS",
                "BALDOSA",
                "Tipo + Dimensiones",
                "",
            ),
            TaxonomyRecord::new(
                "PISOS Y PAREDES",
                "CERAMICA DE MUROS",
                "LISTELOS",
                "Tipo + Modelo + Color + Dimensiones",
                "",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_structure_splits_title() {
        let store = store();
        let found = find_structure(
            "BAMBOO AMARILLO 21X31 PISOS Y PAREDES CERAMICA DE MUROS LISTELOS",
            &store,
        )
        .unwrap();
        assert_eq!(found.title, "BAMBOO AMARILLO 21X31");
        assert_eq!(found.record.category(), "LISTELOS");
    }

    #[test]
    fn test_parse_structured_line_sets_hints() {
        let store = store();
        let d = parse_structured_line(
            "Bamboo Amarillo 21x31 pisos y paredes ceramica de muros listelos",
            &store,
        );
        assert_eq!(d.raw_title(), "Bamboo Amarillo 21x31");
        assert_eq!(d.category_hint.as_deref(), Some("LISTELOS"));
        assert_eq!(d.family_hint.as_deref(), Some("CERAMICA DE MUROS"));
        assert_eq!(d.dimensions.as_deref(), Some("21x31"));
        assert_eq!(d.color.as_deref(), Some("Amarillo"));
    }

    fn wall_store() -> TaxonomyStore {
        TaxonomyStore::from_records(vec![
            TaxonomyRecord::new("REVESTIMIENTOS", "CERAMICA DE PISOS", "BALDOSA", "Tipo", ""),
            TaxonomyRecord::new(
                "Revestimientos",
                "Ceramica de Muros y Complementos",
                "Listelos",
                "Tipo + Modelo",
                "",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_indicator_word_gives_partial_placement() {
        let store = wall_store();
        let found = find_structure("BAMBOO AMARILLO 21X31 MALLAS DECORATIVAS", &store).unwrap();
        assert!(found.partial);
        assert_eq!(found.title, "BAMBOO AMARILLO 21X31");
        assert_eq!(found.record.category(), "Listelos");

        let d = parse_structured_line("Capri gris pisos", &store);
        assert_eq!(d.category_hint.as_deref(), Some("BALDOSA"));
        assert_eq!(d.raw_title(), "Capri gris");
    }

    #[test]
    fn test_indicator_needs_existing_triple_and_whole_word() {
        let store = wall_store();
        // PAREDES maps to CERAMICA DE MURO, absent here
        assert!(find_structure("Azulejo blanco paredes", &store).is_none());
        assert!(find_structure("Tapete antiderrapante PISOSX", &store).is_none());

        let custom = [PlacementIndicator {
            word: "paredes".into(),
            department: "revestimientos".into(),
            family: "ceramica de pisos".into(),
            category: "baldosa".into(),
        }];
        let found = find_structure_with("Azulejo blanco paredes", &store, &custom).unwrap();
        assert_eq!(found.record.category(), "BALDOSA");
    }

    #[test]
    fn test_full_placement_is_not_partial() {
        let store = store();
        let found = find_structure(
            "BAMBOO AMARILLO 21X31 PISOS Y PAREDES CERAMICA DE MUROS LISTELOS",
            &store,
        )
        .unwrap();
        assert!(!found.partial);
    }

    #[test]
    fn test_unstructured_line_falls_back() {
        let store = store();
        let d = parse_structured_line("Martillo de uña 16oz", &store);
        assert_eq!(d.raw_title(), "Martillo de uña 16oz");
        assert!(d.category_hint.is_none());
    }
}
