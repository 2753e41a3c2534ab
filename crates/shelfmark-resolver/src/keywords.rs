//! Per-record keyword sets for the KEYWORD strategy.
//!
//! Built once per taxonomy: the category's own tokens (connectors dropped)
//! plus every synonym entry whose trigger substring occurs in the category.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use shelfmark_extract::{upper_tokens, vocabulary::is_connector};
use shelfmark_taxonomy::TaxonomyStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymEntry {
    /// Upper-case substrings looked up in the category key.
    pub category_contains: Vec<String>,
    pub keywords: Vec<String>,
}

fn entry(keys: &[&str], keywords: &[&str]) -> SynonymEntry {
    SynonymEntry {
        category_contains: keys.iter().map(|s| (*s).to_string()).collect(),
        keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
    }
}

pub fn default_synonyms() -> Vec<SynonymEntry> {
    vec![
        // hardware / locks
        entry(
            &["CHAPA", "CERRADURA"],
            &["MANIJA", "PICAPORTE", "HERRAJE", "PUERTA", "HANDLE", "LATCH", "LOCK"],
        ),
        entry(&["HERRAJE", "HARDWARE"], &["FITTING", "HANDLE", "LATCH", "HERRAJE"]),
        // fasteners
        entry(
            &["TORNILLO", "FIJACION", "SUJETADOR"],
            &["TOR", "PERNO", "FIJADOR", "SUJECION", "SCREW", "BOLT", "ANCHOR"],
        ),
        entry(&["SCREW", "FASTENER"], &["TORNILLO", "BOLT", "ANCHOR"]),
        // drill bits
        entry(&["BROCA"], &["PUNTA", "MECHA", "PERFORACION", "TIP", "BORE", "BIT"]),
        entry(&["DRILL"], &["BIT", "TIP", "BORE", "BROCA"]),
        // faucets / plumbing
        entry(
            &["GRIFO", "LLAVE", "GRIFERIA"],
            &["AGUA", "PLOMERIA", "GRIFERIA", "WATER", "PLUMBING", "FAUCET"],
        ),
        entry(&["FAUCET", "PLUMBING"], &["WATER", "GRIFO", "LLAVE"]),
        // locations
        entry(&["BAÑO", "BANO"], &["BATHROOM", "SANITARIO", "BAÑO"]),
        entry(&["BATH"], &["BAÑO", "SANITARIO"]),
        entry(&["COCINA"], &["KITCHEN"]),
        entry(&["KITCHEN"], &["COCINA"]),
        entry(&["JARDIN"], &["GARDEN", "EXTERIOR"]),
        entry(&["GARDEN"], &["JARDIN", "OUTDOOR"]),
    ]
}

/// Keyword set per record, indexed by record position.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    sets: Vec<BTreeSet<String>>,
}

impl KeywordIndex {
    pub fn build(store: &TaxonomyStore, synonyms: &[SynonymEntry]) -> Self {
        let sets = store
            .all_records()
            .iter()
            .map(|record| {
                let category = record.category_key();
                let mut set: BTreeSet<String> = upper_tokens(category)
                    .into_iter()
                    .filter(|t| !is_connector(t))
                    .collect();
                for syn in synonyms {
                    if syn
                        .category_contains
                        .iter()
                        .any(|k| category.contains(k.as_str()))
                    {
                        set.extend(syn.keywords.iter().map(|k| k.to_uppercase()));
                    }
                }
                set
            })
            .collect();
        Self { sets }
    }

    pub fn keywords(&self, position: usize) -> Option<&BTreeSet<String>> {
        self.sets.get(position)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
