//! Fixed word lists used by the extractor.
//!
//! - construction/hardware domain vocabulary (token → tag, gloss)
//! - closed color list (Spanish + English)
//! - brand stop-list
//! - tile pattern names

use crate::DomainTerm;

/// `(token, tag, gloss)`.
pub const DOMAIN_VOCABULARY: &[(&str, &str, &str)] = &[
    // door hardware
    ("CHAPA", "door-lock", "CERRADURA"),
    ("CERRADURA", "door-lock", "CERRADURA"),
    ("MANIJA", "door-handle", "MANIJA"),
    ("PICAPORTE", "door-handle", "MANIJA"),
    ("HERRAJE", "hardware", "HERRAJE"),
    // fasteners
    ("TOR", "screw", "TORNILLO"),
    ("TORN", "screw", "TORNILLO"),
    ("TORNILLO", "screw", "TORNILLO"),
    ("AUTORROSCANTE", "screw", "AUTORROSCANTE"),
    ("PERNO", "bolt", "PERNO"),
    ("TUERCA", "nut", "TUERCA"),
    ("ARANDELA", "washer", "ARANDELA"),
    ("TAQUETE", "anchor", "TAQUETE"),
    // cutting / drilling
    ("BROCA", "drill-tip", "BROCA"),
    ("MECHA", "drill-tip", "BROCA"),
    ("PUNTA", "tool-tip", "PUNTA"),
    // plumbing
    ("GRIFO", "faucet", "GRIFO"),
    ("LLAVE", "faucet-or-wrench", "LLAVE"),
    ("MEZCLADORA", "faucet", "MEZCLADORA"),
    ("VALVULA", "valve", "VALVULA"),
    // materials and finishes
    ("GALV", "material-galvanized", "GALVANIZADO"),
    ("GALVANIZADO", "material-galvanized", "GALVANIZADO"),
    ("INOX", "material-stainless", "INOXIDABLE"),
    ("CROMO", "finish-chrome", "CROMO"),
    ("COBRE", "material-copper", "COBRE"),
    // tile patterns
    ("BAMBOO", "tile-pattern", "MADERAS"),
    ("CAPRI", "tile-pattern", "MONOCOLOR"),
    ("CLAY", "tile-pattern", "RUSTICO"),
    // locations
    ("BAÑO", "location-bathroom", "BAÑO"),
    ("BANO", "location-bathroom", "BAÑO"),
    ("COCINA", "location-kitchen", "COCINA"),
    ("JARDIN", "location-garden", "JARDIN"),
];

pub fn lookup_domain_term(token: &str) -> Option<DomainTerm> {
    DOMAIN_VOCABULARY
        .iter()
        .find(|(t, _, _)| *t == token)
        .map(|(t, tag, gloss)| DomainTerm {
            token: (*t).to_string(),
            tag: (*tag).to_string(),
            gloss: (*gloss).to_string(),
        })
}

/// Closed color list, lower case. Scanned left to right over the title, first hit wins.
pub const COLORS: &[&str] = &[
    "blanco", "negro", "azul", "rojo", "verde", "gris", "amarillo", "naranja", "rosa", "cafe",
    "café", "marrón", "marron", "beige", "plata", "dorado", "white", "black", "blue", "red",
    "green", "gray", "grey", "yellow", "orange", "pink", "brown", "silver", "gold",
];

/// Capitalized words that are never a brand.
pub const BRAND_STOP_WORDS: &[&str] = &[
    "para", "con", "sin", "tipo", "marca", "de", "del", "la", "el", "los", "las", "y", "en",
    "the", "for", "with", "and", "of", "kit", "set", "juego", "paquete", "caja",
];

/// Tile pattern name → category of the floor tile family. The resolver's
/// default pattern-override lexicon is built from this table.
pub const TILE_PATTERN_LEXICON: &[(&str, &str)] = &[
    ("BAMBOO", "MADERAS"),
    ("CAPRI", "MONOCOLOR"),
    ("CLAY", "RUSTICO"),
    ("WOOD", "MADERAS"),
    ("STONE", "PIEDRA"),
    ("MARBLE", "MARMOL"),
    ("CEMENT", "CEMENTO"),
];

/// Words that carry no category signal.
pub const CONNECTOR_WORDS: &[&str] = &[
    "Y", "E", "DE", "DEL", "LA", "EL", "LOS", "LAS", "PARA", "CON", "SIN", "EN", "A", "O",
    "AND", "OF", "FOR", "WITH", "THE",
];

pub fn is_connector(token: &str) -> bool {
    CONNECTOR_WORDS.contains(&token)
}
