//! Taxonomy store for Shelfmark
//!
//! Loads the fixed catalog of `(department, family, category)` triples, each
//! bound to a naming template and a worked example, from a CSV source:
//!
//! ```text
//! Departamento,Familia,Categoria,Nomenclatura sugerida,Ejemplo aplicado
//! ```
//!
//! The store is read-only after load and is meant to be shared (`Arc`) by any
//! number of concurrent resolver calls.

pub mod error;
pub mod record;
pub mod store;

pub use error::*;
pub use record::*;
pub use store::*;

/// Normalize a taxonomy string for comparison: trim, collapse inner
/// whitespace, upper-case.
pub fn normalize_key(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
