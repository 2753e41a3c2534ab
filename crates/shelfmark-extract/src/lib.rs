//! Descriptor extraction for Shelfmark
//!
//! Turns a raw product title into a typed [`ProductDescriptor`] without any
//! generative-model call:
//! - dimensions, quantity, R-value, color, candidate brand, tile pattern
//! - construction/hardware vocabulary hits (`detected_domain_terms`)
//! - optional structured-line mode that also recovers taxonomy hints

pub mod descriptor;
pub mod extractor;
pub mod structure;
pub mod vocabulary;

pub use descriptor::*;
pub use extractor::*;
pub use structure::*;
