//! Category resolution for Shelfmark
//!
//! Given a [`ProductDescriptor`](shelfmark_extract::ProductDescriptor), pick the
//! single best taxonomy record through a precision-first cascade:
//!
//! 1. EXACT: all three hints name a record (confidence 1.0)
//! 2. PATTERN_OVERRIDE: tile pattern names / characteristic tile sizes
//! 3. DOMAIN_AWARE: vocabulary hits plus the domain rule table
//! 4. KEYWORD: category tokens and synonym expansion
//! 5. FUZZY: partial token overlap, last resort
//!
//! No acceptance is `None`, a normal outcome. Weights, thresholds, rules and
//! synonyms live in [`ResolverConfig`].

pub mod config;
pub mod error;
pub mod keywords;
pub mod pattern;
pub mod resolver;
pub mod rules;
pub mod strategy;
pub mod trace;

pub use config::*;
pub use error::*;
pub use keywords::*;
pub use pattern::{tile_pattern_name, PatternOverrideConfig, PatternTrigger};
pub use resolver::*;
pub use rules::*;
pub use strategy::*;
pub use trace::*;
