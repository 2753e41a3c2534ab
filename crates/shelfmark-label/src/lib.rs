//! In-store label formatting for Shelfmark
//!
//! Shelf labels have a fixed width (36 characters by default). Titles that
//! do not fit are abbreviated, reduced to their most important words, or cut
//! at a word boundary, in that order.

pub mod abbreviations;
pub mod formatter;

pub use abbreviations::abbreviate;
pub use formatter::*;
