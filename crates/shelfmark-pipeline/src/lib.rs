//! Shelfmark pipeline
//!
//! Orchestrates one title through the whole chain:
//! - descriptor extraction (plain or structured input lines)
//! - category resolution
//! - optional research enrichment
//! - title synthesis, generative first with the naming template as fallback
//! - shelf-label formatting
//!
//! Also hosts batch input (`.csv` / `.txt`), results output (CSV / JSON) and
//! the batch quality review.

pub mod input;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod review;

pub use input::{read_titles, InputFormat};
pub use outcome::*;
pub use output::{write_csv, write_csv_file, write_json_file, ResultRow};
pub use pipeline::*;
pub use review::{assess, render_review_text, BatchReview, ItemQuality, QualityThresholds};
