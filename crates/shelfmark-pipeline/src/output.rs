use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::review::{assess, QualityThresholds};
use crate::ItemOutcome;

/// One flat results-table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub item: usize,
    pub original_title: String,
    pub success: bool,
    pub status: &'static str,
    pub optimized_title: String,
    pub store_label: String,
    pub department: String,
    pub family: String,
    pub category: String,
    pub strategy: String,
    pub confidence: f64,
    pub title_source: &'static str,
    pub quality_score: f64,
    pub errors: String,
}

impl ResultRow {
    pub fn from_outcome(outcome: &ItemOutcome, thresholds: &QualityThresholds) -> Self {
        let (department, family, category, strategy, confidence) = match &outcome.resolution {
            Some(m) => (
                m.record.department().to_string(),
                m.record.family().to_string(),
                m.record.category().to_string(),
                m.strategy.to_string(),
                m.confidence,
            ),
            None => (String::new(), String::new(), String::new(), String::new(), 0.0),
        };
        Self {
            item: outcome.item,
            original_title: outcome.raw_title.clone(),
            success: outcome.is_success(),
            status: outcome.status.as_str(),
            optimized_title: outcome.title.clone().unwrap_or_default(),
            store_label: outcome.label.clone().unwrap_or_default(),
            department,
            family,
            category,
            strategy,
            confidence,
            title_source: outcome.title_source.map(|s| s.as_str()).unwrap_or_default(),
            quality_score: assess(outcome, thresholds).score,
            errors: outcome.errors.join("; "),
        }
    }
}

pub fn result_rows(outcomes: &[ItemOutcome]) -> Vec<ResultRow> {
    let thresholds = QualityThresholds::default();
    outcomes
        .iter()
        .map(|o| ResultRow::from_outcome(o, &thresholds))
        .collect()
}

pub fn write_csv<W: Write>(writer: W, outcomes: &[ItemOutcome]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in result_rows(outcomes) {
        wtr.serialize(&row)
            .with_context(|| format!("failed to write result row {}", row.item))?;
    }
    wtr.flush().context("failed to flush results")?;
    Ok(())
}

pub fn write_csv_file(path: impl AsRef<Path>, outcomes: &[ItemOutcome]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(BufWriter::new(file), outcomes)?;
    tracing::info!(path = %path.display(), rows = outcomes.len(), "wrote results CSV");
    Ok(())
}

/// Full outcomes (descriptor, match, title, label) as pretty JSON.
pub fn write_json_file(path: impl AsRef<Path>, outcomes: &[ItemOutcome]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, outcomes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    tracing::info!(path = %path.display(), items = outcomes.len(), "wrote results JSON");
    Ok(())
}
