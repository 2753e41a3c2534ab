//! Batch input
//!
//! - `.txt`: one title per non-blank line
//! - `.csv`: first column of every row; a leading header row is skipped when
//!   its first cell is a known title header
//! - `.xlsx` / `.xls`: rejected, export the sheet as CSV first

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

const TITLE_HEADERS: &[&str] = &[
    "title", "titulo", "título", "titles", "product", "producto", "description", "descripcion",
    "descripción", "original_title", "nombre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Txt,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "txt" => Ok(InputFormat::Txt),
            "xlsx" | "xls" => bail!(
                "Excel input is not supported: export {} as UTF-8 CSV",
                path.display()
            ),
            other => bail!(
                "unsupported input format '{}' for {} (expected .csv or .txt)",
                other,
                path.display()
            ),
        }
    }
}

pub fn titles_from_txt(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn titles_from_csv<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut titles = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("failed to read CSV row {}", i + 1))?;
        let Some(first) = row.get(0) else {
            continue;
        };
        let cell = first.trim_start_matches('\u{feff}').trim();
        if cell.is_empty() {
            continue;
        }
        if i == 0 && TITLE_HEADERS.contains(&cell.to_lowercase().as_str()) {
            continue;
        }
        titles.push(cell.to_string());
    }
    Ok(titles)
}

/// Read every title from `path`, dispatching on the extension.
pub fn read_titles(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read input {}", path.display()))?;
    let titles = match format {
        InputFormat::Txt => {
            let text = String::from_utf8(bytes)
                .with_context(|| format!("{} is not UTF-8 encoded", path.display()))?;
            titles_from_txt(&text)
        }
        InputFormat::Csv => titles_from_csv(bytes.as_slice())
            .with_context(|| format!("failed to parse {}", path.display()))?,
    };
    tracing::info!(path = %path.display(), titles = titles.len(), "read input");
    Ok(titles)
}
