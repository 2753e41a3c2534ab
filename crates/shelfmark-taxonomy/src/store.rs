use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{normalize_key, DataLoadError, TaxonomyRecord};

// ============================================================================
// Source format
// ============================================================================

pub const COLUMN_DEPARTMENT: &str = "Departamento";
pub const COLUMN_FAMILY: &str = "Familia";
pub const COLUMN_CATEGORY: &str = "Categoria";
pub const COLUMN_NAMING_TEMPLATE: &str = "Nomenclatura sugerida";
pub const COLUMN_EXAMPLE: &str = "Ejemplo aplicado";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    COLUMN_DEPARTMENT,
    COLUMN_FAMILY,
    COLUMN_CATEGORY,
    COLUMN_NAMING_TEMPLATE,
    COLUMN_EXAMPLE,
];

fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

// ============================================================================
// Store
// ============================================================================

type TripleKey = (String, String, String);

/// Read-only, source-ordered taxonomy with a case-insensitive triple index.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    records: Vec<TaxonomyRecord>,
    index: HashMap<TripleKey, usize>,
}

/// Per-department counts, in source order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentSummary {
    pub department: String,
    pub families: Vec<String>,
    pub record_count: usize,
}

impl TaxonomyStore {
    /// Load a taxonomy CSV from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataLoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "loaded taxonomy"
        );
        Ok(store)
    }

    /// Parse taxonomy CSV from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
        let mut columns = [0usize; 5];
        let mut missing = Vec::new();
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h == name) {
                Some(idx) => columns[slot] = idx,
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(DataLoadError::MissingColumns { missing });
        }

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            if row.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let field = |slot: usize| row.get(columns[slot]).unwrap_or("").trim();
            let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
            for (slot, column) in REQUIRED_COLUMNS.iter().enumerate().take(3) {
                if field(slot).is_empty() {
                    return Err(DataLoadError::EmptyField {
                        row: line,
                        column: *column,
                    });
                }
            }
            records.push(TaxonomyRecord::new(
                field(0),
                field(1),
                field(2),
                field(3),
                field(4),
            ));
        }

        Self::from_records(records)
    }

    /// Build a store from already-constructed records (source order = vector order).
    pub fn from_records(records: Vec<TaxonomyRecord>) -> Result<Self, DataLoadError> {
        let mut store = TaxonomyStore::default();
        for (position, record) in records.into_iter().enumerate() {
            let checks = [
                (record.department_key(), COLUMN_DEPARTMENT),
                (record.family_key(), COLUMN_FAMILY),
                (record.category_key(), COLUMN_CATEGORY),
            ];
            for (value, column) in checks {
                if value.is_empty() {
                    return Err(DataLoadError::EmptyField {
                        row: position + 1,
                        column,
                    });
                }
            }

            let key = (
                record.department_key().to_string(),
                record.family_key().to_string(),
                record.category_key().to_string(),
            );
            store.index.entry(key).or_insert(position);
            store.records.push(record.at_position(position));
        }
        Ok(store)
    }

    pub fn all_records(&self) -> &[TaxonomyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&TaxonomyRecord> {
        self.records.get(position)
    }

    /// Case-insensitive lookup by the full triple. First record in source order wins.
    pub fn find_exact(
        &self,
        department: &str,
        family: &str,
        category: &str,
    ) -> Option<&TaxonomyRecord> {
        let key = (
            normalize_key(department),
            normalize_key(family),
            normalize_key(category),
        );
        self.index.get(&key).map(|&i| &self.records[i])
    }

    /// First record of `department > family` whose category satisfies `predicate`.
    pub fn find_in_family<P>(
        &self,
        department: &str,
        family: &str,
        predicate: P,
    ) -> Option<&TaxonomyRecord>
    where
        P: Fn(&TaxonomyRecord) -> bool,
    {
        let department = normalize_key(department);
        let family = normalize_key(family);
        self.records.iter().find(|r| {
            r.department_key() == department && r.family_key() == family && predicate(r)
        })
    }

    pub fn has_family(&self, department: &str, family: &str) -> bool {
        self.find_in_family(department, family, |_| true).is_some()
    }

    pub fn departments(&self) -> Vec<DepartmentSummary> {
        let mut out: Vec<DepartmentSummary> = Vec::new();
        for record in &self.records {
            let idx = match out
                .iter()
                .position(|d| normalize_key(&d.department) == record.department_key())
            {
                Some(idx) => idx,
                None => {
                    out.push(DepartmentSummary {
                        department: record.department().to_string(),
                        families: Vec::new(),
                        record_count: 0,
                    });
                    out.len() - 1
                }
            };
            let summary = &mut out[idx];
            summary.record_count += 1;
            if !summary
                .families
                .iter()
                .any(|f| normalize_key(f) == record.family_key())
            {
                summary.families.push(record.family().to_string());
            }
        }
        out
    }

    /// `(first, duplicate)` positions of records sharing a triple.
    pub fn duplicate_triples(&self) -> Vec<(usize, usize)> {
        self.records
            .iter()
            .filter_map(|r| {
                let first = self.index.get(&(
                    r.department_key().to_string(),
                    r.family_key().to_string(),
                    r.category_key().to_string(),
                ))?;
                (*first != r.position()).then_some((*first, r.position()))
            })
            .collect()
    }
}
