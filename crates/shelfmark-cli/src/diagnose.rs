//! Taxonomy health and LLM configuration checks (`shelfmark diagnose`).

use serde::Serialize;

use shelfmark_resolver::ResolverConfig;
use shelfmark_synth::template::part_slots;
use shelfmark_taxonomy::TaxonomyStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Finding {
    pub level: &'static str, // "error" | "warning" | "info"
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TaxonomyHealth {
    pub records: usize,
    pub departments: usize,
    pub families: usize,
    pub findings: Vec<Finding>,
}

impl TaxonomyHealth {
    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.level == "error").count()
    }
}

pub(crate) fn check_taxonomy(store: &TaxonomyStore, config: &ResolverConfig) -> TaxonomyHealth {
    let departments = store.departments();
    let families = departments.iter().map(|d| d.families.len()).sum();
    let mut findings = Vec::new();

    if store.is_empty() {
        findings.push(Finding {
            level: "error",
            code: "empty_taxonomy",
            message: "taxonomy has no records".to_string(),
        });
    }

    for (first, dup) in store.duplicate_triples() {
        let path = store.get(dup).map(|r| r.path()).unwrap_or_default();
        findings.push(Finding {
            level: "warning",
            code: "duplicate_triple",
            message: format!("row {} repeats row {}: {path}", dup + 1, first + 1),
        });
    }

    for record in store.all_records() {
        let row = record.position() + 1;
        if record.naming_template().trim().is_empty() {
            findings.push(Finding {
                level: "warning",
                code: "missing_template",
                message: format!("row {row} ({}) has no naming template", record.path()),
            });
            continue;
        }
        let unknown: Vec<&str> = record
            .naming_template()
            .split('+')
            .map(str::trim)
            .filter(|p| !p.is_empty() && part_slots(p).is_empty())
            .collect();
        if !unknown.is_empty() {
            findings.push(Finding {
                level: "info",
                code: "unknown_template_part",
                message: format!(
                    "row {row} ({}): template parts not filled from descriptors: {}",
                    record.path(),
                    unknown.join(", ")
                ),
            });
        }
    }

    if let Err(e) = config.validate() {
        findings.push(Finding {
            level: "error",
            code: "resolver_config",
            message: e.to_string(),
        });
    }

    TaxonomyHealth {
        records: store.len(),
        departments: departments.len(),
        families,
        findings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_taxonomy::TaxonomyRecord;

    #[test]
    fn test_health_flags_duplicates_and_templates() {
        let store = TaxonomyStore::from_records(vec![
            TaxonomyRecord::new("FERRETERIA", "HERRAJES", "CHAPAS", "Tipo + Marca", ""),
            TaxonomyRecord::new("Ferreteria", "Herrajes", "Chapas", "", ""),
            TaxonomyRecord::new("FERRETERIA", "TORNILLERIA", "TORNILLOS", "Tipo + Garantia", ""),
        ])
        .unwrap();
        let health = check_taxonomy(&store, &ResolverConfig::default());

        assert_eq!(health.records, 3);
        assert_eq!(health.departments, 1);
        assert_eq!(health.families, 2);
        let codes: Vec<&str> = health.findings.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec!["duplicate_triple", "missing_template", "unknown_template_part"]
        );
        assert_eq!(health.error_count(), 0);
        assert!(health.findings[2].message.contains("Garantia"));
    }
}
