use std::io::Write;
use std::sync::Arc;

use approx::assert_relative_eq;
use shelfmark_extract::{extract_descriptor, DomainTerm, ProductDescriptor};
use shelfmark_resolver::{BonusRule, CategoryResolver, ResolverConfig, Strategy};
use shelfmark_taxonomy::{TaxonomyRecord, TaxonomyStore};

// ============================================================================
// Fixtures
// ============================================================================

fn record(d: &str, f: &str, c: &str) -> TaxonomyRecord {
    TaxonomyRecord::new(d, f, c, "Tipo + Marca + Dimensiones", "")
}

fn hardware_store() -> Arc<TaxonomyStore> {
    Arc::new(
        TaxonomyStore::from_records(vec![
            TaxonomyRecord::new(
                "Construction Materials",
                "Insulation",
                "Fiberglass",
                "Type + Dimensions + Color",
                "Fiberglass R-13 15x93x3.5 Gray",
            ),
            record("FERRETERIA", "HERRAMIENTAS", "BROCAS PARA METAL"),
            record("FERRETERIA", "TORNILLERIA", "TORNILLOS AUTORROSCANTES"),
            record("FERRETERIA", "HERRAJES", "CHAPAS Y CERRADURAS"),
            record("PLOMERIA", "GRIFERIA", "LLAVES DE AGUA"),
            record("REVESTIMIENTOS", "CERAMICA DE PISOS", "BALDOSAS CERAMICAS"),
            record("REVESTIMIENTOS", "CERAMICA DE PISOS", "MADERAS"),
        ])
        .unwrap(),
    )
}

fn resolver() -> CategoryResolver {
    CategoryResolver::new(hardware_store())
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn fiberglass_title_resolves_by_keyword() {
    let d = extract_descriptor("fiberglass r13 gray 15x93x3.5 owens corning");
    let m = resolver().resolve(&d).expect("should match");

    assert_eq!(m.record.category(), "Fiberglass");
    assert_eq!(m.strategy, Strategy::Keyword);
    assert!(m.confidence > 0.2);
}

#[test]
fn unrelated_title_is_no_match() {
    let d = extract_descriptor("zzzz qqqq");
    assert!(resolver().resolve(&d).is_none());

    let trace = resolver().explain(&d);
    assert!(trace.result.is_none());
    assert_eq!(trace.attempts.len(), Strategy::CASCADE.len());
    assert!(trace.attempts.iter().all(|a| !a.accepted));
}

#[test]
fn screw_with_drill_tip_prefers_screw_category() {
    let d = extract_descriptor("TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2");
    let m = resolver().resolve(&d).unwrap();

    assert_eq!(m.record.category(), "TORNILLOS AUTORROSCANTES");
    assert_eq!(m.strategy, Strategy::DomainAware);
    assert_relative_eq!(m.raw_score, 150.0);
    assert_relative_eq!(m.confidence, 1.0);
    assert_eq!(m.detail.as_deref(), Some("rules: self-drilling-screw"));
}

#[test]
fn without_rules_screw_and_drill_tie_goes_to_first_record() {
    let config = ResolverConfig {
        bonus_rules: Vec::new(),
        penalty_rules: Vec::new(),
        ..Default::default()
    };
    let resolver = CategoryResolver::with_config(hardware_store(), config);
    let d = extract_descriptor("TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2");
    let m = resolver.resolve(&d).unwrap();

    // both score 50: BROCAS comes first in source order
    assert_eq!(m.record.category(), "BROCAS PARA METAL");
    assert_relative_eq!(m.confidence, 0.5);
}

#[test]
fn door_lock_is_not_plumbing() {
    let d = extract_descriptor("CHAPA BARI DE BAÑO CROMO COBRE ANTIGUO");
    let m = resolver().resolve(&d).unwrap();
    assert_eq!(m.record.category(), "CHAPAS Y CERRADURAS");
    assert_eq!(m.strategy, Strategy::DomainAware);
}

// ============================================================================
// Cascade properties
// ============================================================================

#[test]
fn exact_hints_win_over_everything() {
    let d = extract_descriptor("TOR. PUNTA DE BROCA").with_hints(
        "ferreteria",
        "Herramientas",
        "brocas para metal",
    );
    let m = resolver().resolve(&d).unwrap();
    assert_eq!(m.strategy, Strategy::Exact);
    assert_eq!(m.record.category(), "BROCAS PARA METAL");
    assert_eq!(m.confidence, 1.0);
}

#[test]
fn unknown_exact_hints_fall_through() {
    let d = extract_descriptor("fiberglass batt").with_hints("X", "Y", "Z");
    let trace = resolver().explain(&d);
    assert!(!trace.attempts[0].accepted);
    assert!(trace.attempts[0].skipped.is_none());
    assert_eq!(trace.result.unwrap().strategy, Strategy::Keyword);
}

#[test]
fn pattern_override_runs_before_domain_rules() {
    let d = extract_descriptor("CHAPA BAMBOO 60x60");
    assert!(!d.detected_domain_terms.is_empty());

    let m = resolver().resolve(&d).unwrap();
    assert_eq!(m.strategy, Strategy::PatternOverride);
    assert_eq!(m.record.category(), "MADERAS");
    assert_eq!(m.confidence, 0.95);
}

#[test]
fn tile_size_alone_resolves_to_generic_tile() {
    let d = extract_descriptor("Piso Beige 45x45");
    let m = resolver().resolve(&d).unwrap();
    assert_eq!(m.strategy, Strategy::PatternOverride);
    assert_eq!(m.record.category(), "BALDOSAS CERAMICAS");
    assert_eq!(m.confidence, 0.85);
}

#[test]
fn domain_match_beats_later_keyword_match() {
    let d = extract_descriptor("TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2");
    let trace = resolver().explain(&d);
    let strategies: Vec<Strategy> = trace.attempts.iter().map(|a| a.strategy).collect();
    assert_eq!(
        strategies,
        vec![Strategy::Exact, Strategy::PatternOverride, Strategy::DomainAware]
    );
}

// ============================================================================
// Threshold boundary
// ============================================================================

fn widget_resolver(bonus: f64) -> CategoryResolver {
    let store = Arc::new(
        TaxonomyStore::from_records(vec![
            record("A", "B", "WIDGETS"),
            record("A", "B", "GADGETS"),
        ])
        .unwrap(),
    );
    let config = ResolverConfig {
        bonus_rules: vec![BonusRule {
            name: "widget-marker".into(),
            group: None,
            when_tags: vec!["widget-marker".into()],
            category_all: Vec::new(),
            category_any: vec!["WIDGETS".into()],
            bonus,
        }],
        penalty_rules: Vec::new(),
        ..Default::default()
    };
    CategoryResolver::with_config(store, config)
}

fn widget_descriptor() -> ProductDescriptor {
    let mut d = ProductDescriptor::new("zzzz");
    d.push_domain_term(DomainTerm {
        token: "QQQ".into(),
        tag: "widget-marker".into(),
        gloss: "QQQ".into(),
    });
    d
}

#[test]
fn domain_score_of_exactly_thirty_is_rejected() {
    let resolver = widget_resolver(30.0);
    let trace = resolver.explain(&widget_descriptor());

    let domain = trace
        .attempts
        .iter()
        .find(|a| a.strategy == Strategy::DomainAware)
        .unwrap();
    assert_relative_eq!(domain.confidence, 0.3);
    assert!(!domain.accepted);
    assert!(trace.result.is_none());
}

#[test]
fn domain_score_of_thirty_one_is_accepted() {
    let resolver = widget_resolver(31.0);
    let m = resolver.resolve(&widget_descriptor()).unwrap();
    assert_eq!(m.strategy, Strategy::DomainAware);
    assert_eq!(m.record.category(), "WIDGETS");
    assert_relative_eq!(m.confidence, 0.31);
}

// ============================================================================
// Determinism and tie-breaks
// ============================================================================

#[test]
fn keyword_ties_go_to_earliest_record() {
    let store = Arc::new(
        TaxonomyStore::from_records(vec![
            record("A", "ACERO", "CLAVOS"),
            record("A", "GALVANIZADO", "CLAVOS"),
        ])
        .unwrap(),
    );
    let m = CategoryResolver::new(store)
        .resolve(&extract_descriptor("clavos 2 pulgadas"))
        .unwrap();
    assert_eq!(m.record.position(), 0);
    assert_eq!(m.record.family(), "ACERO");
}

#[test]
fn resolution_is_deterministic_across_threads() {
    let resolver = Arc::new(resolver());
    let titles = [
        "fiberglass r13 gray 15x93x3.5 owens corning",
        "TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2",
        "CHAPA BARI DE BAÑO CROMO COBRE ANTIGUO",
        "zzzz",
    ];
    let expected: Vec<_> = titles
        .iter()
        .map(|t| resolver.resolve(&extract_descriptor(t)))
        .collect();

    std::thread::scope(|s| {
        for _ in 0..4 {
            let resolver = Arc::clone(&resolver);
            let expected = &expected;
            s.spawn(move || {
                for (t, want) in titles.iter().zip(expected) {
                    assert_eq!(&resolver.resolve(&extract_descriptor(t)), want);
                }
            });
        }
    });
}

#[test]
fn resolver_config_loads_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "domain_aware": {{ "normalizer": 200.0, "threshold": 0.3 }} }}"#
    )
    .unwrap();
    let config = ResolverConfig::load(file.path()).unwrap();
    let resolver = CategoryResolver::with_config(hardware_store(), config);

    let m = resolver
        .resolve(&extract_descriptor("TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2"))
        .unwrap();
    assert_relative_eq!(m.confidence, 0.75);
}

// ============================================================================
// Domain overlap
// ============================================================================

#[test]
fn abbreviation_inside_unrelated_category_word_does_not_count() {
    // TOR occurs inside CONECTORES; only its gloss TORNILLO should score.
    let store = Arc::new(
        TaxonomyStore::from_records(vec![
            record("ELECTRICO", "CABLEADO", "CONECTORES"),
            record("FERRETERIA", "TORNILLERIA", "TORNILLOS"),
        ])
        .unwrap(),
    );
    let resolver = CategoryResolver::new(store);
    let trace = resolver.explain(&extract_descriptor("TOR. CABEZA PLANA 1/4 GALV"));

    let domain = trace
        .attempts
        .iter()
        .find(|a| a.strategy == Strategy::DomainAware)
        .unwrap();
    assert!(domain.accepted);
    assert_relative_eq!(domain.raw_score, 50.0);

    let m = trace.result.unwrap();
    assert_eq!(m.strategy, Strategy::DomainAware);
    assert_eq!(m.record.category(), "TORNILLOS");
}

#[test]
fn raw_token_counts_as_whole_category_word() {
    let store = Arc::new(
        TaxonomyStore::from_records(vec![
            record("A", "B", "WIDGETS"),
            record("A", "B", "QQQ SURTIDOS"),
        ])
        .unwrap(),
    );
    let mut d = ProductDescriptor::new("zzzz");
    d.push_domain_term(DomainTerm {
        token: "QQQ".into(),
        tag: "assorted".into(),
        gloss: "VARIOS".into(),
    });
    let m = CategoryResolver::new(store).resolve(&d).unwrap();
    assert_eq!(m.record.category(), "QQQ SURTIDOS");
    assert_relative_eq!(m.confidence, 0.5);
}

// ============================================================================
// Config casing
// ============================================================================

#[test]
fn lowercase_rule_table_fires_like_uppercase() {
    let rule = |needle: &str| {
        format!(
            r#"{{ "bonus_rules": [ {{ "name": "screw-bonus", "when_tags": ["screw"],
                 "category_all": ["{needle}"], "bonus": 80.0 }} ],
                 "penalty_rules": [] }}"#
        )
    };
    let d = extract_descriptor("TOR. CABEZA PLANA 1/4 GALV");
    let score = |json: &str| {
        let config = ResolverConfig::from_json_str(json).unwrap();
        let trace = CategoryResolver::with_config(hardware_store(), config).explain(&d);
        trace
            .attempts
            .iter()
            .find(|a| a.strategy == Strategy::DomainAware)
            .unwrap()
            .raw_score
    };
    assert_relative_eq!(score(&rule("tornillo")), score(&rule("TORNILLO")));
    assert_relative_eq!(score(&rule("tornillo")), 130.0);
}

#[test]
fn lowercase_pattern_lexicon_still_overrides() {
    let config = ResolverConfig::from_json_str(
        r#"{ "pattern_override": { "department": "revestimientos",
             "family": "ceramica de pisos", "lexicon": [["bamboo", "Maderas"]] } }"#,
    )
    .unwrap();
    let m = CategoryResolver::with_config(hardware_store(), config)
        .resolve(&extract_descriptor("BAMBOO AMARILLO"))
        .unwrap();
    assert_eq!(m.strategy, Strategy::PatternOverride);
    assert_eq!(m.record.category(), "MADERAS");
}
