use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const TAXONOMY: &str = "Departamento,Familia,Categoria,Nomenclatura sugerida,Ejemplo aplicado\n\
Construction Materials,Insulation,Fiberglass,Type + Dimensions + Color,Fiberglass R-13 15x93x3.5 Gray\n\
FERRETERIA,TORNILLERIA,TORNILLOS AUTORROSCANTES,Tipo + Dimensiones + Cantidad,Tornillo 1/4 x 1 100 pzs\n\
FERRETERIA,HERRAMIENTAS,BROCAS PARA METAL,Tipo + Marca + Dimensiones,Broca Truper 1/4\n\
FERRETERIA,HERRAJES,CHAPAS Y CERRADURAS,Tipo + Marca + Color,Chapa Bari Cromo\n";

fn shelfmark_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_shelfmark"))
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let taxonomy = dir.path().join("taxonomy.csv");
    fs::write(&taxonomy, TAXONOMY).expect("write taxonomy");
    (dir, taxonomy)
}

fn run(taxonomy: &Path, args: &[&str]) -> Output {
    Command::new(shelfmark_bin())
        .arg("--taxonomy")
        .arg(taxonomy)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("SHELFMARK_LOG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .output()
        .expect("run shelfmark")
}

fn stdout(out: &Output) -> String {
    assert!(
        out.status.success(),
        "shelfmark failed:\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).to_string()
}

#[test]
fn resolve_prints_the_matched_path() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["resolve", "TOR. PUNTA DE BROCA AR. 1/4 X 1 1/2"]));
    assert!(text.contains("FERRETERIA > TORNILLERIA > TORNILLOS AUTORROSCANTES"));
    assert!(text.contains("DOMAIN_AWARE"));
}

#[test]
fn resolve_json_is_null_for_no_match() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["resolve", "--json", "zzzz qqqq"]));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value.is_null());
}

#[test]
fn resolve_explain_lists_every_strategy() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["resolve", "--explain", "fiberglass r13 gray 15x93x3.5"]));
    for name in ["EXACT", "PATTERN_OVERRIDE", "DOMAIN_AWARE", "KEYWORD", "FUZZY"] {
        assert!(text.contains(name), "missing {name} in:\n{text}");
    }
}

#[test]
fn label_respects_width() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(
        &taxonomy,
        &["label", "--width", "20", "Fibra de Vidrio Owens Corning R-13 15x93x3.5 Gris"],
    ));
    let label = text.trim_end();
    assert!(!label.is_empty());
    assert!(label.chars().count() <= 20, "label too long: {label:?}");
}

#[test]
fn extract_prints_descriptor_json() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["extract", "fiberglass r13 gray 15x93x3.5"]));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["dimensions"], "15x93x3.5");
}

#[test]
fn process_writes_results_and_report() {
    let (dir, taxonomy) = workspace();
    let input = dir.path().join("titles.txt");
    fs::write(
        &input,
        "fiberglass r13 gray 15x93x3.5 owens corning\nCHAPA BARI DE BAÑO CROMO\nzzzz qqqq\n",
    )
    .unwrap();
    let out = dir.path().join("out/results.csv");
    let report = dir.path().join("out/review.json");

    let text = stdout(&run(
        &taxonomy,
        &[
            "process",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--llm",
            "mock",
        ],
    ));
    assert!(text.contains("2/3 matched"));

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    assert_eq!(rdr.records().count(), 3);

    let review: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(review["total"], 3);
    assert_eq!(review["unmatched"], 1);
}

#[test]
fn process_rejects_enrich_without_backend() {
    let (dir, taxonomy) = workspace();
    let input = dir.path().join("titles.txt");
    fs::write(&input, "CHAPA BARI\n").unwrap();
    let out = run(
        &taxonomy,
        &[
            "process",
            input.to_str().unwrap(),
            "--out",
            dir.path().join("r.csv").to_str().unwrap(),
            "--enrich",
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--enrich needs"));
}

#[test]
fn categories_filters_by_department() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["categories", "--department", "ferreteria"]));
    assert!(text.contains("TORNILLOS AUTORROSCANTES"));
    assert!(!text.contains("Fiberglass"));
}

#[test]
fn diagnose_json_reports_taxonomy_size() {
    let (_dir, taxonomy) = workspace();
    let text = stdout(&run(&taxonomy, &["diagnose", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["taxonomy"]["records"], 4);
    assert_eq!(value["taxonomy"]["departments"], 2);
    assert!(value["detected_backend"].is_null());
}

#[test]
fn missing_taxonomy_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&dir.path().join("nope.csv"), &["categories"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to load taxonomy"));
}

#[test]
fn verbose_run_logs_taxonomy_load_once() {
    let (_dir, taxonomy) = workspace();
    let out = run(&taxonomy, &["-v", "categories"]);
    stdout(&out);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("loaded taxonomy").count(), 1, "stderr:\n{stderr}");
    assert!(!stderr.contains("taxonomy loaded"));
}

#[test]
fn extract_tile_pattern_follows_rules_lexicon() {
    let (dir, taxonomy) = workspace();
    let rules = dir.path().join("rules.json");
    fs::write(&rules, r#"{ "pattern_override": { "lexicon": [["onyx", "marmol"]] } }"#).unwrap();

    let default = stdout(&run(&taxonomy, &["extract", "Piso onyx 60x60"]));
    let value: serde_json::Value = serde_json::from_str(&default).unwrap();
    assert!(value.get("tile_pattern").is_none());

    let out = Command::new(shelfmark_bin())
        .arg("--taxonomy")
        .arg(&taxonomy)
        .arg("--rules")
        .arg(&rules)
        .args(["extract", "Piso onyx 60x60"])
        .env_remove("SHELFMARK_LOG")
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["tile_pattern"], "ONYX");
}
