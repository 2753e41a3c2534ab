//! Shelfmark CLI
//!
//! Command-line front end for:
//! - resolving single titles against the taxonomy (with a strategy trace)
//! - inspecting descriptors and shelf labels
//! - batch processing `.csv` / `.txt` title lists into results tables
//! - taxonomy and LLM configuration diagnostics

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shelfmark_extract::{extract_descriptor, parse_structured_line};
use shelfmark_label::{LabelFormatter, DEFAULT_LABEL_WIDTH};
use shelfmark_pipeline::{
    read_titles, render_review_text, write_csv_file, write_json_file, BatchReview, Pipeline,
    PipelineOptions,
};
use shelfmark_resolver::{tile_pattern_name, CategoryResolver, ResolverConfig};
use shelfmark_taxonomy::{normalize_key, TaxonomyStore};

mod diagnose;
mod llm;

const LOG_ENV: &str = "SHELFMARK_LOG";

#[derive(Parser)]
#[command(name = "shelfmark")]
#[command(
    author,
    version,
    about = "Shelfmark: product-title categorization, title synthesis and shelf labels"
)]
struct Cli {
    /// Taxonomy CSV (Departamento, Familia, Categoria, Nomenclatura sugerida, Ejemplo aplicado)
    #[arg(long, global = true, env = "SHELFMARK_TAXONOMY", default_value = "taxonomy.csv")]
    taxonomy: PathBuf,

    /// Resolver config JSON (weights, thresholds, rule tables)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace); SHELFMARK_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one title to a taxonomy category.
    Resolve {
        title: String,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Treat the title as `title DEPARTMENT FAMILY CATEGORY`
        #[arg(long)]
        structured: bool,
        /// Print every strategy attempt
        #[arg(long)]
        explain: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the extracted descriptor of a title as JSON.
    Extract {
        title: String,
        /// Recover hints from a trailing `DEPARTMENT FAMILY CATEGORY` (needs the taxonomy)
        #[arg(long)]
        structured: bool,
    },

    /// Compress a title into a shelf label.
    Label {
        title: String,
        #[arg(long, default_value_t = DEFAULT_LABEL_WIDTH)]
        width: usize,
    },

    /// Process a batch of titles into a results table.
    Process {
        /// Input `.csv` (first column) or `.txt` (one title per line)
        input: PathBuf,
        /// Output results CSV
        #[arg(short, long)]
        out: PathBuf,
        /// Also write full outcomes as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write the quality review (`.json` extension for JSON, text otherwise)
        #[arg(long)]
        report: Option<PathBuf>,
        /// Input lines are `title DEPARTMENT FAMILY CATEGORY`
        #[arg(long)]
        structured: bool,
        /// Title backend: off, auto, openai, anthropic, ollama, mock
        #[arg(long, default_value = "off")]
        llm: String,
        /// Research enrichment before title generation (needs --llm)
        #[arg(long)]
        enrich: bool,
        #[arg(long, default_value_t = DEFAULT_LABEL_WIDTH)]
        width: usize,
        /// Flag matches below this confidence for manual review
        #[arg(long, default_value_t = 0.3)]
        review_below: f64,
    },

    /// List departments, families and categories.
    Categories {
        #[arg(long)]
        department: Option<String>,
    },

    /// Check taxonomy health and LLM configuration.
    Diagnose {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // a second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Resolve {
            ref title,
            ref department,
            ref family,
            ref category,
            structured,
            explain,
            json,
        } => {
            let hints = Hints {
                department: department.as_deref(),
                family: family.as_deref(),
                category: category.as_deref(),
            };
            cmd_resolve(&cli, title, hints, structured, explain, json)
        }
        Commands::Extract {
            ref title,
            structured,
        } => cmd_extract(&cli, title, structured),
        Commands::Label { ref title, width } => {
            cmd_label(title, width);
            Ok(())
        }
        Commands::Process {
            ref input,
            ref out,
            ref json,
            ref report,
            structured,
            ref llm,
            enrich,
            width,
            review_below,
        } => {
            let options = PipelineOptions {
                label_width: width,
                structured,
                enrich,
                review_below,
            };
            cmd_process(&cli, input, out, json.as_deref(), report.as_deref(), llm, options)
        }
        Commands::Categories { ref department } => cmd_categories(&cli, department.as_deref()),
        Commands::Diagnose { json } => cmd_diagnose(&cli, json),
    }
}

// ============================================================================
// Shared setup
// ============================================================================

fn load_store(path: &Path) -> Result<Arc<TaxonomyStore>> {
    let store = TaxonomyStore::load(path)
        .context("failed to load taxonomy (set --taxonomy or SHELFMARK_TAXONOMY)")?;
    Ok(Arc::new(store))
}

fn load_config(rules: Option<&Path>) -> Result<ResolverConfig> {
    match rules {
        Some(path) => Ok(ResolverConfig::load(path)?),
        None => Ok(ResolverConfig::default()),
    }
}

fn load_resolver(cli: &Cli) -> Result<Arc<CategoryResolver>> {
    let store = load_store(&cli.taxonomy)?;
    let config = load_config(cli.rules.as_deref())?;
    Ok(Arc::new(CategoryResolver::with_config(store, config)))
}

// ============================================================================
// Commands
// ============================================================================

struct Hints<'a> {
    department: Option<&'a str>,
    family: Option<&'a str>,
    category: Option<&'a str>,
}

fn cmd_resolve(
    cli: &Cli,
    title: &str,
    hints: Hints<'_>,
    structured: bool,
    explain: bool,
    json: bool,
) -> Result<()> {
    let resolver = load_resolver(cli)?;
    let mut descriptor = if structured {
        parse_structured_line(title, resolver.store())
    } else {
        extract_descriptor(title)
    };
    resolver.tag_tile_pattern(&mut descriptor);
    if let Some(d) = hints.department {
        descriptor.department_hint = Some(d.to_string());
    }
    if let Some(f) = hints.family {
        descriptor.family_hint = Some(f.to_string());
    }
    if let Some(c) = hints.category {
        descriptor.category_hint = Some(c.to_string());
    }

    let trace = resolver.explain(&descriptor);
    if json {
        let text = if explain {
            serde_json::to_string_pretty(&trace)?
        } else {
            serde_json::to_string_pretty(&trace.result)?
        };
        println!("{text}");
        return Ok(());
    }

    if explain {
        print!("{trace}");
        return Ok(());
    }
    match &trace.result {
        Some(m) => println!(
            "{} {} via {} ({:.2})",
            "match".green().bold(),
            m.record.path().bold(),
            m.strategy,
            m.confidence
        ),
        None => println!("{}", "NO_MATCH".yellow().bold()),
    }
    Ok(())
}

fn cmd_extract(cli: &Cli, title: &str, structured: bool) -> Result<()> {
    let mut descriptor = if structured {
        let store = load_store(&cli.taxonomy)?;
        parse_structured_line(title, &store)
    } else {
        extract_descriptor(title)
    };
    if cli.rules.is_some() {
        let config = load_config(cli.rules.as_deref())?;
        descriptor.tile_pattern =
            tile_pattern_name(descriptor.raw_title(), &config.pattern_override);
    }
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}

fn cmd_label(title: &str, width: usize) {
    let label = LabelFormatter::new(width).format_with_step(title);
    println!("{}", label.text);
    tracing::info!(step = ?label.step, chars = label.text.chars().count(), "label");
}

fn cmd_process(
    cli: &Cli,
    input: &Path,
    out: &Path,
    json: Option<&Path>,
    report: Option<&Path>,
    llm_choice: &str,
    options: PipelineOptions,
) -> Result<()> {
    let backend = llm::select_backend(llm::parse_llm_choice(llm_choice)?)?;
    if options.enrich && backend.is_none() {
        bail!("--enrich needs a language-model backend (pass --llm)");
    }

    let resolver = load_resolver(cli)?;
    let titles = read_titles(input)?;
    println!(
        "{} {} titles from {}",
        "Processing".green().bold(),
        titles.len(),
        input.display()
    );

    let mut pipeline = Pipeline::with_options(resolver, options);
    if let Some(backend) = backend {
        pipeline = pipeline.with_backend(backend);
    }
    let outcomes = pipeline.process_batch(&titles);

    create_parent(out)?;
    write_csv_file(out, &outcomes)?;
    println!("  {} {}", "→".cyan(), out.display());

    if let Some(path) = json {
        create_parent(path)?;
        write_json_file(path, &outcomes)?;
        println!("  {} {}", "→".cyan(), path.display());
    }

    let review = BatchReview::from_outcomes(&outcomes);
    if let Some(path) = report {
        create_parent(path)?;
        let is_json = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let text = if is_json {
            serde_json::to_string_pretty(&review)?
        } else {
            render_review_text(&review)
        };
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        println!("  {} {}", "→".cyan(), path.display());
    }

    println!(
        "  {} {}/{} matched, {} need review, {} unmatched",
        "→".yellow(),
        review.successful,
        review.total,
        review.needs_review,
        review.unmatched
    );
    for rec in &review.recommendations {
        println!("  {} {rec}", "•".yellow());
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn cmd_categories(cli: &Cli, department: Option<&str>) -> Result<()> {
    let store = load_store(&cli.taxonomy)?;
    let wanted = department.map(normalize_key);
    let mut shown = 0;
    for summary in store.departments() {
        let dept_key = normalize_key(&summary.department);
        if wanted.as_deref().is_some_and(|w| w != dept_key) {
            continue;
        }
        shown += 1;
        println!(
            "{} ({} categories)",
            summary.department.bold(),
            summary.record_count
        );
        for family in &summary.families {
            println!("  {}", family.cyan());
            let family_key = normalize_key(family);
            for record in store
                .all_records()
                .iter()
                .filter(|r| r.department_key() == dept_key && r.family_key() == family_key)
            {
                println!("    {}", record.category());
            }
        }
    }
    if shown == 0 {
        if let Some(d) = department {
            bail!("no department named '{d}' in {}", cli.taxonomy.display());
        }
    }
    Ok(())
}

fn cmd_diagnose(cli: &Cli, json: bool) -> Result<()> {
    let store = load_store(&cli.taxonomy)?;
    let config = load_config(cli.rules.as_deref())?;
    let health = diagnose::check_taxonomy(&store, &config);
    let statuses = llm::backend_statuses();
    let compiled = llm::compiled_backends();

    if json {
        let llm: Vec<serde_json::Value> = statuses
            .iter()
            .map(|(kind, status)| match status {
                Ok(line) => serde_json::json!({ "backend": kind, "ok": true, "status": line }),
                Err(e) => serde_json::json!({ "backend": kind, "ok": false, "error": e }),
            })
            .collect();
        let out = serde_json::json!({
            "taxonomy": health,
            "llm": llm,
            "compiled_backends": compiled,
            "detected_backend": shelfmark_synth::LlmConfig::detect(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", "taxonomy".bold());
        println!("  path: {}", cli.taxonomy.display());
        println!(
            "  records={} departments={} families={}",
            health.records, health.departments, health.families
        );
        if health.findings.is_empty() {
            println!("  {}", "(no findings)".green());
        }
        for f in &health.findings {
            let level = match f.level {
                "error" => f.level.red().bold(),
                "warning" => f.level.yellow().bold(),
                _ => f.level.normal(),
            };
            println!("  - {level} {}: {}", f.code, f.message);
        }

        println!("\n{}", "llm".bold());
        println!("  compiled: {}", compiled.join(", "));
        for (kind, status) in &statuses {
            match status {
                Ok(line) => println!("  {} {line}", "ok".green().bold()),
                Err(e) => println!("  {} {kind}: {e}", "--".yellow()),
            }
        }
        match shelfmark_synth::LlmConfig::detect() {
            Some(kind) => println!("  auto: {kind}"),
            None => println!("  auto: none (titles come from naming templates)"),
        }
    }

    if health.error_count() > 0 {
        bail!("taxonomy has {} error(s)", health.error_count());
    }
    Ok(())
}
