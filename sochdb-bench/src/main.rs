//! SochDB Similarity Benchmark Runner
//!
//! Usage:
//!   sochdb-bench                              # every backend and metric
//!   sochdb-bench --backends zstd,lz4          # selected backends
//!   sochdb-bench --metrics mcd --search       # selected workloads
//!   sochdb-bench --corpus 10000 --export out  # larger corpus, export CSV + JSON
//!   RUST_LOG=sochdb_similarity=debug sochdb-bench

use clap::Parser;
use colored::Colorize;
use sochdb_bench::report;
use sochdb_bench::workloads::{self, WorkloadConfig};
use sochdb_bench::{BenchError, BenchResult, BenchSuite, Corpus, SystemInfo, WorkloadResult};
use sochdb_similarity::{Backend, EngineConfig, Metric, SimilarityEngine};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sochdb-bench", about = "SochDB similarity engine benchmark suite")]
struct Cli {
    /// Run all workloads.
    #[arg(long)]
    all: bool,

    /// Run complexity workloads (cold compressed size).
    #[arg(long)]
    complexity: bool,

    /// Run distance workloads (random pairs, text vs random blobs).
    #[arg(long)]
    distance: bool,

    /// Run search workloads (sequential and parallel).
    #[arg(long)]
    search: bool,

    /// Run duplicate-detection quality workload.
    #[arg(long)]
    dedup: bool,

    /// Backends (comma-separated: deflate, zstd, lz4). Defaults to all.
    #[arg(long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Metrics (comma-separated: ncd, mcd). Defaults to all.
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Engine configuration file; its thresholds apply to every run.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tickets in the generated corpus.
    #[arg(long, default_value = "2000")]
    corpus: usize,

    /// Share of tickets generated as near-duplicates.
    #[arg(long, default_value = "0.2")]
    dup_rate: f64,

    /// Queries per search workload.
    #[arg(long, default_value = "50")]
    queries: usize,

    /// Random pairs for the distance workload.
    #[arg(long, default_value = "10000")]
    pairs: usize,

    /// Tickets fed to all-pairs duplicate detection.
    #[arg(long, default_value = "300")]
    dedup_size: usize,

    /// Corpus seed.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Export directory for CSV + JSON results.
    #[arg(long)]
    export: Option<String>,
}

type WorkloadFn = fn(&SimilarityEngine, &Corpus, &WorkloadConfig) -> BenchResult<WorkloadResult>;

fn main() -> BenchResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let run_all = cli.all || (!cli.complexity && !cli.distance && !cli.search && !cli.dedup);
    let run_complexity = run_all || cli.complexity;
    let run_distance = run_all || cli.distance;
    let run_search = run_all || cli.search;
    let run_dedup = run_all || cli.dedup;

    let backends = parse_list(&cli.backends, &Backend::ALL, |b| b.label())?;
    let metrics = parse_list(&cli.metrics, &Metric::ALL, |m| m.name())?;
    let base = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let cfg = WorkloadConfig {
        corpus_size: cli.corpus,
        dup_rate: cli.dup_rate,
        queries: cli.queries,
        pairs: cli.pairs,
        dedup_size: cli.dedup_size,
        seed: cli.seed,
    };

    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║     SochDB Similarity Benchmark Suite                ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );
    println!(
        "  Corpus: {} tickets  DupRate: {:.2}  Queries: {}  Pairs: {}  Seed: {}",
        cfg.corpus_size, cfg.dup_rate, cfg.queries, cfg.pairs, cfg.seed
    );

    let corpus = cfg.corpus()?;
    println!(
        "  Ground truth: {} duplicate pairs",
        corpus.duplicate_pairs()
    );

    let mut engines = Vec::new();
    for &backend in &backends {
        for &metric in &metrics {
            let config = base.with_backend(backend).with_metric(metric);
            engines.push(SimilarityEngine::new(config)?);
        }
    }
    println!(
        "  Configs: {}",
        engines
            .iter()
            .map(sochdb_bench::config_name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut suite = BenchSuite {
        system_info: SystemInfo::collect(),
        results: Vec::new(),
    };

    let mut plan: Vec<(&str, &str, WorkloadFn)> = Vec::new();
    if run_complexity {
        plan.push(("Complexity", "cold_complexity", workloads::cold_complexity));
    }
    if run_distance {
        plan.push(("Distance", "pairwise_distance", workloads::pairwise_distance));
        plan.push(("Distance", "random_blob_distance", workloads::random_blob_distance));
    }
    if run_search {
        plan.push(("Search", "search_sequential", workloads::sequential_search));
        plan.push(("Search", "search_parallel", workloads::parallel_search));
    }
    if run_dedup {
        plan.push(("Dedup", "duplicate_detection", workloads::duplicate_detection));
    }

    let mut section = "";
    for (group, label, workload_fn) in plan {
        if group != section {
            println!("\n{}", format!("▶ {} Workloads", group).bold().green());
            section = group;
        }
        run_workload_across(&engines, &corpus, &cfg, &mut suite.results, label, workload_fn);
    }

    report::print_suite(&suite);

    if let Some(ref dir) = cli.export {
        let export_dir = Path::new(dir);
        std::fs::create_dir_all(export_dir)?;
        report::export_csv(&suite, &export_dir.join("similarity_results.csv"))?;
        report::export_json(&suite, &export_dir.join("similarity_results.json"))?;
    }

    Ok(())
}

/// Resolve names against the known values; empty selects everything.
fn parse_list<T: Copy>(
    names: &[String],
    all: &[T],
    name_of: impl Fn(&T) -> &'static str,
) -> BenchResult<Vec<T>> {
    if names.is_empty() {
        return Ok(all.to_vec());
    }
    names
        .iter()
        .map(|name| {
            let name = name.trim().to_lowercase();
            all.iter()
                .copied()
                .find(|v| name_of(v) == name)
                .ok_or_else(|| BenchError::Config(format!("unknown option '{}'", name)))
        })
        .collect()
}

/// Run a single workload function across all engines, collecting results.
///
/// Each engine gets its own cold copy of the corpus so no engine runs on
/// caches another one filled.
fn run_workload_across(
    engines: &[SimilarityEngine],
    corpus: &Corpus,
    cfg: &WorkloadConfig,
    results: &mut Vec<WorkloadResult>,
    label: &str,
    workload_fn: WorkloadFn,
) {
    use std::io::Write;
    print!("  {} ... ", label);
    let _ = std::io::stdout().flush();

    for engine in engines {
        let name = sochdb_bench::config_name(engine);
        let local = corpus.fresh();
        match workload_fn(engine, &local, cfg) {
            Ok(r) => {
                print!("{}:{:.0} ops/s  ", name, r.throughput);
                let _ = std::io::stdout().flush();
                results.push(r);
            }
            Err(e) => {
                print!("{}: ERR({})  ", name, e);
                let _ = std::io::stdout().flush();
            }
        }
    }
    println!();
}
