//! Pretty-print benchmark results with comparison tables, CSV and JSON export.

use crate::{BenchResult, BenchSuite, WorkloadResult};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use std::collections::HashMap;
use std::path::Path;

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

/// Print a comparison table for one workload across all engine configurations.
pub fn print_workload_comparison(workload: &str, results: &[WorkloadResult]) {
    if results.is_empty() {
        return;
    }

    println!("\n{}", format!("━━━ {} ━━━", workload).bold().cyan());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        "Config",
        "Ops",
        "Throughput",
        "p50 (μs)",
        "p99 (μs)",
        "p99.9 (μs)",
        "Mean (μs)",
    ]);

    let best_throughput = results
        .iter()
        .map(|r| r.throughput)
        .fold(0.0f64, f64::max);

    for r in results {
        let is_best = (r.throughput - best_throughput).abs() < 0.01 && r.throughput > 0.0;
        let (name_cell, tp_cell) = if is_best {
            (
                Cell::new(format!("★ {}", r.config_name)).fg(Color::Green),
                Cell::new(format_throughput(r.throughput)).fg(Color::Green),
            )
        } else {
            (
                Cell::new(&r.config_name),
                Cell::new(format_throughput(r.throughput)),
            )
        };

        table.add_row(vec![
            name_cell,
            Cell::new(format_count(r.ops)),
            tp_cell,
            Cell::new(format!("{:.1}", r.p50_us)),
            Cell::new(format!("{:.1}", r.p99_us)),
            Cell::new(format!("{:.1}", r.p999_us)),
            Cell::new(format!("{:.1}", r.mean_us)),
        ]);
    }

    println!("{table}");

    for r in results {
        let mut extra: Vec<String> = r.extra.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        if !extra.is_empty() {
            extra.sort();
            println!("  {} {}", r.config_name.dimmed(), extra.join(", ").dimmed());
        }
    }
}

/// Print the full benchmark suite report.
pub fn print_suite(suite: &BenchSuite) {
    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║          SochDB Similarity Benchmark Report                  ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );

    println!(
        "  OS: {}  Arch: {}  CPUs: {}  Time: {}",
        suite.system_info.os,
        suite.system_info.arch,
        suite.system_info.cpus,
        suite.system_info.timestamp
    );

    let (order, by_workload) = group_by_workload(&suite.results);
    for wl in &order {
        if let Some(results) = by_workload.get(wl) {
            print_workload_comparison(wl, results);
        }
    }

    println!("\n{}", "── Summary: Fastest Config per Workload ──".bold().yellow());
    for wl in &order {
        if let Some(best) = by_workload.get(wl).and_then(|results| {
            results
                .iter()
                .filter(|r| r.throughput > 0.0)
                .max_by(|a, b| a.throughput.total_cmp(&b.throughput))
        }) {
            println!("  {} {}", format!("{:>22}", wl).bold(), best.config_name);
        }
    }
}

/// Group results by workload, preserving first-seen workload order.
fn group_by_workload(
    results: &[WorkloadResult],
) -> (Vec<String>, HashMap<String, Vec<WorkloadResult>>) {
    let mut by_workload: HashMap<String, Vec<WorkloadResult>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for r in results {
        if !by_workload.contains_key(&r.workload) {
            order.push(r.workload.clone());
        }
        by_workload
            .entry(r.workload.clone())
            .or_default()
            .push(r.clone());
    }
    (order, by_workload)
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_csv(suite: &BenchSuite, path: &Path) -> BenchResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "config",
        "workload",
        "ops",
        "total_secs",
        "throughput_ops_sec",
        "p50_us",
        "p99_us",
        "p999_us",
        "mean_us",
        "precision",
        "recall",
    ])?;

    for r in &suite.results {
        let extra = |key: &str| r.extra.get(key).cloned().unwrap_or_default();
        wtr.write_record([
            r.config_name.clone(),
            r.workload.clone(),
            r.ops.to_string(),
            format!("{:.6}", r.total_secs),
            format!("{:.2}", r.throughput),
            format!("{:.2}", r.p50_us),
            format!("{:.2}", r.p99_us),
            format!("{:.2}", r.p999_us),
            format!("{:.2}", r.mean_us),
            extra("precision"),
            extra("recall"),
        ])?;
    }

    wtr.flush()?;
    println!("  CSV exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_json(suite: &BenchSuite, path: &Path) -> BenchResult<()> {
    let json = serde_json::to_string_pretty(suite)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// Formatting helpers
// ────────────────────────────────────────────────────────────────────────────────

fn format_throughput(t: f64) -> String {
    if t >= 1_000_000.0 {
        format!("{:.2}M", t / 1_000_000.0)
    } else if t >= 1_000.0 {
        format!("{:.1}K", t / 1_000.0)
    } else {
        format!("{:.0}", t)
    }
}

fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LatencyRecorder, SystemInfo};
    use std::time::Duration;

    fn suite() -> BenchSuite {
        let mut rec = LatencyRecorder::new();
        rec.record_batch(Duration::from_millis(1), 10);
        BenchSuite {
            system_info: SystemInfo::collect(),
            results: vec![
                WorkloadResult::from_recorder("deflate/mcd", "search_sequential", &rec),
                WorkloadResult::from_recorder("zstd/mcd", "search_sequential", &rec),
                WorkloadResult::from_recorder("deflate/mcd", "duplicate_detection", &rec)
                    .with_extra("precision", "0.950")
                    .with_extra("recall", "0.800"),
            ],
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_throughput(2_500_000.0), "2.50M");
        assert_eq!(format_throughput(1_500.0), "1.5K");
        assert_eq!(format_throughput(12.0), "12");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(12_345), "12.3K");
    }

    #[test]
    fn test_grouping_preserves_order() {
        let (order, groups) = group_by_workload(&suite().results);
        assert_eq!(order, vec!["search_sequential", "duplicate_detection"]);
        assert_eq!(groups["search_sequential"].len(), 2);
    }

    #[test]
    fn test_export_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let suite = suite();

        let csv_path = dir.path().join("results.csv");
        export_csv(&suite, &csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("deflate/mcd,duplicate_detection,10"));
        assert!(text.contains("0.950,0.800"));

        let json_path = dir.path().join("results.json");
        export_json(&suite, &json_path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed["results"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["results"][1]["config_name"], "zstd/mcd");
    }
}
