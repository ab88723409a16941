//! Report renderer: aggregates a results table and draws the comparison chart.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::schema::{
    AggregatedStat, EnvironmentInfo, SummaryMeta, SummaryReport, TrialRecord, SCHEMA_VERSION,
    TIME_UNIT,
};
use crate::table::{self, DEFAULT_ENV_PATH, DEFAULT_RESULTS_PATH};
use crate::{env_info, Algorithm, BenchError, Operation, Result};

pub const DEFAULT_CHART_PATH: &str = "benchmark_comparison.svg";

const CHART_SIZE: (u32, u32) = (1000, 700);
const CHART_TITLE: &str = "Ed25519 vs secp256k1";
const Y_LABEL: &str = "Time (µs per operation)";
const BAR_WIDTH: f64 = 0.35;

const ED25519_COLOR: RGBColor = RGBColor(0x4C, 0xAF, 0x50);
const SECP256K1_COLOR: RGBColor = RGBColor(0xFF, 0x70, 0x43);

#[derive(Clone, Debug)]
pub struct ReportPaths {
    pub results: PathBuf,
    pub env: PathBuf,
    pub chart: PathBuf,
}

impl Default for ReportPaths {
    fn default() -> Self {
        Self {
            results: PathBuf::from(DEFAULT_RESULTS_PATH),
            env: PathBuf::from(DEFAULT_ENV_PATH),
            chart: PathBuf::from(DEFAULT_CHART_PATH),
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Group by (operation, algorithm) and compute mean and median per group.
/// Groups come back in operation order, then algorithm order.
pub fn aggregate(records: &[TrialRecord]) -> Vec<AggregatedStat> {
    let mut groups: BTreeMap<(Operation, Algorithm), Vec<f64>> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.operation, r.algorithm))
            .or_default()
            .push(r.elapsed_time);
    }

    groups
        .into_iter()
        .map(|((operation, algorithm), mut times)| {
            times.sort_by(f64::total_cmp);
            let mean = times.iter().sum::<f64>() / times.len() as f64;
            AggregatedStat {
                algorithm,
                operation,
                mean_time: mean,
                median_time: median(&times),
                sample_count: times.len() as u64,
            }
        })
        .collect()
}

/// As [`aggregate`], but every one of the six (algorithm, operation) groups
/// must be present.
pub fn aggregate_complete(records: &[TrialRecord]) -> Result<Vec<AggregatedStat>> {
    let stats = aggregate(records);

    let missing: Vec<String> = Operation::ALL
        .into_iter()
        .flat_map(|op| Algorithm::ALL.into_iter().map(move |alg| (alg, op)))
        .filter(|&(alg, op)| {
            !stats
                .iter()
                .any(|s| s.algorithm == alg && s.operation == op)
        })
        .map(|(alg, op)| format!("{alg}/{op}"))
        .collect();

    if !missing.is_empty() {
        return Err(BenchError::DataIntegrity(format!(
            "results table is missing rows for: {}",
            missing.join(", ")
        )));
    }
    Ok(stats)
}

fn lookup(stats: &[AggregatedStat], algorithm: Algorithm, operation: Operation) -> f64 {
    stats
        .iter()
        .find(|s| s.algorithm == algorithm && s.operation == operation)
        .map(|s| s.mean_time)
        .unwrap_or(0.0)
}

/// Environment table for the chart footer; a missing or broken file only warns.
pub fn load_environment_lenient(path: &Path) -> Option<EnvironmentInfo> {
    match table::read_environment(path) {
        Ok(env) => Some(env),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "environment details unavailable");
            None
        }
    }
}

fn bar_color(algorithm: Algorithm) -> RGBColor {
    match algorithm {
        Algorithm::Ed25519 => ED25519_COLOR,
        Algorithm::Secp256k1 => SECP256K1_COLOR,
    }
}

/// Draw the grouped bar chart as an SVG document.
///
/// `stats` must hold all six groups; see [`aggregate_complete`].
pub fn render_svg(stats: &[AggregatedStat], env: Option<&EnvironmentInfo>) -> Result<String> {
    let series = [Algorithm::Ed25519, Algorithm::Secp256k1];
    let y_max = stats.iter().map(|s| s.mean_time).fold(0.0_f64, f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.15 } else { 1.0 };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let footer_lines = env.map(|e| e.fields().len()).unwrap_or(0) as i32;
        let (plot_area, footer) =
            root.split_vertically(CHART_SIZE.1 as i32 - footer_lines * 14 - 10);

        let mut chart = ChartBuilder::on(&plot_area)
            .caption(CHART_TITLE, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..2.5f64, 0f64..y_top)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(Y_LABEL)
            .x_labels(Operation::ALL.len())
            .x_label_formatter(&|x| {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && (0.0..3.0).contains(&idx) {
                    Operation::ALL[idx as usize].label().to_string()
                } else {
                    String::new()
                }
            })
            .draw()
            .map_err(chart_error)?;

        for (slot, &algorithm) in series.iter().enumerate() {
            let offset = if slot == 0 { -BAR_WIDTH / 2.0 } else { BAR_WIDTH / 2.0 };
            let color = bar_color(algorithm);
            let bars: Vec<(f64, f64)> = Operation::ALL
                .iter()
                .enumerate()
                .map(|(i, &op)| (i as f64 + offset, lookup(stats, algorithm, op)))
                .collect();

            chart
                .draw_series(bars.iter().map(|&(x, v)| {
                    Rectangle::new(
                        [(x - BAR_WIDTH / 2.0, 0.0), (x + BAR_WIDTH / 2.0, v)],
                        color.mix(0.8).filled(),
                    )
                }))
                .map_err(chart_error)?
                .label(algorithm.display_name())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));

            chart
                .draw_series(bars.iter().map(|&(x, v)| {
                    Text::new(
                        format!("{v:.1}"),
                        (x - BAR_WIDTH / 4.0, v + y_top * 0.02),
                        ("sans-serif", 13).into_font(),
                    )
                }))
                .map_err(chart_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;

        if let Some(env) = env {
            for (i, (name, value)) in env.fields().into_iter().enumerate() {
                footer
                    .draw(&Text::new(
                        format!("{name}: {value}"),
                        (10, 14 * i as i32),
                        ("monospace", 12).into_font(),
                    ))
                    .map_err(chart_error)?;
            }
        }

        root.present().map_err(chart_error)?;
    }
    Ok(svg)
}

fn chart_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> BenchError {
    BenchError::Io(io::Error::other(e.to_string()))
}

/// Load, validate and aggregate the results table, then write the chart.
/// Any data problem is reported before the chart file is touched.
pub fn render(paths: &ReportPaths) -> Result<Vec<AggregatedStat>> {
    let records = table::read_results(&paths.results)?;
    info!(rows = records.len(), path = %paths.results.display(), "loaded benchmark data");

    let stats = aggregate_complete(&records)?;
    let env = load_environment_lenient(&paths.env);
    let svg = render_svg(&stats, env.as_ref())?;
    table::write_atomic(&paths.chart, svg.as_bytes())?;
    info!(path = %paths.chart.display(), "chart saved");
    Ok(stats)
}

/// Per-operation comparison: Ed25519 mean, secp256k1 mean, and their ratio.
pub fn comparison_table(stats: &[AggregatedStat]) -> String {
    let mut out = format!(
        "{:<14} {:>14} {:>14} {:>8}\n",
        "Operation", "Ed25519 (us)", "secp256k1 (us)", "Ratio"
    );
    out.push_str(&"-".repeat(53));
    out.push('\n');
    for op in Operation::ALL {
        let ed = lookup(stats, Algorithm::Ed25519, op);
        let secp = lookup(stats, Algorithm::Secp256k1, op);
        let ratio = if ed > 0.0 {
            format!("{:.1}x", secp / ed)
        } else {
            "n/a".to_string()
        };
        out.push_str(&format!(
            "{:<14} {:>14.2} {:>14.2} {:>8}\n",
            op.label(),
            ed,
            secp,
            ratio
        ));
    }
    out
}

pub fn summarize(results: &Path, env: &Path) -> Result<SummaryReport> {
    let records = table::read_results(results)?;
    let stats = aggregate_complete(&records)?;
    Ok(SummaryReport {
        run: SummaryMeta {
            schema_version: SCHEMA_VERSION,
            bench_version: env!("CARGO_PKG_VERSION").to_string(),
            unit: TIME_UNIT.to_string(),
            source: results.display().to_string(),
            timestamp_utc: env_info::now_utc_rfc3339(),
            git_sha: env_info::git_sha_short(),
        },
        stats,
        environment: load_environment_lenient(env),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn rec(algorithm: Algorithm, operation: Operation, elapsed_time: f64) -> TrialRecord {
        TrialRecord {
            algorithm,
            operation,
            elapsed_time,
        }
    }

    fn full_table() -> Vec<TrialRecord> {
        let mut out = Vec::new();
        for alg in Algorithm::ALL {
            for (k, op) in Operation::ALL.into_iter().enumerate() {
                let base = if alg == Algorithm::Secp256k1 { 100.0 } else { 20.0 };
                for t in [1.0, 2.0, 6.0] {
                    out.push(rec(alg, op, base * (k as f64 + 1.0) + t));
                }
            }
        }
        out
    }

    #[test]
    fn mean_and_median_per_group() {
        let stats = aggregate(&[
            rec(Algorithm::Ed25519, Operation::Sign, 4.0),
            rec(Algorithm::Ed25519, Operation::Sign, 1.0),
            rec(Algorithm::Ed25519, Operation::Sign, 10.0),
            rec(Algorithm::Ed25519, Operation::Sign, 3.0),
            rec(Algorithm::Secp256k1, Operation::Keygen, 7.0),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].operation, Operation::Keygen);
        assert_eq!(stats[0].sample_count, 1);
        assert_eq!(stats[0].median_time, 7.0);

        assert_eq!(stats[1].mean_time, 4.5);
        assert_eq!(stats[1].median_time, 3.5);
        assert_eq!(stats[1].sample_count, 4);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let table = full_table();
        let mut reversed = table.clone();
        reversed.reverse();
        assert_eq!(aggregate(&table), aggregate(&reversed));
    }

    #[test]
    fn complete_table_yields_six_groups() {
        let stats = aggregate_complete(&full_table()).unwrap();
        assert_eq!(stats.len(), 6);
        assert!(stats.iter().all(|s| s.sample_count == 3));
        assert_eq!(lookup(&stats, Algorithm::Ed25519, Operation::Keygen), 23.0);
    }

    #[test]
    fn missing_algorithm_names_every_gap() {
        let only_secp: Vec<_> = full_table()
            .into_iter()
            .filter(|r| r.algorithm == Algorithm::Secp256k1)
            .collect();
        let err = aggregate_complete(&only_secp).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, BenchError::DataIntegrity(_)));
        for op in ["keygen", "sign", "verify"] {
            assert!(msg.contains(&format!("ed25519/{op}")), "{msg}");
        }
        assert!(!msg.contains("secp256k1/"));
    }

    #[test]
    fn svg_contains_labels_and_legend() {
        let stats = aggregate_complete(&full_table()).unwrap();
        let svg = render_svg(&stats, None).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(CHART_TITLE));
        assert!(svg.contains("Key Generation"));
        assert!(svg.contains("Verification"));
        assert!(svg.contains("Ed25519"));
        assert!(svg.contains("secp256k1"));
    }

    #[test]
    fn comparison_table_reports_ratio() {
        let stats = aggregate_complete(&full_table()).unwrap();
        let text = comparison_table(&stats);
        // keygen: secp 103, ed 23
        assert!(text.contains("4.5x"), "{text}");
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn render_writes_chart_and_stats() {
        let dir = tempdir().unwrap();
        let paths = ReportPaths {
            results: dir.path().join("r.csv"),
            env: dir.path().join("missing_env.csv"),
            chart: dir.path().join("chart.svg"),
        };
        let env = env_info::capture();
        table::write_tables(&full_table(), &paths.results, &env, &dir.path().join("e.csv"))
            .unwrap();

        let first = render(&paths).unwrap();
        let second = render(&paths).unwrap();
        assert_eq!(first, second);
        assert!(fs::read_to_string(&paths.chart).unwrap().contains("<svg"));
    }

    #[test]
    fn incomplete_table_produces_no_chart() {
        let dir = tempdir().unwrap();
        let paths = ReportPaths {
            results: dir.path().join("r.csv"),
            env: dir.path().join("e.csv"),
            chart: dir.path().join("chart.svg"),
        };
        let rows: Vec<_> = full_table()
            .into_iter()
            .filter(|r| !(r.algorithm == Algorithm::Ed25519 && r.operation == Operation::Verify))
            .collect();
        table::write_tables(&rows, &paths.results, &env_info::capture(), &paths.env).unwrap();

        let err = render(&paths).unwrap_err();
        assert!(err.to_string().contains("ed25519/verify"));
        assert!(!paths.chart.exists());
    }

    #[test]
    fn summary_carries_environment() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("r.csv");
        let env_path = dir.path().join("e.csv");
        let env = env_info::capture();
        table::write_tables(&full_table(), &results, &env, &env_path).unwrap();

        let report = summarize(&results, &env_path).unwrap();
        assert_eq!(report.run.unit, "us");
        assert_eq!(report.stats.len(), 6);
        assert_eq!(report.environment, Some(env));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stats"][0]["operation"], "keygen");
    }
}
