use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use curve_sig_bench::harness::{BenchConfig, DEFAULT_TRIAL_COUNT, DEFAULT_WARMUP_COUNT};
use curve_sig_bench::report::{self, ReportPaths, DEFAULT_CHART_PATH};
use curve_sig_bench::runner::{self, OutputPaths};
use curve_sig_bench::table::{DEFAULT_ENV_PATH, DEFAULT_RESULTS_PATH};
use curve_sig_bench::Algorithm;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
enum Command {
    /// Time keygen/sign/verify and write the results and environment tables.
    Run {
        /// Timed trials per (algorithm, operation).
        #[arg(long, short = 'n', default_value_t = DEFAULT_TRIAL_COUNT)]
        trials: u64,

        /// Untimed calls before each operation's trials.
        #[arg(long, default_value_t = DEFAULT_WARMUP_COUNT)]
        warmup: u64,

        /// Algorithm to benchmark. Repeat to select several; defaults to all.
        #[arg(long = "algorithm", short = 'a', value_enum, action = clap::ArgAction::Append)]
        algorithms: Vec<Algorithm>,

        /// Seed for key material.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, value_name = "FILE", default_value = DEFAULT_RESULTS_PATH)]
        results: PathBuf,

        #[arg(long, value_name = "FILE", default_value = DEFAULT_ENV_PATH)]
        env: PathBuf,
    },

    /// Draw the grouped bar chart from a results table.
    Render {
        #[arg(long, value_name = "FILE", default_value = DEFAULT_RESULTS_PATH)]
        results: PathBuf,

        /// Environment table shown under the chart; optional.
        #[arg(long, value_name = "FILE", default_value = DEFAULT_ENV_PATH)]
        env: PathBuf,

        /// Where to write the SVG chart.
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CHART_PATH)]
        out: PathBuf,
    },

    /// Print the per-operation comparison and emit aggregated stats as JSON.
    Summary {
        #[arg(long, value_name = "FILE", default_value = DEFAULT_RESULTS_PATH)]
        results: PathBuf,

        #[arg(long, value_name = "FILE", default_value = DEFAULT_ENV_PATH)]
        env: PathBuf,

        /// Where to write the JSON report. If omitted, prints to stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "curve-sig-bench")]
#[command(about = "secp256k1 vs ed25519 keygen/sign/verify timings (CSV tables, SVG chart)")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.cmd {
        Command::Run {
            trials,
            warmup,
            algorithms,
            seed,
            results,
            env,
        } => {
            let cfg = BenchConfig {
                trial_count: trials,
                warmup_count: warmup,
                seed,
                algorithms: if algorithms.is_empty() {
                    Algorithm::ALL.to_vec()
                } else {
                    algorithms
                },
            };
            let paths = OutputPaths { results, env };
            let run = runner::run_and_persist(&cfg, &paths).context("benchmark run failed")?;

            for stat in report::aggregate(&run.records) {
                info!(
                    algorithm = %stat.algorithm,
                    operation = %stat.operation,
                    mean_us = stat.mean_time,
                    median_us = stat.median_time,
                    "result"
                );
            }
            for (name, value) in run.environment.fields() {
                info!("{name}: {value}");
            }
        }
        Command::Render { results, env, out } => {
            let paths = ReportPaths {
                results,
                env,
                chart: out,
            };
            report::render(&paths).context("rendering report failed")?;
        }
        Command::Summary { results, env, out } => {
            let summary = report::summarize(&results, &env).context("summarizing results failed")?;
            eprint!("{}", report::comparison_table(&summary.stats));

            let json = serde_json::to_string_pretty(&summary)?;
            if let Some(out) = out {
                fs::write(&out, json).with_context(|| format!("writing {}", out.display()))?;
            } else {
                println!("{json}");
            }
        }
    }

    Ok(())
}
