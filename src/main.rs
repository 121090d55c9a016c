//! Threadlab Grader - command line entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Build   │───▶│   Run    │───▶│  Report  │
//! │  (YAML)  │    │  (make)  │    │ (suites) │    │  (JSON)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Scores never affect the exit code; only harness errors do.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

use threadlab_grader::config::AppConfig;
use threadlab_grader::logging::init_logging;
use threadlab_grader::report::{GradeReport, TestCategory, Verdict};
use threadlab_grader::runner::ProcessRunner;
use threadlab_grader::suites::{PiSettings, WorkloadSource, grade_exchange, run_pi_suite};

const GRADER_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GRADER_REVISION"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "threadlab_grader")]
#[command(author, version = GRADER_VERSION)]
#[command(about = "Autograder for the parallel pi and message exchange labs")]
struct Cli {
    /// Skip the parallel pi sweep
    #[arg(long)]
    no_pi: bool,

    /// Skip the message exchange test
    #[arg(long)]
    no_exchange: bool,

    /// Reuse the configured workload file instead of generating one
    #[arg(long)]
    no_generate: bool,

    /// Write the JSON grade report
    #[arg(long)]
    grade: bool,

    /// Reuse this workload file (implies --no-generate)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Configuration environment (config/<env>.yaml)
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// Seed for workload generation; drawn at random when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Debug logging and -DDEBUG=1 builds
    #[arg(short, long)]
    verbose: bool,

    /// Grade report path
    #[arg(long, default_value = "grade.json")]
    report: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = AppConfig::env_path(&cli.env);
    let mut config = AppConfig::load(&cli.env)
        .with_context(|| format!("Failed to load configuration for env '{}'", cli.env))?;
    if cli.verbose {
        config.debug = true;
    }
    let _log_guard = init_logging(&config);

    tracing::info!(
        version = GRADER_VERSION,
        env = %cli.env,
        subject_dir = %config.subject_dir.display(),
        "Starting grader"
    );
    if !config_path.exists() {
        tracing::info!(path = %config_path.display(), "No config file, using defaults");
    }

    let runner = ProcessRunner::new(
        config.subject_dir.clone(),
        config.build_program.clone(),
        config.build_timeout(),
        config.debug,
    );

    // Resolved before any suite runs so a bad corpus shows up immediately
    let exchange_source = (!cli.no_exchange).then(|| {
        let generate = cli.file.is_none() && !cli.no_generate;
        let seed = cli.seed.unwrap_or_else(rand::random);
        if generate {
            tracing::info!(seed, "Workload will be generated");
        }
        WorkloadSource::resolve(&config, cli.file.clone(), generate, seed)
    });

    let mut verdicts = Vec::with_capacity(TestCategory::ALL.len());

    if cli.no_pi {
        verdicts.push(Verdict::not_run(TestCategory::ParallelPi));
    } else {
        tracing::info!("=== Parallel pi ===");
        verdicts.push(run_pi_suite(&runner, &PiSettings::from_config(&config)).await);
    }

    match exchange_source {
        None => verdicts.push(Verdict::not_run(TestCategory::Exchange)),
        Some(source) => {
            tracing::info!("=== Message exchange ===");
            verdicts.push(grade_exchange(&runner, &config, source).await);
        }
    }

    let report = GradeReport::assemble(&verdicts, Utc::now());
    print!("{}", report.summary());

    if cli.grade {
        let json = report.to_json().context("Failed to serialize grade report")?;
        std::fs::write(&cli.report, json)
            .with_context(|| format!("Failed to write {}", cli.report.display()))?;
        tracing::info!(path = %cli.report.display(), "Grade report written");
    }

    tracing::info!(total = report.total_score(), "Grading complete");
    Ok(())
}
