//! Message exchange - routing correctness against the reference oracle
//!
//! Steps: build, prepare the workload file, derive the expected buckets from
//! that file, run the subject on it, parse its output and compare. Any step
//! that fails ends the suite with a zero verdict and the reason.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::write_exchange_artifacts;
use crate::bench::{
    CorpusError, FortuneCorpus, GeneratorConfig, WorkloadError, WorkloadGenerator,
    compute_expected, first_mismatch, load_workload, parse_subject_output, write_workload,
};
use crate::config::AppConfig;
use crate::core_types::{BucketSet, Diagnostic};
use crate::report::{TestCategory, Verdict};
use crate::runner::{ProcessOutput, SubjectRunner};
use crate::suites::{BusyWaitSignal, StderrMarker, build_subject, debug_define, judgeable_output};

pub const EXCHANGE_TARGET: &str = "exchange";
pub const EXCHANGE_EXECUTABLE: &str = "./exchange";

/// Where the exchange input comes from
#[derive(Debug, Clone)]
pub enum WorkloadSource {
    /// Generate a fresh workload into `path`
    Generate {
        path: PathBuf,
        seed: u64,
        corpus: FortuneCorpus,
    },
    /// Reuse an existing file as-is
    Existing(PathBuf),
}

impl WorkloadSource {
    /// An explicit `file` wins; otherwise the configured workload file is
    /// generated or reused. Configured paths are relative to `subject_dir`.
    pub fn resolve(
        config: &AppConfig,
        file: Option<PathBuf>,
        generate: bool,
        seed: u64,
    ) -> Result<Self, CorpusError> {
        if let Some(file) = file {
            return Ok(WorkloadSource::Existing(file));
        }
        let path = config.subject_dir.join(&config.exchange.workload_file);
        if !generate {
            return Ok(WorkloadSource::Existing(path));
        }
        let corpus = match &config.exchange.corpus_file {
            Some(file) => FortuneCorpus::from_file(&config.subject_dir.join(file))?,
            None => FortuneCorpus::builtin(),
        };
        Ok(WorkloadSource::Generate { path, seed, corpus })
    }
}

pub struct ExchangeSettings {
    pub clients: u32,
    pub exchanges: u32,
    pub messages: usize,
    pub workload: WorkloadSource,
    pub run_timeout: Duration,
    pub debug: bool,
    /// Directory for stdout/stderr/expected dumps; skipped when `None`
    pub artifacts_dir: Option<PathBuf>,
    pub busy_wait: Option<Box<dyn BusyWaitSignal>>,
}

impl ExchangeSettings {
    pub fn from_config(config: &AppConfig, workload: WorkloadSource) -> Self {
        Self {
            clients: config.exchange.clients,
            exchanges: config.exchange.exchanges,
            messages: config.exchange.messages,
            workload,
            run_timeout: config.run_timeout(),
            debug: config.debug,
            artifacts_dir: Some(config.artifacts_dir.clone()),
            busy_wait: config
                .exchange
                .busy_wait_marker
                .clone()
                .map(|m| Box::new(StderrMarker(m)) as Box<dyn BusyWaitSignal>),
        }
    }

    fn defines(&self) -> String {
        format!(
            "-DN_EXCHANGES={} -DN_CLIENTS={} -DDEBUG={}",
            self.exchanges,
            self.clients,
            debug_define(self.debug)
        )
    }
}

/// Generate (if asked) and return the workload file path.
fn prepare_workload(
    settings: &ExchangeSettings,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<PathBuf, WorkloadError> {
    match &settings.workload {
        WorkloadSource::Existing(path) => {
            diagnostics.push(Diagnostic::info(format!(
                "Using workload file {}",
                path.display()
            )));
            Ok(path.clone())
        }
        WorkloadSource::Generate { path, seed, corpus } => {
            tracing::info!(seed, messages = settings.messages, "Generating messages...");
            let config = GeneratorConfig {
                client_count: settings.clients,
                message_count: settings.messages,
            };
            let workload =
                WorkloadGenerator::new(config, StdRng::seed_from_u64(*seed), corpus)?.generate();
            write_workload(&workload, path)?;
            diagnostics.push(Diagnostic::info(format!(
                "Generated {} messages for {} clients (seed {})",
                workload.len(),
                settings.clients,
                seed
            )));
            Ok(path.clone())
        }
    }
}

fn record_artifacts(
    settings: &ExchangeSettings,
    output: &ProcessOutput,
    expected: &BucketSet,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(dir) = &settings.artifacts_dir else {
        return;
    };
    if let Err(err) = write_exchange_artifacts(dir, &output.stdout, &output.stderr, expected) {
        tracing::warn!(dir = %dir.display(), error = %err, "Could not write artifacts");
        diagnostics.push(Diagnostic::warning(format!(
            "could not write artifacts to {}: {}",
            dir.display(),
            err
        )));
    }
}

pub async fn run_exchange_suite<R: SubjectRunner + ?Sized>(
    runner: &R,
    settings: &ExchangeSettings,
) -> Verdict {
    let mut diagnostics = Vec::new();

    tracing::info!("Making exchange...");
    if let Err(failure) =
        build_subject(runner, &settings.defines(), EXCHANGE_TARGET, &mut diagnostics).await
    {
        diagnostics.push(failure);
        return Verdict::failed(TestCategory::Exchange, diagnostics);
    }

    let path = match prepare_workload(settings, &mut diagnostics) {
        Ok(path) => path,
        Err(err) => {
            diagnostics.push(Diagnostic::failure(format!(
                "Could not prepare workload: {}",
                err
            )));
            return Verdict::failed(TestCategory::Exchange, diagnostics);
        }
    };

    tracing::info!("Generating solution...");
    let expected = match load_workload(&path, settings.clients) {
        Ok(workload) => compute_expected(&workload, settings.clients),
        Err(err) => {
            diagnostics.push(Diagnostic::failure(format!("Bad workload: {}", err)));
            return Verdict::failed(TestCategory::Exchange, diagnostics);
        }
    };

    tracing::info!("Running program...");
    let arg = std::path::absolute(&path)
        .unwrap_or_else(|_| path.clone())
        .display()
        .to_string();
    let result = runner
        .run(EXCHANGE_EXECUTABLE, &[arg], settings.run_timeout)
        .await;

    if let Ok(out) = &result {
        record_artifacts(settings, out, &expected, &mut diagnostics);
    }
    let output = match judgeable_output(&result) {
        Ok(out) => out,
        Err(reason) => {
            diagnostics.push(Diagnostic::failure(format!(
                "Error running exchange: {}",
                reason
            )));
            return Verdict::failed(TestCategory::Exchange, diagnostics);
        }
    };

    tracing::info!("Collecting output...");
    let actual = match parse_subject_output(&output.stdout, settings.clients) {
        Ok(actual) => actual,
        Err(err) => {
            diagnostics.push(Diagnostic::failure(format!(
                "Unreadable output: {}",
                err
            )));
            return Verdict::failed(TestCategory::Exchange, diagnostics);
        }
    };

    if let Some(mismatch) = first_mismatch(&expected, &actual) {
        tracing::warn!(%mismatch, "Exchange output does not match");
        diagnostics.push(Diagnostic::failure(
            "Something is not right! Some messages seem to be missing or repeated?",
        ));
        diagnostics.push(Diagnostic::failure(mismatch.to_string()));
        return Verdict::failed(TestCategory::Exchange, diagnostics);
    }

    diagnostics.push(Diagnostic::info(format!(
        "Looks good :) {} messages delivered to {} clients",
        actual.total_payloads(),
        settings.clients
    )));

    let busy = settings
        .busy_wait
        .as_ref()
        .is_some_and(|signal| signal.detected(output));
    if busy {
        diagnostics.push(Diagnostic::warning(
            "But you are looping those is_free/is_full functions a lot! Geez, the CPU is so busy ;)",
        ));
    }
    Verdict::judge(TestCategory::Exchange, true, !busy, diagnostics)
}

/// Exchange verdict for a workload that may have failed to resolve.
///
/// A resolution failure fails the category without touching the subject.
pub async fn grade_exchange<R: SubjectRunner + ?Sized>(
    runner: &R,
    config: &AppConfig,
    source: Result<WorkloadSource, CorpusError>,
) -> Verdict {
    match source {
        Ok(source) => {
            let settings = ExchangeSettings::from_config(config, source);
            run_exchange_suite(runner, &settings).await
        }
        Err(err) => {
            tracing::error!(error = %err, "Could not prepare the exchange workload");
            Verdict::failed(
                TestCategory::Exchange,
                vec![Diagnostic::failure(format!(
                    "Could not load payload corpus: {}",
                    err
                ))],
            )
        }
    }
}
