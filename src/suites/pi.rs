//! Parallel pi estimator - thread-count sweep
//!
//! The subject is rebuilt for every thread count, run once, and its last
//! stdout token is read as the estimate. A failed build aborts the sweep;
//! a failed or timed-out run only fails that sample.

use std::time::Duration;

use crate::bench::scaling::{AcceptableRange, SampleOutcome, ScalingSample, assess_sweep};
use crate::config::AppConfig;
use crate::core_types::{Diagnostic, ThreadCount};
use crate::report::{TestCategory, Verdict};
use crate::runner::SubjectRunner;
use crate::suites::{build_subject, debug_define, judgeable_output};

pub const PI_TARGET: &str = "pi";
pub const PI_EXECUTABLE: &str = "./pi";

#[derive(Debug, Clone)]
pub struct PiSettings {
    pub thread_counts: Vec<ThreadCount>,
    pub num_points: u64,
    pub range: AcceptableRange,
    pub available_cores: u32,
    pub run_timeout: Duration,
    pub debug: bool,
}

impl PiSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            thread_counts: config.pi.thread_counts.clone(),
            num_points: config.pi.num_points,
            range: config.pi.acceptable_range(),
            available_cores: config.pi.cores(),
            run_timeout: config.run_timeout(),
            debug: config.debug,
        }
    }

    fn defines(&self, threads: ThreadCount) -> String {
        format!(
            "-DNUM_THREADS={} -DNUM_POINTS={} -DDEBUG={}",
            threads,
            self.num_points,
            debug_define(self.debug)
        )
    }
}

/// Last whitespace-separated token of the subject's stdout, as a number.
pub fn parse_estimate(stdout: &str) -> Option<f64> {
    stdout.split_whitespace().last()?.parse().ok()
}

pub async fn run_pi_suite<R: SubjectRunner + ?Sized>(
    runner: &R,
    settings: &PiSettings,
) -> Verdict {
    let mut diagnostics = Vec::new();
    let mut outcomes = Vec::with_capacity(settings.thread_counts.len());

    for &threads in &settings.thread_counts {
        let plural = if threads > 1 { "s" } else { "" };
        tracing::info!("Calculating PI with {} thread{}...", threads, plural);

        if let Err(failure) = build_subject(
            runner,
            &settings.defines(threads),
            PI_TARGET,
            &mut diagnostics,
        )
        .await
        {
            tracing::error!(threads, "Build failed, aborting sweep");
            diagnostics.push(failure);
            return Verdict::failed(TestCategory::ParallelPi, diagnostics);
        }

        let result = runner.run(PI_EXECUTABLE, &[], settings.run_timeout).await;
        let outcome = match judgeable_output(&result) {
            Err(reason) => SampleOutcome::Failed {
                thread_count: threads,
                reason,
            },
            Ok(out) => match parse_estimate(&out.stdout) {
                Some(estimate) => SampleOutcome::Measured(ScalingSample {
                    thread_count: threads,
                    runtime_seconds: out.elapsed_seconds(),
                    estimate_value: estimate,
                }),
                None => SampleOutcome::Failed {
                    thread_count: threads,
                    reason: format!("no numeric estimate in output {:?}", out.stdout.trim()),
                },
            },
        };

        match &outcome {
            SampleOutcome::Measured(s) => tracing::info!(
                threads,
                runtime = s.runtime_seconds,
                estimate = s.estimate_value,
                "Executed in {:.3}s and calculated PI as {}",
                s.runtime_seconds,
                s.estimate_value
            ),
            SampleOutcome::Failed { reason, .. } => {
                tracing::warn!(threads, %reason, "Sample failed")
            }
        }
        outcomes.push(outcome);
    }

    let assessment = assess_sweep(&outcomes, settings.available_cores, settings.range);
    diagnostics.extend(assessment.diagnostics);
    if !assessment.correctness_pass {
        diagnostics.push(Diagnostic::failure(
            "Something doesn't look good with the estimates",
        ));
    }
    Verdict::judge(
        TestCategory::ParallelPi,
        assessment.correctness_pass,
        assessment.timeliness_pass,
        diagnostics,
    )
}
