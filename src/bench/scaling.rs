//! Scaling Analyzer - correctness and speedup across a thread-count sweep
//!
//! # Rules
//!
//! - Every estimate must be inside the acceptable range; one bad sample
//!   fails correctness for the whole sweep.
//! - Each sample is timed against its immediate predecessor only:
//!   - within the core count: `ratio < 0.7` passes, `[0.7, 1.0)` warns and
//!     fails, `>= 1.0` fails outright;
//!   - beyond the core count: `ratio >= 0.9` is a warning, never a failure.
//! - Every sample and pair is evaluated; diagnostics accumulate.

use std::fmt;

use crate::core_types::{Diagnostic, Severity, ThreadCount};

/// Required ratio for a meaningful speedup within the core count
pub const SPEEDUP_RATIO: f64 = 0.7;

/// Ratio at which an oversubscribed step is flagged
pub const OVERSUBSCRIBED_RATIO: f64 = 0.9;

/// One measurement of the subject at a given thread count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingSample {
    pub thread_count: ThreadCount,
    pub runtime_seconds: f64,
    pub estimate_value: f64,
}

/// Result of attempting one sweep step
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Measured(ScalingSample),
    /// Build failure, run failure, timeout or unreadable estimate
    Failed {
        thread_count: ThreadCount,
        reason: String,
    },
}

impl SampleOutcome {
    pub fn thread_count(&self) -> ThreadCount {
        match self {
            SampleOutcome::Measured(s) => s.thread_count,
            SampleOutcome::Failed { thread_count, .. } => *thread_count,
        }
    }
}

/// Inclusive tolerance band for the computed estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptableRange {
    pub low: f64,
    pub high: f64,
}

impl AcceptableRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `target ± tolerance`
    pub fn around(target: f64, tolerance: f64) -> Self {
        Self {
            low: target - tolerance,
            high: target + tolerance,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        // NaN fails both comparisons
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for AcceptableRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Classification of one predecessor → sample step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// ratio < 0.7 within the core count
    Speedup,
    /// ratio in [0.7, 1.0) within the core count
    WeakSpeedup,
    /// ratio >= 1.0 within the core count
    NoSpeedup,
    /// beyond the core count, ratio < 0.9
    Oversubscribed,
    /// beyond the core count, ratio >= 0.9
    OversubscribedFlat,
}

impl StepKind {
    pub fn fails_timeliness(self) -> bool {
        matches!(self, StepKind::WeakSpeedup | StepKind::NoSpeedup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingStep {
    pub from_threads: ThreadCount,
    pub to_threads: ThreadCount,
    pub ratio: f64,
    pub kind: StepKind,
}

/// Combined judgment over a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingAssessment {
    pub correctness_pass: bool,
    pub timeliness_pass: bool,
    pub steps: Vec<ScalingStep>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScalingAssessment {
    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Classify a runtime ratio for the thread count it leads to.
pub fn classify_step(ratio: f64, to_threads: ThreadCount, available_cores: u32) -> StepKind {
    if to_threads <= available_cores {
        if ratio >= 1.0 {
            StepKind::NoSpeedup
        } else if ratio >= SPEEDUP_RATIO {
            StepKind::WeakSpeedup
        } else {
            StepKind::Speedup
        }
    } else if ratio >= OVERSUBSCRIBED_RATIO {
        StepKind::OversubscribedFlat
    } else {
        StepKind::Oversubscribed
    }
}

fn describe_step(step: &ScalingStep, available_cores: u32) -> Diagnostic {
    let prefix = format!(
        "{} -> {} threads: runtime ratio {:.3}",
        step.from_threads, step.to_threads, step.ratio
    );
    match step.kind {
        StepKind::Speedup | StepKind::Oversubscribed => {
            Diagnostic::info(format!("{prefix}, speedup ok"))
        }
        // Still fails timeliness; only the severity is softer
        StepKind::WeakSpeedup => Diagnostic::warning(format!(
            "{prefix}: faster, but not much (needs < {SPEEDUP_RATIO})"
        )),
        StepKind::NoSpeedup => Diagnostic::failure(format!("{prefix}: more threads not faster")),
        StepKind::OversubscribedFlat => Diagnostic::warning(format!(
            "{prefix}: more threads not much faster; {} threads on {} CPU cores, probably out of CPUs",
            step.to_threads, available_cores
        )),
    }
}

/// Assess a sweep where every step produced a measurement.
pub fn assess(
    samples: &[ScalingSample],
    available_cores: u32,
    range: AcceptableRange,
) -> ScalingAssessment {
    let outcomes: Vec<SampleOutcome> = samples
        .iter()
        .copied()
        .map(SampleOutcome::Measured)
        .collect();
    assess_sweep(&outcomes, available_cores, range)
}

/// Assess a sweep that may contain failed steps.
///
/// A failed step fails correctness and breaks the timing chain: the next
/// measured sample has no predecessor to be compared with.
pub fn assess_sweep(
    outcomes: &[SampleOutcome],
    available_cores: u32,
    range: AcceptableRange,
) -> ScalingAssessment {
    let mut correctness_pass = true;
    let mut timeliness_pass = true;
    let mut steps = Vec::new();
    let mut diagnostics = Vec::new();

    if outcomes.is_empty() {
        diagnostics.push(Diagnostic::failure("no samples collected"));
        return ScalingAssessment {
            correctness_pass: false,
            timeliness_pass: false,
            steps,
            diagnostics,
        };
    }

    let mut previous: Option<ScalingSample> = None;
    for outcome in outcomes {
        let sample = match outcome {
            SampleOutcome::Measured(sample) => *sample,
            SampleOutcome::Failed {
                thread_count,
                reason,
            } => {
                correctness_pass = false;
                diagnostics.push(Diagnostic::failure(format!(
                    "{thread_count} threads: sample failed: {reason}"
                )));
                previous = None;
                continue;
            }
        };

        diagnostics.push(Diagnostic::info(format!(
            "{} threads: executed in {:.3}s, estimate {}",
            sample.thread_count, sample.runtime_seconds, sample.estimate_value
        )));

        if !range.contains(sample.estimate_value) {
            correctness_pass = false;
            diagnostics.push(Diagnostic::failure(format!(
                "{} threads: estimate {} outside {}",
                sample.thread_count, sample.estimate_value, range
            )));
        }

        if let Some(prev) = previous {
            if prev.runtime_seconds > 0.0 {
                let ratio = sample.runtime_seconds / prev.runtime_seconds;
                let kind = classify_step(ratio, sample.thread_count, available_cores);
                let step = ScalingStep {
                    from_threads: prev.thread_count,
                    to_threads: sample.thread_count,
                    ratio,
                    kind,
                };
                if kind.fails_timeliness() {
                    timeliness_pass = false;
                }
                diagnostics.push(describe_step(&step, available_cores));
                steps.push(step);
            } else {
                diagnostics.push(Diagnostic::warning(format!(
                    "{} -> {} threads: previous runtime {}s too small to compare",
                    prev.thread_count, sample.thread_count, prev.runtime_seconds
                )));
            }
        }
        previous = Some(sample);
    }

    tracing::debug!(
        correctness_pass,
        timeliness_pass,
        steps = steps.len(),
        "Scaling sweep assessed"
    );

    ScalingAssessment {
        correctness_pass,
        timeliness_pass,
        steps,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(thread_count: u32, runtime_seconds: f64, estimate_value: f64) -> ScalingSample {
        ScalingSample {
            thread_count,
            runtime_seconds,
            estimate_value,
        }
    }

    fn pi_range() -> AcceptableRange {
        AcceptableRange::new(3.14, 3.15)
    }

    #[test]
    fn test_range_inclusive() {
        let r = pi_range();
        assert!(r.contains(3.14));
        assert!(r.contains(3.15));
        assert!(!r.contains(3.1399));
        assert!(!r.contains(f64::NAN));
    }

    #[test]
    fn test_classify_within_cores() {
        assert_eq!(classify_step(0.5, 2, 4), StepKind::Speedup);
        assert_eq!(classify_step(0.7, 2, 4), StepKind::WeakSpeedup);
        assert_eq!(classify_step(0.99, 4, 4), StepKind::WeakSpeedup);
        assert_eq!(classify_step(1.0, 4, 4), StepKind::NoSpeedup);
        assert_eq!(classify_step(1.4, 2, 4), StepKind::NoSpeedup);
    }

    #[test]
    fn test_classify_oversubscribed() {
        assert_eq!(classify_step(0.5, 8, 4), StepKind::Oversubscribed);
        assert_eq!(classify_step(0.9, 8, 4), StepKind::OversubscribedFlat);
        assert_eq!(classify_step(1.5, 8, 4), StepKind::OversubscribedFlat);
        assert!(!StepKind::OversubscribedFlat.fails_timeliness());
    }

    #[test]
    fn test_weak_speedup_fails_timeliness() {
        let samples = [sample(1, 10.0, 3.141), sample(2, 8.0, 3.142)];
        let result = assess(&samples, 4, pi_range());
        assert!(result.correctness_pass);
        assert!(!result.timeliness_pass);
        assert_eq!(result.steps[0].kind, StepKind::WeakSpeedup);
        assert_eq!(result.warnings(), 1);
    }

    #[test]
    fn test_slowdown_fails_and_later_pairs_still_evaluated() {
        let samples = [
            sample(1, 10.0, 3.141),
            sample(2, 12.0, 3.141),
            sample(4, 5.0, 3.141),
        ];
        let result = assess(&samples, 4, pi_range());
        assert!(!result.timeliness_pass);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].kind, StepKind::NoSpeedup);
        assert_eq!(result.steps[1].kind, StepKind::Speedup);
    }

    #[test]
    fn test_failed_sample_breaks_chain() {
        let outcomes = [
            SampleOutcome::Measured(sample(1, 10.0, 3.141)),
            SampleOutcome::Failed {
                thread_count: 2,
                reason: "timed out".into(),
            },
            SampleOutcome::Measured(sample(4, 9.0, 3.141)),
        ];
        let result = assess_sweep(&outcomes, 4, pi_range());
        assert!(!result.correctness_pass);
        // 4 threads is not compared against 1 thread
        assert!(result.steps.is_empty());
        assert!(result.timeliness_pass);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.severity == Severity::Failure && d.message.contains("timed out"))
        );
    }

    #[test]
    fn test_zero_previous_runtime_warns() {
        let samples = [sample(1, 0.0, 3.141), sample(2, 0.0, 3.141)];
        let result = assess(&samples, 4, pi_range());
        assert!(result.steps.is_empty());
        assert_eq!(result.warnings(), 1);
    }

    #[test]
    fn test_empty_sweep_fails() {
        let result = assess(&[], 4, pi_range());
        assert!(!result.correctness_pass);
        assert!(!result.timeliness_pass);
    }

    #[test]
    fn test_every_out_of_range_sample_reported() {
        let samples = [
            sample(1, 10.0, 2.0),
            sample(2, 5.0, 3.141),
            sample(4, 2.0, 4.0),
        ];
        let result = assess(&samples, 4, pi_range());
        let failures = result
            .diagnostics
            .iter()
            .filter(|d| d.message.contains("outside"))
            .count();
        assert_eq!(failures, 2);
    }
}
