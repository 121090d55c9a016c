//! Verdicts and the grade report
//!
//! Suites return immutable [`Verdict`]s; [`GradeReport::assemble`] is the
//! only place they are combined. Nothing accumulates scores in shared state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCategory {
    ParallelPi,
    Exchange,
}

impl TestCategory {
    pub const ALL: [TestCategory; 2] = [TestCategory::ParallelPi, TestCategory::Exchange];

    pub fn name(self) -> &'static str {
        match self {
            TestCategory::ParallelPi => "Parallel pie",
            TestCategory::Exchange => "Exchanging messages",
        }
    }

    pub fn max_score(self) -> f64 {
        match self {
            TestCategory::ParallelPi => 3.0,
            TestCategory::Exchange => 6.0,
        }
    }

    /// Score for a correct but slow (pi) or busy-waiting (exchange) subject
    pub fn partial_score(self) -> f64 {
        match self {
            TestCategory::ParallelPi => 1.5,
            TestCategory::Exchange => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Pass,
    Partial,
    Fail,
    NotRun,
}

/// Final judgment of one test category.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: TestCategory,
    pub grade: Grade,
    pub diagnostics: Vec<Diagnostic>,
}

impl Verdict {
    /// Combine the two judgments into the coarse score bands.
    ///
    /// `timeliness` is the speedup check for pi and the absence of
    /// busy-waiting for the exchange.
    pub fn judge(
        category: TestCategory,
        correctness: bool,
        timeliness: bool,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let grade = match (correctness, timeliness) {
            (false, _) => Grade::Fail,
            (true, false) => Grade::Partial,
            (true, true) => Grade::Pass,
        };
        Self {
            category,
            grade,
            diagnostics,
        }
    }

    /// Hard failure before judging was possible (build failure, bad output).
    pub fn failed(category: TestCategory, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            category,
            grade: Grade::Fail,
            diagnostics,
        }
    }

    pub fn not_run(category: TestCategory) -> Self {
        Self {
            category,
            grade: Grade::NotRun,
            diagnostics: vec![Diagnostic::info("Test not run")],
        }
    }

    pub fn score(&self) -> f64 {
        match self.grade {
            Grade::Pass => self.category.max_score(),
            Grade::Partial => self.category.partial_score(),
            Grade::Fail | Grade::NotRun => 0.0,
        }
    }

    pub fn output_text(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestEntry {
    pub score: f64,
    pub max_score: f64,
    pub name: String,
    pub output: String,
    pub visibility: String,
}

/// Grading-platform report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeReport {
    pub output: String,
    pub tests: Vec<TestEntry>,
}

impl GradeReport {
    /// One entry per category in fixed order; categories without a verdict
    /// are reported as not run.
    pub fn assemble(verdicts: &[Verdict], graded_at: DateTime<Utc>) -> Self {
        let mut tests = Vec::with_capacity(TestCategory::ALL.len());
        let mut total = 0.0;
        let mut max_total = 0.0;

        for category in TestCategory::ALL {
            let fallback;
            let verdict = match verdicts.iter().find(|v| v.category == category) {
                Some(v) => v,
                None => {
                    fallback = Verdict::not_run(category);
                    &fallback
                }
            };
            total += verdict.score();
            max_total += category.max_score();
            tests.push(TestEntry {
                score: verdict.score(),
                max_score: category.max_score(),
                name: category.name().to_string(),
                output: verdict.output_text(),
                visibility: "visible".to_string(),
            });
        }

        Self {
            output: format!(
                "Graded at {}. Total {:.1}/{:.1}",
                graded_at.to_rfc3339(),
                total,
                max_total
            ),
            tests,
        }
    }

    pub fn total_score(&self) -> f64 {
        self.tests.iter().map(|t| t.score).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary for the terminal.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for test in &self.tests {
            out.push_str(&format!(
                "== {} : {:.1}/{:.1}\n",
                test.name, test.score, test.max_score
            ));
            for line in test.output.lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&self.output);
        out.push('\n');
        out
    }
}
