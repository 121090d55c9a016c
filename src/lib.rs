//! Threadlab Grader - autograder for concurrent C assignments
//!
//! Builds a student's submission, drives it through two test categories and
//! produces a scored report for the grading platform.
//!
//! # Modules
//!
//! - [`core_types`] - Client ids, messages, workloads and delivery buckets
//! - [`bench`] - Workload generation, reference oracle, output parsing,
//!   multiset comparison and scaling analysis
//! - [`runner`] - Build tool and subject process execution with timeouts
//! - [`suites`] - The parallel pi sweep and the message exchange test
//! - [`report`] - Verdicts and the JSON grade report
//! - [`artifacts`] - Raw stream dumps for failed exchange runs
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber setup

// Core types - must be first!
pub mod core_types;

pub mod artifacts;
pub mod bench;
pub mod config;
pub mod logging;
pub mod report;
pub mod runner;
pub mod suites;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{BucketSet, ClientId, Diagnostic, Message, Severity, ThreadCount, Workload};
pub use report::{Grade, GradeReport, TestCategory, Verdict};
pub use runner::{ProcessOutput, ProcessRunner, RunnerError, SubjectRunner};
pub use suites::{ExchangeSettings, PiSettings, WorkloadSource, run_exchange_suite, run_pi_suite};
