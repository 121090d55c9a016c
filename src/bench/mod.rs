//! Verification Engine
//!
//! Pure, single-threaded building blocks shared by the test suites.
//!
//! # Components
//!
//! - [`corpus`] - Payload text sources
//! - [`workload_generator`] - Seeded exchange workload generator
//! - [`oracle`] - Expected per-client deliveries from a workload
//! - [`result_parser`] - Subject output to per-client buckets
//! - [`comparator`] - Order-insensitive multiset comparison
//! - [`scaling`] - Thread-count sweep analysis

pub mod comparator;
pub mod corpus;
pub mod error;
pub mod oracle;
pub mod result_parser;
pub mod scaling;
pub mod workload_generator;

pub use comparator::{Mismatch, compare, first_mismatch};
pub use corpus::{FortuneCorpus, PayloadCorpus};
pub use error::{CorpusError, ParseError, WorkloadError};
pub use oracle::{compute_expected, load_workload, parse_workload};
pub use result_parser::parse_subject_output;
pub use scaling::{
    AcceptableRange, SampleOutcome, ScalingAssessment, ScalingSample, StepKind, assess,
    assess_sweep,
};
pub use workload_generator::{GeneratorConfig, WorkloadGenerator, write_workload};
