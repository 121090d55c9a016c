//! Subject Runner - build and execute the program under test
//!
//! The suites only see the [`SubjectRunner`] trait; [`ProcessRunner`] is the
//! real implementation on top of `make` and `tokio::process`.

pub mod error;
pub mod process;

use async_trait::async_trait;
use std::time::Duration;

pub use error::RunnerError;
pub use process::ProcessRunner;

/// Captured result of one finished child process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    /// `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Exit status as text for diagnostics.
    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[async_trait]
pub trait SubjectRunner: Send + Sync {
    /// Run the build tool with the given arguments (e.g. `clean`, or
    /// `CFLAGS=... target`).
    async fn build(&self, args: &[String]) -> Result<ProcessOutput, RunnerError>;

    /// Execute a built program, killing it once `timeout` expires.
    async fn run(
        &self,
        executable: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError>;
}
