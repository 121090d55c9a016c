//! Test Suites
//!
//! Each suite drives the subject through a [`SubjectRunner`] and reduces
//! everything it saw to a single [`Verdict`](crate::report::Verdict).
//! Subject misbehaviour never escapes as an error.

pub mod exchange;
pub mod pi;

pub use exchange::{ExchangeSettings, WorkloadSource, grade_exchange, run_exchange_suite};
pub use pi::{PiSettings, parse_estimate, run_pi_suite};

use crate::core_types::Diagnostic;
use crate::runner::{ProcessOutput, RunnerError, SubjectRunner};

/// Secondary signal that a correct subject wastes CPU by busy-waiting.
pub trait BusyWaitSignal: Send + Sync {
    fn detected(&self, output: &ProcessOutput) -> bool;
}

/// Busy-waiting reported by the subject itself through a stderr phrase.
#[derive(Debug, Clone)]
pub struct StderrMarker(pub String);

impl BusyWaitSignal for StderrMarker {
    fn detected(&self, output: &ProcessOutput) -> bool {
        output.stderr.contains(&self.0)
    }
}

fn debug_define(debug: bool) -> u8 {
    if debug { 1 } else { 0 }
}

/// `make clean` then `make CFLAGS=<defines> <target>`.
///
/// A failed clean is only a warning; a failed build is returned as the
/// failure diagnostic.
async fn build_subject<R: SubjectRunner + ?Sized>(
    runner: &R,
    defines: &str,
    target: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), Diagnostic> {
    match runner.build(&["clean".to_string()]).await {
        Ok(out) if out.success() => {}
        Ok(out) => diagnostics.push(Diagnostic::warning(format!(
            "make clean: {}",
            out.status_text()
        ))),
        Err(err) => diagnostics.push(Diagnostic::warning(format!("make clean: {}", err))),
    }

    let args = vec![format!("CFLAGS={}", defines), target.to_string()];
    match runner.build(&args).await {
        Ok(out) if out.success() => Ok(()),
        Ok(out) => Err(Diagnostic::failure(format!(
            "Error making {} ({}):\n{}{}",
            target,
            out.status_text(),
            out.stdout,
            out.stderr
        ))),
        Err(err) => Err(Diagnostic::failure(format!("Error making {}: {}", target, err))),
    }
}

/// The output of a run that finished cleanly, or a one-line reason why
/// there is nothing to judge.
fn judgeable_output(result: &Result<ProcessOutput, RunnerError>) -> Result<&ProcessOutput, String> {
    match result {
        Ok(out) if out.success() => Ok(out),
        Ok(out) => Err(format!(
            "{} after {:.3}s: {}",
            out.status_text(),
            out.elapsed_seconds(),
            out.stderr.trim()
        )),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::runner::{ProcessOutput, RunnerError, SubjectRunner};

    pub fn ok(stdout: &str, seconds: f64) -> Result<ProcessOutput, RunnerError> {
        Ok(ProcessOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed: Duration::from_secs_f64(seconds),
        })
    }

    pub fn exit(code: i32, stderr: &str) -> Result<ProcessOutput, RunnerError> {
        Ok(ProcessOutput {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
            elapsed: Duration::from_millis(5),
        })
    }

    pub fn timeout(program: &str) -> Result<ProcessOutput, RunnerError> {
        Err(RunnerError::Timeout {
            program: program.to_string(),
            timeout: Duration::from_secs(120),
        })
    }

    /// Scripted runner: builds succeed unless a failure is queued, runs
    /// pop queued results in order.
    #[derive(Default)]
    pub struct FakeRunner {
        pub builds: Mutex<VecDeque<Result<ProcessOutput, RunnerError>>>,
        pub runs: Mutex<VecDeque<Result<ProcessOutput, RunnerError>>>,
        pub build_calls: Mutex<Vec<Vec<String>>>,
        pub run_calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeRunner {
        pub fn with_runs(runs: Vec<Result<ProcessOutput, RunnerError>>) -> Self {
            Self {
                runs: Mutex::new(runs.into()),
                ..Default::default()
            }
        }

        pub fn queue_build(&self, result: Result<ProcessOutput, RunnerError>) {
            self.builds.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl SubjectRunner for FakeRunner {
        async fn build(&self, args: &[String]) -> Result<ProcessOutput, RunnerError> {
            self.build_calls.lock().unwrap().push(args.to_vec());
            self.builds
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ok("", 0.01))
        }

        async fn run(
            &self,
            executable: &str,
            args: &[String],
            _timeout: Duration,
        ) -> Result<ProcessOutput, RunnerError> {
            self.run_calls
                .lock()
                .unwrap()
                .push((executable.to_string(), args.to_vec()));
            self.runs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| exit(127, "no scripted run left"))
        }
    }
}
