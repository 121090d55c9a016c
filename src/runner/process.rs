use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::runner::{ProcessOutput, RunnerError, SubjectRunner};

/// Runs the build tool and the subject as child processes in `subject_dir`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    subject_dir: PathBuf,
    build_program: String,
    build_timeout: Duration,
    debug: bool,
}

impl ProcessRunner {
    pub fn new(
        subject_dir: impl Into<PathBuf>,
        build_program: impl Into<String>,
        build_timeout: Duration,
        debug: bool,
    ) -> Self {
        Self {
            subject_dir: subject_dir.into(),
            build_program: build_program.into(),
            build_timeout,
            debug,
        }
    }

    /// Paths like `./pi` are resolved against the subject directory;
    /// bare names go through `PATH`.
    fn resolve(&self, program: &str) -> PathBuf {
        if program.contains('/') {
            let joined = self.subject_dir.join(program);
            std::path::absolute(&joined).unwrap_or(joined)
        } else {
            PathBuf::from(program)
        }
    }

    async fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        tracing::debug!(program, ?args, dir = %self.subject_dir.display(), "Spawning");

        let mut cmd = Command::new(self.resolve(program));
        cmd.args(args)
            .current_dir(&self.subject_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: program.to_string(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(RunnerError::Io {
                    program: program.to_string(),
                    source,
                });
            }
            Err(_) => {
                tracing::warn!(program, timeout_secs = timeout.as_secs_f64(), "Timed out, killed");
                return Err(RunnerError::Timeout {
                    program: program.to_string(),
                    timeout,
                });
            }
        };

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: start.elapsed(),
        };

        if !result.success() {
            tracing::warn!(
                program,
                status = %result.status_text(),
                stderr = %result.stderr.trim_end(),
                "Child exited unsuccessfully"
            );
        }
        if self.debug {
            tracing::debug!(program, stdout = %result.stdout.trim_end(), "Child output");
        }
        Ok(result)
    }
}

#[async_trait]
impl SubjectRunner for ProcessRunner {
    async fn build(&self, args: &[String]) -> Result<ProcessOutput, RunnerError> {
        self.execute(&self.build_program, args, self.build_timeout)
            .await
    }

    async fn run(
        &self,
        executable: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, RunnerError> {
        self.execute(executable, args, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sh_args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn runner() -> ProcessRunner {
        ProcessRunner::new(".", "sh", Duration::from_secs(10), false)
    }

    #[tokio::test]
    async fn test_captures_output_and_status() {
        let out = runner()
            .run(
                "sh",
                &sh_args("echo out; echo err >&2; exit 3"),
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_build_uses_build_program() {
        let out = runner().build(&sh_args("echo built")).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "built");
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = runner()
            .run("sh", &sh_args("sleep 5"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = runner()
            .run(
                "threadlab-grader-no-such-program",
                &[],
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_relative_executable_resolved_in_subject_dir() {
        let dir = format!("target/test_runner_subject_{}", std::process::id());
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let script = Path::new(&dir).join("hello.sh");
        std::fs::write(&script, "#!/bin/sh\necho from subject $1\n").unwrap();

        let runner = ProcessRunner::new(&dir, "sh", Duration::from_secs(10), false);
        let out = runner
            .run("sh", &["hello.sh".to_string(), "dir".to_string()], Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.stdout, "from subject dir\n");
        let pi = runner.resolve("./pi");
        assert!(pi.is_absolute());
        assert_eq!(pi, std::path::absolute(Path::new(&dir).join("./pi")).unwrap());
        assert_eq!(runner.resolve("make"), PathBuf::from("make"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
