//! Exchange test artifacts
//!
//! Raw subject streams and the oracle's expectation, written side by side so
//! a failing submission can be diffed by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core_types::BucketSet;

pub const STDOUT_FILE: &str = "stdout.txt";
pub const STDERR_FILE: &str = "stderr.txt";
pub const EXPECTED_FILE: &str = "expected.txt";

/// Human-readable listing of expected deliveries per client.
pub fn render_expected(expected: &BucketSet) -> String {
    let mut out = String::new();
    for (client, payloads) in expected.iter() {
        out.push_str(&format!("Client {} received:\n", client));
        for payload in payloads {
            out.push_str("  - ");
            out.push_str(payload);
            out.push('\n');
        }
    }
    out
}

/// Write the three artifact files; returns the paths written.
pub fn write_exchange_artifacts(
    dir: &Path,
    stdout: &str,
    stderr: &str,
    expected: &BucketSet,
) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let files = [
        (STDOUT_FILE, stdout.to_string()),
        (STDERR_FILE, stderr.to_string()),
        (EXPECTED_FILE, render_expected(expected)),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        written.push(path);
    }
    tracing::debug!(dir = %dir.display(), "Exchange artifacts written");
    Ok(written)
}
