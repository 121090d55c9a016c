//! Reference Oracle - expected per-client deliveries
//!
//! The oracle never looks at the subject. It reads the same persisted
//! workload the subject was given and routes every payload to its
//! destination bucket. Sources are ignored.

use std::path::Path;

use crate::bench::error::{ParseError, WorkloadError};
use crate::core_types::{BucketSet, ClientId, Message, Workload};

/// Expected buckets for a workload, normalized for comparison.
pub fn compute_expected(workload: &Workload, client_count: u32) -> BucketSet {
    let mut expected = BucketSet::new(client_count);
    for msg in workload.messages() {
        // Parsed workloads are range-checked; generated ones are in range by construction
        expected.deliver(msg.destination, msg.payload.clone());
    }
    expected.normalize();
    expected
}

fn malformed(line: usize, reason: &str, text: &str) -> ParseError {
    ParseError::MalformedWorkloadLine {
        line,
        reason: reason.to_string(),
        text: text.to_string(),
    }
}

fn parse_client(
    field: &str,
    what: &str,
    client_count: u32,
    line: usize,
    text: &str,
) -> Result<ClientId, ParseError> {
    let id: ClientId = field
        .parse()
        .map_err(|_| malformed(line, &format!("{what} is not a decimal client id"), text))?;
    if id == 0 || id > client_count {
        return Err(malformed(
            line,
            &format!("{what} {id} outside 1..={client_count}"),
            text,
        ));
    }
    Ok(id)
}

/// Parse one `<source> <destination>[ <payload>]` line.
///
/// The payload is trimmed the same way subject output is.
pub fn parse_workload_line(
    text: &str,
    line: usize,
    client_count: u32,
) -> Result<Message, ParseError> {
    let mut fields = text.splitn(3, ' ');
    let source_field = fields.next().unwrap_or_default();
    let destination_field = fields
        .next()
        .ok_or_else(|| malformed(line, "missing destination", text))?;
    let payload = fields.next().unwrap_or_default().trim();

    let source = parse_client(source_field, "source", client_count, line, text)?;
    let destination = parse_client(destination_field, "destination", client_count, line, text)?;

    Ok(Message {
        source,
        destination,
        payload: payload.to_string(),
    })
}

/// Parse a whole workload file body. Blank lines are skipped.
pub fn parse_workload(contents: &str, client_count: u32) -> Result<Workload, ParseError> {
    let mut messages = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        messages.push(parse_workload_line(raw, idx + 1, client_count)?);
    }
    Ok(Workload::new(messages))
}

/// Read a persisted workload back for oracle computation.
pub fn load_workload(path: &Path, client_count: u32) -> Result<Workload, WorkloadError> {
    if client_count == 0 {
        return Err(WorkloadError::NoClients);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| WorkloadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let workload = parse_workload(&contents, client_count)?;
    tracing::debug!(
        path = %path.display(),
        messages = workload.len(),
        "Workload loaded"
    );
    Ok(workload)
}
