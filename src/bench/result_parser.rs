//! Result Parser - subject stdout to per-client buckets
//!
//! Every non-empty line must be `<destination>:<payload>`. A line that does
//! not fit is an error for the whole output; dropping it would skew the
//! multiset comparison.

use crate::bench::error::ParseError;
use crate::core_types::{BucketSet, ClientId, OUTPUT_DELIMITER};

fn malformed(line: usize, reason: String, text: &str) -> ParseError {
    ParseError::MalformedOutputLine {
        line,
        reason,
        text: text.to_string(),
    }
}

/// Parse one received-message line into `(destination, payload)`.
pub fn parse_output_line(
    text: &str,
    line: usize,
    client_count: u32,
) -> Result<(ClientId, String), ParseError> {
    let (dest_field, payload) = text
        .split_once(OUTPUT_DELIMITER)
        .ok_or_else(|| malformed(line, format!("missing '{OUTPUT_DELIMITER}' delimiter"), text))?;

    let destination: ClientId = dest_field
        .trim()
        .parse()
        .map_err(|_| malformed(line, "destination is not a decimal client id".into(), text))?;
    if destination == 0 || destination > client_count {
        return Err(malformed(
            line,
            format!("destination {destination} outside 1..={client_count}"),
            text,
        ));
    }

    Ok((destination, payload.trim().to_string()))
}

/// Parse the subject's whole stdout; buckets come back normalized.
pub fn parse_subject_output(stdout: &str, client_count: u32) -> Result<BucketSet, ParseError> {
    let mut actual = BucketSet::new(client_count);
    for (idx, raw) in stdout.lines().enumerate() {
        if raw.is_empty() {
            continue;
        }
        let (destination, payload) = parse_output_line(raw, idx + 1, client_count)?;
        actual.deliver(destination, payload);
    }
    actual.normalize();
    Ok(actual)
}
