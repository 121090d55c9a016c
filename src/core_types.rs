//! Core types used throughout the grader
//!
//! Messages, workloads and per-client buckets are shared by the generator,
//! the reference oracle, the output parser and the comparator.

/// Client ID - 1-based identifier of an exchange client.
///
/// # Constraints:
/// - Always in `[1, client_count]` once a value has been validated
/// - Used as `id - 1` to index a [`BucketSet`]
pub type ClientId = u32;

/// Thread count handed to the subject at build time
pub type ThreadCount = u32;

/// Longest payload (in characters) a message may carry on the wire
pub const MAX_PAYLOAD_CHARS: usize = 998;

/// Field delimiter of the subject's output lines
pub const OUTPUT_DELIMITER: char = ':';

/// Replacement for the output delimiter inside payloads
pub const DELIMITER_REPLACEMENT: char = '-';

/// How much a diagnostic line weighs in a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Failure,
}

/// Human-readable note explaining part of a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Failure,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "{}", self.message),
            Severity::Warning => write!(f, "[warn] {}", self.message),
            Severity::Failure => write!(f, "[fail] {}", self.message),
        }
    }
}

/// One routed message of a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: ClientId,
    pub destination: ClientId,
    pub payload: String,
}

impl Message {
    /// Build a message, sanitizing the payload so it survives the wire format.
    pub fn new(source: ClientId, destination: ClientId, payload: &str) -> Self {
        Self {
            source,
            destination,
            payload: sanitize_payload(payload),
        }
    }

    /// Workload file line, without the trailing newline.
    pub fn to_workload_line(&self) -> String {
        format!("{} {} {}", self.source, self.destination, self.payload)
    }
}

/// Strip line breaks, replace the output delimiter and cap the length.
///
/// Length is counted in characters, not bytes. The result is trimmed after
/// truncation, so it equals what a parser reads back from the wire.
pub fn sanitize_payload(raw: &str) -> String {
    let capped: String = raw
        .chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\n' => ' ',
            OUTPUT_DELIMITER => DELIMITER_REPLACEMENT,
            other => other,
        })
        .take(MAX_PAYLOAD_CHARS)
        .collect();
    capped.trim().to_string()
}

/// Ordered, immutable message sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workload {
    messages: Vec<Message>,
}

impl Workload {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize in the exchange input format, one message per line.
    pub fn to_file_contents(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            out.push_str(&msg.to_workload_line());
            out.push('\n');
        }
        out
    }
}

/// Per-client multisets of payloads.
///
/// Every client in `[1, client_count]` has a bucket, possibly empty.
/// Comparison is only meaningful after [`BucketSet::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet {
    buckets: Vec<Vec<String>>,
}

impl BucketSet {
    pub fn new(client_count: u32) -> Self {
        Self {
            buckets: vec![Vec::new(); client_count as usize],
        }
    }

    pub fn client_count(&self) -> u32 {
        self.buckets.len() as u32
    }

    /// Add a payload to a client's bucket.
    ///
    /// Returns `false` (and stores nothing) when the client is out of range.
    pub fn deliver(&mut self, client: ClientId, payload: String) -> bool {
        match self.slot(client) {
            Some(idx) => {
                self.buckets[idx].push(payload);
                true
            }
            None => false,
        }
    }

    /// Sort every bucket lexicographically.
    pub fn normalize(&mut self) {
        for bucket in &mut self.buckets {
            bucket.sort_unstable();
        }
    }

    /// Payloads of a client, empty for out-of-range ids.
    pub fn bucket(&self, client: ClientId) -> &[String] {
        self.slot(client)
            .map(|idx| self.buckets[idx].as_slice())
            .unwrap_or(&[])
    }

    /// `(client, payloads)` pairs in client order.
    pub fn iter(&self) -> impl Iterator<Item = (ClientId, &[String])> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(idx, bucket)| (idx as ClientId + 1, bucket.as_slice()))
    }

    pub fn total_payloads(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    fn slot(&self, client: ClientId) -> Option<usize> {
        if client == 0 || client as usize > self.buckets.len() {
            None
        } else {
            Some(client as usize - 1)
        }
    }
}
