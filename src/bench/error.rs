use thiserror::Error;

/// Wire-format violations in workload files and subject output.
///
/// Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("workload line {line}: {reason}: {text:?}")]
    MalformedWorkloadLine {
        line: usize,
        reason: String,
        text: String,
    },

    #[error("output line {line}: {reason}: {text:?}")]
    MalformedOutputLine {
        line: usize,
        reason: String,
        text: String,
    },
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("payload corpus is empty")]
    Empty,

    #[error("cannot read corpus file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("client count must be at least 1")]
    NoClients,

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("workload file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
