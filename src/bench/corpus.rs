//! Payload corpus - source of human-readable message text
//!
//! The grader only needs "some line of text"; which text is irrelevant to
//! correctness as long as the generator sanitizes it.

use rand::Rng;
use std::path::Path;

use crate::bench::error::CorpusError;

/// Supplies raw payload text to the workload generator.
pub trait PayloadCorpus {
    /// Draw one entry. Raw text; the generator sanitizes it.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &str;
}

/// Corpus in `fortune(6)` format: entries separated by lines holding a single `%`.
///
/// A file without any `%` separator is read as one entry per non-empty line.
#[derive(Debug, Clone)]
pub struct FortuneCorpus {
    entries: Vec<String>,
}

const BUILTIN_ENTRIES: &[&str] = &[
    "Real programmers don't comment their code. If it was hard to write, it should be hard to understand.",
    "There are two hard problems in computer science: cache invalidation, naming things, and off-by-one errors.",
    "A deadlock is when two threads are each waiting politely for the other to go first.",
    "Premature optimization is the root of all evil.",
    "If debugging is the process of removing bugs, then programming must be the process of putting them in.",
    "Never test for an error condition you don't know how to handle.",
    "The trouble with the world is that the stupid are cocksure and the intelligent are full of doubt.",
    "Beware of bugs in the above code; I have only proved it correct, not tried it.",
    "Any sufficiently advanced bug is indistinguishable from a feature.",
    "Concurrency is not parallelism:\nit is about dealing with lots of things at once.",
    "Mutex: a device that lets exactly one thread be disappointed at a time.",
    "Unix is user-friendly. It's just very selective about who its friends are.",
    "The best way to predict the future is to implement it.",
    "It works on my machine.",
    "Every program has at least one bug and can be shortened by at least one instruction.",
    "Spin locks: because sometimes you just want to burn a core while you wait.",
];

impl FortuneCorpus {
    pub fn from_entries<I, S>(entries: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries
            .into_iter()
            .map(Into::into)
            .filter(|e: &String| !e.trim().is_empty())
            .collect();
        if entries.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self { entries })
    }

    /// Compiled-in fallback used when no corpus file is configured.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ENTRIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, CorpusError> {
        let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, CorpusError> {
        let has_separators = text.lines().any(|l| l.trim_end() == "%");
        if !has_separators {
            return Self::from_entries(text.lines());
        }

        let mut entries = Vec::new();
        let mut current = String::new();
        for line in text.lines() {
            if line.trim_end() == "%" {
                entries.push(std::mem::take(&mut current));
                continue;
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
        entries.push(current);
        Self::from_entries(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PayloadCorpus for FortuneCorpus {
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.entries[rng.gen_range(0..self.entries.len())]
    }
}
