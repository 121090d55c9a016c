//! Workload Generator - randomized routing workloads for the exchange test
//!
//! Sources and destinations are drawn independently and uniformly, so
//! self-messages occur naturally. The random source is injected: the same
//! seed and corpus always produce the same workload file.

use rand::Rng;
use std::path::Path;

use crate::bench::corpus::PayloadCorpus;
use crate::bench::error::WorkloadError;
use crate::core_types::{ClientId, Message, Workload};

/// Shape of a generated workload
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub client_count: u32,
    pub message_count: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            client_count: 4,
            message_count: 1000,
        }
    }
}

/// Message-by-message generator over an injected random source.
pub struct WorkloadGenerator<'a, R: Rng, C: PayloadCorpus> {
    rng: R,
    corpus: &'a C,
    config: GeneratorConfig,
}

impl<'a, R: Rng, C: PayloadCorpus> WorkloadGenerator<'a, R, C> {
    pub fn new(config: GeneratorConfig, rng: R, corpus: &'a C) -> Result<Self, WorkloadError> {
        if config.client_count == 0 {
            return Err(WorkloadError::NoClients);
        }
        Ok(Self {
            rng,
            corpus,
            config,
        })
    }

    fn select_client(&mut self) -> ClientId {
        self.rng.gen_range(1..=self.config.client_count)
    }

    /// Draw the next message.
    ///
    /// Consumption order per message: source, destination, payload.
    pub fn next_message(&mut self) -> Message {
        let source = self.select_client();
        let destination = self.select_client();
        let payload = self.corpus.draw(&mut self.rng);
        Message::new(source, destination, payload)
    }

    /// Generate the full configured workload.
    pub fn generate(mut self) -> Workload {
        let messages = (0..self.config.message_count)
            .map(|_| self.next_message())
            .collect();
        Workload::new(messages)
    }
}

/// Persist a workload; the file is what both the subject and the oracle read.
pub fn write_workload(workload: &Workload, path: &Path) -> Result<(), WorkloadError> {
    std::fs::write(path, workload.to_file_contents()).map_err(|source| WorkloadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        messages = workload.len(),
        "Workload written"
    );
    Ok(())
}
