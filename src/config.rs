use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::bench::AcceptableRange;
use crate::core_types::ThreadCount;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Echo subject output into the logs and build subjects with `-DDEBUG=1`
    pub debug: bool,
    /// Directory holding the subject's Makefile and sources
    pub subject_dir: PathBuf,
    /// Where stdout.txt / stderr.txt / expected.txt are written
    pub artifacts_dir: PathBuf,
    pub build_program: String,
    pub build_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub pi: PiConfig,
    pub exchange: ExchangeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            log_file: "grader.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            debug: false,
            subject_dir: PathBuf::from("."),
            artifacts_dir: PathBuf::from("."),
            build_program: "make".to_string(),
            build_timeout_secs: 30,
            run_timeout_secs: 120,
            pi: PiConfig::default(),
            exchange: ExchangeConfig::default(),
        }
    }
}

/// Parallel pi estimator sweep
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PiConfig {
    pub thread_counts: Vec<ThreadCount>,
    pub num_points: u64,
    pub acceptable_low: f64,
    pub acceptable_high: f64,
    /// Defaults to the detected parallelism of this machine
    pub available_cores: Option<u32>,
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            thread_counts: vec![1, 2, 4, 8],
            num_points: 1_000_000_000,
            acceptable_low: 3.14,
            acceptable_high: 3.15,
            available_cores: None,
        }
    }
}

impl PiConfig {
    pub fn acceptable_range(&self) -> AcceptableRange {
        AcceptableRange::new(self.acceptable_low, self.acceptable_high)
    }

    pub fn cores(&self) -> u32 {
        self.available_cores.unwrap_or_else(detected_cores)
    }
}

/// Message exchange test
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub clients: u32,
    pub exchanges: u32,
    pub messages: usize,
    /// Generated workload location, relative to `subject_dir`
    pub workload_file: PathBuf,
    /// Fortune-format corpus; the built-in corpus is used when unset
    pub corpus_file: Option<PathBuf>,
    /// Stderr phrase that marks a busy-waiting subject
    pub busy_wait_marker: Option<String>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            clients: 4,
            exchanges: 4,
            messages: 1000,
            workload_file: PathBuf::from("file.txt"),
            corpus_file: None,
            busy_wait_marker: Some("ERROR: Tried to check if".to_string()),
        }
    }
}

pub fn detected_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

impl AppConfig {
    pub fn env_path(env: &str) -> PathBuf {
        PathBuf::from(format!("config/{}.yaml", env))
    }

    /// Load `config/<env>.yaml`, or the defaults when that file is absent.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let path = Self::env_path(env);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threads = &self.pi.thread_counts;
        if threads.is_empty() {
            return Err(ConfigError::Invalid("pi.thread_counts is empty".into()));
        }
        if threads.contains(&0) {
            return Err(ConfigError::Invalid("pi.thread_counts contains 0".into()));
        }
        if threads.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::Invalid(format!(
                "pi.thread_counts must be strictly increasing, got {:?}",
                threads
            )));
        }
        if self.pi.acceptable_low > self.pi.acceptable_high {
            return Err(ConfigError::Invalid(format!(
                "pi.acceptable_low {} exceeds pi.acceptable_high {}",
                self.pi.acceptable_low, self.pi.acceptable_high
            )));
        }
        if self.exchange.clients == 0 {
            return Err(ConfigError::Invalid("exchange.clients must be at least 1".into()));
        }
        if self.build_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }
        Ok(())
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}
