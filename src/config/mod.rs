use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Concurrent write workload: every thread inserts its own disjoint keys
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WritesConfig {
  pub threads: usize,
  pub ops_per_thread: usize,
}

impl Default for WritesConfig {
  fn default() -> Self {
    Self {
      threads: 8,
      ops_per_thread: 1000,
    }
  }
}

/// Concurrent read workload over a pre-populated store
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReadsConfig {
  pub keys: usize,
  pub threads: usize,
  pub reads_per_thread: usize,
}

impl Default for ReadsConfig {
  fn default() -> Self {
    Self {
      keys: 1000,
      threads: 16,
      reads_per_thread: 10000,
    }
  }
}

/// Random writers and readers running at the same time
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MixedConfig {
  pub writer_threads: usize,
  pub reader_threads: usize,
  pub ops_per_thread: usize,
}

impl Default for MixedConfig {
  fn default() -> Self {
    Self {
      writer_threads: 4,
      reader_threads: 12,
      ops_per_thread: 5000,
    }
  }
}

/// Benchmark workload sizes
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
  pub writes: WritesConfig,
  pub reads: ReadsConfig,
  pub mixed: MixedConfig,
}

/// rbkv configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,

  /// Benchmark configuration
  #[serde(default)]
  pub bench: BenchConfig,
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config: Config = toml::from_str(&config_str)
      .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;

    config.validate()?;
    Ok(config)
  }

  /// Reject workloads that cannot run
  pub fn validate(&self) -> anyhow::Result<()> {
    let bench = &self.bench;
    anyhow::ensure!(bench.writes.threads > 0, "bench.writes.threads must be positive");
    anyhow::ensure!(bench.reads.threads > 0, "bench.reads.threads must be positive");
    anyhow::ensure!(bench.reads.keys > 0, "bench.reads.keys must be positive");
    anyhow::ensure!(
      bench.mixed.writer_threads + bench.mixed.reader_threads > 0,
      "bench.mixed needs at least one thread"
    );
    Ok(())
  }
}
