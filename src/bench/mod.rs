//! Multi-threaded workloads driving a shared [`Store`]
//!
//! Each scenario builds a fresh store, runs its threads to completion,
//! verifies what it can about the result and returns a [`BenchReport`].
//! Every scenario ends with a full invariant check of the tree.
//!
//! [`Store`]: crate::store::Store

mod mixed;
mod reads;
mod writes;

use std::fmt;
use std::thread::ScopedJoinHandle;

use anyhow::anyhow;
use serde::Serialize;

use crate::config::BenchConfig;
use crate::tree::TreeStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Writes,
    Reads,
    Mixed,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Writes, Scenario::Reads, Scenario::Mixed];

    pub fn run(self, config: &BenchConfig) -> anyhow::Result<BenchReport> {
        match self {
            Scenario::Writes => writes::run(&config.writes),
            Scenario::Reads => reads::run(&config.reads),
            Scenario::Mixed => mixed::run(&config.mixed),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Writes => write!(f, "concurrent writes"),
            Scenario::Reads => write!(f, "concurrent reads"),
            Scenario::Mixed => write!(f, "mixed read/write"),
        }
    }
}

/// Outcome of one scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchReport {
    pub scenario: Scenario,
    pub threads: usize,
    pub writes: u64,
    pub reads: u64,
    /// Reads that found a value
    pub hits: u64,
    pub elapsed_ms: u64,
    pub ops_per_ms: u64,
    /// Shape of the tree after the run
    pub tree: TreeStats,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} on {} threads completed in {} ms", self.scenario, self.threads, self.elapsed_ms)?;
        writeln!(
            f,
            "Writes: {}, Reads: {} ({} hits), Ops/ms: {}",
            self.writes, self.reads, self.hits, self.ops_per_ms
        )?;
        write!(
            f,
            "Tree: {} entries, height {}, black height {}",
            self.tree.len, self.tree.height, self.tree.black_height
        )
    }
}

/// Join every worker, surfacing the first failure
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, anyhow::Result<T>>>) -> anyhow::Result<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.join().map_err(|_| anyhow!("worker thread panicked"))?;
        results.push(result?);
    }
    Ok(results)
}

/// Key owned by worker `thread`, unique per `index`
fn worker_key(thread: usize, index: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(8);
    key.extend_from_slice(&(thread as u32).to_be_bytes());
    key.extend_from_slice(&(index as u32).to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MixedConfig, ReadsConfig, WritesConfig};

    fn small_config() -> BenchConfig {
        BenchConfig {
            writes: WritesConfig {
                threads: 4,
                ops_per_thread: 200,
            },
            reads: ReadsConfig {
                keys: 100,
                threads: 4,
                reads_per_thread: 500,
            },
            mixed: MixedConfig {
                writer_threads: 2,
                reader_threads: 4,
                ops_per_thread: 300,
            },
        }
    }

    #[test]
    fn test_worker_keys_are_disjoint_and_ordered() {
        assert!(worker_key(0, 999) < worker_key(1, 0));
        assert_ne!(worker_key(1, 2), worker_key(2, 1));
    }

    #[test]
    fn test_all_scenarios_run() {
        let config = small_config();
        for scenario in Scenario::ALL {
            let report = scenario.run(&config).unwrap();
            assert_eq!(report.scenario, scenario);
            assert!(report.tree.len > 0, "{scenario} left an empty tree");
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = Scenario::Writes.run(&small_config()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenario"], "writes");
        assert_eq!(json["writes"], 800);
        assert_eq!(json["tree"]["len"], 800);
    }

    #[test]
    fn test_report_display() {
        let report = Scenario::Reads.run(&small_config()).unwrap();
        let text = report.to_string();
        assert!(text.starts_with("concurrent reads on 4 threads"));
        assert!(text.contains("Reads: 2000 (2000 hits)"));
    }
}
