use std::thread;
use std::time::Instant;

use anyhow::{bail, ensure};
use tracing::{error, info};

use super::{BenchReport, Scenario, join_all};
use crate::config::ReadsConfig;
use crate::store::Store;
use crate::util::time::{elapsed_ms, ops_per_ms};

fn key_for(index: usize) -> [u8; 4] {
    (index as u32).to_be_bytes()
}

fn value_for(index: usize) -> [u8; 4] {
    (index as u32).to_le_bytes()
}

/// Readers hammer a store populated up front; no writer runs meanwhile.
pub fn run(config: &ReadsConfig) -> anyhow::Result<BenchReport> {
    info!(
        keys = config.keys,
        threads = config.threads,
        reads_per_thread = config.reads_per_thread,
        "starting concurrent reads"
    );
    ensure!(config.keys > 0, "concurrent reads need at least one key");
    let store = Store::new();
    for index in 0..config.keys {
        store.put(&key_for(index), &value_for(index))?;
    }

    let start = Instant::now();
    let hits: Vec<u64> = thread::scope(|scope| {
        let handles = (0..config.threads)
            .map(|t| {
                let store = &store;
                scope.spawn(move || -> anyhow::Result<u64> {
                    let mut hits = 0;
                    for i in 0..config.reads_per_thread {
                        let index = (t * 7919 + i * 31) % config.keys;
                        match store.get(&key_for(index))? {
                            Some(value) if value == value_for(index) => hits += 1,
                            Some(value) => {
                                error!(index, ?value, "read returned a value stored under another key");
                                bail!("key {index} read back as {value:?}");
                            }
                            None => {}
                        }
                    }
                    Ok(hits)
                })
            })
            .collect();
        join_all(handles)
    })?;

    let elapsed = elapsed_ms(start);
    let hits: u64 = hits.iter().sum();
    let reads = (config.threads * config.reads_per_thread) as u64;
    let tree = store.validate()?;
    info!(reads, hits, elapsed_ms = elapsed, "concurrent reads finished");

    Ok(BenchReport {
        scenario: Scenario::Reads,
        threads: config.threads,
        writes: config.keys as u64,
        reads,
        hits,
        elapsed_ms: elapsed,
        ops_per_ms: ops_per_ms(reads, elapsed),
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_read_hits() {
        let report = run(&ReadsConfig {
            keys: 1000,
            threads: 16,
            reads_per_thread: 1000,
        })
        .unwrap();
        assert_eq!(report.reads, 16_000);
        assert_eq!(report.hits, 16_000);
        assert_eq!(report.tree.len, 1000);
    }
}
