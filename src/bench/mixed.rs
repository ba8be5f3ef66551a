use std::thread;
use std::time::Instant;

use anyhow::bail;
use rand::Rng;
use tracing::{error, info};

use super::{BenchReport, Scenario, join_all};
use crate::config::MixedConfig;
use crate::store::Store;
use crate::util::time::{elapsed_ms, ops_per_ms};

/// Writer `writer` owns every key starting with its id
fn random_key(rng: &mut impl Rng, writer: usize) -> Vec<u8> {
    let mut key = (writer as u32).to_be_bytes().to_vec();
    key.extend_from_slice(&rng.random::<[u8; 2]>());
    key
}

#[derive(Debug, Default)]
struct Counts {
    writes: u64,
    reads: u64,
    hits: u64,
}

/// Random writers and readers share one store; readers check that any value
/// they see was written under the key they asked for.
pub fn run(config: &MixedConfig) -> anyhow::Result<BenchReport> {
    info!(
        writers = config.writer_threads,
        readers = config.reader_threads,
        ops_per_thread = config.ops_per_thread,
        "starting mixed read/write"
    );
    let store = Store::new();
    let start = Instant::now();

    let counts: Vec<Counts> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.writer_threads + config.reader_threads);

        for writer in 0..config.writer_threads {
            let store = &store;
            handles.push(scope.spawn(move || -> anyhow::Result<Counts> {
                let mut rng = rand::rng();
                let mut counts = Counts::default();
                for i in 0..config.ops_per_thread {
                    let key = random_key(&mut rng, writer);
                    let mut value = key[..4].to_vec();
                    value.extend_from_slice(&(i as u32).to_be_bytes());
                    store.put(&key, &value)?;
                    counts.writes += 1;
                }
                Ok(counts)
            }));
        }

        for _ in 0..config.reader_threads {
            let store = &store;
            handles.push(scope.spawn(move || -> anyhow::Result<Counts> {
                let mut rng = rand::rng();
                let mut counts = Counts::default();
                for _ in 0..config.ops_per_thread {
                    let writer = rng.random_range(0..config.writer_threads.max(1));
                    let key = random_key(&mut rng, writer);
                    counts.reads += 1;
                    if let Some(value) = store.get(&key)? {
                        if value.get(..4) != Some(&key[..4]) {
                            error!(?key, ?value, "read returned a value written under another key");
                            bail!("key {key:?} read back as {value:?}");
                        }
                        counts.hits += 1;
                    }
                }
                Ok(counts)
            }));
        }

        join_all(handles)
    })?;

    let elapsed = elapsed_ms(start);
    let total = counts.iter().fold(Counts::default(), |acc, c| Counts {
        writes: acc.writes + c.writes,
        reads: acc.reads + c.reads,
        hits: acc.hits + c.hits,
    });
    let tree = store.validate()?;
    info!(
        writes = total.writes,
        reads = total.reads,
        elapsed_ms = elapsed,
        "mixed read/write finished"
    );

    Ok(BenchReport {
        scenario: Scenario::Mixed,
        threads: config.writer_threads + config.reader_threads,
        writes: total.writes,
        reads: total.reads,
        hits: total.hits,
        elapsed_ms: elapsed,
        ops_per_ms: ops_per_ms(total.writes + total.reads, elapsed),
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_workload_keeps_tree_valid() {
        let report = run(&MixedConfig {
            writer_threads: 4,
            reader_threads: 12,
            ops_per_thread: 2000,
        })
        .unwrap();
        assert_eq!(report.writes, 8000);
        assert_eq!(report.reads, 24_000);
        assert!(report.hits <= report.reads);
        // Random suffixes repeat, so overwrites keep the count at or below the writes.
        assert!(report.tree.len as u64 <= report.writes);
        assert!(report.tree.len > 0);
    }

    #[test]
    fn test_readers_without_writers_miss() {
        let report = run(&MixedConfig {
            writer_threads: 0,
            reader_threads: 2,
            ops_per_thread: 100,
        })
        .unwrap();
        assert_eq!(report.hits, 0);
        assert_eq!(report.tree.len, 0);
    }
}
