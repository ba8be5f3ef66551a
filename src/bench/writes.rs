use std::thread;
use std::time::Instant;

use anyhow::{bail, ensure};
use tracing::{error, info};

use super::{BenchReport, Scenario, join_all, worker_key};
use crate::config::WritesConfig;
use crate::store::Store;
use crate::util::time::{elapsed_ms, ops_per_ms};

fn value_for(thread: usize, index: usize) -> Vec<u8> {
    vec![((thread * 100 + index) & 0xff) as u8]
}

/// Every thread writes its own keys; afterwards each key is read back.
pub fn run(config: &WritesConfig) -> anyhow::Result<BenchReport> {
    info!(
        threads = config.threads,
        ops_per_thread = config.ops_per_thread,
        "starting concurrent writes"
    );
    let store = Store::new();
    let start = Instant::now();

    thread::scope(|scope| {
        let handles = (0..config.threads)
            .map(|t| {
                let store = &store;
                scope.spawn(move || -> anyhow::Result<()> {
                    for i in 0..config.ops_per_thread {
                        store.put(&worker_key(t, i), &value_for(t, i))?;
                    }
                    Ok(())
                })
            })
            .collect();
        join_all(handles)
    })?;

    let elapsed = elapsed_ms(start);

    for t in 0..config.threads {
        for i in 0..config.ops_per_thread {
            let key = worker_key(t, i);
            match store.get(&key)? {
                Some(value) if value == value_for(t, i) => {}
                other => {
                    error!(thread = t, index = i, ?other, "written key not read back");
                    bail!("key {key:?} written by thread {t} read back as {other:?}");
                }
            }
        }
    }

    let writes = (config.threads * config.ops_per_thread) as u64;
    let tree = store.validate()?;
    ensure!(
        tree.len as u64 == writes,
        "expected {writes} entries after concurrent writes, found {}",
        tree.len
    );
    info!(writes, elapsed_ms = elapsed, "all keys verified");

    Ok(BenchReport {
        scenario: Scenario::Writes,
        threads: config.threads,
        writes,
        reads: 0,
        hits: 0,
        elapsed_ms: elapsed,
        ops_per_ms: ops_per_ms(writes, elapsed),
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_writers_thousand_keys_each() {
        let report = run(&WritesConfig::default()).unwrap();
        assert_eq!(report.writes, 8000);
        assert_eq!(report.tree.len, 8000);
    }

    #[test]
    fn test_zero_ops() {
        let report = run(&WritesConfig {
            threads: 2,
            ops_per_thread: 0,
        })
        .unwrap();
        assert_eq!(report.tree.len, 0);
    }
}
