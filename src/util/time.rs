//! Time utility functions

use std::time::Instant;

/// Milliseconds elapsed since `start`
pub fn elapsed_ms(start: Instant) -> u64 {
  u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Operations per millisecond, counting a sub-millisecond run as one
pub fn ops_per_ms(ops: u64, elapsed_ms: u64) -> u64 {
  ops / elapsed_ms.max(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_elapsed_ms() {
    let start = Instant::now();
    std::thread::sleep(std::time::Duration::from_millis(10));
    assert!(elapsed_ms(start) >= 10);
  }

  #[test]
  fn test_ops_per_ms() {
    assert_eq!(ops_per_ms(8000, 4), 2000);
    assert_eq!(ops_per_ms(500, 0), 500);
  }
}
