//! Key ordering

use std::cmp::Ordering;

/// Compare two keys byte by byte (unsigned).
///
/// The first differing byte decides. When one key is a prefix of the other,
/// the shorter key orders first.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}
