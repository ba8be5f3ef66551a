use thiserror::Error;

use crate::tree::InvariantViolation;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A writer panicked while holding the lock; the tree may be half-updated.
    #[error("store lock poisoned by a panicked writer")]
    LockPoisoned,

    #[error("tree invariant violated: {0}")]
    Corrupted(#[from] InvariantViolation),
}
