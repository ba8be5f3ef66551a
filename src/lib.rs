//! In-memory sorted key-value store
//!
//! Keys and values are arbitrary byte strings. Entries live in a red-black
//! tree ([`tree::RedBlackTree`]) and are shared between threads through a
//! single reader-writer lock ([`store::Store`]).

pub mod bench;
pub mod config;
pub mod error;
pub mod store;
pub mod tree;
pub mod util;

pub use error::{Result, StoreError};
pub use store::Store;
