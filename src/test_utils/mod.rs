//! Helpers for constructing signed transactions and a mock chain-state
//! oracle, used by the crate tests and by embedders testing against the pool.

pub mod helpers;
