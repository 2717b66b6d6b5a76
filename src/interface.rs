//! Interfaces to the chain-side collaborators of the pool.
//!
//! The pool never reads chain data directly: account nonces and balances come
//! from a [`StateOracle`] snapshot, and head changes arrive as
//! [`ChainEvent`]s on a channel owned by the maintenance task.

use std::sync::Arc;

use alloy::{
    consensus::TxEnvelope,
    primitives::{Address, U256},
};

use crate::result::StateError;

/// A read-only snapshot of account state at some chain head.
///
/// Snapshots are immutable; the pool swaps in a fresh one on every reset.
pub trait AccountState: Send + Sync {
    /// The account nonce at the snapshot head.
    fn nonce(&self, addr: Address) -> u64;
    /// The account balance at the snapshot head.
    fn balance(&self, addr: Address) -> U256;
}

/// Supplier of chain state snapshots and the current block gas limit.
pub trait StateOracle: Send + Sync {
    /// Returns a snapshot of the state at the current chain head.
    fn current_state(&self) -> Result<Arc<dyn AccountState>, StateError>;

    /// The gas limit of the current head block.
    fn block_gas_limit(&self) -> u64;
}

/// Chain events the pool reacts to.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    /// A new canonical head block was adopted.
    NewHead {
        /// Height of the new head
        number: u64,
    },
    /// Transactions fell out of the canonical chain during a reorg and should
    /// be re-admitted.
    RemovedTransactions(Vec<TxEnvelope>),
}

/// State snapshot used before the first successful oracle read. Every account
/// is empty, so admissions fail the funds check until a real snapshot lands.
pub(crate) struct EmptyState;

impl AccountState for EmptyState {
    fn nonce(&self, _addr: Address) -> u64 {
        0
    }

    fn balance(&self, _addr: Address) -> U256 {
        U256::ZERO
    }
}
