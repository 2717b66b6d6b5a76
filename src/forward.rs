//! Outbound handoff of newly executable transactions.

use std::sync::Arc;

use crate::transaction::PooledTransaction;

/// Result of handing a transaction to the forward hook.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ForwardOutcome {
    /// The transaction was accepted downstream.
    Ok,
    /// Delivery failed but may succeed later; the transaction stays pooled.
    Transient(String),
    /// Delivery failed permanently; the transaction must be removed.
    Terminal(String),
}

/// Hook invoked synchronously whenever a transaction is promoted to the
/// executable set, before the pool lock is released.
///
/// At most one hook can be installed, once, at startup. When a hook is
/// installed it replaces the in-process promotion event; when none is, the
/// pool posts promoted transactions to its local subscribers instead.
pub trait ForwardHook: Send + Sync {
    fn forward(&self, tx: &Arc<PooledTransaction>) -> ForwardOutcome;
}

impl<F> ForwardHook for F
where
    F: Fn(&Arc<PooledTransaction>) -> ForwardOutcome + Send + Sync,
{
    fn forward(&self, tx: &Arc<PooledTransaction>) -> ForwardOutcome {
        self(tx)
    }
}
