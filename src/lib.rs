//! A per-node staging area for blockchain transactions.
//!
//! The pool ingests transactions from local submission and network peers,
//! validates them against the current chain state, groups them by sender and
//! orders them by nonce. Transactions whose nonce continues the sender's
//! current account nonce form the executable (pending) set consumed by the
//! block producer; everything else waits in the future queue until its
//! predecessors arrive. A maintenance task tracks chain-head changes, demotes
//! transactions the new head invalidated and expires queued transactions
//! whose sender went quiet.
//!
//! The main entry point is [`TxPool`]; its collaborators are abstracted as
//! [`StateOracle`] (chain state and gas limit), [`ChainEvent`] (head
//! tracking) and [`ForwardHook`] (outbound handoff of freshly executable
//! transactions).

pub mod config;
pub mod forward;
pub mod interface;
mod maintain;
pub mod pool;
pub mod result;
pub mod test_utils;
pub mod transaction;

pub use config::{ChainSpec, PoolConfig};
pub use forward::{ForwardHook, ForwardOutcome};
pub use interface::{AccountState, ChainEvent, StateOracle};
pub use pool::{ContentSnapshot, TxPool};
pub use result::{PoolError, PoolErrorKind, PoolResult, StateError};
pub use transaction::{Eip155Signer, PooledTransaction, SignerError};
