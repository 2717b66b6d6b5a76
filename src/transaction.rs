use std::sync::OnceLock;

use alloy::{
    consensus::{Transaction, TxEnvelope},
    eips::eip2718::Encodable2718,
    primitives::{Address, TxHash, U256},
};

/// Gas consumed by any transaction before any computation happens.
pub const TX_GAS: u64 = 21_000;
/// Gas consumed by a contract-creating transaction under homestead rules.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Gas charged per zero byte of transaction payload.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Gas charged per non-zero byte of transaction payload.
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;

/// Minimum gas required merely to initiate execution of a transaction with
/// the given payload, before any computation.
pub fn intrinsic_gas(data: &[u8], contract_creation: bool, homestead: bool) -> u64 {
    let mut gas =
        if contract_creation && homestead { TX_GAS_CONTRACT_CREATION } else { TX_GAS };
    let non_zero = data.iter().filter(|byte| **byte != 0).count() as u64;
    let zero = data.len() as u64 - non_zero;
    gas += non_zero * TX_DATA_NON_ZERO_GAS;
    gas += zero * TX_DATA_ZERO_GAS;
    gas
}

/// Error produced when a transaction signer cannot be derived.
#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
pub enum SignerError {
    /// The transaction is replay-protected for a different chain.
    #[error("chain id mismatch: signer {signer}, tx {tx}")]
    ChainIdMismatch {
        /// Chain id the signer operates on
        signer: u64,
        /// Chain id carried by the transaction
        tx: u64,
    },
    /// The signature does not yield a valid public key.
    #[error("signature recovery failed")]
    Recovery,
}

/// Sender derivation for replay-protected transactions on a single chain.
///
/// Recovery results are memoized on the transaction itself, so repeated
/// derivations are cheap.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Eip155Signer {
    chain_id: u64,
}

impl Eip155Signer {
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Derives the sender of the given transaction, rejecting transactions
    /// that are bound to a different chain.
    pub fn recover(&self, tx: &PooledTransaction) -> Result<Address, SignerError> {
        if let Some(sender) = tx.sender() {
            return Ok(sender);
        }
        if let Some(tx_chain_id) = tx.inner().chain_id() {
            if tx_chain_id != self.chain_id {
                return Err(SignerError::ChainIdMismatch { signer: self.chain_id, tx: tx_chain_id });
            }
        }
        let sender = tx.inner().recover_signer().map_err(|_| SignerError::Recovery)?;
        // Concurrent derivations race benignly: the result is identical.
        let _ = tx.sender.set(sender);
        Ok(sender)
    }
}

/// A transaction held by the pool.
///
/// Wraps the raw envelope with the two pieces of derived data the pool needs
/// on every hot path: the encoded size, computed once at construction, and
/// the recovered sender, memoized behind a read-through accessor.
#[derive(Debug)]
pub struct PooledTransaction {
    tx: TxEnvelope,
    size: usize,
    sender: OnceLock<Address>,
}

impl PooledTransaction {
    pub fn new(tx: TxEnvelope) -> Self {
        let size = tx.encode_2718_len();
        Self { tx, size, sender: OnceLock::new() }
    }

    /// The raw transaction envelope.
    pub const fn inner(&self) -> &TxEnvelope {
        &self.tx
    }

    pub fn hash(&self) -> TxHash {
        *self.tx.tx_hash()
    }

    /// Size of the encoded transaction in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The memoized sender, if it has been derived.
    pub fn sender(&self) -> Option<Address> {
        self.sender.get().copied()
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce()
    }

    pub fn gas_limit(&self) -> u64 {
        self.tx.gas_limit()
    }

    /// The price this transaction is willing to pay per unit of gas.
    pub fn gas_price(&self) -> u128 {
        self.tx.max_fee_per_gas()
    }

    pub fn value(&self) -> U256 {
        self.tx.value()
    }

    /// The transaction payload.
    pub fn data(&self) -> &[u8] {
        self.tx.input()
    }

    /// Whether this transaction creates a contract.
    pub fn is_create(&self) -> bool {
        self.tx.to().is_create()
    }

    /// Total cost the sender must be able to cover: `value + gas_price * gas_limit`.
    pub fn cost(&self) -> U256 {
        U256::from(self.gas_price()) * U256::from(self.gas_limit()) + self.value()
    }
}
