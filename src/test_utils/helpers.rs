//! Test utility helpers for transaction, sender and chain-state creation.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use alloy::{
    consensus::TxEnvelope,
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::{Address, TxKind, U256},
    rpc::types::{TransactionInput, TransactionRequest},
    signers::{k256::Secp256k1, local::LocalSigner, utils::secret_key_to_address},
};
use ecdsa::SigningKey;
use parking_lot::Mutex;
use rand_core::OsRng;

use crate::{
    interface::{AccountState, StateOracle},
    result::StateError,
    transaction::PooledTransaction,
};

/// Block gas limit reported by [`MockOracle`] unless overridden.
pub const DEFAULT_GAS_LIMIT: u64 = 8_000_000;

/// `amount` whole ether in wei.
pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18))
}

// === Senders and transactions ===

pub fn create_sender() -> (Address, SigningKey<Secp256k1>) {
    let private_key = SigningKey::random(&mut OsRng);
    let address = secret_key_to_address(&private_key);
    (address, private_key)
}

/// Builds and signs an EIP-1559 transaction with the given parameters.
pub async fn create_tx(
    private_key: SigningKey<Secp256k1>,
    sender: Address,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    value: U256,
    nonce: u64,
) -> TxEnvelope {
    create_signed_tx(
        private_key,
        sender,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        gas_limit,
        value,
        nonce,
        Vec::new(),
    )
    .await
}

/// Builds and signs an EIP-1559 transaction carrying the given payload.
pub async fn create_tx_with_input(
    private_key: SigningKey<Secp256k1>,
    sender: Address,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    nonce: u64,
    input: Vec<u8>,
) -> TxEnvelope {
    create_signed_tx(
        private_key,
        sender,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        gas_limit,
        U256::ZERO,
        nonce,
        input,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn create_signed_tx(
    private_key: SigningKey<Secp256k1>,
    sender: Address,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    value: U256,
    nonce: u64,
    input: Vec<u8>,
) -> TxEnvelope {
    let req = TransactionRequest {
        to: Some(TxKind::Call(Address::random())),
        max_fee_per_gas: Some(max_fee_per_gas),
        max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
        gas: Some(gas_limit),
        value: Some(value),
        input: TransactionInput::new(input.into()),
        nonce: Some(nonce),
        chain_id: Some(1),
        ..Default::default()
    };
    let typed_tx = req.build_typed_tx().expect("Failed to build typed tx");
    let local_signer: LocalSigner<SigningKey<Secp256k1>> =
        LocalSigner::from_signing_key(private_key);
    let wallet = EthereumWallet::new(local_signer);
    let tx_env = <EthereumWallet as NetworkWallet<Ethereum>>::sign_transaction_from(
        &wallet, sender, typed_tx,
    )
    .await
    .expect("Failed to sign tx");

    assert!(tx_env.is_eip1559(), "Transaction is not EIP1559");
    tx_env
}

/// Builds a signed transaction wrapped as a pool transaction.
pub async fn create_pooled_tx(
    private_key: SigningKey<Secp256k1>,
    sender: Address,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    value: U256,
    nonce: u64,
) -> Arc<PooledTransaction> {
    let tx = create_tx(
        private_key,
        sender,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        gas_limit,
        value,
        nonce,
    )
    .await;
    Arc::new(PooledTransaction::new(tx))
}

pub async fn create_pooled_tx_and_sender(
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    gas_limit: u64,
    value: U256,
    nonce: u64,
) -> (Arc<PooledTransaction>, Address, SigningKey<Secp256k1>) {
    let (sender, private_key) = create_sender();
    let tx = create_pooled_tx(
        private_key.clone(),
        sender,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        gas_limit,
        value,
        nonce,
    )
    .await;
    (tx, sender, private_key)
}

// === Mock chain state ===

#[derive(Debug, Clone, Default)]
struct MockAccounts {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
}

/// Immutable account-state snapshot handed out by [`MockOracle`].
struct MockSnapshot {
    accounts: MockAccounts,
}

impl AccountState for MockSnapshot {
    fn nonce(&self, addr: Address) -> u64 {
        self.accounts.nonces.get(&addr).copied().unwrap_or_default()
    }

    fn balance(&self, addr: Address) -> U256 {
        self.accounts.balances.get(&addr).copied().unwrap_or_default()
    }
}

/// In-memory chain-state oracle with settable nonces, balances, gas limit and
/// failure injection.
pub struct MockOracle {
    accounts: Mutex<MockAccounts>,
    gas_limit: AtomicU64,
    fail: AtomicBool,
}

impl MockOracle {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            accounts: Mutex::new(MockAccounts::default()),
            gas_limit: AtomicU64::new(gas_limit),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_nonce(&self, addr: Address, nonce: u64) {
        self.accounts.lock().nonces.insert(addr, nonce);
    }

    pub fn set_balance(&self, addr: Address, balance: U256) {
        self.accounts.lock().balances.insert(addr, balance);
    }

    /// Shorthand for funding an account with a balance.
    pub fn fund(&self, addr: Address, balance: U256) {
        self.set_balance(addr, balance);
    }

    pub fn set_gas_limit(&self, gas_limit: u64) {
        self.gas_limit.store(gas_limit, Ordering::Relaxed);
    }

    /// Makes subsequent state reads fail until reset, simulating an
    /// unavailable chain backend.
    pub fn fail_state_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl StateOracle for MockOracle {
    fn current_state(&self) -> Result<Arc<dyn AccountState>, StateError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(StateError("mock oracle offline".to_string()));
        }
        Ok(Arc::new(MockSnapshot { accounts: self.accounts.lock().clone() }))
    }

    fn block_gas_limit(&self) -> u64 {
        self.gas_limit.load(Ordering::Relaxed)
    }
}
