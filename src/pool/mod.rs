mod list;
mod lookup;
mod managed;

use std::{
    collections::{BinaryHeap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    time::Instant,
};

use alloy::{
    consensus::TxEnvelope,
    primitives::{Address, TxHash},
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{ChainSpec, PoolConfig},
    forward::{ForwardHook, ForwardOutcome},
    interface::{AccountState, ChainEvent, EmptyState, StateOracle},
    maintain,
    result::{PoolError, PoolErrorKind, PoolResult},
    transaction::{intrinsic_gas, Eip155Signer, PooledTransaction},
};

use list::SenderList;
use lookup::TxLookup;
use managed::ManagedNonces;

/// Heuristic upper bound on the encoded transaction size. Oversized payloads
/// are rejected as DOS protection, not as a consensus rule.
const MAX_TX_SIZE: usize = 32 * 1024;

/// Buffered promotion events before slow in-process subscribers start
/// missing them.
const PROMOTION_EVENT_BUFFER: usize = 1024;

/// Snapshot of both pool tiers, grouped by sender and sorted by nonce.
pub type ContentSnapshot = HashMap<Address, Vec<Arc<PooledTransaction>>>;

/// The shared mutable state of the pool, guarded by a single reader-writer
/// lock on [`TxPool`].
struct PoolInner {
    /// All currently executable transactions
    pending: HashMap<Address, SenderList>,
    /// Queued but non-executable transactions
    queue: HashMap<Address, SenderList>,
    /// Dedup index over both tiers
    lookup: TxLookup,
    /// Item count in `pending`
    pending_volume: u64,
    /// Item count in `queue`
    queue_volume: u64,
    /// Last promotion instant for each known account, the eviction key
    beats: HashMap<Address, Instant>,
    /// Projected next nonce per account with executable transactions
    managed: ManagedNonces,
    /// Account state at the current chain head
    state: Arc<dyn AccountState>,
    /// Minimum gas price accepted from remote submitters
    gas_price: u128,
}

impl PoolInner {
    /// Inserts a transaction into the future queue, replacing an incumbent at
    /// the same nonce when the price bump allows it. Returns whether an
    /// incumbent was replaced.
    fn enqueue_tx(
        &mut self,
        tx: Arc<PooledTransaction>,
        sender: Address,
        price_bump: u64,
    ) -> Result<bool, PoolErrorKind> {
        let list = self.queue.entry(sender).or_insert_with(|| SenderList::new(false));
        let (inserted, displaced) = list.add(Arc::clone(&tx), price_bump);
        if !inserted {
            return Err(PoolErrorKind::ReplaceUnderpriced);
        }
        let replaced = displaced.is_some();
        match displaced {
            Some(old) => {
                self.lookup.remove(&old.hash());
            }
            None => self.queue_volume += 1,
        }
        self.lookup.insert(tx);
        Ok(replaced)
    }

    /// Removes a single transaction, moving any pending transactions it
    /// invalidates back into the future queue. A missing hash is a no-op.
    fn remove_tx(&mut self, hash: &TxHash, price_bump: u64) {
        let Some(tx) = self.lookup.remove(hash) else {
            return;
        };
        // The sender was derived during admission.
        let Some(addr) = tx.sender() else {
            return;
        };
        let nonce = tx.nonce();

        if let Some(list) = self.pending.get_mut(&addr) {
            let (removed, invalids) = list.remove(nonce);
            if removed {
                let emptied = list.is_empty();
                self.pending_volume -= 1;
                // Postpone everything that depended on the removed nonce.
                for invalid in invalids {
                    self.pending_volume -= 1;
                    if self.enqueue_tx(Arc::clone(&invalid), addr, price_bump).is_err() {
                        self.lookup.remove(&invalid.hash());
                    }
                }
                let state = Arc::clone(&self.state);
                self.managed.roll_back(addr, nonce, &*state);
                if emptied {
                    self.pending.remove(&addr);
                    self.beats.remove(&addr);
                }
                return;
            }
        }
        let mut emptied = false;
        let mut removed = false;
        if let Some(list) = self.queue.get_mut(&addr) {
            removed = list.remove(nonce).0;
            emptied = removed && list.is_empty();
        }
        if removed {
            self.queue_volume -= 1;
        }
        if emptied {
            self.queue.remove(&addr);
        }
    }

    /// Removes invalid and processed transactions from the executable tier.
    /// Transactions that merely lost executability are moved back into the
    /// future queue.
    fn demote_unexecutables(&mut self, block_gas_limit: u64, price_bump: u64) {
        let accounts: Vec<Address> = self.pending.keys().copied().collect();
        for addr in accounts {
            let state_nonce = self.state.nonce(addr);
            let balance = self.state.balance(addr);
            let Some(list) = self.pending.get_mut(&addr) else {
                continue;
            };
            let stale = list.forward(state_nonce);
            let (drops, invalids) = list.filter(balance, block_gas_limit);
            let emptied = list.is_empty();

            for tx in stale {
                trace!(hash = %tx.hash(), "Removed old pending transaction");
                self.lookup.remove(&tx.hash());
                self.pending_volume -= 1;
            }
            for tx in drops {
                trace!(hash = %tx.hash(), "Removed unpayable pending transaction");
                self.lookup.remove(&tx.hash());
                self.pending_volume -= 1;
            }
            for tx in invalids {
                trace!(hash = %tx.hash(), "Demoting pending transaction");
                self.pending_volume -= 1;
                if self.enqueue_tx(Arc::clone(&tx), addr, price_bump).is_err() {
                    self.lookup.remove(&tx.hash());
                }
            }
            if emptied {
                self.pending.remove(&addr);
                self.beats.remove(&addr);
            }
        }
    }
}

/// The transaction pool.
///
/// Transactions enter the pool when they are submitted locally or received
/// from the network, and leave it when they are included in the chain or
/// become invalid. The pool separates executable transactions, which form a
/// contiguous nonce run from the account's current state nonce, from future
/// transactions waiting on their predecessors; transactions move between the
/// two tiers as chain heads come and go.
pub struct TxPool {
    config: PoolConfig,
    chain: ChainSpec,
    signer: Eip155Signer,
    oracle: Arc<dyn StateOracle>,
    /// Whether the homestead rule set is active at the current head
    homestead: AtomicBool,
    inner: RwLock<PoolInner>,
    forward_hook: OnceLock<Arc<dyn ForwardHook>>,
    promotions: broadcast::Sender<Arc<PooledTransaction>>,
    quit: watch::Sender<bool>,
    maintenance: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TxPool {
    /// Creates a new pool over the given chain state oracle and primes it
    /// with a first state snapshot.
    ///
    /// The returned pool is fully functional but performs no background
    /// maintenance; embedders drive it through [`TxPool::on_chain_head`]. Use
    /// [`TxPool::spawn`] for the self-maintaining variant.
    pub fn new(config: PoolConfig, chain: ChainSpec, oracle: Arc<dyn StateOracle>) -> Self {
        let config = config.sanitize();
        let (promotions, _) = broadcast::channel(PROMOTION_EVENT_BUFFER);
        let (quit, _) = watch::channel(false);
        let pool = Self {
            signer: Eip155Signer::new(chain.chain_id),
            homestead: AtomicBool::new(false),
            inner: RwLock::new(PoolInner {
                pending: HashMap::new(),
                queue: HashMap::new(),
                lookup: TxLookup::default(),
                pending_volume: 0,
                queue_volume: 0,
                beats: HashMap::new(),
                managed: ManagedNonces::default(),
                state: Arc::new(EmptyState),
                gas_price: config.price_limit as u128,
            }),
            config,
            chain,
            oracle,
            forward_hook: OnceLock::new(),
            promotions,
            quit,
            maintenance: Mutex::new(None),
        };
        pool.reset();
        pool
    }

    /// Creates a pool and spawns its maintenance task on the current tokio
    /// runtime. The task reacts to `events` and runs the periodic stats
    /// report and expiration sweeps until [`TxPool::stop`] is called.
    pub fn spawn(
        config: PoolConfig,
        chain: ChainSpec,
        oracle: Arc<dyn StateOracle>,
        events: mpsc::UnboundedReceiver<ChainEvent>,
    ) -> Arc<Self> {
        let pool = Arc::new(Self::new(config, chain, oracle));
        let task = tokio::spawn(maintain::maintenance_task(
            Arc::clone(&pool),
            events,
            pool.quit.subscribe(),
        ));
        *pool.maintenance.lock() = Some(task);
        pool
    }

    /// Signals the maintenance task to exit and waits for it. Admissions in
    /// flight complete normally.
    pub async fn stop(&self) {
        let _ = self.quit.send(true);
        let task = self.maintenance.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        info!("Transaction pool stopped");
    }

    /// The signer used to derive transaction senders.
    pub fn signer(&self) -> &Eip155Signer {
        &self.signer
    }

    /// The minimum gas price enforced by the pool.
    pub fn gas_price(&self) -> u128 {
        self.inner.read().gas_price
    }

    /// Updates the minimum gas price required for new remote transactions.
    pub fn set_gas_price(&self, price: u128) {
        self.inner.write().gas_price = price;
        info!(price, "Transaction pool price threshold updated");
    }

    /// Installs the forward hook. At most one hook can be installed for the
    /// lifetime of the pool; later calls are ignored.
    pub fn set_forward_hook(&self, hook: Arc<dyn ForwardHook>) {
        if self.forward_hook.set(hook).is_err() {
            warn!("Ignoring forward hook, one is already installed");
        }
    }

    /// Subscribes to promoted transactions. Events are only posted while no
    /// forward hook is installed.
    pub fn subscribe_promotions(&self) -> broadcast::Receiver<Arc<PooledTransaction>> {
        self.promotions.subscribe()
    }

    /// The number of executable and queued transactions.
    pub fn stats(&self) -> (u64, u64) {
        let inner = self.inner.read();
        (inner.pending_volume, inner.queue_volume)
    }

    /// Returns the transaction for the given hash if it is in the pool.
    pub fn get(&self, hash: &TxHash) -> Option<Arc<PooledTransaction>> {
        self.inner.read().lookup.get(hash).cloned()
    }

    /// The next nonce the pool expects from `addr`, accounting for its
    /// executable transactions.
    pub fn pool_nonce(&self, addr: Address) -> u64 {
        let inner = self.inner.read();
        inner.managed.next(addr, &*inner.state)
    }

    /// All currently executable transactions, grouped by origin account and
    /// sorted by nonce. The returned set is a copy and can be freely modified
    /// by calling code.
    pub fn pending_snapshot(&self) -> ContentSnapshot {
        let inner = self.inner.read();
        inner.pending.iter().map(|(addr, list)| (*addr, list.flatten())).collect()
    }

    /// The full data content of the pool: executable and queued transactions,
    /// grouped by account and sorted by nonce.
    pub fn content(&self) -> (ContentSnapshot, ContentSnapshot) {
        let inner = self.inner.read();
        let pending = inner.pending.iter().map(|(addr, list)| (*addr, list.flatten())).collect();
        let queued = inner.queue.iter().map(|(addr, list)| (*addr, list.flatten())).collect();
        (pending, queued)
    }

    /// Enqueues a single locally submitted transaction, exempting it from the
    /// pricing constraints unless local handling is disabled.
    pub fn submit_local(&self, tx: TxEnvelope) -> PoolResult<()> {
        self.add_tx(tx, !self.config.no_locals)
    }

    /// Enqueues a single transaction received from the network.
    pub fn submit_remote(&self, tx: TxEnvelope) -> PoolResult<()> {
        self.add_tx(tx, false)
    }

    /// Enqueues a batch of locally submitted transactions.
    pub fn submit_local_batch(&self, txs: Vec<TxEnvelope>) -> PoolResult<()> {
        self.add_txs(txs, !self.config.no_locals)
    }

    /// Enqueues a batch of transactions received from the network. Admission
    /// continues past per-item errors; the first error is returned after all
    /// valid entries have been accepted.
    pub fn submit_remote_batch(&self, txs: Vec<TxEnvelope>) -> PoolResult<()> {
        self.add_txs(txs, false)
    }

    /// Removes the transaction with the given hash from the pool.
    pub fn remove(&self, hash: &TxHash) {
        self.inner.write().remove_tx(hash, self.config.price_bump);
    }

    /// Removes all given transactions from the pool.
    pub fn remove_batch(&self, hashes: &[TxHash]) {
        let mut inner = self.inner.write();
        for hash in hashes {
            inner.remove_tx(hash, self.config.price_bump);
        }
    }

    /// Re-validates the pool contents against the current chain head. Called
    /// by the maintenance task on head events; embedders without one call it
    /// directly.
    pub fn on_chain_head(&self) {
        self.reset();
    }

    /// Reacts to a new canonical head at the given height.
    pub(crate) fn on_new_head(&self, number: u64) {
        if self.chain.is_homestead(number) {
            self.homestead.store(true, Ordering::Relaxed);
        }
        self.reset();
    }

    /// Refreshes the state snapshot, demotes transactions the new head
    /// invalidated and promotes whatever became executable. An oracle failure
    /// aborts the reset and keeps the previous view.
    fn reset(&self) {
        let state = match self.oracle.current_state() {
            Ok(state) => state,
            Err(err) => {
                error!(%err, "Failed to reset txpool state");
                return;
            }
        };
        let block_gas_limit = self.oracle.block_gas_limit();

        let mut inner = self.inner.write();
        inner.state = state;
        inner.demote_unexecutables(block_gas_limit, self.config.price_bump);

        // Project every account with executable transactions to the nonce
        // following its highest pending one.
        inner.managed.clear();
        let tails: Vec<(Address, u64)> = inner
            .pending
            .iter()
            .filter_map(|(addr, list)| list.last_nonce().map(|nonce| (*addr, nonce + 1)))
            .collect();
        for (addr, next) in tails {
            inner.managed.set(addr, next);
        }

        self.promote_executables(&mut inner, None);
    }

    /// Validates a transaction against the consensus rules and the local
    /// heuristics of the node. Runs without the pool lock: sender recovery is
    /// CPU-heavy.
    fn validate_tx(
        &self,
        tx: &PooledTransaction,
        local: bool,
        state: &dyn AccountState,
        price_floor: u128,
        block_gas_limit: u64,
    ) -> Result<Address, PoolErrorKind> {
        if tx.size() > MAX_TX_SIZE {
            return Err(PoolErrorKind::OversizedData);
        }
        if tx.gas_limit() > block_gas_limit {
            return Err(PoolErrorKind::GasLimit { block: block_gas_limit, tx: tx.gas_limit() });
        }
        let sender = self.signer.recover(tx).map_err(|_| PoolErrorKind::InvalidSender)?;
        if !local && tx.gas_price() < price_floor {
            return Err(PoolErrorKind::Underpriced);
        }
        let state_nonce = state.nonce(sender);
        if tx.nonce() < state_nonce {
            return Err(PoolErrorKind::NonceTooLow { state: state_nonce, tx: tx.nonce() });
        }
        if state.balance(sender) < tx.cost() {
            return Err(PoolErrorKind::InsufficientFunds);
        }
        let homestead = self.homestead.load(Ordering::Relaxed);
        if tx.gas_limit() < intrinsic_gas(tx.data(), tx.is_create(), homestead) {
            return Err(PoolErrorKind::IntrinsicGas);
        }
        Ok(sender)
    }

    /// Admission steps that need the pool lock: dedup, capacity, the
    /// no-replace-pending rule and the queue insert itself. Returns whether
    /// the transaction replaced a queued incumbent.
    fn add_locked(
        &self,
        inner: &mut PoolInner,
        tx: Arc<PooledTransaction>,
        sender: Address,
    ) -> Result<bool, PoolErrorKind> {
        let hash = tx.hash();
        if inner.lookup.contains(&hash) {
            trace!(%hash, "Discarding already known transaction");
            return Err(PoolErrorKind::KnownTransaction);
        }
        if inner.lookup.len() as u64 >= self.config.capacity() {
            trace!(%hash, "Discarding transaction, no room left in the pool");
            return Err(PoolErrorKind::PoolFull);
        }
        // Pending entries have been announced downstream and may not be
        // silently swapped.
        if inner.pending.get(&sender).is_some_and(|list| list.overlaps(&tx)) {
            return Err(PoolErrorKind::NonceNotReplaced);
        }
        let replaced = inner.enqueue_tx(tx, sender, self.config.price_bump)?;
        trace!(%hash, %sender, "Pooled new future transaction");
        Ok(replaced)
    }

    fn add_tx(&self, tx: TxEnvelope, local: bool) -> PoolResult<()> {
        let tx = Arc::new(PooledTransaction::new(tx));
        let hash = tx.hash();

        let (state, price_floor) = {
            let inner = self.inner.read();
            (Arc::clone(&inner.state), inner.gas_price)
        };
        let block_gas_limit = self.oracle.block_gas_limit();
        let sender = self
            .validate_tx(&tx, local, &*state, price_floor, block_gas_limit)
            .map_err(|kind| {
                trace!(%hash, err = %kind, "Discarding invalid transaction");
                PoolError::new(hash, kind)
            })?;

        let mut inner = self.inner.write();
        let replaced = self
            .add_locked(&mut inner, tx, sender)
            .map_err(|kind| PoolError::new(hash, kind))?;
        if !replaced {
            self.promote_executables(&mut inner, Some(vec![sender]));
        }
        Ok(())
    }

    fn add_txs(&self, txs: Vec<TxEnvelope>, local: bool) -> PoolResult<()> {
        let (state, price_floor) = {
            let inner = self.inner.read();
            (Arc::clone(&inner.state), inner.gas_price)
        };
        let block_gas_limit = self.oracle.block_gas_limit();

        let validated: Vec<Result<(Arc<PooledTransaction>, Address), PoolError>> = txs
            .into_iter()
            .map(|tx| {
                let tx = Arc::new(PooledTransaction::new(tx));
                match self.validate_tx(&tx, local, &*state, price_floor, block_gas_limit) {
                    Ok(sender) => Ok((tx, sender)),
                    Err(kind) => {
                        trace!(hash = %tx.hash(), err = %kind, "Discarding invalid transaction");
                        Err(PoolError::new(tx.hash(), kind))
                    }
                }
            })
            .collect();

        let mut first_err = None;
        let mut inner = self.inner.write();
        let mut dirty: Vec<Address> = Vec::new();
        for item in validated {
            let outcome = item.and_then(|(tx, sender)| {
                let hash = tx.hash();
                self.add_locked(&mut inner, tx, sender)
                    .map(|replaced| (replaced, sender))
                    .map_err(|kind| PoolError::new(hash, kind))
            });
            match outcome {
                Ok((false, sender)) => {
                    if !dirty.contains(&sender) {
                        dirty.push(sender);
                    }
                }
                Ok((true, _)) => {}
                Err(err) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        if !dirty.is_empty() {
            self.promote_executables(&mut inner, Some(dirty));
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Moves transactions that have become executable from the future queue
    /// to the pending set, deleting everything the current state invalidates
    /// along the way. `None` processes every account with queued entries.
    /// Afterwards both global caps are enforced.
    fn promote_executables(&self, inner: &mut PoolInner, accounts: Option<Vec<Address>>) {
        let block_gas_limit = self.oracle.block_gas_limit();
        let accounts = accounts.unwrap_or_else(|| inner.queue.keys().copied().collect());

        for addr in accounts {
            let state_nonce = inner.state.nonce(addr);
            let balance = inner.state.balance(addr);
            let start_nonce = inner.managed.next(addr, &*inner.state);
            let Some(list) = inner.queue.get_mut(&addr) else {
                continue;
            };
            let stale = list.forward(state_nonce);
            let (drops, _) = list.filter(balance, block_gas_limit);
            let ready = list.ready(start_nonce);
            let emptied = list.is_empty();

            for tx in stale {
                trace!(hash = %tx.hash(), "Removed old queued transaction");
                inner.lookup.remove(&tx.hash());
                inner.queue_volume -= 1;
            }
            for tx in drops {
                trace!(hash = %tx.hash(), "Removed unpayable queued transaction");
                inner.lookup.remove(&tx.hash());
                inner.queue_volume -= 1;
            }
            for tx in ready {
                inner.queue_volume -= 1;
                self.promote_tx(inner, addr, tx);
            }
            if emptied {
                inner.queue.remove(&addr);
            }
        }

        self.enforce_pending_cap(inner);
        self.enforce_queue_cap(inner);
    }

    /// Adds a transaction to the executable set, advances the projected
    /// nonce and hands the transaction downstream.
    fn promote_tx(&self, inner: &mut PoolInner, addr: Address, tx: Arc<PooledTransaction>) {
        let hash = tx.hash();
        trace!(%hash, "Promoting queued transaction");

        let nonce = tx.nonce();
        let list = inner.pending.entry(addr).or_insert_with(|| SenderList::new(true));
        let (inserted, displaced) = list.add(Arc::clone(&tx), self.config.price_bump);
        if !inserted {
            // An older transaction was better; this one no longer fits the
            // queue either.
            inner.lookup.remove(&hash);
            return;
        }
        match displaced {
            Some(old) => {
                inner.lookup.remove(&old.hash());
            }
            None => inner.pending_volume += 1,
        }
        inner.beats.insert(addr, Instant::now());
        inner.managed.set(addr, nonce + 1);

        // An installed hook short-circuits the in-process event post.
        match self.forward_hook.get() {
            Some(hook) => match hook.forward(&tx) {
                ForwardOutcome::Ok => {}
                ForwardOutcome::Transient(reason) => {
                    debug!(%hash, reason, "Deferring transaction forward");
                }
                ForwardOutcome::Terminal(reason) => {
                    let err = PoolError::new(hash, PoolErrorKind::ForwardFailed(reason));
                    error!(%err, "Dropping transaction rejected downstream");
                    inner.remove_tx(&hash, self.config.price_bump);
                }
            },
            None => {
                let _ = self.promotions.send(tx);
            }
        }
    }

    /// Trims the executable set back under the global cap by equalizing the
    /// largest holders first, never going below the per-account allowance.
    fn enforce_pending_cap(&self, inner: &mut PoolInner) {
        if inner.pending_volume <= self.config.global_slots {
            return;
        }
        // Assemble a spam order to penalize large transactors first.
        let mut spammers: BinaryHeap<(usize, Address)> = inner
            .pending
            .iter()
            .filter(|(_, list)| list.len() as u64 > self.config.account_slots)
            .map(|(addr, list)| (list.len(), *addr))
            .collect();

        // Gradually drop transactions from offenders.
        let mut offenders: Vec<Address> = Vec::new();
        while inner.pending_volume > self.config.global_slots {
            let Some((_, offender)) = spammers.pop() else {
                break;
            };
            offenders.push(offender);

            // Equalize balances until all the same or below the threshold.
            if offenders.len() > 1 {
                let threshold = pending_len(inner, &offender);
                while inner.pending_volume > self.config.global_slots
                    && pending_len(inner, &offenders[offenders.len() - 2]) > threshold
                {
                    for i in 0..offenders.len() - 1 {
                        let addr = offenders[i];
                        let len = pending_len(inner, &addr);
                        if len > 0 {
                            self.cap_pending(inner, addr, len - 1);
                        }
                    }
                }
            }
        }

        // If still above threshold, reduce to the limit or the minimum
        // allowance, one transaction per offender and pass.
        if inner.pending_volume > self.config.global_slots {
            if let Some(&last) = offenders.last() {
                while inner.pending_volume > self.config.global_slots
                    && pending_len(inner, &last) as u64 > self.config.account_slots
                {
                    for &addr in &offenders {
                        let len = pending_len(inner, &addr);
                        if len > 0 {
                            self.cap_pending(inner, addr, len - 1);
                        }
                    }
                }
            }
        }
    }

    /// Caps one account's executable list, deleting the removed transactions
    /// and rolling the projected nonce back to the lowest dropped one.
    fn cap_pending(&self, inner: &mut PoolInner, addr: Address, new_len: usize) {
        let state = Arc::clone(&inner.state);
        let Some(list) = inner.pending.get_mut(&addr) else {
            return;
        };
        let capped = list.cap(new_len);
        let emptied = list.is_empty();
        for tx in capped {
            let hash = tx.hash();
            trace!(%hash, "Removed fairness-exceeding pending transaction");
            inner.lookup.remove(&hash);
            inner.pending_volume -= 1;
            inner.managed.roll_back(addr, tx.nonce(), &*state);
        }
        if emptied {
            inner.pending.remove(&addr);
            inner.beats.remove(&addr);
        }
    }

    /// Trims the future queue back under the global cap, dropping whole
    /// accounts in order of staleness. Accounts that never saw a promotion
    /// count as the stalest of all.
    fn enforce_queue_cap(&self, inner: &mut PoolInner) {
        if inner.queue_volume <= self.config.global_queue {
            return;
        }
        let mut drop = inner.queue_volume - self.config.global_queue;

        let mut addresses: Vec<(Option<Instant>, Address)> = inner
            .queue
            .keys()
            .map(|addr| (inner.beats.get(addr).copied(), *addr))
            .collect();
        addresses.sort_unstable();

        for (_, addr) in addresses {
            if drop == 0 {
                break;
            }
            let Some(list) = inner.queue.get(&addr) else {
                continue;
            };
            let txs = list.flatten();
            // Drop the whole list if it is smaller than the overflow.
            if txs.len() as u64 <= drop {
                drop -= txs.len() as u64;
                for tx in txs {
                    trace!(hash = %tx.hash(), "Removed queue-exceeding transaction");
                    inner.remove_tx(&tx.hash(), self.config.price_bump);
                }
                continue;
            }
            // Otherwise drop only the last few transactions.
            for tx in txs.iter().rev() {
                if drop == 0 {
                    break;
                }
                trace!(hash = %tx.hash(), "Removed queue-exceeding transaction");
                inner.remove_tx(&tx.hash(), self.config.price_bump);
                drop -= 1;
            }
        }
    }

    /// Drops every queued account that has seen no promotion within the
    /// configured lifetime. Driven by the maintenance task.
    pub(crate) fn evict_expired(&self) {
        let mut inner = self.inner.write();
        let expired: Vec<Address> = inner
            .queue
            .keys()
            .filter(|addr| {
                inner.beats.get(*addr).map_or(true, |beat| beat.elapsed() > self.config.lifetime)
            })
            .copied()
            .collect();
        for addr in expired {
            debug!(%addr, "Evicting expired queued transactions");
            let txs = inner.queue.get(&addr).map(|list| list.flatten()).unwrap_or_default();
            for tx in txs {
                inner.remove_tx(&tx.hash(), self.config.price_bump);
            }
            inner.beats.remove(&addr);
        }
    }
}

fn pending_len(inner: &PoolInner, addr: &Address) -> usize {
    inner.pending.get(addr).map_or(0, SenderList::len)
}
