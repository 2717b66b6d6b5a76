use std::{collections::BTreeMap, sync::Arc};

use alloy::primitives::U256;

use crate::transaction::PooledTransaction;

/// Per-account list of transactions, keyed uniquely by nonce.
///
/// The same structure backs both tiers of the pool. Executable lists are
/// `strict`: removing a transaction invalidates every higher-nonce entry,
/// since the contiguous run they depended on is broken. Future lists are
/// non-strict and tolerate gaps.
#[derive(Debug, Default)]
pub(crate) struct SenderList {
    /// Whether nonces after a removed entry lose executability
    strict: bool,
    txs: BTreeMap<u64, Arc<PooledTransaction>>,
}

impl SenderList {
    pub(crate) fn new(strict: bool) -> Self {
        Self { strict, txs: BTreeMap::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.txs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Whether a transaction already occupies the given transaction's nonce.
    pub(crate) fn overlaps(&self, tx: &PooledTransaction) -> bool {
        self.txs.contains_key(&tx.nonce())
    }

    /// The highest nonce stored, if any.
    pub(crate) fn last_nonce(&self) -> Option<u64> {
        self.txs.last_key_value().map(|(nonce, _)| *nonce)
    }

    /// Inserts a transaction, replacing an incumbent at the same nonce only
    /// when the new price exceeds it by at least `price_bump` percent.
    ///
    /// Returns whether the transaction was stored and the displaced incumbent
    /// if there was one. Price ties lose: the incumbent stays.
    pub(crate) fn add(
        &mut self,
        tx: Arc<PooledTransaction>,
        price_bump: u64,
    ) -> (bool, Option<Arc<PooledTransaction>>) {
        let nonce = tx.nonce();
        if let Some(old) = self.txs.get(&nonce) {
            let threshold = old.gas_price().saturating_mul(100 + price_bump as u128) / 100;
            if old.gas_price() >= tx.gas_price() || tx.gas_price() < threshold {
                return (false, None);
            }
            let old = self.txs.insert(nonce, tx);
            return (true, old);
        }
        self.txs.insert(nonce, tx);
        (true, None)
    }

    /// Removes and returns every transaction with a nonce below `threshold`.
    pub(crate) fn forward(&mut self, threshold: u64) -> Vec<Arc<PooledTransaction>> {
        let keep = self.txs.split_off(&threshold);
        std::mem::replace(&mut self.txs, keep).into_values().collect()
    }

    /// Removes every transaction the account can no longer pay for or that
    /// exceeds the block gas allowance (`drops`). In strict mode every entry
    /// after the lowest drop is removed as well and returned separately
    /// (`invalids`): they are payable but no longer executable behind the gap.
    pub(crate) fn filter(
        &mut self,
        balance: U256,
        gas_limit: u64,
    ) -> (Vec<Arc<PooledTransaction>>, Vec<Arc<PooledTransaction>>) {
        let drop_nonces: Vec<u64> = self
            .txs
            .iter()
            .filter(|(_, tx)| tx.cost() > balance || tx.gas_limit() > gas_limit)
            .map(|(nonce, _)| *nonce)
            .collect();
        if drop_nonces.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut drops = Vec::with_capacity(drop_nonces.len());
        for nonce in &drop_nonces {
            if let Some(tx) = self.txs.remove(nonce) {
                drops.push(tx);
            }
        }
        let mut invalids = Vec::new();
        if self.strict {
            // drop_nonces is ascending, the first entry is the gap position
            let lowest = drop_nonces[0];
            invalids = self.txs.split_off(&lowest).into_values().collect();
        }
        (drops, invalids)
    }

    /// Removes and returns the contiguous run of transactions starting at
    /// `start`, advancing by one nonce each step.
    pub(crate) fn ready(&mut self, start: u64) -> Vec<Arc<PooledTransaction>> {
        let mut ready = Vec::new();
        let Some((&first, _)) = self.txs.first_key_value() else {
            return ready;
        };
        if first > start {
            return ready;
        }
        let mut next = first;
        while let Some(entry) = self.txs.first_entry() {
            if *entry.key() != next {
                break;
            }
            ready.push(entry.remove());
            next += 1;
        }
        ready
    }

    /// Removes the highest-nonce transactions until the list holds at most
    /// `new_len` entries, returning the removed ones.
    pub(crate) fn cap(&mut self, new_len: usize) -> Vec<Arc<PooledTransaction>> {
        let mut removed = Vec::new();
        while self.txs.len() > new_len {
            if let Some((_, tx)) = self.txs.pop_last() {
                removed.push(tx);
            }
        }
        removed
    }

    /// Removes the transaction at `nonce`. In strict mode every higher-nonce
    /// entry is removed as well and returned as invalidated.
    pub(crate) fn remove(&mut self, nonce: u64) -> (bool, Vec<Arc<PooledTransaction>>) {
        if self.txs.remove(&nonce).is_none() {
            return (false, Vec::new());
        }
        let invalids = if self.strict {
            self.txs.split_off(&nonce).into_values().collect()
        } else {
            Vec::new()
        };
        (true, invalids)
    }

    /// A nonce-sorted copy of the list contents.
    pub(crate) fn flatten(&self) -> Vec<Arc<PooledTransaction>> {
        self.txs.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::helpers::{create_pooled_tx, create_sender};

    async fn list_of(nonces: &[u64], strict: bool) -> SenderList {
        let (sender, key) = create_sender();
        let mut list = SenderList::new(strict);
        for &nonce in nonces {
            let tx = create_pooled_tx(key.clone(), sender, 20, 10, 100_000, U256::ZERO, nonce).await;
            let (inserted, _) = list.add(tx, 10);
            assert!(inserted);
        }
        list
    }

    #[tokio::test]
    async fn add_rejects_insufficient_bump() {
        let (sender, key) = create_sender();
        let mut list = SenderList::new(false);

        let tx = create_pooled_tx(key.clone(), sender, 100, 10, 100_000, U256::ZERO, 0).await;
        assert!(list.add(tx, 10).0);

        // equal price loses the tie
        let equal = create_pooled_tx(key.clone(), sender, 100, 10, 100_000, U256::ZERO, 0).await;
        assert!(!list.add(equal, 10).0);

        // 9% above the incumbent is below the 10% bump
        let short = create_pooled_tx(key.clone(), sender, 109, 10, 100_000, U256::ZERO, 0).await;
        assert!(!list.add(short, 10).0);

        // exactly 10% above is accepted and displaces the incumbent
        let bumped = create_pooled_tx(key, sender, 110, 10, 100_000, U256::ZERO, 0).await;
        let (inserted, displaced) = list.add(bumped, 10);
        assert!(inserted);
        assert_eq!(displaced.unwrap().gas_price(), 100);
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn forward_strips_stale_nonces() {
        let mut list = list_of(&[0, 1, 2, 3, 4], false).await;
        let removed = list.forward(3);
        assert_eq!(removed.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.last_nonce(), Some(4));
    }

    #[tokio::test]
    async fn filter_drops_unpayable() {
        let (sender, key) = create_sender();
        let mut list = SenderList::new(false);
        for nonce in 0..3 {
            let tx =
                create_pooled_tx(key.clone(), sender, 10, 5, 100_000, U256::from(nonce), nonce)
                    .await;
            list.add(tx, 10);
        }
        // cost of each tx is 10 * 100_000 + nonce; only nonce 0 is payable
        let balance = U256::from(1_000_000u64);
        let (drops, invalids) = list.filter(balance, 1_000_000);
        assert_eq!(drops.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![1, 2]);
        assert!(invalids.is_empty());
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn strict_filter_invalidates_tail() {
        let (sender, key) = create_sender();
        let mut list = SenderList::new(true);
        // nonce 1 is the expensive one, 0 and 2 are cheap
        for (nonce, fee) in [(0u64, 10u128), (1, 100), (2, 10)] {
            let tx = create_pooled_tx(key.clone(), sender, fee, 5, 100_000, U256::ZERO, nonce).await;
            list.add(tx, 10);
        }
        let balance = U256::from(2_000_000u64);
        let (drops, invalids) = list.filter(balance, 1_000_000);
        assert_eq!(drops.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![1]);
        assert_eq!(invalids.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![2]);
        assert_eq!(list.len(), 1);
        assert_eq!(list.last_nonce(), Some(0));
    }

    #[tokio::test]
    async fn filter_drops_over_gas_limit() {
        let (sender, key) = create_sender();
        let mut list = SenderList::new(false);
        let tx = create_pooled_tx(key, sender, 1, 1, 2_000_000, U256::ZERO, 0).await;
        list.add(tx, 10);

        let (drops, _) = list.filter(U256::MAX, 1_000_000);
        assert_eq!(drops.len(), 1);
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn ready_pops_contiguous_prefix() {
        let mut list = list_of(&[0, 1, 2, 5, 6], false).await;
        let ready = list.ready(0);
        assert_eq!(ready.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(list.len(), 2);

        // the run must reach the start nonce
        assert!(list.ready(4).is_empty());
        let rest = list.ready(5);
        assert_eq!(rest.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![5, 6]);
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn cap_removes_highest_nonces() {
        let mut list = list_of(&[0, 1, 2, 3], false).await;
        let removed = list.cap(2);
        let mut nonces: Vec<u64> = removed.iter().map(|tx| tx.nonce()).collect();
        nonces.sort_unstable();
        assert_eq!(nonces, vec![2, 3]);
        assert_eq!(list.last_nonce(), Some(1));
    }

    #[tokio::test]
    async fn strict_remove_invalidates_descendants() {
        let mut list = list_of(&[0, 1, 2], true).await;
        let (removed, invalids) = list.remove(1);
        assert!(removed);
        assert_eq!(invalids.iter().map(|tx| tx.nonce()).collect::<Vec<_>>(), vec![2]);
        assert_eq!(list.len(), 1);

        let (removed, invalids) = list.remove(7);
        assert!(!removed);
        assert!(invalids.is_empty());
    }

    #[tokio::test]
    async fn flatten_is_nonce_sorted() {
        let mut list = SenderList::new(false);
        let (sender, key) = create_sender();
        for nonce in [4u64, 0, 2] {
            let tx = create_pooled_tx(key.clone(), sender, 20, 10, 100_000, U256::ZERO, nonce).await;
            list.add(tx, 10);
        }
        let nonces: Vec<u64> = list.flatten().iter().map(|tx| tx.nonce()).collect();
        assert_eq!(nonces, vec![0, 2, 4]);
    }
}
