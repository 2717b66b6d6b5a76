use std::{collections::HashMap, sync::Arc};

use alloy::primitives::TxHash;

use crate::transaction::PooledTransaction;

/// The authoritative dedup index over everything the pool holds.
///
/// This is the canonical owner of pooled transactions; the per-sender lists
/// of both tiers hold co-owning handles. The index contains exactly the union
/// of both tiers at all times.
#[derive(Debug, Default)]
pub(crate) struct TxLookup {
    by_hash: HashMap<TxHash, Arc<PooledTransaction>>,
}

impl TxLookup {
    pub(crate) fn contains(&self, hash: &TxHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub(crate) fn get(&self, hash: &TxHash) -> Option<&Arc<PooledTransaction>> {
        self.by_hash.get(hash)
    }

    pub(crate) fn insert(&mut self, tx: Arc<PooledTransaction>) {
        self.by_hash.insert(tx.hash(), tx);
    }

    pub(crate) fn remove(&mut self, hash: &TxHash) -> Option<Arc<PooledTransaction>> {
        self.by_hash.remove(hash)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_hash.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U256};

    use crate::test_utils::helpers::create_pooled_tx_and_sender;

    #[tokio::test]
    async fn insert_and_remove() {
        let mut lookup = TxLookup::default();
        let (tx, _, _) = create_pooled_tx_and_sender(20, 10, 100_000, U256::ZERO, 0).await;
        let hash = tx.hash();

        assert!(!lookup.contains(&hash));
        lookup.insert(Arc::clone(&tx));
        assert!(lookup.contains(&hash));
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get(&hash).unwrap().hash(), hash);

        let removed = lookup.remove(&hash).unwrap();
        assert_eq!(removed.hash(), hash);
        assert_eq!(lookup.len(), 0);
        assert!(lookup.remove(&B256::random()).is_none());
    }
}
