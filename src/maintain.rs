//! Background maintenance of the pool: chain-head tracking, periodic stats
//! reporting and expiration of stale queued transactions.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{interval_at, Instant},
};
use tracing::{debug, trace};

use crate::{interface::ChainEvent, pool::TxPool};

/// Time interval to report transaction pool stats.
const STATS_REPORT_INTERVAL: Duration = Duration::from_secs(8);
/// Time interval to check for evictable transactions.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Runs until the quit signal fires or the event stream closes.
pub(crate) async fn maintenance_task(
    pool: Arc<TxPool>,
    mut events: mpsc::UnboundedReceiver<ChainEvent>,
    mut quit: watch::Receiver<bool>,
) {
    let mut report = interval_at(Instant::now() + STATS_REPORT_INTERVAL, STATS_REPORT_INTERVAL);
    let mut evict = interval_at(Instant::now() + EVICTION_INTERVAL, EVICTION_INTERVAL);
    let (mut prev_pending, mut prev_queued) = (0u64, 0u64);

    loop {
        tokio::select! {
            changed = quit.changed() => {
                if changed.is_err() || *quit.borrow() {
                    return;
                }
            }
            event = events.recv() => {
                match event {
                    Some(ChainEvent::NewHead { number }) => pool.on_new_head(number),
                    Some(ChainEvent::RemovedTransactions(txs)) => {
                        // Transactions that fell out of the chain re-enter the
                        // queue and may be promoted again.
                        if let Err(err) = pool.submit_remote_batch(txs) {
                            trace!(%err, "Dropped reorged transaction during re-admission");
                        }
                    }
                    None => return,
                }
            }
            _ = report.tick() => {
                let (pending, queued) = pool.stats();
                if (pending, queued) != (prev_pending, prev_queued) {
                    debug!(executable = pending, queued, "Transaction pool status report");
                    (prev_pending, prev_queued) = (pending, queued);
                }
            }
            _ = evict.tick() => pool.evict_expired(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy::primitives::U256;

    use crate::{
        config::{ChainSpec, PoolConfig},
        test_utils::helpers::{create_sender, create_tx, eth, MockOracle, DEFAULT_GAS_LIMIT},
    };

    fn test_setup() -> (Arc<TxPool>, Arc<MockOracle>, mpsc::UnboundedSender<ChainEvent>) {
        let oracle = Arc::new(MockOracle::new(DEFAULT_GAS_LIMIT));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let pool = TxPool::spawn(
            PoolConfig::default(),
            ChainSpec::default(),
            oracle.clone(),
            events_rx,
        );
        (pool, oracle, events_tx)
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn new_head_event_resets_the_pool() {
        let (pool, oracle, events) = test_setup();
        let (sender, key) = create_sender();
        oracle.fund(sender, eth(1));

        let tx = create_tx(key, sender, 20, 10, 100_000, U256::ZERO, 0).await;
        let hash = *tx.tx_hash();
        pool.submit_local(tx).unwrap();
        assert!(pool.get(&hash).is_some());

        oracle.set_nonce(sender, 1);
        events.send(ChainEvent::NewHead { number: 1 }).unwrap();
        settle().await;

        assert!(pool.get(&hash).is_none());
        assert_eq!(pool.stats(), (0, 0));
        pool.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reorged_transactions_are_readmitted() {
        let (pool, oracle, events) = test_setup();
        let (sender, key) = create_sender();
        oracle.fund(sender, eth(1));

        let tx = create_tx(key, sender, 20, 10, 100_000, U256::ZERO, 0).await;
        let hash = *tx.tx_hash();
        events.send(ChainEvent::RemovedTransactions(vec![tx])).unwrap();
        settle().await;

        assert!(pool.get(&hash).is_some());
        assert_eq!(pool.stats(), (1, 0));
        pool.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_tick_sweeps_never_promoted_accounts() {
        let (pool, oracle, _events) = test_setup();
        let (sender, key) = create_sender();
        oracle.fund(sender, eth(1));

        // queued with a nonce gap, the account never sees a promotion
        let tx = create_tx(key, sender, 20, 10, 100_000, U256::ZERO, 5).await;
        pool.submit_local(tx).unwrap();
        assert_eq!(pool.stats(), (0, 1));

        tokio::time::advance(EVICTION_INTERVAL + Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(pool.stats(), (0, 0));
        pool.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_terminates_the_task() {
        let (pool, _oracle, events) = test_setup();
        pool.stop().await;
        // the task is gone, events are simply not consumed any more
        let _ = events.send(ChainEvent::NewHead { number: 1 });
    }
}
