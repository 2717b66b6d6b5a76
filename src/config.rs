use std::time::Duration;

use tracing::warn;

/// Configuration parameters of the transaction pool.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PoolConfig {
    /// Whether local transaction handling should be disabled. When set, local
    /// submissions are subject to the same pricing constraints as remote ones.
    pub no_locals: bool,

    /// Minimum gas price to enforce for acceptance into the pool
    pub price_limit: u64,
    /// Minimum price bump percentage to replace an already existing
    /// transaction at the same nonce
    pub price_bump: u64,

    /// Number of executable transaction slots guaranteed per account before
    /// fairness eviction targets it
    pub account_slots: u64,
    /// Maximum number of executable transaction slots for all accounts
    pub global_slots: u64,
    /// Maximum number of non-executable transaction slots permitted per
    /// account. Reserved: the current fairness logic operates on the pending
    /// tier only.
    pub account_queue: u64,
    /// Maximum number of non-executable transaction slots for all accounts
    pub global_queue: u64,

    /// Maximum amount of time non-executable transactions are queued
    pub lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            no_locals: false,
            price_limit: 1,
            price_bump: 10,
            account_slots: 16,
            global_slots: 32_768,
            account_queue: 64,
            global_queue: 4_096,
            lifetime: Duration::from_secs(3 * 3600),
        }
    }
}

impl PoolConfig {
    /// Checks the provided user configuration and changes anything that is
    /// unreasonable or unworkable.
    pub fn sanitize(mut self) -> Self {
        let defaults = Self::default();
        if self.price_limit < 1 {
            warn!(
                provided = self.price_limit,
                updated = defaults.price_limit,
                "Sanitizing invalid txpool price limit"
            );
            self.price_limit = defaults.price_limit;
        }
        if self.price_bump < 1 {
            warn!(
                provided = self.price_bump,
                updated = defaults.price_bump,
                "Sanitizing invalid txpool price bump"
            );
            self.price_bump = defaults.price_bump;
        }
        self
    }

    /// Hard upper bound on the total number of transactions held by the pool.
    pub const fn capacity(&self) -> u64 {
        self.global_slots + self.global_queue
    }
}

/// The subset of the chain rule set the pool cares about.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChainSpec {
    /// Chain id used for replay-protected signature recovery
    pub chain_id: u64,
    /// Height at which the homestead rules (notably contract-creation
    /// intrinsic gas accounting) activate. `None` means never.
    pub homestead_block: Option<u64>,
}

impl ChainSpec {
    /// Returns whether the homestead rules are active at the given height.
    pub fn is_homestead(&self, number: u64) -> bool {
        self.homestead_block.is_some_and(|activation| number >= activation)
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self { chain_id: 1, homestead_block: Some(0) }
    }
}
