use std::collections::HashMap;

use alloy::primitives::Address;

use crate::interface::AccountState;

/// Projected next-nonce overlay on top of the chain state.
///
/// For every account with executable transactions this tracks the nonce the
/// pool expects next, advancing as transactions are promoted and rolling back
/// when promoted transactions drop out. Accounts without an entry fall
/// through to the underlying state snapshot.
#[derive(Debug, Default)]
pub(crate) struct ManagedNonces {
    nonces: HashMap<Address, u64>,
}

impl ManagedNonces {
    /// The projected next nonce for `addr`.
    pub(crate) fn next(&self, addr: Address, state: &dyn AccountState) -> u64 {
        self.nonces.get(&addr).copied().unwrap_or_else(|| state.nonce(addr))
    }

    pub(crate) fn set(&mut self, addr: Address, nonce: u64) {
        self.nonces.insert(addr, nonce);
    }

    /// Rolls the projection back to `nonce` if it currently points past it.
    pub(crate) fn roll_back(&mut self, addr: Address, nonce: u64, state: &dyn AccountState) {
        if self.next(addr, state) > nonce {
            self.nonces.insert(addr, nonce);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nonces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    struct FixedState(u64);

    impl AccountState for FixedState {
        fn nonce(&self, _addr: Address) -> u64 {
            self.0
        }

        fn balance(&self, _addr: Address) -> U256 {
            U256::ZERO
        }
    }

    #[test]
    fn falls_through_to_state() {
        let managed = ManagedNonces::default();
        let state = FixedState(7);
        assert_eq!(managed.next(Address::random(), &state), 7);
    }

    #[test]
    fn set_overrides_state() {
        let mut managed = ManagedNonces::default();
        let state = FixedState(7);
        let addr = Address::random();
        managed.set(addr, 12);
        assert_eq!(managed.next(addr, &state), 12);
    }

    #[test]
    fn roll_back_only_moves_down() {
        let mut managed = ManagedNonces::default();
        let state = FixedState(0);
        let addr = Address::random();
        managed.set(addr, 10);

        managed.roll_back(addr, 4, &state);
        assert_eq!(managed.next(addr, &state), 4);

        // rolling "back" to a higher nonce is a no-op
        managed.roll_back(addr, 8, &state);
        assert_eq!(managed.next(addr, &state), 4);
    }
}
