use alloy::primitives::TxHash;

/// Transaction pool result type.
pub type PoolResult<T> = Result<T, PoolError>;

/// Transaction pool error, tagged with the hash of the offending transaction.
#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
#[error("[{hash}]: {kind}")]
pub struct PoolError {
    /// Hash of the transaction that caused the error
    pub hash: TxHash,
    /// The kind of error
    pub kind: PoolErrorKind,
}

impl PoolError {
    pub const fn new(hash: TxHash, kind: PoolErrorKind) -> Self {
        Self { hash, kind }
    }
}

/// The kind of pool error.
///
/// All admission errors are recovered locally: the offending transaction is
/// discarded, the error is returned to the caller and the pool state is left
/// untouched.
#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
pub enum PoolErrorKind {
    /// The transaction signature is invalid or the signer could not be
    /// recovered.
    #[error("invalid sender")]
    InvalidSender,

    /// The transaction nonce is lower than the one present in the local chain.
    #[error("nonce too low: state {state}, tx {tx}")]
    NonceTooLow {
        /// Account nonce in the current chain state
        state: u64,
        /// Nonce carried by the transaction
        tx: u64,
    },

    /// The gas price is below the minimum configured for the pool.
    #[error("transaction underpriced")]
    Underpriced,

    /// Attempted to replace a transaction at the same nonce without the
    /// required price bump.
    #[error("replacement transaction underpriced")]
    ReplaceUnderpriced,

    /// The total cost of the transaction exceeds the sender balance.
    #[error("insufficient funds for gas * price + value")]
    InsufficientFunds,

    /// The transaction requests less gas than needed to start execution.
    #[error("intrinsic gas too low")]
    IntrinsicGas,

    /// The transaction gas limit exceeds the current block gas limit.
    #[error("transaction gas limit {tx} exceeds block gas limit {block}")]
    GasLimit {
        /// Gas limit of the current block
        block: u64,
        /// Gas limit requested by the transaction
        tx: u64,
    },

    /// Sanity error for transactions carrying a negative value. Cannot occur
    /// for decoded transactions but is kept for API compatibility with
    /// submission surfaces that construct values directly.
    #[error("negative value")]
    NegativeValue,

    /// The transaction payload exceeds the DOS-protection size limit.
    #[error("oversized data")]
    OversizedData,

    /// A transaction at this nonce is already pending. Pending entries have
    /// been announced downstream and may not be silently swapped.
    #[error("can not replace pending transaction")]
    NonceNotReplaced,

    /// The forward hook reported a terminal failure for this transaction.
    #[error("failed to forward transaction: {0}")]
    ForwardFailed(String),

    /// The transaction is already present in the pool.
    #[error("known transaction")]
    KnownTransaction,

    /// The pool has reached its aggregate capacity.
    #[error("transaction pool is full")]
    PoolFull,
}

/// Error returned by the state oracle when the current chain state cannot be
/// read. Resets triggered while the oracle is failing leave the previous pool
/// view intact.
#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
#[error("chain state unavailable: {0}")]
pub struct StateError(pub String);
