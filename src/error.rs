//! Error types for account operations and the dispatcher.
//!
//! Business-rule failures (overdraft) are returned as values so the unit of
//! work that triggered them can log and absorb them.

/// Crate-wide error type.
///
/// # Error Categories
///
/// - **Business Errors**: `InsufficientFunds`
/// - **Precondition Errors**: `InvalidAmount`, `BalanceOverflow`
/// - **Dispatcher Errors**: `InvalidConfig`, `PoolClosed`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    /// Withdrawal larger than the balance seen at the atomic check.
    ///
    /// The balance is left unchanged.
    #[error(
        "Insufficient funds in account {account_id}: requested {requested_cents} cents, available {available_cents} cents"
    )]
    InsufficientFunds {
        account_id: String,
        requested_cents: i64,
        available_cents: i64,
    },

    /// Amount is zero or negative, or an initial balance is negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Deposit would overflow the balance.
    #[error("Balance overflow in account {account_id}")]
    BalanceOverflow { account_id: String },

    /// Dispatcher or worker pool settings are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Job submitted after the worker pool was shut down.
    #[error("Worker pool is closed")]
    PoolClosed,
}

impl BankError {
    /// True for the overdraft rejection, which units treat as a normal outcome.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, BankError::InsufficientFunds { .. })
    }
}
