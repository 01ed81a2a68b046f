//! Account entity and its serializable snapshot.
//!
//! This module defines:
//! - `Account`: in-memory account whose balance is guarded by a per-account lock
//! - `AccountSnapshot`: consistent point-in-time view returned to callers
//!
//! # Balance Storage
//!
//! Balances are stored as `i64` cents to avoid floating-point precision issues.
//!
//! For example:
//! - $10.50 is stored as 1050 cents
//! - $1000.00 is stored as 100000 cents

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::BankError;

/// Mutable part of an account. Only reachable through `Account::state`.
#[derive(Debug)]
struct AccountState {
    balance_cents: i64,
    updated_at: DateTime<Utc>,
}

/// An account shared between concurrent units of work.
///
/// Share it with `Arc<Account>`. Every read and write of the balance goes
/// through the same mutex, so deposit, withdraw and balance reads on one
/// account never interleave. Separate accounts have separate locks.
#[derive(Debug)]
pub struct Account {
    id: String,
    created_at: DateTime<Utc>,
    state: Mutex<AccountState>,
}

/// Point-in-time view of an account.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "ACC-001",
///   "balance_cents": 125000,
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:01Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub id: String,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Open an account with an explicit initial balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: initial balance is negative
    pub fn new(id: impl Into<String>, initial_balance_cents: i64) -> Result<Self, BankError> {
        if initial_balance_cents < 0 {
            return Err(BankError::InvalidAmount(
                "Initial balance cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: id.into(),
            created_at: now,
            state: Mutex::new(AccountState {
                balance_cents: initial_balance_cents,
                updated_at: now,
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add money to the account and return the new balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `BalanceOverflow`: the new balance does not fit in `i64`
    pub async fn deposit(&self, amount_cents: i64) -> Result<i64, BankError> {
        validate_amount(amount_cents)?;

        let new_balance = {
            let mut state = self.state.lock().await;
            let new_balance = state.balance_cents.checked_add(amount_cents).ok_or_else(|| {
                BankError::BalanceOverflow {
                    account_id: self.id.clone(),
                }
            })?;
            state.balance_cents = new_balance;
            state.updated_at = Utc::now();
            new_balance
        };

        tracing::info!(
            account_id = %self.id,
            amount_cents,
            balance_cents = new_balance,
            "Deposited {} to {}. New balance: {}",
            format_cents(amount_cents),
            self.id,
            format_cents(new_balance)
        );

        Ok(new_balance)
    }

    /// Remove money from the account and return the new balance.
    ///
    /// The sufficiency check and the decrement happen under one lock
    /// acquisition, so no other operation can slip in between them.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`: amount is zero or negative
    /// - `InsufficientFunds`: balance is smaller than the amount; balance unchanged
    pub async fn withdraw(&self, amount_cents: i64) -> Result<i64, BankError> {
        validate_amount(amount_cents)?;

        let new_balance = {
            let mut state = self.state.lock().await;
            if state.balance_cents < amount_cents {
                return Err(BankError::InsufficientFunds {
                    account_id: self.id.clone(),
                    requested_cents: amount_cents,
                    available_cents: state.balance_cents,
                });
            }
            state.balance_cents -= amount_cents;
            state.updated_at = Utc::now();
            state.balance_cents
        };

        tracing::info!(
            account_id = %self.id,
            amount_cents,
            balance_cents = new_balance,
            "Withdrew {} from {}. New balance: {}",
            format_cents(amount_cents),
            self.id,
            format_cents(new_balance)
        );

        Ok(new_balance)
    }

    /// Current balance in cents.
    pub async fn balance(&self) -> i64 {
        self.state.lock().await.balance_cents
    }

    /// Consistent view of balance and timestamps.
    pub async fn snapshot(&self) -> AccountSnapshot {
        let state = self.state.lock().await;
        AccountSnapshot {
            id: self.id.clone(),
            balance_cents: state.balance_cents,
            created_at: self.created_at,
            updated_at: state.updated_at,
        }
    }
}

fn validate_amount(amount_cents: i64) -> Result<(), BankError> {
    if amount_cents <= 0 {
        return Err(BankError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Render cents as dollars, e.g. `125000` -> `$1250.00`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
