//! Outcomes of units of work.
//!
//! A unit of work is one deposit followed by one withdraw. Outcomes are kept
//! in memory for the dispatcher's report only; nothing here is persisted.

use serde::Serialize;

/// How a unit of work ended.
///
/// - `Completed`: deposit and withdraw both applied
/// - `WithdrawRejected`: deposit applied, withdraw refused (e.g. insufficient funds)
/// - `DepositRejected`: deposit refused, withdraw not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Completed,
    WithdrawRejected,
    DepositRejected,
}

/// Result of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    /// Submission index within the dispatch run
    pub unit_id: usize,

    pub status: UnitStatus,

    /// Amount actually added to the balance (0 if the deposit was rejected)
    pub deposited_cents: i64,

    /// Amount actually removed from the balance (0 if the withdraw was rejected)
    pub withdrawn_cents: i64,

    /// Error message for rejected operations
    pub error: Option<String>,
}

impl UnitOutcome {
    pub fn completed(unit_id: usize, deposited_cents: i64, withdrawn_cents: i64) -> Self {
        Self {
            unit_id,
            status: UnitStatus::Completed,
            deposited_cents,
            withdrawn_cents,
            error: None,
        }
    }

    pub fn withdraw_rejected(unit_id: usize, deposited_cents: i64, error: String) -> Self {
        Self {
            unit_id,
            status: UnitStatus::WithdrawRejected,
            deposited_cents,
            withdrawn_cents: 0,
            error: Some(error),
        }
    }

    pub fn deposit_rejected(unit_id: usize, error: String) -> Self {
        Self {
            unit_id,
            status: UnitStatus::DepositRejected,
            deposited_cents: 0,
            withdrawn_cents: 0,
            error: Some(error),
        }
    }

    /// Net effect of this unit on the balance.
    pub fn net_cents(&self) -> i64 {
        self.deposited_cents - self.withdrawn_cents
    }
}
