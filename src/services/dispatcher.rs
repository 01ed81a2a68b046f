//! Dispatcher - runs concurrent units of work against one shared account.
//!
//! Each unit deposits, sleeps for the simulated processing time (outside any
//! lock), then withdraws. Units are submitted to a `WorkerPool`; the
//! dispatcher then waits for the pool to drain. One deadline, taken before
//! the first submission, bounds both the submissions and that wait.
//!
//! # Failure Handling
//!
//! A rejected withdraw (e.g. `InsufficientFunds`) is logged and recorded in
//! the unit's outcome. It never aborts sibling units or the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::BankError;
use crate::models::account::Account;
use crate::models::transaction::{UnitOutcome, UnitStatus};
use crate::services::worker_pool::WorkerPool;

/// Settings for one dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Fixed worker pool size
    pub workers: usize,
    /// Number of units to submit
    pub units: usize,
    pub deposit_cents: i64,
    pub withdraw_cents: i64,
    /// Simulated processing time between deposit and withdraw
    pub delay: Duration,
    /// Upper bound on the wait for all units
    pub timeout: Duration,
    /// Bounded job queue size
    pub queue_capacity: usize,
}

impl DispatchConfig {
    /// Check the settings without starting anything.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: zero workers, zero queue capacity, or non-positive amounts
    pub fn validate(&self) -> Result<(), BankError> {
        if self.workers == 0 {
            return Err(BankError::InvalidConfig(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(BankError::InvalidConfig(
                "job queue capacity must be positive".to_string(),
            ));
        }
        if self.deposit_cents <= 0 || self.withdraw_cents <= 0 {
            return Err(BankError::InvalidConfig(
                "deposit and withdraw amounts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// What happened during a dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    /// Units the configuration asked for
    pub requested: usize,
    /// Units that made it into the queue before the deadline
    pub submitted: usize,
    /// Units that finished before the dispatcher stopped waiting
    pub completed: usize,
    /// True if the timeout elapsed before every unit finished
    pub timed_out: bool,
    pub outcomes: Vec<UnitOutcome>,
}

impl DispatchReport {
    pub fn all_completed(&self) -> bool {
        !self.timed_out && self.completed == self.requested
    }

    pub fn total_deposited_cents(&self) -> i64 {
        self.outcomes.iter().map(|o| o.deposited_cents).sum()
    }

    pub fn total_withdrawn_cents(&self) -> i64 {
        self.outcomes.iter().map(|o| o.withdrawn_cents).sum()
    }

    pub fn rejected_withdrawals(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == UnitStatus::WithdrawRejected)
            .count()
    }
}

pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Submit every unit, wait for them (up to the timeout) and report.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig`: the configuration is unusable
    /// - `PoolClosed`: the pool stopped accepting jobs mid-submission
    ///
    /// Per-unit failures are not errors; they show up in the report.
    pub async fn run(&self, account: Arc<Account>) -> Result<DispatchReport, BankError> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let config = &self.config;
        tracing::info!(
            %run_id,
            account_id = account.id(),
            workers = config.workers,
            units = config.units,
            "Dispatching units of work"
        );

        let deadline = Instant::now() + config.timeout;
        let pool = WorkerPool::new(config.workers, config.queue_capacity)?;
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        // Submission waits on the bounded queue, so it shares the deadline.
        let mut submitted = 0;
        let submit_all = async {
            for unit_id in 0..config.units {
                let account = Arc::clone(&account);
                let outcome_tx = outcome_tx.clone();
                let (deposit, withdraw, delay) =
                    (config.deposit_cents, config.withdraw_cents, config.delay);

                pool.submit(async move {
                    let outcome = run_unit(unit_id, &account, deposit, withdraw, delay).await;
                    // The receiver is gone only if the dispatcher gave up waiting.
                    let _ = outcome_tx.send(outcome);
                })
                .await?;
                submitted += 1;
            }
            Ok::<(), BankError>(())
        };
        let submission_finished = match tokio::time::timeout_at(deadline, submit_all).await {
            Ok(result) => {
                result?;
                true
            }
            Err(_) => false,
        };
        drop(outcome_tx);

        let finished = pool.await_termination_until(deadline).await && submission_finished;

        let mut outcomes = Vec::with_capacity(submitted);
        while let Ok(outcome) = outcome_rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes.sort_by_key(|o| o.unit_id);

        let report = DispatchReport {
            run_id,
            requested: config.units,
            submitted,
            completed: outcomes.len(),
            timed_out: !finished,
            outcomes,
        };

        if report.timed_out {
            tracing::warn!(
                %run_id,
                completed = report.completed,
                submitted = report.submitted,
                requested = report.requested,
                "Dispatcher timed out before all units completed"
            );
        } else {
            tracing::info!(
                %run_id,
                completed = report.completed,
                rejected_withdrawals = report.rejected_withdrawals(),
                "All units completed"
            );
        }

        Ok(report)
    }
}

/// One unit of work: deposit, simulated processing time, withdraw.
///
/// Errors are logged and folded into the outcome.
pub async fn run_unit(
    unit_id: usize,
    account: &Account,
    deposit_cents: i64,
    withdraw_cents: i64,
    delay: Duration,
) -> UnitOutcome {
    if let Err(e) = account.deposit(deposit_cents).await {
        tracing::warn!(unit_id, "Transaction error: {}", e);
        return UnitOutcome::deposit_rejected(unit_id, e.to_string());
    }

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match account.withdraw(withdraw_cents).await {
        Ok(_) => UnitOutcome::completed(unit_id, deposit_cents, withdraw_cents),
        Err(e) => {
            tracing::warn!(unit_id, "Transaction error: {}", e);
            UnitOutcome::withdraw_rejected(unit_id, deposit_cents, e.to_string())
        }
    }
}
