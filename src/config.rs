//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to deserialize `BANK_*` variables into a type-safe struct.
//! Every variable is optional; the defaults reproduce the classic demo run.

use std::time::Duration;

use serde::Deserialize;

use crate::error::BankError;
use crate::services::dispatcher::DispatchConfig;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `BANK_ACCOUNT_ID`: account identifier, defaults to `ACC-001`
/// - `BANK_INITIAL_BALANCE_CENTS`: opening balance, defaults to 100000 (1000.00)
/// - `BANK_WORKERS`: worker pool size, defaults to 3
/// - `BANK_UNITS`: number of deposit+withdraw units, defaults to 5
/// - `BANK_DEPOSIT_CENTS` / `BANK_WITHDRAW_CENTS`: per-unit amounts, default 10000 / 5000
/// - `BANK_DELAY_MS`: simulated processing time between deposit and withdraw, defaults to 50
/// - `BANK_TIMEOUT_SECS`: how long to wait for all units, defaults to 5
/// - `BANK_QUEUE_CAPACITY`: bounded job queue size, defaults to 16
/// - `BANK_OVERDRAFT_PROBE_CENTS`: withdrawal attempted after the run, defaults to 200000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_account_id")]
    pub account_id: String,

    #[serde(default = "default_initial_balance")]
    pub initial_balance_cents: i64,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_units")]
    pub units: usize,

    #[serde(default = "default_deposit")]
    pub deposit_cents: i64,

    #[serde(default = "default_withdraw")]
    pub withdraw_cents: i64,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_overdraft_probe")]
    pub overdraft_probe_cents: i64,
}

fn default_account_id() -> String {
    "ACC-001".to_string()
}

fn default_initial_balance() -> i64 {
    100_000
}

fn default_workers() -> usize {
    3
}

fn default_units() -> usize {
    5
}

fn default_deposit() -> i64 {
    10_000
}

fn default_withdraw() -> i64 {
    5_000
}

fn default_delay_ms() -> u64 {
    50
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    16
}

fn default_overdraft_probe() -> i64 {
    200_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            initial_balance_cents: default_initial_balance(),
            workers: default_workers(),
            units: default_units(),
            deposit_cents: default_deposit(),
            withdraw_cents: default_withdraw(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            queue_capacity: default_queue_capacity(),
            overdraft_probe_cents: default_overdraft_probe(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads an optional `.env` file first, then reads `BANK_`-prefixed variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed into its field type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // bank_workers -> workers, etc.
        envy::prefixed("BANK_").from_env::<Config>()
    }

    /// Build the dispatcher settings, rejecting values no run could use.
    pub fn dispatch_config(&self) -> Result<DispatchConfig, BankError> {
        if self.timeout_secs == 0 {
            return Err(BankError::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }

        let config = DispatchConfig {
            workers: self.workers,
            units: self.units,
            deposit_cents: self.deposit_cents,
            withdraw_cents: self.withdraw_cents,
            delay: Duration::from_millis(self.delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            queue_capacity: self.queue_capacity,
        };
        config.validate()?;

        Ok(config)
    }
}
