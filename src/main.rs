//! Concurrent bank account demo - application entry point.
//!
//! Opens one account, runs concurrent deposit/withdraw units against it on a
//! fixed-size worker pool, prints the final balance, then shows an overdraft
//! being rejected.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the account
//! 3. Dispatch units of work and wait for them (bounded by a timeout)
//! 4. Print the final balance and attempt an overdraft

use std::sync::Arc;

use concurrent_bank::{
    config::Config,
    models::account::{Account, format_cents},
    services::dispatcher::Dispatcher,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let dispatch_config = config.dispatch_config()?;
    tracing::info!("Configuration loaded");

    // One explicitly owned account, shared with the workers.
    let account = Arc::new(Account::new(
        config.account_id.clone(),
        config.initial_balance_cents,
    )?);
    tracing::info!(
        account_id = account.id(),
        "Account opened with balance {}",
        format_cents(config.initial_balance_cents)
    );

    let report = Dispatcher::new(dispatch_config)
        .run(Arc::clone(&account))
        .await?;
    if !report.all_completed() {
        println!(
            "Dispatcher stopped waiting: {} of {} units completed",
            report.completed, report.requested
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    println!("Final balance: {}", format_cents(account.balance().await));

    match account.withdraw(config.overdraft_probe_cents).await {
        Ok(balance) => println!(
            "Overdraft probe unexpectedly succeeded. New balance: {}",
            format_cents(balance)
        ),
        Err(e) => println!("Caught error: {}", e),
    }

    println!("{}", serde_json::to_string_pretty(&account.snapshot().await)?);

    Ok(())
}
