//! Concurrent account access tests
//!
//! These tests hammer one account from many tasks on the multi-threaded
//! runtime and check that no update is lost and no overdraft slips through.
//!
//! Run with: cargo test --test concurrent_account_test -- --nocapture

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use concurrent_bank::error::BankError;
use concurrent_bank::models::account::Account;
use concurrent_bank::services::dispatcher::{DispatchConfig, Dispatcher};
use concurrent_bank::services::worker_pool::WorkerPool;
use rand::seq::SliceRandom;
use tokio::sync::Barrier;

/// Number of concurrent tasks for stress tests.
const TASK_COUNT: usize = 16;

/// Number of operations per task
const ITERATIONS_PER_TASK: usize = 50;

fn demo_config() -> DispatchConfig {
    DispatchConfig {
        workers: 3,
        units: 5,
        deposit_cents: 10_000,
        withdraw_cents: 5_000,
        delay: Duration::from_millis(50),
        timeout: Duration::from_secs(5),
        queue_capacity: 16,
    }
}

/// Scenario: 1000.00, five units of +100.00 / -50.00 ends at 1250.00.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demo_scenario_final_balance() {
    let account = Arc::new(Account::new("ACC-001", 100_000).unwrap());

    let report = Dispatcher::new(demo_config())
        .run(Arc::clone(&account))
        .await
        .unwrap();

    assert!(report.all_completed(), "report: {:?}", report);
    assert_eq!(report.total_deposited_cents(), 50_000);
    assert_eq!(report.total_withdrawn_cents(), 25_000);
    assert_eq!(account.balance().await, 125_000);
}

/// Scenario: a single overdraft is rejected and leaves the balance alone.
#[tokio::test]
async fn test_single_overdraft_rejected() {
    let account = Account::new("ACC-001", 100_000).unwrap();

    match account.withdraw(200_000).await {
        Err(BankError::InsufficientFunds {
            account_id,
            requested_cents,
            ..
        }) => {
            assert_eq!(account_id, "ACC-001");
            assert_eq!(requested_cents, 200_000);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
    assert_eq!(account.balance().await, 100_000);
}

/// Final balance = initial + successful deposits - successful withdrawals.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_lost_updates_under_contention() {
    let account = Arc::new(Account::new("ACC-STRESS", 10_000).unwrap());
    let barrier = Arc::new(Barrier::new(TASK_COUNT));
    let deposited = Arc::new(AtomicI64::new(0));
    let withdrawn = Arc::new(AtomicI64::new(0));

    let mut handles = vec![];
    for task_id in 0..TASK_COUNT {
        let account = Arc::clone(&account);
        let barrier = Arc::clone(&barrier);
        let deposited = Arc::clone(&deposited);
        let withdrawn = Arc::clone(&withdrawn);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            for i in 0..ITERATIONS_PER_TASK {
                let amount = ((task_id * 7 + i * 13) % 500 + 1) as i64;
                if (task_id + i) % 2 == 0 {
                    account.deposit(amount).await.unwrap();
                    deposited.fetch_add(amount, Ordering::SeqCst);
                } else {
                    match account.withdraw(amount).await {
                        Ok(balance) => {
                            assert!(balance >= 0);
                            withdrawn.fetch_add(amount, Ordering::SeqCst);
                        }
                        Err(e) => assert!(e.is_insufficient_funds()),
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let expected =
        10_000 + deposited.load(Ordering::SeqCst) - withdrawn.load(Ordering::SeqCst);
    assert_eq!(account.balance().await, expected);
    assert!(account.balance().await >= 0);
}

/// Over-subscribed withdrawals: exactly as many succeed as the balance covers.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_withdrawals_never_overdraw() {
    let account = Arc::new(Account::new("ACC-RACE", 100_000).unwrap());
    let barrier = Arc::new(Barrier::new(TASK_COUNT * 2));
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));

    // 32 withdrawals of 10.00 against 1000.00 of funds: only 10 can succeed.
    let mut handles = vec![];
    for _ in 0..TASK_COUNT * 2 {
        let account = Arc::clone(&account);
        let barrier = Arc::clone(&barrier);
        let successes = Arc::clone(&successes);
        let failures = Arc::clone(&failures);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            match account.withdraw(10_000).await {
                Ok(balance) => {
                    assert!(balance >= 0);
                    successes.fetch_add(1, Ordering::SeqCst);
                }
                Err(BankError::InsufficientFunds {
                    available_cents, ..
                }) => {
                    assert!(available_cents < 10_000);
                    failures.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(successes.load(Ordering::SeqCst), 10);
    assert_eq!(failures.load(Ordering::SeqCst), TASK_COUNT * 2 - 10);
    assert_eq!(account.balance().await, 0);
}

/// Dispatcher run where later withdrawals cannot be covered.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatcher_absorbs_insufficient_funds() {
    let account = Arc::new(Account::new("ACC-LOW", 0).unwrap());
    let config = DispatchConfig {
        units: 6,
        deposit_cents: 1_000,
        withdraw_cents: 5_000,
        delay: Duration::from_millis(5),
        ..demo_config()
    };

    let report = Dispatcher::new(config)
        .run(Arc::clone(&account))
        .await
        .unwrap();

    assert!(report.all_completed());
    assert_eq!(report.outcomes.len(), 6);
    assert!(report.rejected_withdrawals() >= 1);
    let net: i64 = report.outcomes.iter().map(|o| o.net_cents()).sum();
    assert_eq!(account.balance().await, net);
    assert!(account.balance().await >= 0);
}

/// Reordering units with the same totals yields the same final balance.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unit_order_does_not_change_final_balance() {
    let units: Vec<(i64, i64)> = vec![
        (10_000, 5_000),
        (2_500, 1_000),
        (7_000, 6_500),
        (400, 100),
        (12_000, 11_000),
    ];
    let expected = 100_000 + units.iter().map(|(d, w)| d - w).sum::<i64>();

    for _ in 0..5 {
        let mut shuffled = units.clone();
        shuffled.shuffle(&mut rand::rng());

        let account = Arc::new(Account::new("ACC-ORDER", 100_000).unwrap());
        let pool = WorkerPool::new(3, 8).unwrap();
        for (deposit, withdraw) in shuffled {
            let account = Arc::clone(&account);
            pool.submit(async move {
                account.deposit(deposit).await.unwrap();
                tokio::time::sleep(Duration::from_millis(2)).await;
                account.withdraw(withdraw).await.unwrap();
            })
            .await
            .unwrap();
        }

        assert!(pool.await_termination(Duration::from_secs(5)).await);
        assert_eq!(account.balance().await, expected);
    }
}

/// The dispatcher stops waiting at the timeout and reports partial completion.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatcher_reports_timeout() {
    let account = Arc::new(Account::new("ACC-SLOW", 100_000).unwrap());
    let config = DispatchConfig {
        workers: 1,
        units: 3,
        delay: Duration::from_secs(2),
        timeout: Duration::from_millis(100),
        ..demo_config()
    };

    let report = Dispatcher::new(config)
        .run(Arc::clone(&account))
        .await
        .unwrap();

    assert!(report.timed_out);
    assert!(!report.all_completed());
    assert!(report.completed < report.submitted);
}

/// Operations on different accounts do not share a lock.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_accounts_are_independent() {
    let a = Arc::new(Account::new("ACC-A", 0).unwrap());
    let b = Arc::new(Account::new("ACC-B", 0).unwrap());

    let da = Dispatcher::new(demo_config());
    let db = Dispatcher::new(demo_config());
    let (ra, rb) = tokio::join!(
        da.run(Arc::clone(&a)),
        db.run(Arc::clone(&b)),
    );

    assert!(ra.unwrap().all_completed());
    assert!(rb.unwrap().all_completed());
    assert_eq!(a.balance().await, 25_000);
    assert_eq!(b.balance().await, 25_000);
}

/// A saturated queue must not stretch the run past its timeout.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeout_bounds_submission_on_full_queue() {
    let account = Arc::new(Account::new("ACC-BUSY", 100_000).unwrap());
    let config = DispatchConfig {
        workers: 1,
        queue_capacity: 1,
        units: 6,
        delay: Duration::from_millis(300),
        timeout: Duration::from_millis(100),
        ..demo_config()
    };

    let started = std::time::Instant::now();
    let report = Dispatcher::new(config)
        .run(Arc::clone(&account))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(250), "elapsed {:?}", elapsed);
    assert!(report.timed_out);
    assert_eq!(report.requested, 6);
    assert!(report.submitted < report.requested);
    assert_eq!(report.completed, 0);
}
