//! Concurrent bank account core.
//!
//! An [`Account`](models::account::Account) guards its balance with one lock,
//! and a [`Dispatcher`](services::dispatcher::Dispatcher) drives concurrent
//! deposit/withdraw units through a fixed-size
//! [`WorkerPool`](services::worker_pool::WorkerPool).

pub mod config;
pub mod error;
pub mod models;
pub mod services;
