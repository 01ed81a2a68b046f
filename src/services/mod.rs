//! Concurrency services.
//!
//! Services coordinate work against accounts, separate from the account
//! entity itself.

pub mod dispatcher;
pub mod worker_pool;
