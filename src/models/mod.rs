//! Domain models.
//!
//! This module contains the account entity and the in-memory records the
//! dispatcher reports back.

/// Shared account with a lock-guarded balance
pub mod account;
/// Unit-of-work outcomes
pub mod transaction;
