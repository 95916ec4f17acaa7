//! # openledger-types
//!
//! Shared types, errors, and configuration for the **OpenLedger** balance
//! and reservation engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OwnerId`], [`EntryId`], [`Initiator`]
//! - **Balance model**: [`Balance`], [`BalanceAmounts`], [`BalanceSnapshot`]
//! - **Ledger model**: [`LedgerEntry`], [`EntryType`], [`EntryStatus`], [`Reference`]
//! - **Paging**: [`EntryFilter`], [`PageRequest`], [`Page`]
//! - **Configuration**: [`RetryConfig`], [`VerifierConfig`]
//! - **Errors**: [`LedgerError`] with `OL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod ids;

// Re-export all primary types at crate root for ergonomic imports:
//   use openledger_types::{Balance, LedgerEntry, EntryType, ...};

pub use balance::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use ids::*;

// Constants are accessed via `openledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
