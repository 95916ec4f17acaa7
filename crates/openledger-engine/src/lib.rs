//! # openledger-engine
//!
//! **Hot path**: balance mutation under optimistic concurrency, paired
//! audit-trail writes, and the cross-owner transfer saga.
//!
//! ## Architecture
//!
//! 1. **RetryPolicy**: jittered exponential backoff; retries only
//!    transient errors
//! 2. **ConcurrencyController**: the single code path that writes a
//!    balance — read, compute, conditional commit, retry on conflict
//! 3. **ReservationManager**: reserve / release / debit / credit plus
//!    reversal and administrative operations, each atomically paired
//!    with one ledger entry
//! 4. **AlertSink**: fire-and-forget low-balance and consistency signals
//! 5. **Transfer saga**: two sequential primitives plus a compensating
//!    reversal — never a cross-row lock
//!
//! ## Mutation Flow
//!
//! ```text
//! caller → ReservationManager.reserve()
//!        → ConcurrencyController.apply(compute)
//!        → LedgerStore.get_or_create() → compute(balance) → commit()
//!        → [VersionMismatch → backoff → re-read → retry, bounded]
//!        → LedgerEntry (COMPLETED), paired atomically with the write
//! ```
//!
//! No lock is held across the read-compute-write cycle; writes to one
//! owner serialize on the row's version token.

pub mod alerts;
pub mod controller;
pub mod manager;
pub mod retry;
pub mod saga;

pub use alerts::{AlertSink, TracingAlerts};
pub use controller::{Applied, ConcurrencyController, EntryDraft, Mutation};
pub use manager::ReservationManager;
pub use retry::RetryPolicy;
pub use saga::TransferReceipt;
