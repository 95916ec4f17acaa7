//! # openledger-store
//!
//! **Storage seam**: the durable-store contract the engine requires, and the
//! in-memory reference implementation.
//!
//! ## Contract
//!
//! The engine does not mandate a storage technology — only a single-row
//! conditional-write primitive: [`LedgerStore::commit`] applies a new
//! balance row guarded by `WHERE version = expected`, atomically paired
//! with one ledger-entry append. Any backend that can express that guard
//! (a document store's conditional update, an RDBMS `UPDATE ... WHERE
//! version = ?`, a CAS-capable KV store) can implement the trait.
//!
//! ## Write Flow
//!
//! ```text
//! ConcurrencyController.apply() → get_or_create() → compute → commit()
//!                                      ▲                        │
//!                                      └───── VersionMismatch ──┘
//! ```
//!
//! The store holds its row lock only for the duration of the conditional
//! write itself — never across the caller's read-compute cycle.

pub mod contract;
pub mod memory;

pub use contract::{CommitOutcome, CommitRequest, LedgerStore};
pub use memory::MemoryStore;
