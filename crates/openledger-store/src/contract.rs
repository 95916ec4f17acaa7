//! The `LedgerStore` trait — the conditional-update contract.
//!
//! A balance row, its paired ledger entry, and an optional reversal marker
//! flip commit as **one atomic unit**. The version guard is the entire
//! concurrency story: no other locking is required of a backend.

use async_trait::async_trait;
use openledger_types::{
    Balance, BalanceSnapshot, EntryFilter, EntryId, LedgerEntry, OwnerId, Page, PageRequest,
    Result,
};

/// One conditional write: the full new balance row plus its paired entry.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// The version the caller read. The write applies only if the stored
    /// row still carries this version.
    pub expected_version: u64,
    /// The full new row. Must carry `version = expected_version + 1`.
    pub balance: Balance,
    /// The paired audit record. `None` only for flag-only writes
    /// (freeze/unfreeze, threshold changes) that move no quantity.
    pub entry: Option<LedgerEntry>,
    /// When set, the referenced entry's status flips `COMPLETED → REVERSED`
    /// in the same commit. Set on compensating entries only.
    pub reverses: Option<EntryId>,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The guard held; balance, entry, and reversal flip are all durable.
    Applied,
    /// The stored version no longer matches. Nothing was written; the
    /// caller re-reads and retries.
    VersionMismatch { actual: u64 },
}

/// Durable record of balances and their append-only ledger.
///
/// Implementations must guarantee:
/// - `get_or_create` is idempotent under concurrent first access;
/// - `commit` is atomic: on `Applied` the balance write, the entry append,
///   and any reversal flip are one durability event; on any failure or
///   mismatch nothing is retained;
/// - entries are immutable once written, except the single sanctioned
///   status flip `COMPLETED → REVERSED` via `CommitRequest::reverses`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Return the owner's balance row, atomically inserting a zeroed one
    /// (version 0) on first reference.
    async fn get_or_create(&self, owner_id: &OwnerId) -> Result<Balance>;

    /// Consistent point-in-time view. No side effects; `None` if the owner
    /// has never been referenced.
    async fn read(&self, owner_id: &OwnerId) -> Result<Option<BalanceSnapshot>>;

    /// The conditional write primitive. See [`CommitRequest`].
    async fn commit(&self, request: CommitRequest) -> Result<CommitOutcome>;

    /// Look up one ledger entry.
    async fn find_entry(&self, owner_id: &OwnerId, entry_id: EntryId)
        -> Result<Option<LedgerEntry>>;

    /// Filtered, paged ledger listing in commit order.
    async fn list_entries(
        &self,
        owner_id: &OwnerId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>>;

    /// The owner's full entry history in commit order, for reconciliation.
    async fn replay_entries(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>>;

    /// Every owner ever referenced, for the verifier sweep.
    async fn owner_ids(&self) -> Result<Vec<OwnerId>>;
}
