//! # LedgerEntry — the immutable audit record
//!
//! One entry per committed balance mutation, written atomically with the
//! balance row it mutates. Entries are append-only: a correction is a new,
//! compensating entry, never an edit of the original.
//!
//! ## Status State Machine
//!
//! ```text
//!   ┌─────────┐  paired write   ┌───────────┐  compensating entry  ┌──────────┐
//!   │ PENDING ├────────────────▶│ COMPLETED ├─────────────────────▶│ REVERSED │
//!   └────┬────┘                 └───────────┘                      └──────────┘
//!        │ paired write aborts
//!        ▼
//!   ┌────────┐
//!   │ FAILED │
//!   └────────┘
//! ```
//!
//! Single-commit stores write `COMPLETED` directly; `PENDING`/`FAILED` exist
//! for two-phase stores where the balance write and the entry append are
//! separate durability events. `COMPLETED → REVERSED` happens only as a side
//! effect of committing the compensating entry — amounts and snapshots of
//! the original are never edited, only its status marker flips in that same
//! atomic commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BalanceAmounts, EntryId, Initiator, OwnerId};

/// The kind of balance mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Unconditional increase of `available` (incoming payment, refund, top-up).
    Credit,
    /// Decrease of `available` (charge, stock consumption).
    Debit,
    /// Move from `available` to `reserved` (temporary hold).
    Reserve,
    /// Move from `reserved` back to `available` (hold released).
    Release,
}

impl EntryType {
    /// The mutation that undoes this one. Used when building a
    /// compensating entry.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
            Self::Reserve => Self::Release,
            Self::Release => Self::Reserve,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
            Self::Reserve => write!(f, "RESERVE"),
            Self::Release => write!(f, "RELEASE"),
        }
    }
}

/// Lifecycle state of a ledger entry.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Pending → Completed` (paired write committed)
/// - `Pending → Failed` (paired write aborted; no balance effect retained)
/// - `Completed → Reversed` (a compensating entry was committed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Written, pair not yet durable. Never visible from single-commit stores.
    Pending,
    /// The paired balance write committed. The entry's effect is real.
    Completed,
    /// The paired write aborted. The entry had no balance effect.
    Failed,
    /// A later compensating entry undid this one. The original effect
    /// was real at the time; the compensation nets it out.
    Reversed,
}

impl EntryStatus {
    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Completed | Self::Failed)
                | (Self::Completed, Self::Reversed)
        )
    }

    /// Whether an entry in this status contributed to the balance.
    /// `Reversed` counts: its effect was committed, and the compensating
    /// entry carries the opposite effect.
    #[must_use]
    pub fn affected_balance(&self) -> bool {
        matches!(self, Self::Completed | Self::Reversed)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Reversed => write!(f, "REVERSED"),
        }
    }
}

/// Link to the business event that caused a mutation.
///
/// The engine never interprets `kind` beyond equality; callers use their
/// own vocabulary (`"shipment"`, `"payment"`, `"adjustment"`, ...). The one
/// engine-generated kind is [`Reference::REVERSAL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub kind: String,
    pub id: String,
}

impl Reference {
    /// Reference kind written on engine-generated compensating entries.
    pub const REVERSAL: &'static str = "reversal";

    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Reference pointing at the original entry a compensation undoes.
    #[must_use]
    pub fn reversal(original: EntryId) -> Self {
        Self {
            kind: Self::REVERSAL.to_string(),
            id: original.to_string(),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// An immutable record of a single committed balance mutation.
///
/// Written atomically with its paired balance write. The before/after
/// snapshots make every entry self-contained: reconstructing the balance
/// at any point in time needs only the one entry, not a full replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Globally unique, time-ordered identifier.
    pub id: EntryId,
    /// The owner whose balance this entry mutated.
    pub owner_id: OwnerId,
    /// The kind of mutation.
    pub entry_type: EntryType,
    /// Mutation magnitude. Always strictly positive; direction is carried
    /// by `entry_type`.
    pub amount: Decimal,
    /// Full snapshot at the instant before the write.
    pub balance_before: BalanceAmounts,
    /// Full snapshot at the instant after the write.
    pub balance_after: BalanceAmounts,
    /// The causing business event.
    pub reference: Reference,
    /// Actor/user/process responsible.
    pub initiator: Initiator,
    /// Free-form human context.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: EntryStatus,
    /// On a compensating entry: the original entry it undoes.
    pub reverses: Option<EntryId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Synthetic entries for unit tests. Snapshots are zeroed.
/// **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl LedgerEntry {
    pub fn dummy(owner_id: OwnerId, entry_type: EntryType, amount: Decimal) -> Self {
        Self {
            id: EntryId::new(),
            owner_id,
            entry_type,
            amount,
            balance_before: BalanceAmounts::zero(),
            balance_after: BalanceAmounts::zero(),
            reference: Reference::new("test", "t-0"),
            initiator: Initiator::new("test"),
            description: None,
            status: EntryStatus::Completed,
            reverses: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters & paging
// ---------------------------------------------------------------------------

/// Filter for ledger listings. `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub status: Option<EntryStatus>,
    pub reference_kind: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Match-all filter.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_reference_kind(mut self, kind: impl Into<String>) -> Self {
        self.reference_kind = Some(kind.into());
        self
    }

    /// Whether an entry passes every configured predicate.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if self.entry_type.is_some_and(|t| t != entry.entry_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != entry.status) {
            return false;
        }
        if self
            .reference_kind
            .as_deref()
            .is_some_and(|k| k != entry.reference.kind)
        {
            return false;
        }
        if self.created_after.is_some_and(|t| entry.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| entry.created_at > t) {
            return false;
        }
        true
    }
}

/// Offset/limit page request. Stores clamp `limit` to
/// [`crate::constants::MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
}

impl PageRequest {
    #[must_use]
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: crate::constants::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the total count before paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}
