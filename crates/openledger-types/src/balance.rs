//! Balance tracking types for the OpenLedger reservation model.
//!
//! Every owner has an `available` balance (usable for new debits and
//! reservations) and a `reserved` balance (held by active reservations
//! awaiting a later debit or release). The row carries a version token;
//! all writes are conditional on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OwnerId;

/// The three derived quantities of a balance at one instant.
///
/// Embedded in every [`crate::LedgerEntry`] as the before/after snapshot,
/// enabling point-in-time reconstruction without replaying the whole log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceAmounts {
    pub available: Decimal,
    pub reserved: Decimal,
    pub total: Decimal,
}

impl BalanceAmounts {
    /// All-zero amounts.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            available: Decimal::ZERO,
            reserved: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

/// A single owner's balance row.
///
/// Created lazily on first reference, never deleted (only frozen), and
/// mutated exclusively through the concurrency controller. `total` is
/// always derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    /// The owner this row belongs to.
    pub owner_id: OwnerId,
    /// Available for new debits and reservations.
    pub available: Decimal,
    /// Held by active reservations awaiting debit or release.
    pub reserved: Decimal,
    /// Monotonically increasing version token; incremented on every
    /// committed write. Basis of optimistic concurrency.
    pub version: u64,
    /// Optional alert trigger: crossing below fires a low-balance alert.
    pub low_threshold: Option<Decimal>,
    /// Administrative block on outflow (reserve/debit).
    pub frozen: bool,
    /// Owner-class flag permitting `available < 0` on debit.
    pub allow_negative: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a zeroed balance for an owner (version 0, nothing held).
    #[must_use]
    pub fn new(owner_id: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            owner_id,
            available: Decimal::ZERO,
            reserved: Decimal::ZERO,
            version: 0,
            low_threshold: None,
            frozen: false,
            allow_negative: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total balance (available + reserved). Derived, never stored.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.reserved
    }

    /// Whether this row holds no quantity at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.reserved.is_zero()
    }

    /// The three derived quantities at this instant.
    #[must_use]
    pub fn amounts(&self) -> BalanceAmounts {
        BalanceAmounts {
            available: self.available,
            reserved: self.reserved,
            total: self.total(),
        }
    }

    /// Consistent point-in-time view for readers.
    #[must_use]
    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            owner_id: self.owner_id.clone(),
            available: self.available,
            reserved: self.reserved,
            total: self.total(),
            version: self.version,
            frozen: self.frozen,
        }
    }

    /// Whether `available` has crossed below the configured low threshold.
    #[must_use]
    pub fn below_threshold(&self) -> bool {
        self.low_threshold
            .is_some_and(|threshold| self.available < threshold)
    }
}

/// Read-only point-in-time view of a balance. No side effects to produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub owner_id: OwnerId,
    pub available: Decimal,
    pub reserved: Decimal,
    pub total: Decimal,
    pub version: u64,
    pub frozen: bool,
}
