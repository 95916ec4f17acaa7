//! Error types for the OpenLedger engine.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Balance / business-rule errors
//! - 2xx: Concurrency errors
//! - 3xx: Ledger entry errors
//! - 4xx: Audit / reconciliation errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{EntryId, EntryStatus, OwnerId};

/// Central error enum for all OpenLedger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // Balance / Business Errors (1xx)
    // =================================================================
    /// Not enough available balance to debit or reserve.
    /// Business-rule violation; non-retriable; surfaced to the caller as-is.
    #[error("OL_ERR_100: Insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Not enough reserved balance to release. Indicates a mismatched
    /// reserve/release pairing — a bug upstream, not a user-facing condition.
    #[error("OL_ERR_101: Insufficient reserved balance: need {needed}, have {reserved}")]
    InsufficientReserved { needed: Decimal, reserved: Decimal },

    /// The owner is administratively frozen; outflow requires manual unfreeze.
    #[error("OL_ERR_102: Owner frozen: {0}")]
    OwnerFrozen(OwnerId),

    /// Mutation amounts must be strictly positive.
    #[error("OL_ERR_103: Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// A mutation would drive a quantity negative where that is not allowed.
    #[error("OL_ERR_104: Balance underflow")]
    BalanceUnderflow,

    // =================================================================
    // Concurrency Errors (2xx)
    // =================================================================
    /// The conditional write lost to a concurrent writer on every attempt.
    /// Transient: retried internally with backoff, surfaced only on
    /// exhaustion, at which point the caller may retry the whole operation.
    #[error("OL_ERR_200: Concurrent modification of {owner} (gave up after {attempts} attempts)")]
    ConcurrentModification { owner: OwnerId, attempts: usize },

    // =================================================================
    // Ledger Entry Errors (3xx)
    // =================================================================
    /// The referenced ledger entry does not exist for this owner.
    #[error("OL_ERR_300: Ledger entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Only COMPLETED entries can be reversed.
    #[error("OL_ERR_301: Entry {entry} is {status}, not COMPLETED; cannot reverse")]
    EntryNotReversible { entry: EntryId, status: EntryStatus },

    // =================================================================
    // Audit Errors (4xx)
    // =================================================================
    /// The stored balance disagrees with the ledger history. Raised only by
    /// the background verifier, never on the hot path; requires manual
    /// reconciliation.
    #[error("OL_ERR_400: Consistency violation for {owner}: {reason}")]
    ConsistencyViolation { owner: OwnerId, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid retry bounds, missing fields, etc.).
    #[error("OL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("OL_ERR_903: I/O error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Whether this error may succeed on retry. The retry layer retries
    /// ONLY transient errors; business-rule violations propagate immediately.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

// Conversion from std::io::Error
impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
