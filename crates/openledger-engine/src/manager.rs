//! The reservation manager — the exposed mutation and read surface.
//!
//! Every operation follows the same shape: validate preconditions against
//! the freshly-read balance inside the compute closure, delegate the write
//! to the concurrency controller, and return the paired ledger entry. A
//! failed precondition leaves the balance and the ledger completely
//! untouched.
//!
//! Callers that fail after a successful `reserve` MUST `release` or `debit`
//! the held amount on every exit path; the engine never auto-releases a
//! remainder (an explicit release is the auditable record of intent).

use std::sync::Arc;

use openledger_store::LedgerStore;
use openledger_types::{
    Balance, BalanceSnapshot, EntryFilter, EntryId, EntryStatus, EntryType, Initiator,
    LedgerEntry, LedgerError, OwnerId, Page, PageRequest, Reference, Result, RetryConfig,
};
use rust_decimal::Decimal;

use crate::alerts::{AlertSink, TracingAlerts};
use crate::controller::{Applied, ConcurrencyController, EntryDraft, Mutation};

/// Orchestrates reserve / release / debit / credit over one balance store.
///
/// Cheap to share: wrap in an `Arc` and call from any number of tasks.
/// Writes to the same owner serialize on the version token; writes to
/// different owners never contend.
pub struct ReservationManager<S> {
    controller: ConcurrencyController<S>,
    alerts: Arc<dyn AlertSink>,
}

impl<S: LedgerStore> ReservationManager<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            controller: ConcurrencyController::new(store, retry),
            alerts,
        }
    }

    /// Default retry bounds, alerts into the `tracing` pipeline.
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, RetryConfig::default(), Arc::new(TracingAlerts))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        self.controller.store()
    }

    // -----------------------------------------------------------------
    // Primitive operations
    // -----------------------------------------------------------------

    /// Move `amount` from available to reserved (a temporary hold pending
    /// a later debit or release).
    ///
    /// # Errors
    /// `OwnerFrozen` if the owner is blocked; `InsufficientBalance` if
    /// available < amount.
    pub async fn reserve(
        &self,
        owner_id: &OwnerId,
        amount: Decimal,
        reference: Reference,
        initiator: Initiator,
        description: Option<String>,
    ) -> Result<LedgerEntry> {
        Self::check_amount(amount)?;
        let applied = self
            .controller
            .apply(owner_id, |current| {
                if current.frozen {
                    return Err(LedgerError::OwnerFrozen(current.owner_id.clone()));
                }
                if current.available < amount {
                    return Err(LedgerError::InsufficientBalance {
                        needed: amount,
                        available: current.available,
                    });
                }
                let mut next = current.clone();
                next.available -= amount;
                next.reserved += amount;
                Ok(Mutation {
                    balance: next,
                    entry: Some(EntryDraft {
                        entry_type: EntryType::Reserve,
                        amount,
                        reference: reference.clone(),
                        initiator: initiator.clone(),
                        description: description.clone(),
                        reverses: None,
                    }),
                })
            })
            .await?;
        tracing::debug!(owner = %owner_id, amount = %amount, "reserved");
        self.finish(applied)
    }

    /// Decrement available directly. Used for charges not preceded by a
    /// reservation; the settle-after-reserve flow is `debit` plus a
    /// separate `release` for any remainder.
    ///
    /// # Errors
    /// `OwnerFrozen` if the owner is blocked; `InsufficientBalance` if
    /// available < amount and the owner class does not allow negative.
    pub async fn debit(
        &self,
        owner_id: &OwnerId,
        amount: Decimal,
        reference: Reference,
        initiator: Initiator,
    ) -> Result<LedgerEntry> {
        Self::check_amount(amount)?;
        let applied = self
            .controller
            .apply(owner_id, |current| {
                if current.frozen {
                    return Err(LedgerError::OwnerFrozen(current.owner_id.clone()));
                }
                if current.available < amount && !current.allow_negative {
                    return Err(LedgerError::InsufficientBalance {
                        needed: amount,
                        available: current.available,
                    });
                }
                let mut next = current.clone();
                next.available -= amount;
                Ok(Mutation {
                    balance: next,
                    entry: Some(EntryDraft {
                        entry_type: EntryType::Debit,
                        amount,
                        reference: reference.clone(),
                        initiator: initiator.clone(),
                        description: None,
                        reverses: None,
                    }),
                })
            })
            .await?;
        tracing::debug!(owner = %owner_id, amount = %amount, "debited");
        self.finish(applied)
    }

    /// Move `amount` from reserved back to available (hold released).
    /// Allowed on frozen owners: a release only restores availability.
    ///
    /// # Errors
    /// `InsufficientReserved` — a mismatched reserve/release pairing,
    /// which is a bug in the caller, not a user-facing condition.
    pub async fn release(
        &self,
        owner_id: &OwnerId,
        amount: Decimal,
        reference: Reference,
        initiator: Initiator,
    ) -> Result<LedgerEntry> {
        Self::check_amount(amount)?;
        let applied = self
            .controller
            .apply(owner_id, |current| {
                if current.reserved < amount {
                    return Err(LedgerError::InsufficientReserved {
                        needed: amount,
                        reserved: current.reserved,
                    });
                }
                let mut next = current.clone();
                next.reserved -= amount;
                next.available += amount;
                Ok(Mutation {
                    balance: next,
                    entry: Some(EntryDraft {
                        entry_type: EntryType::Release,
                        amount,
                        reference: reference.clone(),
                        initiator: initiator.clone(),
                        description: None,
                        reverses: None,
                    }),
                })
            })
            .await?;
        tracing::debug!(owner = %owner_id, amount = %amount, "released");
        self.finish(applied)
    }

    /// Unconditionally increment available (incoming payment, refund,
    /// top-up). Allowed on frozen owners: incoming funds are never bounced.
    pub async fn credit(
        &self,
        owner_id: &OwnerId,
        amount: Decimal,
        reference: Reference,
        initiator: Initiator,
    ) -> Result<LedgerEntry> {
        Self::check_amount(amount)?;
        let applied = self
            .controller
            .apply(owner_id, |current| {
                let mut next = current.clone();
                next.available += amount;
                Ok(Mutation {
                    balance: next,
                    entry: Some(EntryDraft {
                        entry_type: EntryType::Credit,
                        amount,
                        reference: reference.clone(),
                        initiator: initiator.clone(),
                        description: None,
                        reverses: None,
                    }),
                })
            })
            .await?;
        tracing::debug!(owner = %owner_id, amount = %amount, "credited");
        self.finish(applied)
    }

    // -----------------------------------------------------------------
    // Corrections
    // -----------------------------------------------------------------

    /// Compensate a COMPLETED entry: apply the inverse mutation and write
    /// a new entry linked via `reverses`; the original's status marker
    /// flips to REVERSED in the same atomic commit. Amounts and snapshots
    /// of the original are never edited.
    ///
    /// This is an administrative correction and is allowed on frozen
    /// owners.
    ///
    /// # Errors
    /// `EntryNotFound`; `EntryNotReversible` if the original is not
    /// COMPLETED (a concurrent reversal of the same entry commits first,
    /// the loser surfaces this).
    pub async fn reverse(
        &self,
        owner_id: &OwnerId,
        entry_id: EntryId,
        initiator: Initiator,
    ) -> Result<LedgerEntry> {
        let original = self
            .store()
            .find_entry(owner_id, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        if original.status != EntryStatus::Completed {
            return Err(LedgerError::EntryNotReversible {
                entry: entry_id,
                status: original.status,
            });
        }

        let amount = original.amount;
        let inverse = original.entry_type.inverse();
        let applied = self
            .controller
            .apply(owner_id, |current| {
                let mut next = current.clone();
                match inverse {
                    EntryType::Credit => next.available += amount,
                    EntryType::Debit => {
                        if current.available < amount && !current.allow_negative {
                            return Err(LedgerError::InsufficientBalance {
                                needed: amount,
                                available: current.available,
                            });
                        }
                        next.available -= amount;
                    }
                    EntryType::Release => {
                        if current.reserved < amount {
                            return Err(LedgerError::InsufficientReserved {
                                needed: amount,
                                reserved: current.reserved,
                            });
                        }
                        next.reserved -= amount;
                        next.available += amount;
                    }
                    EntryType::Reserve => {
                        if current.available < amount {
                            return Err(LedgerError::InsufficientBalance {
                                needed: amount,
                                available: current.available,
                            });
                        }
                        next.available -= amount;
                        next.reserved += amount;
                    }
                }
                Ok(Mutation {
                    balance: next,
                    entry: Some(EntryDraft {
                        entry_type: inverse,
                        amount,
                        reference: Reference::reversal(entry_id),
                        initiator: initiator.clone(),
                        description: Some(format!("reversal of {entry_id}")),
                        reverses: Some(entry_id),
                    }),
                })
            })
            .await?;
        tracing::info!(owner = %owner_id, entry = %entry_id, "ledger entry reversed");
        self.finish(applied)
    }

    // -----------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------

    /// Block outflow (reserve/debit) for an owner. Idempotent.
    pub async fn freeze(&self, owner_id: &OwnerId, initiator: Initiator) -> Result<BalanceSnapshot> {
        let applied = self.set_flag(owner_id, |next| next.frozen = true).await?;
        tracing::warn!(owner = %owner_id, initiator = %initiator, "owner frozen");
        Ok(applied.balance.snapshot())
    }

    /// Lift the administrative block. Idempotent.
    pub async fn unfreeze(
        &self,
        owner_id: &OwnerId,
        initiator: Initiator,
    ) -> Result<BalanceSnapshot> {
        let applied = self.set_flag(owner_id, |next| next.frozen = false).await?;
        tracing::info!(owner = %owner_id, initiator = %initiator, "owner unfrozen");
        Ok(applied.balance.snapshot())
    }

    /// Configure (or clear) the low-balance alert trigger.
    pub async fn set_low_threshold(
        &self,
        owner_id: &OwnerId,
        threshold: Option<Decimal>,
    ) -> Result<BalanceSnapshot> {
        let applied = self
            .set_flag(owner_id, |next| next.low_threshold = threshold)
            .await?;
        Ok(applied.balance.snapshot())
    }

    /// Flip the owner-class flag permitting negative available on debit.
    pub async fn set_allow_negative(
        &self,
        owner_id: &OwnerId,
        allow: bool,
    ) -> Result<BalanceSnapshot> {
        let applied = self
            .set_flag(owner_id, |next| next.allow_negative = allow)
            .await?;
        Ok(applied.balance.snapshot())
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Consistent point-in-time view. An owner never referenced reads as
    /// zeroed; no row is created.
    pub async fn get_balance(&self, owner_id: &OwnerId) -> Result<BalanceSnapshot> {
        Ok(self
            .store()
            .read(owner_id)
            .await?
            .unwrap_or_else(|| Balance::new(owner_id.clone()).snapshot()))
    }

    /// Filtered, paged ledger history in commit order.
    pub async fn list_ledger(
        &self,
        owner_id: &OwnerId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>> {
        self.store().list_entries(owner_id, filter, page).await
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn check_amount(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(())
    }

    async fn set_flag<F>(&self, owner_id: &OwnerId, set: F) -> Result<Applied>
    where
        F: Fn(&mut Balance) + Send + Sync,
    {
        self.controller
            .apply(owner_id, |current| {
                let mut next = current.clone();
                set(&mut next);
                Ok(Mutation {
                    balance: next,
                    entry: None,
                })
            })
            .await
    }

    fn finish(&self, applied: Applied) -> Result<LedgerEntry> {
        if let Some(threshold) = applied.balance.low_threshold {
            if applied.balance.available < threshold {
                self.alerts
                    .low_balance(&applied.balance.owner_id, applied.balance.available, threshold);
            }
        }
        applied.entry.ok_or_else(|| {
            LedgerError::Internal("mutation committed without its paired entry".to_string())
        })
    }
}
