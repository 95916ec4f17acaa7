//! The concurrency controller — the single path that writes a balance.
//!
//! Every mutation is expressed as a compute closure over the freshly-read
//! row. The controller owns the optimistic cycle: read the current balance
//! and its version, compute the target state, validate the invariants,
//! and issue a conditional commit. A version mismatch re-runs the whole
//! cycle under the retry policy; no lock is held at any point.

use std::sync::Arc;

use chrono::Utc;
use openledger_store::{CommitOutcome, CommitRequest, LedgerStore};
use openledger_types::{
    Balance, EntryId, EntryStatus, EntryType, Initiator, LedgerEntry, LedgerError, OwnerId,
    Reference, Result, RetryConfig,
};
use rust_decimal::Decimal;

use crate::retry::RetryPolicy;

/// Caller-supplied fields of the paired ledger entry. The controller fills
/// in the id, before/after snapshots, status, and timestamp at commit time.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub reference: Reference,
    pub initiator: Initiator,
    pub description: Option<String>,
    /// On a compensating entry: the original this one undoes. Its status
    /// flips to REVERSED in the same commit.
    pub reverses: Option<EntryId>,
}

/// Target state produced by a compute closure: the full new balance row
/// plus the draft of its paired audit record. The `version` and
/// `updated_at` fields of the returned balance are managed by the
/// controller; whatever the closure leaves there is overwritten.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub balance: Balance,
    /// `None` only for flag-only writes that move no quantity.
    pub entry: Option<EntryDraft>,
}

/// A committed mutation: the new row and its paired entry (if any).
#[derive(Debug, Clone)]
pub struct Applied {
    pub balance: Balance,
    pub entry: Option<LedgerEntry>,
}

/// Optimistic-retry wrapper around the store's conditional write.
pub struct ConcurrencyController<S> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S: LedgerStore> ConcurrencyController<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig) -> Self {
        Self {
            store,
            policy: RetryPolicy::new(retry),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Apply one mutation to an owner's balance.
    ///
    /// `compute` receives the current row and returns the target state; it
    /// may run several times (once per attempt) and must be side-effect
    /// free. A business error from `compute` aborts immediately with the
    /// balance and ledger untouched. On conditional-write conflict the
    /// cycle retries with backoff up to the configured bound, then
    /// surfaces [`LedgerError::ConcurrentModification`].
    pub async fn apply<F>(&self, owner_id: &OwnerId, compute: F) -> Result<Applied>
    where
        F: Fn(&Balance) -> Result<Mutation> + Send + Sync,
    {
        let compute = &compute;
        self.policy
            .run(|attempt| async move {
                let current = self.store.get_or_create(owner_id).await?;
                let mutation = compute(&current)?;
                let (next, entry) = Self::materialize(&current, mutation)?;
                let request = CommitRequest {
                    expected_version: current.version,
                    balance: next.clone(),
                    entry: entry.clone(),
                    reverses: entry.as_ref().and_then(|e| e.reverses),
                };
                match self.store.commit(request).await? {
                    CommitOutcome::Applied => {
                        tracing::debug!(
                            owner = %owner_id,
                            version = next.version,
                            "balance committed"
                        );
                        Ok(Applied {
                            balance: next,
                            entry,
                        })
                    }
                    CommitOutcome::VersionMismatch { actual } => {
                        tracing::debug!(
                            owner = %owner_id,
                            expected = current.version,
                            actual,
                            attempt,
                            "conditional write lost, re-reading"
                        );
                        Err(LedgerError::ConcurrentModification {
                            owner: owner_id.clone(),
                            attempts: attempt + 1,
                        })
                    }
                }
            })
            .await
    }

    /// Validate the target state and build the full ledger entry with
    /// before/after snapshots.
    fn materialize(
        current: &Balance,
        mutation: Mutation,
    ) -> Result<(Balance, Option<LedgerEntry>)> {
        let Mutation {
            balance: mut next,
            entry: draft,
        } = mutation;

        if next.owner_id != current.owner_id {
            return Err(LedgerError::Internal(
                "compute closure must not change the owner".to_string(),
            ));
        }
        if next.reserved < Decimal::ZERO {
            return Err(LedgerError::BalanceUnderflow);
        }
        if next.available < Decimal::ZERO && !next.allow_negative {
            return Err(LedgerError::BalanceUnderflow);
        }
        if draft.is_none()
            && (next.available != current.available || next.reserved != current.reserved)
        {
            return Err(LedgerError::Internal(
                "quantity mutations must carry a paired ledger entry".to_string(),
            ));
        }

        next.version = current.version + 1;
        next.updated_at = Utc::now();

        let entry = draft.map(|d| LedgerEntry {
            id: EntryId::new(),
            owner_id: current.owner_id.clone(),
            entry_type: d.entry_type,
            amount: d.amount,
            balance_before: current.amounts(),
            balance_after: next.amounts(),
            reference: d.reference,
            initiator: d.initiator,
            description: d.description,
            status: EntryStatus::Completed,
            reverses: d.reverses,
            created_at: next.updated_at,
        });
        Ok((next, entry))
    }
}
