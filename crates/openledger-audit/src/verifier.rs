//! The background consistency verifier.
//!
//! Periodic, out-of-band sweep: for each owner, replay the ledger history,
//! compare against the stored balance, and alert on drift. The verifier
//! never corrects anything — flagged owners need an explicit, logged
//! administrative adjustment.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use openledger_engine::AlertSink;
use openledger_store::LedgerStore;
use openledger_types::{BalanceAmounts, LedgerError, OwnerId, Result, VerifierConfig};
use serde::Serialize;

use crate::replay::replay;

/// One owner whose stored balance disagrees with its ledger history.
#[derive(Debug, Clone, Serialize)]
pub struct Drift {
    pub owner_id: OwnerId,
    /// What the ledger history says the balance should be.
    pub expected: BalanceAmounts,
    /// What the balance row actually holds.
    pub actual: BalanceAmounts,
}

impl Drift {
    /// Human-readable mismatch description for alerts and logs.
    #[must_use]
    pub fn reason(&self) -> String {
        format!(
            "ledger replays to available={} reserved={}, stored available={} reserved={}",
            self.expected.available,
            self.expected.reserved,
            self.actual.available,
            self.actual.reserved,
        )
    }

    /// The drift as a typed error, for callers that propagate instead of
    /// alerting.
    #[must_use]
    pub fn into_error(self) -> LedgerError {
        let reason = self.reason();
        LedgerError::ConsistencyViolation {
            owner: self.owner_id,
            reason,
        }
    }
}

/// Summary of one full reconciliation sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub owners_checked: usize,
    pub violations: Vec<Drift>,
    pub completed_at: DateTime<Utc>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Recomputes balances from ledger history and flags drift.
///
/// Reads live balances, writes only to the alert sink and the log.
pub struct ConsistencyVerifier<S> {
    store: Arc<S>,
    alerts: Arc<dyn AlertSink>,
    config: VerifierConfig,
}

impl<S: LedgerStore> ConsistencyVerifier<S> {
    pub fn new(store: Arc<S>, alerts: Arc<dyn AlertSink>) -> Self {
        Self::with_config(store, alerts, VerifierConfig::default())
    }

    pub fn with_config(store: Arc<S>, alerts: Arc<dyn AlertSink>, config: VerifierConfig) -> Self {
        Self {
            store,
            alerts,
            config,
        }
    }

    /// Check one owner. `None` means the stored balance matches its
    /// history (or the owner was never referenced).
    pub async fn verify_owner(&self, owner_id: &OwnerId) -> Result<Option<Drift>> {
        let Some(snapshot) = self.store.read(owner_id).await? else {
            return Ok(None);
        };
        let entries = self.store.replay_entries(owner_id).await?;
        let expected = replay(&entries);

        if expected.available == snapshot.available && expected.reserved == snapshot.reserved {
            return Ok(None);
        }
        Ok(Some(Drift {
            owner_id: owner_id.clone(),
            expected,
            actual: BalanceAmounts {
                available: snapshot.available,
                reserved: snapshot.reserved,
                total: snapshot.total,
            },
        }))
    }

    /// Sweep every owner. Each violation raises a consistency alert; the
    /// stored balance is left exactly as found.
    pub async fn verify_all(&self) -> Result<ReconciliationReport> {
        let owners = self.store.owner_ids().await?;
        let mut violations = Vec::new();
        for owner_id in &owners {
            if let Some(drift) = self.verify_owner(owner_id).await? {
                tracing::error!(
                    owner = %owner_id,
                    reason = %drift.reason(),
                    "consistency violation detected"
                );
                self.alerts.consistency_violation(owner_id, &drift.reason());
                violations.push(drift);
            }
        }
        let report = ReconciliationReport {
            owners_checked: owners.len(),
            violations,
            completed_at: Utc::now(),
        };
        if report.is_clean() {
            tracing::debug!(owners = report.owners_checked, "reconciliation sweep clean");
        }
        Ok(report)
    }

    /// Periodic sweep loop, decoupled from the hot path. Spawn as a task:
    ///
    /// ```ignore
    /// tokio::spawn(async move { verifier.run().await });
    /// ```
    pub async fn run(&self) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.scan_interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match self.verify_all().await {
                Ok(report) if !report.is_clean() => {
                    tracing::warn!(
                        owners = report.owners_checked,
                        violations = report.violations.len(),
                        "reconciliation sweep found drift"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "reconciliation sweep failed");
                }
            }
        }
    }
}
