//! Alerting seam for low-balance and consistency-violation signals.
//!
//! Fire-and-forget: the engine never blocks on, retries, or fails an
//! operation because of a sink. A sink that talks to an external system
//! owns its own delivery problems and logs them.

use openledger_types::OwnerId;
use rust_decimal::Decimal;

/// Receiver for out-of-band engine signals.
pub trait AlertSink: Send + Sync {
    /// An owner's available balance crossed below its configured threshold.
    fn low_balance(&self, owner_id: &OwnerId, available: Decimal, threshold: Decimal);

    /// The background verifier found stored state disagreeing with the
    /// ledger history. Requires manual reconciliation.
    fn consistency_violation(&self, owner_id: &OwnerId, reason: &str);
}

/// Sink that routes alerts into the `tracing` pipeline.
pub struct TracingAlerts;

impl AlertSink for TracingAlerts {
    fn low_balance(&self, owner_id: &OwnerId, available: Decimal, threshold: Decimal) {
        tracing::warn!(
            owner = %owner_id,
            available = %available,
            threshold = %threshold,
            "available balance below low threshold"
        );
    }

    fn consistency_violation(&self, owner_id: &OwnerId, reason: &str) {
        tracing::error!(owner = %owner_id, reason, "ledger consistency violation");
    }
}

/// Sink that records alerts for assertions. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Default)]
pub struct CollectingAlerts {
    pub low_balance: std::sync::Mutex<Vec<(OwnerId, Decimal, Decimal)>>,
    pub violations: std::sync::Mutex<Vec<(OwnerId, String)>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl AlertSink for CollectingAlerts {
    fn low_balance(&self, owner_id: &OwnerId, available: Decimal, threshold: Decimal) {
        self.low_balance
            .lock()
            .unwrap()
            .push((owner_id.clone(), available, threshold));
    }

    fn consistency_violation(&self, owner_id: &OwnerId, reason: &str) {
        self.violations
            .lock()
            .unwrap()
            .push((owner_id.clone(), reason.to_string()));
    }
}
