//! Cross-owner transfers as a two-step saga.
//!
//! A transfer is never a single atomic unit: the atomicity scope of this
//! engine is one balance row plus its paired entry. Instead, two
//! sequential primitives run — `debit(from)` then `credit(to)` — and a
//! failed second leg triggers a compensating reversal of the first. No
//! cross-row lock is ever held, so the mutation path stays lock-free.

use openledger_store::LedgerStore;
use openledger_types::{Initiator, LedgerEntry, OwnerId, Reference, Result};
use rust_decimal::Decimal;

use crate::manager::ReservationManager;

/// Both legs of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub debit: LedgerEntry,
    pub credit: LedgerEntry,
}

impl<S: LedgerStore> ReservationManager<S> {
    /// Move `amount` from one owner's available balance to another's.
    ///
    /// On a failed credit leg the already-committed debit is reversed
    /// (a compensating entry, visible on the ledger) and the credit-leg
    /// error is surfaced. If the compensation itself fails, the error is
    /// logged at `error` level and the consistency verifier is the
    /// backstop — the debit leg's entry remains on the ledger for manual
    /// reconciliation.
    pub async fn transfer(
        &self,
        from: &OwnerId,
        to: &OwnerId,
        amount: Decimal,
        reference: Reference,
        initiator: Initiator,
    ) -> Result<TransferReceipt> {
        let debit = self
            .debit(from, amount, reference.clone(), initiator.clone())
            .await?;

        match self.credit(to, amount, reference, initiator).await {
            Ok(credit) => {
                tracing::debug!(from = %from, to = %to, amount = %amount, "transfer completed");
                Ok(TransferReceipt { debit, credit })
            }
            Err(err) => {
                tracing::warn!(
                    from = %from,
                    to = %to,
                    amount = %amount,
                    error = %err,
                    "transfer credit leg failed, compensating the debit leg"
                );
                if let Err(comp_err) = self.reverse(from, debit.id, Initiator::system()).await {
                    tracing::error!(
                        from = %from,
                        entry = %debit.id,
                        error = %comp_err,
                        "transfer compensation failed, manual reconciliation required"
                    );
                }
                Err(err)
            }
        }
    }
}
