//! Pure ledger replay: fold an entry history into expected balances.

use openledger_types::{BalanceAmounts, EntryType, LedgerEntry};
use rust_decimal::Decimal;

/// Recompute (available, reserved) from an owner's entry history.
///
/// Entries that affected the balance count — COMPLETED and REVERSED alike:
/// a reversed entry's effect was committed at the time, and its
/// compensating entry (itself COMPLETED) carries the opposite effect.
/// PENDING and FAILED entries never moved quantity and are skipped.
#[must_use]
pub fn replay(entries: &[LedgerEntry]) -> BalanceAmounts {
    let mut available = Decimal::ZERO;
    let mut reserved = Decimal::ZERO;
    for entry in entries {
        if !entry.status.affected_balance() {
            continue;
        }
        match entry.entry_type {
            EntryType::Credit => available += entry.amount,
            EntryType::Debit => available -= entry.amount,
            EntryType::Reserve => {
                available -= entry.amount;
                reserved += entry.amount;
            }
            EntryType::Release => {
                reserved -= entry.amount;
                available += entry.amount;
            }
        }
    }
    BalanceAmounts {
        available,
        reserved,
        total: available + reserved,
    }
}
