//! In-memory `LedgerStore` backed by a `tokio::sync::RwLock` map.
//!
//! The write lock is the row-level conditional-write primitive: it is held
//! only for the duration of a single `commit`, never across a caller's
//! read-compute cycle. This is the reference implementation and the test
//! substrate for the engine; a durable backend implements the same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use openledger_types::{
    constants, Balance, BalanceSnapshot, EntryFilter, EntryId, EntryStatus, LedgerEntry,
    LedgerError, OwnerId, Page, PageRequest, Result,
};
use tokio::sync::RwLock;

use crate::contract::{CommitOutcome, CommitRequest, LedgerStore};

/// One owner's row plus its append-only entry history.
#[derive(Debug)]
struct OwnerSlot {
    balance: Balance,
    entries: Vec<LedgerEntry>,
}

/// In-memory store. Cheap to clone into tests via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<OwnerId, OwnerSlot>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Number of owners ever referenced.
    pub async fn owner_count(&self) -> usize {
        self.slots.read().await.len()
    }
}

/// Drift injection for reconciliation tests: mutates the stored balance
/// without writing a ledger entry. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl MemoryStore {
    pub async fn corrupt_balance(
        &self,
        owner_id: &OwnerId,
        delta_available: rust_decimal::Decimal,
    ) -> Result<()> {
        let mut slots = self.slots.write().await;
        let slot = slots
            .get_mut(owner_id)
            .ok_or_else(|| LedgerError::Internal(format!("no balance row for {owner_id}")))?;
        slot.balance.available += delta_available;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_or_create(&self, owner_id: &OwnerId) -> Result<Balance> {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(owner_id.clone()).or_insert_with(|| OwnerSlot {
            balance: Balance::new(owner_id.clone()),
            entries: Vec::new(),
        });
        Ok(slot.balance.clone())
    }

    async fn read(&self, owner_id: &OwnerId) -> Result<Option<BalanceSnapshot>> {
        let slots = self.slots.read().await;
        Ok(slots.get(owner_id).map(|slot| slot.balance.snapshot()))
    }

    async fn commit(&self, request: CommitRequest) -> Result<CommitOutcome> {
        let mut slots = self.slots.write().await;
        let slot = slots.get_mut(&request.balance.owner_id).ok_or_else(|| {
            LedgerError::Internal(format!(
                "commit for unknown owner {}",
                request.balance.owner_id
            ))
        })?;

        if slot.balance.version != request.expected_version {
            return Ok(CommitOutcome::VersionMismatch {
                actual: slot.balance.version,
            });
        }
        if request.balance.version != request.expected_version + 1 {
            return Err(LedgerError::Internal(
                "commit must advance the version by exactly 1".to_string(),
            ));
        }

        // Validate the reversal flip before touching anything, so a failed
        // commit retains nothing.
        let flip_index = match request.reverses {
            Some(original_id) => {
                let index = slot
                    .entries
                    .iter()
                    .position(|e| e.id == original_id)
                    .ok_or(LedgerError::EntryNotFound(original_id))?;
                let status = slot.entries[index].status;
                if !status.can_transition_to(EntryStatus::Reversed) {
                    return Err(LedgerError::EntryNotReversible {
                        entry: original_id,
                        status,
                    });
                }
                Some(index)
            }
            None => None,
        };

        slot.balance = request.balance;
        if let Some(index) = flip_index {
            slot.entries[index].status = EntryStatus::Reversed;
        }
        if let Some(entry) = request.entry {
            slot.entries.push(entry);
        }
        Ok(CommitOutcome::Applied)
    }

    async fn find_entry(
        &self,
        owner_id: &OwnerId,
        entry_id: EntryId,
    ) -> Result<Option<LedgerEntry>> {
        let slots = self.slots.read().await;
        Ok(slots
            .get(owner_id)
            .and_then(|slot| slot.entries.iter().find(|e| e.id == entry_id).cloned()))
    }

    async fn list_entries(
        &self,
        owner_id: &OwnerId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<Page<LedgerEntry>> {
        let limit = page.limit.min(constants::MAX_PAGE_SIZE);
        let slots = self.slots.read().await;
        let matched: Vec<&LedgerEntry> = slots
            .get(owner_id)
            .map(|slot| slot.entries.iter().filter(|e| filter.matches(e)).collect())
            .unwrap_or_default();
        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(page.offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page {
            items,
            total,
            offset: page.offset,
            limit,
        })
    }

    async fn replay_entries(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>> {
        let slots = self.slots.read().await;
        Ok(slots
            .get(owner_id)
            .map(|slot| slot.entries.clone())
            .unwrap_or_default())
    }

    async fn owner_ids(&self) -> Result<Vec<OwnerId>> {
        let slots = self.slots.read().await;
        Ok(slots.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use openledger_types::EntryType;
    use rust_decimal::Decimal;

    use super::*;

    fn owner() -> OwnerId {
        OwnerId::new("acme")
    }

    /// Apply one credit through the conditional-write path.
    async fn seed_credit(store: &MemoryStore, owner_id: &OwnerId, amount: Decimal) -> LedgerEntry {
        let current = store.get_or_create(owner_id).await.unwrap();
        let mut next = current.clone();
        next.available += amount;
        next.version += 1;
        let entry = LedgerEntry::dummy(owner_id.clone(), EntryType::Credit, amount);
        let outcome = store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: Some(entry.clone()),
                reverses: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Applied);
        entry
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let a = store.get_or_create(&owner()).await.unwrap();
        let b = store.get_or_create(&owner()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.version, 0);
        assert!(a.is_zero());
        assert_eq!(store.owner_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_first_access_creates_one_row() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.get_or_create(&OwnerId::new("acme")).await.unwrap()
            }));
        }
        for handle in handles {
            let bal = handle.await.unwrap();
            assert_eq!(bal.version, 0);
        }
        assert_eq!(store.owner_count().await, 1);
    }

    #[tokio::test]
    async fn read_missing_owner_is_none() {
        let store = MemoryStore::new();
        assert!(store.read(&owner()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_applies_balance_and_appends_entry() {
        let store = MemoryStore::new();
        seed_credit(&store, &owner(), Decimal::new(1000, 0)).await;

        let snap = store.read(&owner()).await.unwrap().unwrap();
        assert_eq!(snap.available, Decimal::new(1000, 0));
        assert_eq!(snap.version, 1);

        let entries = store.replay_entries(&owner()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::Credit);
    }

    #[tokio::test]
    async fn commit_stale_version_reports_actual() {
        let store = MemoryStore::new();
        seed_credit(&store, &owner(), Decimal::new(100, 0)).await;

        // A writer that read version 0 loses to the committed version 1.
        let mut stale = store.get_or_create(&owner()).await.unwrap();
        stale.version = 1;
        let outcome = store
            .commit(CommitRequest {
                expected_version: 0,
                balance: stale,
                entry: None,
                reverses: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::VersionMismatch { actual: 1 });

        // Nothing was written.
        let snap = store.read(&owner()).await.unwrap().unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.available, Decimal::new(100, 0));
    }

    #[tokio::test]
    async fn commit_must_advance_version_by_one() {
        let store = MemoryStore::new();
        let current = store.get_or_create(&owner()).await.unwrap();
        let mut next = current.clone();
        next.version += 2;
        let err = store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: None,
                reverses: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
    }

    #[tokio::test]
    async fn commit_for_unknown_owner_errors() {
        let store = MemoryStore::new();
        let err = store
            .commit(CommitRequest {
                expected_version: 0,
                balance: Balance::new(owner()),
                entry: None,
                reverses: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Internal(_)));
    }

    #[tokio::test]
    async fn reversal_flip_commits_atomically() {
        let store = MemoryStore::new();
        let original = seed_credit(&store, &owner(), Decimal::new(100, 0)).await;

        let current = store.get_or_create(&owner()).await.unwrap();
        let mut next = current.clone();
        next.available -= Decimal::new(100, 0);
        next.version += 1;
        let mut compensation =
            LedgerEntry::dummy(owner(), EntryType::Debit, Decimal::new(100, 0));
        compensation.reverses = Some(original.id);
        store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: Some(compensation),
                reverses: Some(original.id),
            })
            .await
            .unwrap();

        let flipped = store.find_entry(&owner(), original.id).await.unwrap().unwrap();
        assert_eq!(flipped.status, EntryStatus::Reversed);
        assert_eq!(flipped.amount, original.amount, "amounts stay immutable");
        assert_eq!(store.replay_entries(&owner()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn double_reversal_is_rejected_without_side_effects() {
        let store = MemoryStore::new();
        let original = seed_credit(&store, &owner(), Decimal::new(100, 0)).await;

        // First reversal.
        let current = store.get_or_create(&owner()).await.unwrap();
        let mut next = current.clone();
        next.available -= Decimal::new(100, 0);
        next.version += 1;
        store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: Some(LedgerEntry::dummy(owner(), EntryType::Debit, Decimal::new(100, 0))),
                reverses: Some(original.id),
            })
            .await
            .unwrap();

        // Second reversal of the same entry must fail and retain nothing.
        let current = store.get_or_create(&owner()).await.unwrap();
        let mut next = current.clone();
        next.available += Decimal::new(100, 0);
        next.version += 1;
        let err = store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: Some(LedgerEntry::dummy(owner(), EntryType::Credit, Decimal::new(100, 0))),
                reverses: Some(original.id),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::EntryNotReversible { .. }));
        assert_eq!(store.replay_entries(&owner()).await.unwrap().len(), 2);
        assert_eq!(
            store.read(&owner()).await.unwrap().unwrap().version,
            current.version
        );
    }

    #[tokio::test]
    async fn reversal_of_unknown_entry_errors() {
        let store = MemoryStore::new();
        let current = store.get_or_create(&owner()).await.unwrap();
        let mut next = current.clone();
        next.version += 1;
        let err = store
            .commit(CommitRequest {
                expected_version: current.version,
                balance: next,
                entry: None,
                reverses: Some(EntryId::new()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn list_entries_filters_and_pages() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            seed_credit(&store, &owner(), Decimal::new(10, 0)).await;
        }

        let all = store
            .list_entries(&owner(), &EntryFilter::any(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.items.len(), 5);

        let page = store
            .list_entries(&owner(), &EntryFilter::any(), PageRequest::new(3, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.offset, 3);

        let none = store
            .list_entries(
                &owner(),
                &EntryFilter::any().with_type(EntryType::Debit),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(none.total, 0);
        assert!(none.items.is_empty());
    }

    #[tokio::test]
    async fn page_limit_is_clamped() {
        let store = MemoryStore::new();
        seed_credit(&store, &owner(), Decimal::ONE).await;
        let page = store
            .list_entries(&owner(), &EntryFilter::any(), PageRequest::new(0, usize::MAX))
            .await
            .unwrap();
        assert_eq!(page.limit, constants::MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn listing_unknown_owner_is_empty() {
        let store = MemoryStore::new();
        let page = store
            .list_entries(&owner(), &EntryFilter::any(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn corrupt_balance_bypasses_ledger() {
        let store = MemoryStore::new();
        seed_credit(&store, &owner(), Decimal::new(100, 0)).await;
        store
            .corrupt_balance(&owner(), Decimal::new(-30, 0))
            .await
            .unwrap();
        let snap = store.read(&owner()).await.unwrap().unwrap();
        assert_eq!(snap.available, Decimal::new(70, 0));
        // The ledger still claims 100 — exactly the drift the verifier hunts.
        assert_eq!(store.replay_entries(&owner()).await.unwrap().len(), 1);
    }
}
