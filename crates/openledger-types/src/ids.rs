//! Identifiers used throughout OpenLedger.
//!
//! Ledger entries use UUIDv7 for time-ordered lexicographic sorting.
//! Owners are opaque string keys supplied by the embedding service
//! (a company id, a SKU+warehouse pair, a payout pool).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OwnerId
// ---------------------------------------------------------------------------

/// Opaque unique key for one tracked balance.
///
/// The engine never interprets the contents. Callers that track compound
/// dimensions (e.g. stock per SKU per warehouse) build a scoped key with
/// [`OwnerId::scoped`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Compound key for multi-dimensional owners, e.g. `sku-1122@wh-berlin`.
    #[must_use]
    pub fn scoped(namespace: &str, key: &str) -> Self {
        Self(format!("{namespace}@{key}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Globally unique ledger entry identifier. Uses UUIDv7 for time-ordered
/// sorting, so a lexicographic scan of entry ids is also a chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Initiator
// ---------------------------------------------------------------------------

/// The actor responsible for a mutation: a user id, a service name,
/// or a background process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Initiator(pub String);

impl Initiator {
    #[must_use]
    pub fn new(actor: impl Into<String>) -> Self {
        Self(actor.into())
    }

    /// Initiator for engine-internal mutations (e.g. saga compensation).
    #[must_use]
    pub fn system() -> Self {
        Self("system".to_string())
    }
}

impl fmt::Display for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Initiator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_uniqueness() {
        let a = EntryId::new();
        let b = EntryId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn entry_id_ordering() {
        let a = EntryId::new();
        let b = EntryId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn entry_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = EntryId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn owner_id_scoped() {
        let owner = OwnerId::scoped("sku-1122", "wh-berlin");
        assert_eq!(owner.as_str(), "sku-1122@wh-berlin");
    }

    #[test]
    fn owner_id_display_is_transparent() {
        let owner = OwnerId::new("acme-gmbh");
        assert_eq!(format!("{owner}"), "acme-gmbh");
    }

    #[test]
    fn serde_roundtrips() {
        let eid = EntryId::new();
        let json = serde_json::to_string(&eid).unwrap();
        let back: EntryId = serde_json::from_str(&json).unwrap();
        assert_eq!(eid, back);

        let owner = OwnerId::scoped("sku-9", "wh-1");
        let json = serde_json::to_string(&owner).unwrap();
        let back: OwnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(owner, back);
    }
}
