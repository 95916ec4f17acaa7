//! System-wide constants for the OpenLedger engine.

/// Default maximum attempts for a conditional balance write.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Base backoff delay between conflicting write attempts (milliseconds).
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 10;

/// Backoff delay cap (milliseconds). Delays double per attempt up to this.
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 100;

/// Fraction of the computed delay applied as random jitter.
pub const DEFAULT_BACKOFF_JITTER_PCT: f64 = 0.25;

/// Default ledger page size.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Maximum ledger page size; larger requests are clamped.
pub const MAX_PAGE_SIZE: usize = 500;

/// Default interval between background reconciliation sweeps (seconds).
pub const DEFAULT_VERIFY_INTERVAL_SECS: u64 = 300;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenLedger";
