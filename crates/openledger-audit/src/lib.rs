//! # openledger-audit
//!
//! **Fail-safe audit layer**: recompute balances from the ledger history
//! and flag drift against stored state.
//!
//! The hot path pairs every balance write with its ledger entry in one
//! atomic commit, but no hot path can guarantee itself end-to-end — a
//! two-phase store can crash between durability events, an operator can
//! fat-finger a row. The verifier is the out-of-band backstop:
//!
//! 1. **replay**: pure fold of an owner's entry history into the expected
//!    (available, reserved)
//! 2. **ConsistencyVerifier**: compares expected against stored snapshots,
//!    raises alerts on mismatch — and NEVER auto-corrects; correction is
//!    an explicit, logged administrative action
//! 3. **ReconciliationReport**: the sweep summary for dashboards and logs
//!
//! The verifier only reads live balances; its writes go to the alert sink
//! and the log, decoupled from any live request.

pub mod replay;
pub mod verifier;

pub use replay::replay;
pub use verifier::{ConsistencyVerifier, Drift, ReconciliationReport};
