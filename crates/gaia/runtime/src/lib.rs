//! Gaia Coordinator Runtime
//!
//! This crate implements the governance and adaptive resource allocation
//! coordinator: weighted voting on proposals, a per-owner allocation ledger
//! corrected asynchronously by an external oracle, and a global circuit
//! breaker that halts every mutation when an anomaly is reported.
//!
//! # Architecture
//!
//! The [`Coordinator`] is the main entry point. It serializes every mutating
//! operation over a set of single-purpose ledgers:
//!
//! - [`AccessControl`]: roles and per-action authorization
//! - [`CircuitBreaker`]: the process-wide pause flag
//! - [`GovernanceLedger`]: proposals, votes, stake locks, tally, execution
//! - [`AllocationLedger`]: balances and pending-rebalance markers
//! - [`OracleBroker`]: request issue, fulfillment validation, expiry
//!
//! Around it sit the collaborators a deployment wires up: a [`StakeSource`],
//! a [`LedgerStore`] for the audit journal, the [`AnomalyMonitor`], the
//! fulfillment [`OracleInbox`] and the expiry sweeper.
//!
//! # Key Invariants
//!
//! 1. At most one vote per voter per proposal; tallies only grow while Active
//! 2. A proposal's effect is applied at most once
//! 3. At most one outstanding oracle request per owner
//! 4. Stale, duplicate or unknown fulfillments never change a balance
//! 5. Nothing mutates while paused; reads are never blocked
//! 6. An operation lands completely, journal included, or not at all
//!
//! # Example
//!
//! ```rust
//! use gaia_runtime::{Coordinator, CoordinatorConfig, InMemoryStore};
//! use gaia_types::{ActorId, OwnerId};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut config = CoordinatorConfig::default();
//! config.access.administrators.push("ops".into());
//! let coordinator = Coordinator::new(config, Arc::new(InMemoryStore::new()));
//!
//! let ops = ActorId::new("ops");
//! let owner = OwnerId::new("region-1");
//! coordinator.allocate(&ops, &owner, 100.0).await.unwrap();
//! assert_eq!(coordinator.get_allocation(&owner).await, 100.0);
//! # }
//! ```

#![deny(unsafe_code)]

pub mod access;
pub mod allocation;
pub mod breaker;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod governance;
pub mod inbox;
pub mod monitor;
pub mod oracle;
pub mod stake;
pub mod store;
pub mod sweeper;

// Re-export main types for convenience
pub use access::AccessControl;
pub use allocation::AllocationLedger;
pub use breaker::CircuitBreaker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AccessConfig, AllocationConfig, AnomalyThresholds, CoordinatorConfig, GovernanceConfig,
    MonitorConfig, OracleConfig,
};
pub use coordinator::{Coordinator, CoordinatorStatus};
pub use governance::GovernanceLedger;
pub use inbox::{spawn_fulfillment_pump, Fulfillment, InboxError, OracleInbox};
pub use monitor::{AnomalyFinding, AnomalyMonitor, AnomalySignals, MonitorReport};
pub use oracle::OracleBroker;
pub use stake::{StakeSource, StakeTable};
pub use store::{InMemoryStore, JsonLinesStore, LedgerStore, StoreError, StoreResult};
pub use sweeper::spawn_expiry_sweeper;
