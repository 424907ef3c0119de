//! Gaia Coordinator Domain Types
//!
//! This crate defines the data model shared by the governance and
//! adaptive resource allocation coordinator: weighted proposals and their
//! vote records, per-owner allocations, correlated oracle requests, the
//! circuit breaker state, roles and actions, and the hash-chained audit
//! journal every committed mutation is recorded in.
//!
//! # Key Concepts
//!
//! - **Proposal**: a governance item subject to weighted voting and, if it
//!   passes, a single execution effect. States only move forward.
//! - **Allocation**: the resource quantity attributed to an owner, with at
//!   most one outstanding oracle correction.
//! - **Oracle Request**: an outbound rebalance request correlated to its
//!   asynchronous fulfillment by a monotonic id.
//! - **Journal**: one entry per committed mutation, linked by blake3 hashes.
//!
//! # Architecture
//!
//! This is a pure types crate with no I/O. All types implement `Clone`,
//! `Debug`, `Serialize`, `Deserialize`. Identifiers use the newtype pattern
//! and implement `Display`.

#![deny(unsafe_code)]

mod access;
mod allocation;
mod amount;
mod breaker;
mod effect;
mod errors;
mod ids;
mod journal;
mod oracle;
mod proposal;

pub use access::*;
pub use allocation::*;
pub use amount::*;
pub use breaker::*;
pub use effect::*;
pub use errors::*;
pub use ids::*;
pub use journal::*;
pub use oracle::*;
pub use proposal::*;
