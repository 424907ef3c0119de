//! Gaia Daemon library
//!
//! This module provides the components `gaiad` is assembled from:
//! - REST API over the coordinator
//! - Layered configuration
//! - Server lifecycle (journal store, fulfillment pump, expiry sweeper)

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::{create_router, AppState};
pub use config::{DaemonConfig, StorageConfig};
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::Server;
