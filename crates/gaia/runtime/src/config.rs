//! Coordinator configuration
//!
//! Every policy point the ledger leaves open is a setting here rather than
//! a hard-coded choice.

use chrono::Duration;
use gaia_types::TiePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub governance: GovernanceConfig,
    pub allocation: AllocationConfig,
    pub oracle: OracleConfig,
    pub monitor: MonitorConfig,
    pub access: AccessConfig,
    /// Available stake per voter
    pub stakes: HashMap<String, u64>,
}

/// Governance policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Outcome of a tally with equal weight on both sides
    pub tie_policy: TiePolicy,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            tie_policy: TiePolicy::Fail,
        }
    }
}

/// Allocation ledger policy
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AllocationConfig {
    /// Refuse `allocate` on an owner with an outstanding rebalance
    pub block_allocate_while_pending: bool,
}

const MAX_REQUEST_TIMEOUT_SECS: u64 = 10 * 365 * 24 * 3600;

/// Oracle round-trip settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// How long an issued request stays fulfillable
    pub request_timeout_secs: u64,

    /// Period of the background expiry sweep
    pub sweep_interval_secs: u64,

    /// Capacity of the fulfillment inbox
    pub inbox_capacity: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 3600,
            sweep_interval_secs: 60,
            inbox_capacity: 256,
        }
    }
}

impl OracleConfig {
    /// Request timeout, capped at ten years
    pub fn request_timeout(&self) -> Duration {
        let secs = self.request_timeout_secs.min(MAX_REQUEST_TIMEOUT_SECS) as i64;
        Duration::seconds(secs)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Anomaly monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Identity the monitor pauses as
    pub identity: String,
    pub thresholds: AnomalyThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            identity: "anomaly-monitor".to_string(),
            thresholds: AnomalyThresholds::default(),
        }
    }
}

/// Limits above which a simulated signal counts as anomalous
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Cross-region sync latency, seconds
    pub sync_latency_secs: f64,
    /// Variance of model-proposed allocations
    pub allocation_variance: f64,
    /// Sensor anomaly score in [0, 1]
    pub anomaly_score: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            sync_latency_secs: 4.0,
            allocation_variance: 0.25,
            anomaly_score: 0.8,
        }
    }
}

/// Initial role assignments
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    pub administrators: Vec<String>,
    pub monitors: Vec<String>,
    pub participants: Vec<String>,
    pub oracles: Vec<String>,
}
