//! Anomaly monitor: turns simulator signals into breaker trips
//!
//! Signals come from opaque producers (sync-latency probes, allocation
//! model ensembles, sensor anomaly scorers). The monitor never reads ledger
//! state; it only compares signals to thresholds and, on a breach, pauses
//! the coordinator under its own identity.

use crate::config::{AnomalyThresholds, MonitorConfig};
use crate::coordinator::Coordinator;
use gaia_types::{ActorId, CoordinatorResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One sample of simulator output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AnomalySignals {
    pub sync_latency_secs: f64,
    pub allocation_variance: f64,
    pub anomaly_score: f64,
}

/// A signal that crossed its threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyFinding {
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    /// How far past the threshold, in [0, 1]
    pub severity: f64,
}

impl std::fmt::Display for AnomalyFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:.3} exceeds {:.3} (severity {:.2})",
            self.metric, self.value, self.threshold, self.severity
        )
    }
}

/// Result of observing one sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorReport {
    pub findings: Vec<AnomalyFinding>,
    pub paused: bool,
}

/// Threshold detector bound to a monitor identity
#[derive(Debug, Clone)]
pub struct AnomalyMonitor {
    identity: ActorId,
    thresholds: AnomalyThresholds,
}

impl AnomalyMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            identity: ActorId::new(config.identity.clone()),
            thresholds: config.thresholds,
        }
    }

    pub fn identity(&self) -> &ActorId {
        &self.identity
    }

    /// Compare a sample against the thresholds
    pub fn evaluate(&self, signals: &AnomalySignals) -> Vec<AnomalyFinding> {
        let t = &self.thresholds;
        let mut findings = Vec::new();

        // Unbounded metrics scale relative to their threshold
        if signals.sync_latency_secs > t.sync_latency_secs {
            findings.push(finding(
                "sync_latency_secs",
                signals.sync_latency_secs,
                t.sync_latency_secs,
                relative_excess(signals.sync_latency_secs, t.sync_latency_secs),
            ));
        }
        if signals.allocation_variance > t.allocation_variance {
            findings.push(finding(
                "allocation_variance",
                signals.allocation_variance,
                t.allocation_variance,
                relative_excess(signals.allocation_variance, t.allocation_variance),
            ));
        }

        // Scores live in [0, 1]; scale by the remaining headroom
        if signals.anomaly_score > t.anomaly_score {
            let headroom = (1.0 - t.anomaly_score).max(f64::EPSILON);
            findings.push(finding(
                "anomaly_score",
                signals.anomaly_score,
                t.anomaly_score,
                ((signals.anomaly_score - t.anomaly_score) / headroom).min(1.0),
            ));
        }

        findings
    }

    /// Evaluate a sample and pause the coordinator if anything breached
    pub async fn observe(
        &self,
        coordinator: &Coordinator,
        signals: &AnomalySignals,
    ) -> CoordinatorResult<MonitorReport> {
        let findings = self.evaluate(signals);
        if findings.is_empty() {
            debug!(?signals, "Signals within thresholds");
            return Ok(MonitorReport {
                findings,
                paused: false,
            });
        }

        let reason = format!(
            "anomaly detected: {}",
            findings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        );
        warn!(monitor = %self.identity, findings = findings.len(), "Anomaly threshold breached");
        coordinator.pause(&self.identity, reason).await?;

        Ok(MonitorReport {
            findings,
            paused: true,
        })
    }
}

fn finding(metric: &str, value: f64, threshold: f64, severity: f64) -> AnomalyFinding {
    AnomalyFinding {
        metric: metric.to_string(),
        value,
        threshold,
        severity: severity.clamp(0.0, 1.0),
    }
}

fn relative_excess(value: f64, threshold: f64) -> f64 {
    ((value - threshold) / threshold.abs().max(f64::EPSILON)).min(1.0)
}
