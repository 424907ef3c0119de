//! Fulfillment inbox
//!
//! Oracle responses re-enter the coordinator as messages. Collaborators push
//! [`Fulfillment`]s into a bounded channel; a single pump task drains it and
//! delivers each one through [`Coordinator::fulfill_encoded`].

use crate::coordinator::Coordinator;
use gaia_types::RequestId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// An oracle response awaiting delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    /// Opaque encoded amount
    pub payload: Vec<u8>,
}

/// Errors raised when queueing a fulfillment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InboxError {
    #[error("Fulfillment inbox is full")]
    Full,

    #[error("Fulfillment inbox is closed")]
    Closed,
}

/// Sending half of the inbox
#[derive(Debug, Clone)]
pub struct OracleInbox {
    tx: mpsc::Sender<Fulfillment>,
}

impl OracleInbox {
    /// Create an inbox holding at most `capacity` undelivered messages
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Fulfillment>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a fulfillment, waiting for space
    pub async fn submit(&self, fulfillment: Fulfillment) -> Result<(), InboxError> {
        self.tx.send(fulfillment).await.map_err(|_| InboxError::Closed)
    }

    /// Queue a fulfillment without waiting
    pub fn try_submit(&self, fulfillment: Fulfillment) -> Result<(), InboxError> {
        self.tx.try_send(fulfillment).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => InboxError::Full,
            mpsc::error::TrySendError::Closed(_) => InboxError::Closed,
        })
    }
}

/// Drain the inbox into the coordinator until every sender is dropped
pub fn spawn_fulfillment_pump(
    coordinator: Arc<Coordinator>,
    mut rx: mpsc::Receiver<Fulfillment>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Fulfillment pump started");
        while let Some(fulfillment) = rx.recv().await {
            match coordinator
                .fulfill_encoded(fulfillment.request_id, &fulfillment.payload)
                .await
            {
                Ok(outcome) => debug!(?outcome, "Fulfillment delivered"),
                Err(e) => error!(
                    request_id = %fulfillment.request_id,
                    error = %e,
                    "Fulfillment delivery failed"
                ),
            }
        }
        info!("Fulfillment pump stopped");
    })
}
