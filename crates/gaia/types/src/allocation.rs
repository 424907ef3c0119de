//! Allocation records: per-owner resource balances
//!
//! An allocation is a data structure, not an execution engine. Its amount
//! changes only through an explicit allocate or an oracle-resolved
//! rebalance, and it remembers which of the two produced the last change.

use crate::{OwnerId, Quantity, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the most recent change to an allocation came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum AllocationOrigin {
    /// An explicit allocate call (directly or via an executed proposal)
    #[default]
    Allocated,
    /// An oracle fulfillment for the given request
    OracleResolved { request_id: RequestId },
}

/// The resource quantity attributed to one owner
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Allocation {
    /// Unique owner key
    pub owner_id: OwnerId,
    /// Current amount
    pub amount: Quantity,
    /// Outstanding oracle correction, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_request_id: Option<RequestId>,
    /// Origin of the last amount change
    pub last_origin: AllocationOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Allocation {
    pub fn new(owner_id: OwnerId, created_at: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            amount: Quantity::zero(),
            pending_request_id: None,
            last_origin: AllocationOrigin::Allocated,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending_request_id.is_some()
    }
}
