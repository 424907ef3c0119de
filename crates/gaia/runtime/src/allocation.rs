//! Resource Allocation Ledger: per-owner balances
//!
//! Balances change through two paths only: an explicit `allocate`, or an
//! oracle-resolved rebalance delivered by the broker. Each owner has at most
//! one outstanding rebalance.

use crate::config::AllocationConfig;
use crate::oracle::OracleBroker;
use chrono::{DateTime, Utc};
use gaia_types::{
    Allocation, AllocationOrigin, CoordinatorError, CoordinatorResult, LedgerEvent, OwnerId,
    Quantity, RequestId,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Owns allocation records
#[derive(Debug, Clone)]
pub struct AllocationLedger {
    config: AllocationConfig,
    allocations: BTreeMap<OwnerId, Allocation>,
}

impl AllocationLedger {
    pub fn new(config: AllocationConfig) -> Self {
        Self {
            config,
            allocations: BTreeMap::new(),
        }
    }

    /// Create or increase an owner's allocation, returning the new balance
    pub fn allocate(
        &mut self,
        owner: &OwnerId,
        amount: f64,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> CoordinatorResult<Quantity> {
        let amount = Quantity::new(amount)?;

        if let Some(existing) = self.allocations.get(owner) {
            if let (true, Some(request_id)) = (
                self.config.block_allocate_while_pending,
                existing.pending_request_id,
            ) {
                return Err(CoordinatorError::RequestInFlight {
                    owner: owner.clone(),
                    request_id,
                });
            }
        }

        let allocation = self
            .allocations
            .entry(owner.clone())
            .or_insert_with(|| Allocation::new(owner.clone(), now));
        let balance = allocation.amount.checked_add(amount)?;
        allocation.amount = balance;
        allocation.last_origin = AllocationOrigin::Allocated;
        allocation.updated_at = now;

        info!(
            owner = %owner,
            amount = amount.value(),
            balance = balance.value(),
            "Allocation increased"
        );

        journal.push(LedgerEvent::Allocated {
            owner_id: owner.clone(),
            amount,
            balance,
        });
        Ok(balance)
    }

    /// Ask the oracle to correct an owner's allocation
    ///
    /// Stale requests should be expired before calling this so that an owner
    /// whose oracle went silent is not refused forever.
    pub fn request_rebalance(
        &mut self,
        owner: &OwnerId,
        requested_amount: f64,
        broker: &mut OracleBroker,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> CoordinatorResult<RequestId> {
        let requested_amount = Quantity::new(requested_amount)?;
        let allocation = self
            .allocations
            .get_mut(owner)
            .ok_or_else(|| CoordinatorError::allocation_not_found(owner))?;

        if let Some(request_id) = allocation.pending_request_id {
            return Err(CoordinatorError::RequestInFlight {
                owner: owner.clone(),
                request_id,
            });
        }

        let request_id = broker.issue(owner, requested_amount, now, journal);
        allocation.pending_request_id = Some(request_id);
        allocation.updated_at = now;

        info!(
            owner = %owner,
            request_id = %request_id,
            requested = requested_amount.value(),
            "Rebalance requested"
        );
        Ok(request_id)
    }

    /// Overwrite the balance with an oracle-resolved amount
    ///
    /// Only the broker calls this, after validating the request. Fails if
    /// the owner is no longer waiting on `request_id`.
    pub(crate) fn apply_fulfillment(
        &mut self,
        owner: &OwnerId,
        request_id: RequestId,
        resolved: Quantity,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<()> {
        let allocation = self
            .allocations
            .get_mut(owner)
            .ok_or_else(|| CoordinatorError::allocation_not_found(owner))?;

        if allocation.pending_request_id != Some(request_id) {
            return Err(CoordinatorError::InvalidState(format!(
                "{} is not awaiting request {}",
                owner, request_id
            )));
        }

        let previous = allocation.amount;
        allocation.amount = resolved;
        allocation.pending_request_id = None;
        allocation.last_origin = AllocationOrigin::OracleResolved { request_id };
        allocation.updated_at = now;

        info!(
            owner = %owner,
            request_id = %request_id,
            previous = previous.value(),
            resolved = resolved.value(),
            "Allocation resolved by oracle"
        );
        Ok(())
    }

    /// Drop the pending marker left by an expired request
    pub(crate) fn clear_pending(&mut self, owner: &OwnerId, request_id: RequestId, now: DateTime<Utc>) {
        if let Some(allocation) = self.allocations.get_mut(owner) {
            if allocation.pending_request_id == Some(request_id) {
                allocation.pending_request_id = None;
                allocation.updated_at = now;
                debug!(owner = %owner, request_id = %request_id, "Pending rebalance cleared");
            }
        }
    }

    /// Current amount; zero for unknown owners
    pub fn get_allocation(&self, owner: &OwnerId) -> f64 {
        self.allocations
            .get(owner)
            .map(|allocation| allocation.amount.value())
            .unwrap_or(0.0)
    }

    pub fn allocation(&self, owner: &OwnerId) -> Option<&Allocation> {
        self.allocations.get(owner)
    }

    pub fn allocations(&self) -> impl Iterator<Item = &Allocation> {
        self.allocations.values()
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}
